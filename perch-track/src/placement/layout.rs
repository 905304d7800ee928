//! Overlay layouts: how many overlays are placed and where each anchors.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Which overlay of a layout a placement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlaySlot {
    /// A single overlay centred on the upper back.
    Center,
    /// The overlay on the subject's left side.
    Left,
    /// The overlay on the subject's right side; yaw and roll are mirrored.
    Right,
}

/// How many overlays are placed and where they attach.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum OverlayLayout {
    /// One overlay spanning both shoulders.
    #[default]
    Single,
    /// One overlay per side, each `spread * span / 2` pixels from the centre anchor
    /// along the shoulder line.
    Paired { spread: f32 },
}

impl OverlayLayout {
    pub fn slots(&self) -> &'static [OverlaySlot] {
        match self {
            Self::Single => &[OverlaySlot::Center],
            Self::Paired { .. } => &[OverlaySlot::Left, OverlaySlot::Right],
        }
    }

    /// Pixel anchor for `slot`, given the centre anchor, the left→right shoulder
    /// direction (unit length) and the shoulder span.
    pub fn anchor(&self, slot: OverlaySlot, center: Vec2, direction: Vec2, span: f32) -> Vec2 {
        let offset = match self {
            Self::Single => 0.0,
            Self::Paired { spread } => spread * span * 0.5,
        };
        match slot {
            OverlaySlot::Center => center,
            OverlaySlot::Left => center - direction * offset,
            OverlaySlot::Right => center + direction * offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_layout() {
        let layout = OverlayLayout::Single;
        assert_eq!(layout.slots(), &[OverlaySlot::Center]);
        let c = Vec2::new(10.0, 20.0);
        assert_eq!(layout.anchor(OverlaySlot::Center, c, Vec2::X, 100.0), c);
    }

    #[test]
    fn test_paired_anchors_are_symmetric() {
        let layout = OverlayLayout::Paired { spread: 0.5 };
        let c = Vec2::new(500.0, 340.0);
        let left = layout.anchor(OverlaySlot::Left, c, Vec2::X, 200.0);
        let right = layout.anchor(OverlaySlot::Right, c, Vec2::X, 200.0);
        assert_eq!(left, Vec2::new(450.0, 340.0));
        assert_eq!(right, Vec2::new(550.0, 340.0));
    }

    #[test]
    fn test_layout_from_json() {
        let layout: OverlayLayout = serde_json::from_str(r#"{"kind":"paired","spread":0.6}"#).unwrap();
        assert_eq!(layout, OverlayLayout::Paired { spread: 0.6 });
        let single: OverlayLayout = serde_json::from_str(r#"{"kind":"single"}"#).unwrap();
        assert_eq!(single, OverlayLayout::Single);
    }
}
