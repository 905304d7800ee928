use crate::extract::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::placement::smoothing::LossPolicy;
use serde::{Deserialize, Serialize};

/// Empirically tuned constants of the placement engine.
///
/// The defaults reproduce the reference behavior exactly; they are exposed so
/// deployments can retune, not so they can be "improved" in code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Exponential smoothing factor applied to position and rotation.
    pub smoothing: f32,
    /// Shoulders must score strictly above this to be tracked.
    pub confidence_threshold: f32,
    /// Downward shift of the anchor below the shoulder line, as a fraction of shoulder span.
    pub anchor_drop: f32,
    /// Depth when the subject is infinitely close.
    pub depth_base: f32,
    /// `depth = depth_base - depth_numerator / max(1, span)`.
    pub depth_numerator: f32,
    /// Shoulder span in pixels at the reference distance.
    pub reference_shoulder_px: f32,
    /// Lower bound for the subject-distance scale.
    pub min_subject_scale: f32,
    /// World-space size an asset of average dimension 1 is drawn at.
    pub target_world_size: f32,
    /// Forward tilt (radians) so the overlay leans into the back.
    pub pitch: f32,
    /// Multiplier from shoulder angle to yaw.
    pub yaw_gain: f32,
    /// Multiplier from shoulder angle to roll.
    pub roll_gain: f32,
    /// Scale constant used when the asset has no usable bounding box, and
    /// the result when the computed scale is not finite and positive.
    pub fallback_scale: f32,
    /// Capture is mirrored (front-facing camera).
    pub mirrored: bool,
    pub loss_policy: LossPolicy,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.4,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            anchor_drop: 0.15,
            depth_base: -2.0,
            depth_numerator: 150.0,
            reference_shoulder_px: 150.0,
            min_subject_scale: 0.5,
            target_world_size: 1.5,
            pitch: -0.2,
            yaw_gain: 0.5,
            roll_gain: 0.2,
            fallback_scale: 1.0,
            mirrored: false,
            loss_policy: LossPolicy::Persist,
        }
    }
}

impl PlacementConfig {
    pub fn with_smoothing(mut self, smoothing: f32) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub fn with_mirrored(mut self, mirrored: bool) -> Self {
        self.mirrored = mirrored;
        self
    }

    pub fn with_loss_policy(mut self, policy: LossPolicy) -> Self {
        self.loss_policy = policy;
        self
    }

    /// Heuristic camera-relative depth from shoulder span in pixels.
    pub fn depth_for_span(&self, span: f32) -> f32 {
        self.depth_base - self.depth_numerator / span.max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: PlacementConfig =
            serde_json::from_str(r#"{"smoothing":0.3,"loss_policy":"reset"}"#).unwrap();
        assert_eq!(config.smoothing, 0.3);
        assert_eq!(config.loss_policy, LossPolicy::Reset);
        assert_eq!(config.reference_shoulder_px, 150.0);
        assert_eq!(config.confidence_threshold, 0.4);
    }

    #[test]
    fn test_depth_bounds() {
        let config = PlacementConfig::default();
        assert!((config.depth_for_span(1e9) + 2.0).abs() < 1e-6);
        assert_eq!(config.depth_for_span(150.0), -3.0);
        // Spans below one pixel are clamped, so zero never divides.
        assert_eq!(config.depth_for_span(0.0), -152.0);
        assert_eq!(config.depth_for_span(1e-30), -152.0);
        assert!(config.depth_for_span(f32::MIN_POSITIVE).is_finite());
    }
}
