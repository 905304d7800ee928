//! Overlay placement: 2D shoulders → smoothed 3D position, scale and rotation.

use crate::extract::JointPair;
use crate::placement::config::PlacementConfig;
use crate::placement::layout::{OverlayLayout, OverlaySlot};
use crate::placement::smoothing::SmoothedTransform;
use crate::scene::CameraModel;
use glam::{Vec2, Vec3};
use tracing::debug;

/// Smallest ray z magnitude divided by when travelling to the target depth.
pub const RAY_Z_EPSILON: f32 = 1e-4;

/// Shoulder spans at or below this are treated as having no direction.
const SPAN_EPSILON: f32 = 1e-6;

/// Depth of the point unprojected to build the view ray.
const UNPROJECT_DEPTH: f32 = 0.5;

/// Final transform for one overlay after smoothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub slot: OverlaySlot,
    pub position: Vec3,
    /// Euler angles (pitch, yaw, roll) in radians.
    pub rotation: Vec3,
    /// Uniform scale factor.
    pub scale: f32,
}

/// Convert a pixel position into normalized device x/y.
///
/// Mirrored captures flip the horizontal axis.
pub fn pixel_to_ndc(pixel: Vec2, width: u32, height: u32, mirrored: bool) -> Vec2 {
    let w = width.max(1) as f32;
    let h = height.max(1) as f32;
    let nx = (pixel.x / w) * 2.0 - 1.0;
    let ny = -(pixel.y / h) * 2.0 + 1.0;
    Vec2::new(if mirrored { -nx } else { nx }, ny)
}

/// World-space point at the heuristic depth along the camera ray through `ndc`.
pub fn unproject_to_depth(camera: &CameraModel, ndc: Vec2, depth: f32) -> Vec3 {
    let world = camera.unproject(ndc.extend(UNPROJECT_DEPTH));
    let mut direction = (world - camera.position).normalize_or_zero();
    if direction == Vec3::ZERO || !direction.is_finite() {
        direction = camera.forward();
    }
    let z = if direction.z.abs() < RAY_Z_EPSILON {
        RAY_Z_EPSILON.copysign(direction.z)
    } else {
        direction.z
    };
    let distance = (depth / z).abs();
    camera.position + direction * distance
}

/// Scale factor normalising the asset's size against the subject's apparent size.
///
/// `bounds_size` is the asset's bounding-box extent; without one (or with a
/// degenerate one) the raw subject scale times `fallback_scale` is used.
pub fn scale_factor(config: &PlacementConfig, span: f32, bounds_size: Option<Vec3>) -> f32 {
    let subject = config
        .min_subject_scale
        .max(span / config.reference_shoulder_px);
    let average = bounds_size.map(|s| (s.x + s.y + s.z) / 3.0);
    let factor = match average {
        Some(avg) if avg.is_finite() && avg > 0.0 => (config.target_world_size / avg) * subject,
        _ => subject * config.fallback_scale,
    };
    if factor.is_finite() && factor > 0.0 {
        factor
    } else {
        config.fallback_scale
    }
}

/// Target (unsmoothed) transform for an overlay anchored at `anchor`.
pub fn target_transform(
    config: &PlacementConfig,
    anchor: Vec2,
    body_angle: f32,
    span: f32,
    video_size: (u32, u32),
    camera: &CameraModel,
) -> SmoothedTransform {
    let ndc = pixel_to_ndc(anchor, video_size.0, video_size.1, config.mirrored);
    let position = unproject_to_depth(camera, ndc, config.depth_for_span(span));

    let sign = if config.mirrored { -1.0 } else { 1.0 };
    let rotation = Vec3::new(
        config.pitch,
        sign * body_angle * config.yaw_gain,
        sign * body_angle * config.roll_gain,
    );
    SmoothedTransform::new(position, rotation)
}

/// Stateful placement engine owning one smoothed transform per overlay slot.
#[derive(Debug, Clone)]
pub struct PlacementEngine {
    config: PlacementConfig,
    layout: OverlayLayout,
    states: Vec<SmoothedTransform>,
}

impl PlacementEngine {
    pub fn new(config: PlacementConfig) -> Self {
        Self::with_layout(config, OverlayLayout::Single)
    }

    pub fn with_layout(config: PlacementConfig, layout: OverlayLayout) -> Self {
        Self {
            config,
            layout,
            states: vec![SmoothedTransform::default(); layout.slots().len()],
        }
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    pub fn layout(&self) -> OverlayLayout {
        self.layout
    }

    /// Current smoothed state, in the layout's slot order.
    pub fn states(&self) -> &[SmoothedTransform] {
        &self.states
    }

    /// Compute and smooth the transform of every overlay slot.
    pub fn place(
        &mut self,
        shoulders: &JointPair,
        video_size: (u32, u32),
        camera: &CameraModel,
        bounds_size: Option<Vec3>,
    ) -> Vec<Placement> {
        let span = shoulders.span();
        let angle = shoulders.angle();
        let direction = if span > SPAN_EPSILON {
            shoulders.delta() / span
        } else {
            Vec2::X
        };
        let center = shoulders.midpoint() + Vec2::new(0.0, self.config.anchor_drop * span);
        let scale = scale_factor(&self.config, span, bounds_size);

        let mut placements = Vec::with_capacity(self.states.len());
        for (slot, state) in self.layout.slots().iter().zip(self.states.iter_mut()) {
            let anchor = self.layout.anchor(*slot, center, direction, span);
            let mut target =
                target_transform(&self.config, anchor, angle, span, video_size, camera);
            if *slot == OverlaySlot::Right {
                target.rotation.y = -target.rotation.y;
                target.rotation.z = -target.rotation.z;
            }

            if target.position.is_finite() && target.rotation.is_finite() {
                state.blend(&target, self.config.smoothing);
            } else {
                debug!("Skipping non-finite target for {:?}", slot);
            }

            placements.push(Placement {
                slot: *slot,
                position: state.position,
                rotation: state.rotation,
                scale,
            });
        }
        placements
    }

    /// Apply the loss policy to every slot after a frame without tracking.
    pub fn on_tracking_lost(&mut self) {
        for state in &mut self.states {
            state.on_tracking_lost(self.config.loss_policy);
        }
    }

    /// Zero all smoothed state.
    pub fn reset(&mut self) {
        self.states.iter_mut().for_each(SmoothedTransform::reset);
    }
}
