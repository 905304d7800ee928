//! Exponential smoothing of overlay transforms
//!
//! Position: per-axis EMA
//! Rotation: per-axis EMA on Euler angles

use glam::Vec3;

/// What happens to smoothed state when tracking is lost for a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LossPolicy {
    /// Keep the last smoothed transform so the overlay does not snap on reacquire.
    #[default]
    Persist,
    /// Zero the smoothed transform.
    Reset,
}

/// Exponentially smoothed position and Euler rotation of one overlay.
///
/// Starts zeroed; each [`blend`](Self::blend) moves a fraction `alpha` of
/// the remaining distance toward the target.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SmoothedTransform {
    pub position: Vec3,
    /// Euler angles (x = pitch, y = yaw, z = roll) in radians.
    pub rotation: Vec3,
}

impl SmoothedTransform {
    pub fn new(position: Vec3, rotation: Vec3) -> Self {
        Self { position, rotation }
    }

    /// `smoothed += (target - smoothed) * alpha`, independently per axis.
    pub fn blend(&mut self, target: &SmoothedTransform, alpha: f32) {
        self.position = blend_vec(self.position, target.position, alpha);
        self.rotation = blend_vec(self.rotation, target.rotation, alpha);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply a loss policy for a frame without tracking.
    pub fn on_tracking_lost(&mut self, policy: LossPolicy) {
        if policy == LossPolicy::Reset {
            self.reset();
        }
    }

    /// Largest per-axis distance to `target`, across position and rotation.
    pub fn max_error(&self, target: &SmoothedTransform) -> f32 {
        (self.position - target.position)
            .abs()
            .max_element()
            .max((self.rotation - target.rotation).abs().max_element())
    }

    pub fn converged(&self, target: &SmoothedTransform, eps: f32) -> bool {
        self.max_error(target) <= eps
    }
}

fn blend_vec(current: Vec3, target: Vec3, alpha: f32) -> Vec3 {
    current + (target - current) * alpha
}
