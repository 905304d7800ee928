use glam::{Mat4, Vec3, Vec4};

/// Perspective camera the overlay is placed and rendered through.
///
/// Normalized device coordinates follow glam's right-handed convention:
/// x and y in `[-1, 1]`, depth in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraModel {
    /// Camera position in world space.
    pub position: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl CameraModel {
    /// Creates a camera at the given position looking at the target.
    pub fn new(position: Vec3, target: Vec3, fov_y: f32, aspect: f32) -> Self {
        Self {
            position,
            target,
            fov_y,
            aspect,
            near: 0.1,
            far: 1000.0,
        }
    }

    /// Camera at the origin facing -Z with a 75° vertical field of view.
    pub fn facing_forward(width: u32, height: u32) -> Self {
        Self::new(
            Vec3::ZERO,
            Vec3::NEG_Z,
            75f32.to_radians(),
            aspect_ratio(width, height),
        )
    }

    /// Set the clip planes.
    pub fn with_clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Update the aspect ratio for a new viewport size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    /// Unit vector the camera looks along.
    pub fn forward(&self) -> Vec3 {
        let forward = (self.target - self.position).normalize_or_zero();
        if forward == Vec3::ZERO {
            Vec3::NEG_Z
        } else {
            forward
        }
    }

    /// Get the view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        let forward = self.forward();
        let up = if forward.cross(Vec3::Y).length_squared() < 1e-8 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        Mat4::look_to_rh(self.position, forward, up)
    }

    /// Get the projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Map a normalized-device-space point back into world space.
    pub fn unproject(&self, ndc: Vec3) -> Vec3 {
        let world = self.view_projection().inverse() * Vec4::new(ndc.x, ndc.y, ndc.z, 1.0);
        world.truncate() / world.w
    }

    /// Map a world-space point into normalized device space.
    pub fn project(&self, world: Vec3) -> Vec3 {
        self.view_projection().project_point3(world)
    }
}

impl Default for CameraModel {
    fn default() -> Self {
        Self::facing_forward(16, 9)
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_ray_points_down_negative_z() {
        let camera = CameraModel::facing_forward(1280, 720);
        let p = camera.unproject(Vec3::new(0.0, 0.0, 0.5));
        let dir = (p - camera.position).normalize();
        assert!(dir.x.abs() < 1e-5 && dir.y.abs() < 1e-5);
        assert!(dir.z < -0.999);
    }

    #[test]
    fn test_project_inverts_unproject() {
        let camera = CameraModel::new(Vec3::new(1.0, 2.0, 5.0), Vec3::ZERO, 1.0, 1.5);
        let ndc = Vec3::new(0.3, -0.6, 0.5);
        let back = camera.project(camera.unproject(ndc));
        assert!((back - ndc).abs().max_element() < 1e-3);
    }

    #[test]
    fn test_right_edge_is_positive_x() {
        let camera = CameraModel::facing_forward(640, 480);
        let p = camera.unproject(Vec3::new(1.0, 1.0, 0.5));
        assert!(p.x > 0.0 && p.y > 0.0 && p.z < 0.0);
    }

    #[test]
    fn test_resize_updates_aspect() {
        let mut camera = CameraModel::default();
        camera.resize(1280, 720);
        assert!((camera.aspect - 16.0 / 9.0).abs() < 1e-6);
        camera.resize(0, 0);
        assert_eq!(camera.aspect, 1.0);
    }

    #[test]
    fn test_looking_straight_down_has_valid_view() {
        let camera = CameraModel::new(Vec3::Y * 3.0, Vec3::ZERO, 1.0, 1.0);
        assert!(camera.view_matrix().is_finite());
    }
}
