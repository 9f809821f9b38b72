//! Camera component

use crate::ecs::Component;
use crate::foundation::math::{orthographic, perspective, translation_of, Mat4, Vec3};

/// Projection model of a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraKind {
    /// Perspective projection driven by `fov`
    Perspective,
    /// Orthographic projection driven by `zoom_level`
    Orthographic,
}

/// Camera component
///
/// The matrices are written by the camera system from the entity's world
/// transform. At most one camera in a world is `primary`; attaching a new
/// primary camera demotes the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Projection model
    pub kind: CameraKind,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Half-height of the orthographic volume
    pub zoom_level: f32,
    /// Width over height
    pub aspect_ratio: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
    /// Follow the renderer's surface aspect ratio every frame
    pub auto_aspect: bool,
    /// Active render viewpoint
    pub primary: bool,
    /// Inverse of the camera's world matrix
    pub view: Mat4,
    /// Projection matrix
    pub projection: Mat4,
    /// `projection * view`
    pub view_projection: Mat4,
    /// World-space eye position
    pub position: Vec3,
}

impl Component for Camera {}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(45.0, 16.0 / 9.0, 0.1, 1000.0)
    }
}

impl Camera {
    /// Perspective camera, `fov` in degrees
    pub fn perspective(fov: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            kind: CameraKind::Perspective,
            fov,
            zoom_level: 10.0,
            aspect_ratio,
            near,
            far,
            auto_aspect: true,
            primary: false,
            view: Mat4::identity(),
            projection: Mat4::identity(),
            view_projection: Mat4::identity(),
            position: Vec3::zeros(),
        };
        camera.update_projection();
        camera
    }

    /// Orthographic camera
    pub fn orthographic(zoom_level: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            kind: CameraKind::Orthographic,
            zoom_level,
            ..Self::perspective(45.0, aspect_ratio, near, far)
        };
        camera.update_projection();
        camera
    }

    /// Builder pattern: mark as the primary camera
    pub fn with_primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    /// Recompute the projection from the current parameters
    pub fn update_projection(&mut self) {
        let aspect = if self.aspect_ratio > 0.0 { self.aspect_ratio } else { 1.0 };
        self.projection = match self.kind {
            CameraKind::Perspective => perspective(self.fov, aspect, self.near, self.far),
            CameraKind::Orthographic => orthographic(aspect, self.zoom_level, self.near, self.far),
        };
        self.view_projection = self.projection * self.view;
    }

    /// Derive view, projection and view-projection from a world matrix
    pub fn update_from_world(&mut self, world_matrix: &Mat4) {
        self.view = world_matrix.try_inverse().unwrap_or_else(Mat4::identity);
        self.position = translation_of(world_matrix);
        self.update_projection();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_view_is_inverse_of_world() {
        let mut camera = Camera::default();
        let world = Mat4::new_translation(&Vec3::new(0.0, 2.0, 10.0));
        camera.update_from_world(&world);

        assert_relative_eq!(camera.view * world, Mat4::identity(), epsilon = 1e-5);
        assert_relative_eq!(camera.position, Vec3::new(0.0, 2.0, 10.0));
        assert_relative_eq!(camera.view_projection, camera.projection * camera.view);
    }

    #[test]
    fn test_orthographic_keeps_zoom() {
        let camera = Camera::orthographic(5.0, 2.0, 0.1, 100.0);
        assert_eq!(camera.kind, CameraKind::Orthographic);
        // x extent = aspect * zoom = 10
        assert_relative_eq!(camera.projection.m11, 1.0 / 10.0, epsilon = 1e-6);
    }
}
