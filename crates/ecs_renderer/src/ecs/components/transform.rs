//! Transform component for the ECS system
//!
//! Pure data plus cached matrices. The hierarchy resolver in
//! `ecs::systems::transform` is the only writer of the cached matrices.

use crate::ecs::Component;
use crate::foundation::math::{quat_from_euler_degrees, translation_of, trs_matrix, Mat4, Quat, Vec3};

/// ECS Transform component
///
/// Rotation is stored as Euler angles in degrees (XYZ order) and converted
/// to a quaternion whenever the local matrix is recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position relative to the parent
    pub translation: Vec3,
    /// Euler angles in degrees, XYZ order
    pub rotation: Vec3,
    /// Per-axis scale
    pub scale: Vec3,
    /// Cached `T * R * S`
    pub local_matrix: Mat4,
    /// Cached `parent.world_matrix * local_matrix`
    pub world_matrix: Mat4,
    /// Quaternion derived from `rotation` at the last recomputation
    pub quaternion: Quat,
    /// Forces recomputation of the local matrix on the next resolution
    pub dirty: bool,
    /// Recompute the local matrix only while `dirty`
    pub static_: bool,
}

impl Component for Transform {}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0))
    }
}

impl Transform {
    /// Create a dirty, non-static transform
    pub fn new(translation: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
            local_matrix: Mat4::identity(),
            world_matrix: Mat4::identity(),
            quaternion: Quat::identity(),
            dirty: true,
            static_: false,
        }
    }

    /// Create from translation only
    pub fn from_translation(translation: Vec3) -> Self {
        Self::new(translation, Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0))
    }

    /// Builder pattern: set rotation in degrees
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self.dirty = true;
        self
    }

    /// Builder pattern: set scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self.dirty = true;
        self
    }

    /// Builder pattern: mark as static
    pub fn with_static(mut self, static_: bool) -> Self {
        self.static_ = static_;
        self
    }

    /// Change the translation and flag for recomputation
    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
        self.dirty = true;
    }

    /// Change the rotation and flag for recomputation
    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.dirty = true;
    }

    /// Change the scale and flag for recomputation
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.dirty = true;
    }

    /// Recompute the local matrix if needed, then the world matrix
    ///
    /// `parent_world` is `None` for roots and for entities whose parent has
    /// no transform.
    pub fn resolve(&mut self, parent_world: Option<&Mat4>) {
        if self.dirty || !self.static_ {
            self.quaternion = quat_from_euler_degrees(&self.rotation);
            self.local_matrix = trs_matrix(&self.translation, &self.quaternion, &self.scale);
            self.dirty = false;
        }
        self.world_matrix = match parent_world {
            Some(parent) => parent * self.local_matrix,
            None => self.local_matrix,
        };
    }

    /// Translation column of the world matrix
    pub fn world_position(&self) -> Vec3 {
        translation_of(&self.world_matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_transform_starts_dirty() {
        let transform = Transform::default();
        assert!(transform.dirty);
        assert!(!transform.static_);
        assert_eq!(transform.world_matrix, Mat4::identity());
    }

    #[test]
    fn test_resolve_root_uses_local_matrix() {
        let mut transform = Transform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.0, 90.0, 0.0),
            Vec3::new(2.0, 2.0, 2.0),
        );
        transform.resolve(None);

        assert!(!transform.dirty);
        assert_relative_eq!(transform.world_matrix, transform.local_matrix);
        assert_relative_eq!(transform.world_position(), Vec3::new(1.0, 2.0, 3.0));
        // 90 degrees about Y maps +X to -Z, then scale 2
        let x = transform.local_matrix.transform_vector(&Vec3::x());
        assert_relative_eq!(x, Vec3::new(0.0, 0.0, -2.0), epsilon = 1e-5);
    }

    #[test]
    fn test_static_transform_ignores_edits_until_dirty() {
        let mut transform = Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)).with_static(true);
        transform.resolve(None);

        transform.translation = Vec3::new(5.0, 0.0, 0.0);
        transform.resolve(None);
        assert_relative_eq!(transform.world_position(), Vec3::new(1.0, 0.0, 0.0));

        transform.dirty = true;
        transform.resolve(None);
        assert_relative_eq!(transform.world_position(), Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_resolve_with_parent_composes() {
        let mut parent = Transform::from_translation(Vec3::new(0.0, 10.0, 0.0));
        parent.resolve(None);
        let mut child = Transform::from_translation(Vec3::new(1.0, 0.0, 0.0));
        child.resolve(Some(&parent.world_matrix));

        assert_relative_eq!(child.world_matrix, parent.world_matrix * child.local_matrix);
        assert_relative_eq!(child.world_position(), Vec3::new(1.0, 10.0, 0.0));
    }
}
