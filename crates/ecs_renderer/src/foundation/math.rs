//! Math utilities and types
//!
//! Provides the `nalgebra` aliases used across the engine together with the
//! handful of matrix builders the scene and render layers need.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }
}

/// Build a rotation from Euler angles in degrees.
///
/// The angles are applied in XYZ order: the X rotation is applied first,
/// then Y, then Z (`q = qz * qy * qx`).
pub fn quat_from_euler_degrees(euler: &Vec3) -> Quat {
    let qx = Quat::from_axis_angle(&Vec3::x_axis(), utils::deg_to_rad(euler.x));
    let qy = Quat::from_axis_angle(&Vec3::y_axis(), utils::deg_to_rad(euler.y));
    let qz = Quat::from_axis_angle(&Vec3::z_axis(), utils::deg_to_rad(euler.z));
    qz * qy * qx
}

/// Translation * Rotation * Scale
pub fn trs_matrix(translation: &Vec3, rotation: &Quat, scale: &Vec3) -> Mat4 {
    Mat4::new_translation(translation)
        * rotation.to_homogeneous()
        * Mat4::new_nonuniform_scaling(scale)
}

/// Translation component of an affine matrix
pub fn translation_of(matrix: &Mat4) -> Vec3 {
    Vec3::new(matrix.m14, matrix.m24, matrix.m34)
}

/// Right-handed look-at view matrix
pub fn look_at(eye: &Vec3, target: &Vec3, up: &Vec3) -> Mat4 {
    Mat4::look_at_rh(&Point3::from(*eye), &Point3::from(*target), up)
}

/// Right-handed perspective projection, `fov_y` in degrees
pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::new_perspective(aspect, utils::deg_to_rad(fov_y_degrees), near, far)
}

/// Orthographic projection sized by a zoom level around the origin
pub fn orthographic(aspect: f32, zoom: f32, near: f32, far: f32) -> Mat4 {
    Mat4::new_orthographic(-aspect * zoom, aspect * zoom, -zoom, zoom, near, far)
}

/// Strip the translation from a view matrix (skybox style view-projection)
pub fn rotation_only(matrix: &Mat4) -> Mat4 {
    let rotation: Mat3 = matrix.fixed_view::<3, 3>(0, 0).into_owned();
    rotation.to_homogeneous()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_euler_degrees_single_axis() {
        let q = quat_from_euler_degrees(&Vec3::new(0.0, 90.0, 0.0));
        let rotated = q * Vec3::new(1.0, 0.0, 0.0);
        assert_relative_eq!(rotated, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_euler_xyz_order() {
        // X first, then Y
        let q = quat_from_euler_degrees(&Vec3::new(90.0, 90.0, 0.0));
        let expected = Quat::from_axis_angle(&Vec3::y_axis(), utils::deg_to_rad(90.0))
            * Quat::from_axis_angle(&Vec3::x_axis(), utils::deg_to_rad(90.0));
        assert_relative_eq!(q.into_inner(), expected.into_inner(), epsilon = 1e-5);
    }

    #[test]
    fn test_trs_matrix_applies_scale_before_translation() {
        let m = trs_matrix(&Vec3::new(1.0, 2.0, 3.0), &Quat::identity(), &Vec3::new(2.0, 2.0, 2.0));
        let p = m.transform_point(&Point3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(p, Point3::new(3.0, 4.0, 5.0), epsilon = 1e-6);
        assert_relative_eq!(translation_of(&m), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_rotation_only_drops_translation() {
        let view = look_at(&Vec3::new(0.0, 5.0, 5.0), &Vec3::zeros(), &Vec3::y());
        let stripped = rotation_only(&view);
        assert_relative_eq!(translation_of(&stripped), Vec3::zeros());
        assert_relative_eq!(stripped.m11, view.m11);
    }
}
