//! Fly-camera controller state

use crate::ecs::Component;
use crate::foundation::math::{Vec2, Vec3};

/// Free-fly controller state attached next to a `Camera`
#[derive(Debug, Clone, PartialEq)]
pub struct CameraController {
    /// Forward direction
    pub front: Vec3,
    /// Right direction
    pub right: Vec3,
    /// Camera-relative up direction
    pub up: Vec3,
    /// World up axis
    pub world_up: Vec3,
    /// Heading in degrees
    pub yaw: f32,
    /// Elevation in degrees, clamped to +-89
    pub pitch: f32,
    /// Units per second
    pub movement_speed: f32,
    /// Degrees per frame step of mouse motion
    pub mouse_sensitivity: f32,
    /// Cursor position seen on the previous frame
    pub previous_mouse: Option<Vec2>,
}

impl Component for CameraController {}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(3.5, 1.25)
    }
}

impl CameraController {
    /// Controller facing +Z
    pub fn new(movement_speed: f32, mouse_sensitivity: f32) -> Self {
        Self {
            front: Vec3::new(0.0, 0.0, 1.0),
            right: Vec3::new(1.0, 0.0, 0.0),
            up: Vec3::new(0.0, 1.0, 0.0),
            world_up: Vec3::new(0.0, 1.0, 0.0),
            yaw: -90.0,
            pitch: 0.0,
            movement_speed,
            mouse_sensitivity,
            previous_mouse: None,
        }
    }
}
