//! Clip plane marker

use crate::ecs::Component;

/// Horizontal plane used by the reflection and refraction passes
///
/// The plane height is the entity's world-space Y plus `offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPlane {
    /// Added to the world height to avoid seams at the water line
    pub offset: f32,
}

impl Component for ClipPlane {}

impl Default for ClipPlane {
    fn default() -> Self {
        Self { offset: 0.05 }
    }
}
