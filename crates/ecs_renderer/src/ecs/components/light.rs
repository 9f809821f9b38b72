//! Light component

use crate::ecs::Component;
use crate::foundation::math::Vec3;

/// Point light; its position comes from the entity's world transform
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Linear RGB color
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
}

impl Component for Light {}

impl Default for Light {
    fn default() -> Self {
        Self::new(Vec3::new(1.0, 1.0, 1.0), 1.0)
    }
}

impl Light {
    /// Create a light
    pub fn new(color: Vec3, intensity: f32) -> Self {
        Self { color, intensity }
    }
}
