//! Material component

use crate::ecs::Component;
use crate::render::resources::MaterialHandle;

/// Logical material reference
///
/// `instance` is resolved lazily through the material library the first
/// time the entity is built for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    /// Material library key
    pub name: String,
    /// Resolved library instance
    pub instance: Option<MaterialHandle>,
}

impl Component for Material {}

impl Material {
    /// Unresolved reference to a library material
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), instance: None }
    }
}
