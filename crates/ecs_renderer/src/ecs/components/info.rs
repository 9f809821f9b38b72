//! Entity metadata

use crate::ecs::Component;

/// Human-readable tag and an enabled switch
///
/// Disabled entities keep their components but are not drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Info {
    /// Display tag
    pub tag: String,
    /// Whether the entity takes part in rendering
    pub enabled: bool,
}

impl Component for Info {}

impl Info {
    /// Enabled entity with a tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into(), enabled: true }
    }
}
