//! Parent/child links between entities

use crate::ecs::{Component, Entity};

/// Hierarchy link
///
/// The parent and child list are only mutated through `World::set_parent`,
/// which keeps both sides of the relationship consistent and rejects cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Link {
    parent: Option<Entity>,
    children: Vec<Entity>,
}

impl Component for Link {}

impl Link {
    /// A root link with no children
    pub fn new() -> Self {
        Self::default()
    }

    /// Current parent
    pub fn parent(&self) -> Option<Entity> {
        self.parent
    }

    /// Children in attach order
    pub fn children(&self) -> &[Entity] {
        &self.children
    }

    /// Whether the entity is a hierarchy root
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub(crate) fn set_parent_unchecked(&mut self, parent: Option<Entity>) {
        self.parent = parent;
    }

    pub(crate) fn push_child(&mut self, child: Entity) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn remove_child(&mut self, child: Entity) {
        self.children.retain(|existing| *existing != child);
    }
}
