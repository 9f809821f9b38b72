//! Scene management
//!
//! A [`Scene`] owns one ECS world plus the ordered systems that run over it;
//! the [`SceneManager`] holds every loaded scene and selects the active one.
//!
//! ```text
//! SceneManager -> active Scene -> Scheduler -> Systems -> World
//! ```

#[allow(clippy::module_inception)]
mod scene;
mod scene_manager;

pub use scene::Scene;
pub use scene_manager::SceneManager;

use thiserror::Error;

use crate::ecs::{Entity, SystemState};

/// Scene configuration and lookup errors
#[derive(Error, Debug)]
pub enum SceneError {
    /// The entity does not exist
    #[error("{0} does not exist")]
    EntityNotFound(Entity),

    /// An operation needs a component the entity lacks
    #[error("{entity} has no {component} component")]
    MissingComponent {
        /// Entity
        entity: Entity,
        /// Component type name
        component: &'static str,
    },

    /// Reparenting would make an entity its own ancestor
    #[error("parenting {child} under {parent} would create a cycle")]
    ParentCycle {
        /// Entity being reparented
        child: Entity,
        /// Rejected parent
        parent: Entity,
    },

    /// Links carry hierarchy invariants and must go through `set_parent`
    #[error("attach a Link to {0} with attach_link/set_parent")]
    LinkThroughAddComponent(Entity),

    /// A system filter names a component type nobody registered
    #[error("system '{system}' filters on unregistered component {component}")]
    UnregisteredComponent {
        /// System name
        system: String,
        /// Component type name
        component: &'static str,
    },

    /// Two systems share a name
    #[error("a system named '{0}' is already registered")]
    DuplicateSystem(String),

    /// No system with that name
    #[error("no system named '{0}'")]
    SystemNotFound(String),

    /// Illegal lifecycle change
    #[error("system '{system}' cannot go from {from} to {to}")]
    InvalidTransition {
        /// System name
        system: String,
        /// Current state
        from: SystemState,
        /// Requested state
        to: SystemState,
    },

    /// No scene with that index or name
    #[error("no scene '{0}'")]
    SceneNotFound(String),
}

impl SceneError {
    /// Configuration errors halt the frame or startup
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ParentCycle { .. } | Self::UnregisteredComponent { .. } | Self::LinkThroughAddComponent(_)
        )
    }
}

/// Result type for scene operations
pub type SceneResult<T> = Result<T, SceneError>;
