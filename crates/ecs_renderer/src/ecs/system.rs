//! System trait, lifecycle states and the per-frame context handed to systems

use std::any::Any;
use std::fmt;

use thiserror::Error;

use super::component::Filter;
use super::entity::Entity;
use super::world::World;
use crate::core::config::RenderConfig;
use crate::foundation::time::FrameClock;
use crate::platform::InputState;
use crate::render::backend::Renderer;
use crate::render::resources::ResourceLibraries;
use crate::render::RenderError;
use crate::scene::SceneError;

/// Lifecycle state of a registered system
///
/// `Created -> Play <-> Pause -> Destroyed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemState {
    /// Registered, `on_create_system` not yet run
    Created,
    /// Receiving hooks every frame
    Play,
    /// Membership still tracked, hooks suspended
    Pause,
    /// Terminal
    Destroyed,
}

impl fmt::Display for SystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// Errors raised from system hooks
#[derive(Error, Debug)]
pub enum SystemError {
    /// Scene configuration error
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// Rendering error
    #[error(transparent)]
    Render(#[from] RenderError),

    /// A required component disappeared between membership check and access
    #[error("{entity} is missing {component}")]
    MissingComponent {
        /// Entity being processed
        entity: Entity,
        /// Component type name
        component: &'static str,
    },

    /// Any other recoverable failure
    #[error("{0}")]
    Failed(String),
}

impl SystemError {
    /// Fatal errors stop the frame; the rest are logged and the offending
    /// entity or system contribution is skipped.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Scene(error) => error.is_fatal(),
            Self::Render(error) => error.is_fatal(),
            Self::MissingComponent { .. } | Self::Failed(_) => false,
        }
    }
}

/// Result type for system hooks
pub type SystemResult<T> = Result<T, SystemError>;

/// Everything a system may touch besides the world
///
/// Built once per frame by the engine and passed down explicitly; there are
/// no global renderer or library singletons.
pub struct FrameContext<'a> {
    /// Active backend
    pub renderer: &'a mut dyn Renderer,
    /// Shader, material, texture and mesh libraries
    pub libraries: &'a mut ResourceLibraries,
    /// Host input snapshot for this frame
    pub input: &'a dyn InputState,
    /// Render pass settings
    pub config: &'a RenderConfig,
    /// Frame timing
    pub clock: &'a FrameClock,
    /// Size of the main framebuffer
    pub surface_size: (u32, u32),
}

impl FrameContext<'_> {
    /// Seconds since the previous frame
    pub fn delta_time(&self) -> f32 {
        self.clock.delta_time()
    }

    /// Seconds since start
    pub fn elapsed(&self) -> f32 {
        self.clock.total_time()
    }
}

/// Downcasting support for boxed systems
pub trait AsAny {
    /// Upcast to `Any`
    fn as_any(&self) -> &dyn Any;
    /// Mutable upcast to `Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Per-frame logic over the entities matching a fixed component filter
///
/// Every hook has an empty default so systems only implement what they use.
pub trait System: AsAny {
    /// Unique name, used by pause/resume and diagnostics
    fn name(&self) -> &str;

    /// Components an entity must hold to be processed; captured once at registration
    fn filter(&self) -> Filter;

    /// Runs once before the first update
    fn on_create_system(&mut self, _world: &mut World, _ctx: &mut FrameContext<'_>) -> SystemResult<()> {
        Ok(())
    }

    /// Runs once per entity, the first frame it matches the filter
    fn on_create_entity(&mut self, _entity: Entity, _world: &mut World, _ctx: &mut FrameContext<'_>) -> SystemResult<()> {
        Ok(())
    }

    /// Runs once per frame with the entities matched at the start of this pass
    fn on_update_system(&mut self, _entities: &[Entity], _world: &mut World, _ctx: &mut FrameContext<'_>) -> SystemResult<()> {
        Ok(())
    }

    /// Runs once per frame for every matching entity, ascending
    fn on_update_entity(&mut self, _entity: Entity, _world: &mut World, _ctx: &mut FrameContext<'_>) -> SystemResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::resources::ResourceKind;

    #[test]
    fn test_fatality_follows_error_kind() {
        let light_limit = SystemError::from(RenderError::LightLimitExceeded { count: 17, max: 16 });
        assert!(light_limit.is_fatal());

        let unknown = SystemError::from(RenderError::UnknownResource {
            kind: ResourceKind::Material,
            name: "M_Missing".to_string(),
        });
        assert!(!unknown.is_fatal());
        assert!(!SystemError::Failed("skip".to_string()).is_fatal());
    }
}
