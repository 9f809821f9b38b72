//! Application trait and lifecycle management

use thiserror::Error;

use crate::engine::{Engine, EngineError};
use crate::scene::SceneError;

/// Application lifecycle trait
///
/// Implement this trait to build scenes and drive them through
/// [`Engine::run_application`].
pub trait Application {
    /// Initialize the application
    ///
    /// Called once after the renderer is initialized. Build shaders,
    /// materials and scenes here.
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Update the application
    ///
    /// Called every frame before the active scene's systems run.
    fn update(&mut self, _engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
        Ok(())
    }

    /// Cleanup the application
    ///
    /// Called once after the frame loop ends, before GPU resources are released.
    fn cleanup(&mut self, _engine: &mut Engine) {}
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Scene setup failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}
