//! # Rendering System
//!
//! Backend-agnostic rendering layer of the engine.
//!
//! ## Architecture
//!
//! - **Backend**: the [`Renderer`] trait and the handle types a backend hands out
//! - **Resources**: shader, material, texture and mesh libraries that own GPU state
//! - **Uniforms**: declared-uniform parsing and the values staged per draw
//! - **Lighting / Passes**: per-frame light aggregation and pass helpers used by
//!   the static mesh rendering system
//!
//! A headless reference backend lives in [`backends`].

pub mod backend;
pub mod backends;
pub mod lighting;
pub mod passes;
pub mod resources;
pub mod uniforms;

pub use backend::{
    BarrierFlags, BatchHandle, ClearFlags, FillMode, FramebufferDescriptor, FramebufferHandle, ImageAccess,
    ImageFormat, ProgramHandle, Renderer, RendererCapabilities, ShaderSources, ShaderStage, TextureHandle,
};
pub use lighting::{collect_lights, LightSample, LightSet, MAX_LIGHTS};
pub use resources::{ResourceKind, ResourceLibraries};
pub use uniforms::{UniformType, UniformValue};

use crate::assets::ObjError;

/// Rendering errors
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Renderer initialization failed during setup
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// A rendering operation failed during execution
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// Resource creation or management failed
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// Backend-specific error occurred
    #[error("Backend error: {0}")]
    BackendError(String),

    /// A library lookup by logical name found nothing
    #[error("Unknown {kind} '{name}'")]
    UnknownResource {
        /// Library searched
        kind: ResourceKind,
        /// Logical name
        name: String,
    },

    /// The backend rejected a shader stage
    #[error("Shader '{shader}' failed to compile ({stage:?}): {log}")]
    ShaderCompilation {
        /// Shader library key
        shader: String,
        /// Failing stage
        stage: ShaderStage,
        /// Backend diagnostic
        log: String,
    },

    /// More lights in the scene than the shaders support
    #[error("{count} lights in scene, at most {max} are supported")]
    LightLimitExceeded {
        /// Lights found
        count: usize,
        /// Supported maximum
        max: usize,
    },

    /// Mesh file could not be loaded
    #[error("Asset load failed: {0}")]
    AssetLoad(#[from] ObjError),
}

impl RenderError {
    /// Configuration and setup failures that must stop the frame loop
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InitializationFailed(_) | Self::ShaderCompilation { .. } | Self::LightLimitExceeded { .. }
        )
    }
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
