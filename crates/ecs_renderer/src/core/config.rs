//! # Unified Configuration System
//!
//! All configuration structures of the engine live here: window metadata
//! handed to the host collaborator, engine behavior, and the render pass
//! settings consumed by the static mesh rendering system.
//!
//! Every structure is serializable, so a complete [`ApplicationConfig`] can be
//! loaded from TOML or RON through the [`Config`] trait.

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError, ConfigFormat};
use crate::render::backend::FillMode;

/// Default resolution of the depth-only shadow framebuffer
pub const DEFAULT_SHADOW_RESOLUTION: (u32, u32) = (1024, 1024);

/// Default resolution of the reflection framebuffer
pub const DEFAULT_REFLECTION_RESOLUTION: (u32, u32) = (320, 180);

/// Default resolution of the refraction framebuffer
pub const DEFAULT_REFRACTION_RESOLUTION: (u32, u32) = (1280, 720);

/// # Window Configuration
///
/// Passed to the host window collaborator; the engine itself only reads the
/// size to restore the main viewport after offscreen passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Initial width in pixels
    pub width: u32,
    /// Initial height in pixels
    pub height: u32,
    /// Request vertical sync from the host
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "ECS Renderer".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

/// # Render Configuration
///
/// Pass-level settings of the render orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Run the depth-only shadow pre-pass
    pub shadows_enabled: bool,
    /// Shadow framebuffer size
    pub shadow_resolution: (u32, u32),
    /// Run the reflection and refraction passes
    pub auxiliary_passes_enabled: bool,
    /// Reflection framebuffer size
    pub reflection_resolution: (u32, u32),
    /// Refraction framebuffer size
    pub refraction_resolution: (u32, u32),
    /// Clip plane height used when no `ClipPlane` entity exists
    pub clip_plane_height: f32,
    /// Rasterizer fill mode
    pub fill_mode: FillMode,
    /// Clear color of the main framebuffer
    pub clear_color: [f32; 4],
    /// Name of the shared depth-only material used by the shadow pass
    pub depth_material: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            shadows_enabled: false,
            shadow_resolution: DEFAULT_SHADOW_RESOLUTION,
            auxiliary_passes_enabled: false,
            reflection_resolution: DEFAULT_REFLECTION_RESOLUTION,
            refraction_resolution: DEFAULT_REFRACTION_RESOLUTION,
            clip_plane_height: 2.05,
            fill_mode: FillMode::Fill,
            clear_color: [0.8, 0.5, 0.3, 1.0],
            depth_material: "M_DepthPrePass".to_string(),
        }
    }
}

impl RenderConfig {
    /// Enable or disable the shadow pre-pass
    pub fn with_shadows(mut self, enabled: bool) -> Self {
        self.shadows_enabled = enabled;
        self
    }

    /// Enable or disable the reflection/refraction passes
    pub fn with_auxiliary_passes(mut self, enabled: bool) -> Self {
        self.auxiliary_passes_enabled = enabled;
        self
    }

    /// Set the fill mode
    pub fn with_fill_mode(mut self, mode: FillMode) -> Self {
        self.fill_mode = mode;
        self
    }

    /// Validate resolutions
    pub fn validate(&self) -> Result<(), ConfigError> {
        let resolutions = [
            ("shadow_resolution", self.shadow_resolution),
            ("reflection_resolution", self.reflection_resolution),
            ("refraction_resolution", self.refraction_resolution),
        ];
        for (name, (width, height)) in resolutions {
            if width == 0 || height == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be non-zero, got {width}x{height}")));
            }
        }
        Ok(())
    }
}

/// # Engine Configuration
///
/// Core engine behavior: logging and debug features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Default log filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Whether to enable debug features
    pub debug_mode: bool,
    /// Stop the frame loop after this many frames (headless runs)
    pub max_frames: Option<u64>,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            debug_mode: cfg!(debug_assertions),
            max_frames: None,
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Limit the number of frames the loop runs
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Host window settings
    pub window: WindowConfig,
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Render pass configuration
    pub render: RenderConfig,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid("window size must be non-zero".to_string()));
        }
        self.render.validate()
    }
}

impl Config for ApplicationConfig {}
