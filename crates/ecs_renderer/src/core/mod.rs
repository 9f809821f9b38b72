//! # Core Engine Module
//!
//! Shared configuration for every engine subsystem.

pub mod config;

pub use config::{
    ApplicationConfig,
    Config,
    ConfigError,
    ConfigFormat,
    EngineConfig,
    RenderConfig,
    WindowConfig,
};
