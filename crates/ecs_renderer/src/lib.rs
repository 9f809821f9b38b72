//! # ECS Renderer
//!
//! An entity-component-system scene graph with a multi-pass rendering
//! orchestrator on top of a pluggable graphics backend.
//!
//! ## Features
//!
//! - **ECS Architecture**: typed component storage, filtered systems, pausable lifecycles
//! - **Scene Graph**: parent/child links with world matrices resolved every frame
//! - **Resource Libraries**: cached shaders, materials, textures and meshes
//! - **Render Passes**: shadow, reflection, refraction, compute and color passes
//! - **Headless Backend**: a command-recording renderer for tests and CI
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ecs_renderer::prelude::*;
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         let mut scene = Scene::new("main");
//!         scene.register_system(TransformSystem::new())?;
//!         engine.scenes_mut().add_scene(scene);
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApplicationConfig::default();
//!     let mut engine = Engine::new(config, Box::new(HeadlessRenderer::new()))?;
//!     let mut window = HeadlessWindow::new((1280, 720), 1.0 / 60.0, 120);
//!     engine.run_application(&mut MyApp, &mut window)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;
pub mod config;

pub mod foundation;
pub mod ecs;
pub mod scene;
pub mod assets;
pub mod render;
pub mod platform;

mod application;
mod engine;

pub use application::{Application, AppError};
pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        Application, AppError,
        Engine, EngineError,
        core::config::{ApplicationConfig, EngineConfig, RenderConfig, WindowConfig},
        config::{Config, ConfigFormat},
        foundation::{
            math::{Mat4, Quat, Vec2, Vec3, Vec4},
            time::{FrameClock, Stopwatch},
        },
        ecs::{Entity, Filter, FrameContext, System, SystemError, SystemResult, World},
        ecs::components::{
            Camera, CameraController, ClipPlane, Compute, Info, Light, Link, Material, StaticMesh, Terrain,
            Transform,
        },
        ecs::systems::{
            CameraControllerSystem, CameraSystem, StaticMeshRenderingSystem, TerrainGenerationSystem,
            TransformSystem,
        },
        scene::{Scene, SceneError, SceneManager},
        render::{FillMode, RenderError, Renderer, ShaderSources},
        render::backends::HeadlessRenderer,
        render::resources::{MaterialData, MaterialDescriptor, MeshData, TextureData, TextureDescriptor},
        platform::{HeadlessWindow, HostWindow, InputManager, InputState, KeyCode, MouseButton},
    };
}
