//! Core engine implementation

use log::{debug, info};
use thiserror::Error;

use crate::application::{AppError, Application};
use crate::config::ConfigError;
use crate::core::config::ApplicationConfig;
use crate::ecs::system::{FrameContext, SystemError};
use crate::foundation::time::FrameClock;
use crate::platform::{HostWindow, InputManager, InputState};
use crate::render::backend::{ProgramHandle, Renderer, ShaderSources, TextureHandle};
use crate::render::resources::{
    MaterialData, MaterialDescriptor, MaterialHandle, MeshData, ResourceLibraries, TextureData, TextureDescriptor,
};
use crate::render::RenderError;
use crate::scene::{SceneError, SceneManager};

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Renderer or resource failure
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Scene configuration failure
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Fatal error raised by a system
    #[error("System error: {0}")]
    System(#[from] SystemError),

    /// Application callback failed
    #[error("Application error: {0}")]
    Application(String),
}

/// Main engine struct
///
/// Owns the renderer, the resource libraries and the scenes, and drives
/// frames. Nothing is global: every frame hands the systems a
/// [`FrameContext`] borrowing from the engine.
pub struct Engine {
    renderer: Box<dyn Renderer>,
    libraries: ResourceLibraries,
    scenes: SceneManager,
    config: ApplicationConfig,
    clock: FrameClock,
    input: InputManager,
    surface_size: (u32, u32),
    running: bool,
}

impl Engine {
    /// Validate the configuration and initialize the renderer
    pub fn new(config: ApplicationConfig, mut renderer: Box<dyn Renderer>) -> Result<Self, EngineError> {
        config.validate()?;
        info!("Initializing engine on '{}' backend...", renderer.name());

        let surface_size = (config.window.width, config.window.height);
        renderer.resize(surface_size.0, surface_size.1);
        renderer.initialize()?;
        renderer.set_fill_mode(config.render.fill_mode);

        Ok(Self {
            renderer,
            libraries: ResourceLibraries::new(),
            scenes: SceneManager::new(),
            config,
            clock: FrameClock::new(),
            input: InputManager::new(),
            surface_size,
            running: true,
        })
    }

    /// Active backend
    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    /// Active backend, mutably
    pub fn renderer_mut(&mut self) -> &mut dyn Renderer {
        self.renderer.as_mut()
    }

    /// Active backend as its concrete type
    pub fn renderer_as<T: Renderer + 'static>(&self) -> Option<&T> {
        let renderer: &dyn Renderer = self.renderer.as_ref();
        renderer.as_any().downcast_ref::<T>()
    }

    /// Resource libraries
    pub fn libraries(&self) -> &ResourceLibraries {
        &self.libraries
    }

    /// Resource libraries, mutably
    pub fn libraries_mut(&mut self) -> &mut ResourceLibraries {
        &mut self.libraries
    }

    /// Scenes
    pub fn scenes(&self) -> &SceneManager {
        &self.scenes
    }

    /// Scenes, mutably
    pub fn scenes_mut(&mut self) -> &mut SceneManager {
        &mut self.scenes
    }

    /// Configuration
    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    /// Configuration, mutably; render settings apply from the next frame
    pub fn config_mut(&mut self) -> &mut ApplicationConfig {
        &mut self.config
    }

    /// Frame timing
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Input used by [`Engine::frame`]
    pub fn input_mut(&mut self) -> &mut InputManager {
        &mut self.input
    }

    /// Ask the frame loop to stop after the current frame
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Whether the frame loop keeps going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Compile a graphics or compute program
    pub fn build_shader(&mut self, name: &str, sources: ShaderSources) -> Result<ProgramHandle, EngineError> {
        Ok(self.libraries.shaders.build(name, sources, self.renderer.as_mut())?)
    }

    /// Build a material on an already built shader
    pub fn build_material(
        &mut self,
        name: &str,
        data: MaterialData,
        descriptor: Option<MaterialDescriptor>,
    ) -> Result<MaterialHandle, EngineError> {
        let libraries = &mut self.libraries;
        Ok(libraries.materials.build(name, data, descriptor, &libraries.shaders)?)
    }

    /// Create a texture
    pub fn build_texture(
        &mut self,
        name: &str,
        data: TextureData,
        descriptor: Option<TextureDescriptor>,
    ) -> Result<TextureHandle, EngineError> {
        Ok(self.libraries.textures.build(name, data, descriptor, self.renderer.as_mut())?)
    }

    /// Register mesh data for `StaticMesh::from_library`
    pub fn insert_mesh(&mut self, name: impl Into<String>, data: MeshData) {
        self.libraries.meshes.insert(name, data);
    }

    /// Load an OBJ file into the mesh library
    pub fn load_mesh(&mut self, name: &str, path: impl AsRef<std::path::Path>) -> Result<(), EngineError> {
        self.libraries.meshes.build(name, path)?;
        Ok(())
    }

    /// Run one frame with the engine's own input state
    pub fn frame(&mut self, delta_time: f32) -> Result<(), EngineError> {
        let input = std::mem::take(&mut self.input);
        let result = self.frame_with_input(delta_time, &input);
        self.input = input;
        result
    }

    /// Run one frame of the active scene
    ///
    /// Fatal system errors abort the frame and are returned; recoverable
    /// ones were already logged by the scheduler.
    pub fn frame_with_input(&mut self, delta_time: f32, input: &dyn InputState) -> Result<(), EngineError> {
        self.clock.advance(delta_time);
        self.renderer.begin_frame(self.config.render.clear_color)?;

        let mut ctx = FrameContext {
            renderer: self.renderer.as_mut(),
            libraries: &mut self.libraries,
            input,
            config: &self.config.render,
            clock: &self.clock,
            surface_size: self.surface_size,
        };
        let result = self.scenes.update(&mut ctx);

        // close the frame even when a system failed fatally
        self.renderer.end_frame()?;
        result?;
        Ok(())
    }

    /// Drive frames until the window closes, the engine is stopped, or the
    /// configured frame budget runs out; returns the number of frames run
    pub fn run(&mut self, window: &mut dyn HostWindow) -> Result<u64, EngineError> {
        self.run_with(window, |_, _| Ok(()))
    }

    fn run_with<F>(&mut self, window: &mut dyn HostWindow, mut before_frame: F) -> Result<u64, EngineError>
    where
        F: FnMut(&mut Self, f32) -> Result<(), EngineError>,
    {
        info!("Starting main loop...");
        let mut frames = 0;
        while self.running && !window.should_close() {
            if self.config.engine.max_frames.is_some_and(|max| frames >= max) {
                break;
            }
            window.poll_events();
            let size = window.size();
            if size != self.surface_size && size.0 > 0 && size.1 > 0 {
                info!("Surface resized to {}x{}", size.0, size.1);
                self.surface_size = size;
                self.renderer.resize(size.0, size.1);
            }

            let delta_time = window.delta_time();
            before_frame(&mut *self, delta_time)?;
            self.frame_with_input(delta_time, window.input())?;
            window.swap_buffers();
            frames += 1;
        }
        info!("Main loop finished after {frames} frames");
        Ok(frames)
    }

    /// Initialize an application, run it until the window closes, then shut down
    pub fn run_application(&mut self, app: &mut dyn Application, window: &mut dyn HostWindow) -> Result<u64, AppError> {
        app.initialize(self)?;
        let result = self.run_with(window, |engine, delta_time| {
            app.update(engine, delta_time)
                .map_err(|e| EngineError::Application(e.to_string()))
        });
        app.cleanup(self);
        self.shutdown();
        Ok(result?)
    }

    /// Release every GPU resource owned by the scenes and the libraries
    pub fn shutdown(&mut self) {
        let batches = self.scenes.release_batches(self.renderer.as_mut());
        self.libraries.clear(self.renderer.as_mut());
        debug!("Released {batches} mesh batches");
        self.running = false;
        info!("Engine shutdown complete");
    }
}
