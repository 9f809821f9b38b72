//! Water scene demo
//!
//! Builds a small scene (terrain, a water plane, orbiting cubes, two lights
//! and a controllable camera) and drives it through every render pass on
//! the headless backend. Pass a `.toml` or `.ron` path to override the
//! configuration.

mod shaders;

use ecs_renderer::foundation::logging;
use ecs_renderer::prelude::*;
use ecs_renderer::render::backend::{ImageAccess, ImageFormat};
use ecs_renderer::render::resources::TextureFormat;
use ecs_renderer::render::UniformValue;
use log::info;
use thiserror::Error;

const NOISE_SIZE: u32 = 64;

#[derive(Error, Debug)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] ecs_renderer::config::ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    App(#[from] AppError),
}

/// Demo state between frames
#[derive(Default)]
struct WaterScene {
    spinner: Option<Entity>,
    frames: u64,
}

impl WaterScene {
    fn build_resources(engine: &mut Engine) -> Result<(), EngineError> {
        engine.build_shader("S_Lit", ShaderSources::graphics(shaders::LIT_VERTEX, shaders::LIT_FRAGMENT))?;
        engine.build_shader("S_Water", ShaderSources::graphics(shaders::LIT_VERTEX, shaders::WATER_FRAGMENT))?;
        engine.build_shader("S_Depth", ShaderSources::graphics(shaders::DEPTH_VERTEX, shaders::DEPTH_FRAGMENT))?;
        engine.build_shader("C_Noise", ShaderSources::compute(shaders::NOISE_COMPUTE))?;

        engine.build_texture("checker", checker(8), None)?;
        let noise = TextureDescriptor {
            format: TextureFormat::Rgba32F,
            ..TextureDescriptor::default()
        };
        engine.build_texture("noise", TextureData::empty(NOISE_SIZE, NOISE_SIZE), Some(noise))?;

        let depth_material = engine.config().render.depth_material.clone();
        engine.build_material(&depth_material, MaterialData::new("S_Depth"), None)?;
        engine.build_material(
            "M_Ground",
            MaterialData::new("S_Lit").with_texture("checker").with_glossiness(8.0),
            None,
        )?;
        engine.build_material(
            "M_Crate",
            MaterialData::new("S_Lit")
                .with_texture("noise")
                .with_color(Vec4::new(0.9, 0.6, 0.3, 1.0)),
            None,
        )?;
        engine.build_material(
            "M_Water",
            MaterialData::new("S_Water")
                .with_color(Vec4::new(0.3, 0.5, 0.8, 0.8))
                .with_parameter("u_WaveStrength", UniformValue::Float(0.02)),
            Some(MaterialDescriptor {
                cast_shadows: false,
                skip_auxiliary_passes: true,
            }),
        )?;

        engine.insert_mesh("cube", MeshData::cube());
        engine.insert_mesh("quad", MeshData::quad());
        Ok(())
    }

    fn build_scene(&mut self) -> Result<Scene, SceneError> {
        let mut scene = Scene::new("water");
        scene.register_system(CameraControllerSystem::new())?;
        scene.register_system(TerrainGenerationSystem::new())?;
        scene.register_system(TransformSystem::new())?;
        scene.register_system(CameraSystem::new())?;
        scene.register_system(StaticMeshRenderingSystem::new())?;

        let camera = scene.enroll_tagged_entity("camera");
        scene.add_component(
            camera,
            Transform::from_translation(Vec3::new(0.0, 6.0, 14.0)).with_rotation(Vec3::new(-15.0, 0.0, 0.0)),
        )?;
        scene.add_component(camera, Camera::perspective(60.0, 16.0 / 9.0, 0.1, 500.0).with_primary(true))?;
        scene.add_component(camera, CameraController::new(10.0, 0.1))?;

        let terrain = scene.enroll_tagged_entity("terrain");
        let mut settings = Terrain::new(4.0, 2.0, 256, 32);
        settings.camera = Some(camera);
        scene.add_component(terrain, settings)?;
        scene.add_component(terrain, Transform::from_translation(Vec3::new(-64.0, 0.0, -64.0)))?;
        scene.add_component(terrain, StaticMesh::new("terrain", Vec::new(), None))?;
        scene.add_component(terrain, Material::new("M_Ground"))?;

        let water = scene.enroll_tagged_entity("water");
        scene.add_component(
            water,
            Transform::from_translation(Vec3::new(0.0, 2.0, 0.0))
                .with_rotation(Vec3::new(-90.0, 0.0, 0.0))
                .with_scale(Vec3::new(40.0, 40.0, 1.0)),
        )?;
        scene.add_component(water, StaticMesh::from_library("quad"))?;
        scene.add_component(water, Material::new("M_Water"))?;
        scene.add_component(water, ClipPlane::default())?;

        let spinner = scene.enroll_tagged_entity("spinner");
        scene.add_component(spinner, Transform::from_translation(Vec3::new(0.0, 4.0, 0.0)))?;
        scene.add_component(spinner, StaticMesh::from_library("cube"))?;
        scene.add_component(spinner, Material::new("M_Crate"))?;
        scene.attach_link(spinner, None)?;
        for (i, offset) in [Vec3::new(3.0, 0.0, 0.0), Vec3::new(-3.0, 1.0, 0.0)].into_iter().enumerate() {
            let moon = scene.enroll_tagged_entity(format!("moon_{i}"));
            scene.add_component(moon, Transform::from_translation(offset).with_scale(Vec3::new(0.5, 0.5, 0.5)))?;
            scene.add_component(moon, StaticMesh::from_library("cube"))?;
            scene.add_component(moon, Material::new("M_Crate"))?;
            scene.attach_link(moon, Some(spinner))?;
        }
        self.spinner = Some(spinner);

        for (position, color) in [
            (Vec3::new(10.0, 20.0, 10.0), Vec3::new(1.0, 0.95, 0.8)),
            (Vec3::new(-8.0, 6.0, -4.0), Vec3::new(0.3, 0.4, 1.0)),
        ] {
            let light = scene.enroll_tagged_entity("light");
            scene.add_component(light, Transform::from_translation(position))?;
            scene.add_component(light, Light::new(color, 1.0))?;
        }

        let noise = scene.enroll_tagged_entity("noise");
        scene.add_component(
            noise,
            Compute::new("C_Noise", [NOISE_SIZE / 8, NOISE_SIZE / 8, 1])
                .with_image(0, "noise", ImageAccess::WriteOnly, ImageFormat::Rgba32F)
                .with_uniform("u_Frequency", UniformValue::Float(0.3)),
        )?;

        Ok(scene)
    }
}

impl Application for WaterScene {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        info!("Building water scene...");
        Self::build_resources(engine)?;
        let scene = self.build_scene()?;
        engine.scenes_mut().add_scene(scene);
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError> {
        self.frames += 1;
        let (Some(spinner), Some(scene)) = (self.spinner, engine.scenes_mut().active_scene_mut()) else {
            return Ok(());
        };
        if let Some(transform) = scene.get_component_mut::<Transform>(spinner) {
            let mut rotation = transform.rotation;
            rotation.y = (rotation.y + 45.0 * delta_time) % 360.0;
            transform.set_rotation(rotation);
        }
        Ok(())
    }

    fn cleanup(&mut self, engine: &mut Engine) {
        if let Some(stats) = engine
            .scenes()
            .active_scene()
            .and_then(|scene| scene.get_system::<StaticMeshRenderingSystem>())
            .map(StaticMeshRenderingSystem::stats)
        {
            info!("Last frame: {stats:?}");
        }
        info!("Rendered {} frames", self.frames);
    }
}

/// Two-tone checkerboard, `cells` squares per side
fn checker(cells: u32) -> TextureData {
    let size = cells * 8;
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let shade = if (x / 8 + y / 8) % 2 == 0 { 200 } else { 90 };
            pixels.extend_from_slice(&[shade, shade, shade, 255]);
        }
    }
    TextureData::from_bytes(size, size, pixels)
}

fn load_config() -> Result<ApplicationConfig, DemoError> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => ApplicationConfig::load_from_file(path)?,
        None => ApplicationConfig::default(),
    };
    if config.engine.max_frames.is_none() {
        config.engine = config.engine.with_max_frames(240);
    }
    config.window.title = "Water Scene".to_string();
    config.render = config.render.with_shadows(true).with_auxiliary_passes(true);
    Ok(config)
}

fn main() -> Result<(), DemoError> {
    let config = load_config()?;
    logging::init_with_level(&config.engine.log_level);

    let size = (config.window.width, config.window.height);
    let mut engine = Engine::new(config, Box::new(HeadlessRenderer::with_size(size.0, size.1)))?;
    let mut window = HeadlessWindow::new(size, 1.0 / 60.0, u64::MAX);
    let frames = engine.run_application(&mut WaterScene::default(), &mut window)?;
    info!("Demo finished after {frames} frames");
    Ok(())
}
