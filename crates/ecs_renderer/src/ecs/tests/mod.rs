//! Frame-level scenarios over the headless backend
//!
//! Each test builds a scene, runs whole frames through the scheduler and
//! inspects the recorded backend commands.

use approx::assert_relative_eq;

use crate::core::config::RenderConfig;
use crate::ecs::components::{Camera, Compute, Info, Light, Material, StaticMesh, Transform};
use crate::ecs::systems::{CameraSystem, StaticMeshRenderingSystem, TransformSystem};
use crate::ecs::{Entity, Filter, FrameContext, System, SystemError, SystemResult, SystemState, World};
use crate::foundation::math::{translation_of, Vec3};
use crate::foundation::time::FrameClock;
use crate::platform::InputManager;
use crate::render::backend::{BarrierFlags, ImageAccess, ImageFormat, Renderer, ShaderSources};
use crate::render::backends::{HeadlessRenderer, RenderCommand};
use crate::render::resources::{
    MaterialData, MaterialDescriptor, MeshData, ResourceLibraries, TextureData, TextureDescriptor, TextureFormat,
};
use crate::render::uniforms::UniformValue;
use crate::render::RenderError;
use crate::scene::{Scene, SceneError};

const SURFACE: (u32, u32) = (1280, 720);

const LIT_VERTEX: &str = "#version 450
uniform mat4 u_Model;
uniform mat4 u_ModelViewProjection;
uniform vec3 u_LightPositions[16];
uniform vec3 u_LightColors[16];
uniform float u_LightIntensities[16];
uniform int u_LightCount;
uniform float u_ClipPlane;
uniform int u_ClipMode;
void main() {}
";

const LIT_FRAGMENT: &str = "#version 450
uniform vec4 u_Color;
uniform float u_Glossiness;
void main() {}
";

const DEPTH_VERTEX: &str = "#version 450
uniform mat4 u_Model;
uniform mat4 u_LightSpaceMatrix;
void main() {}
";

struct Harness {
    renderer: HeadlessRenderer,
    libraries: ResourceLibraries,
    config: RenderConfig,
    clock: FrameClock,
    input: InputManager,
}

impl Harness {
    fn new(config: RenderConfig) -> Self {
        let mut renderer = HeadlessRenderer::with_size(SURFACE.0, SURFACE.1);
        renderer.initialize().unwrap();
        let mut harness = Self {
            renderer,
            libraries: ResourceLibraries::new(),
            config,
            clock: FrameClock::new(),
            input: InputManager::new(),
        };
        harness.build_lit_material("M_Lit");
        harness
    }

    fn build_lit_material(&mut self, name: &str) {
        self.libraries
            .shaders
            .build("S_Lit", ShaderSources::graphics(LIT_VERTEX, LIT_FRAGMENT), &mut self.renderer)
            .unwrap();
        self.libraries
            .materials
            .build(name, MaterialData::new("S_Lit"), None, &self.libraries.shaders)
            .unwrap();
    }

    fn frame(&mut self, scene: &mut Scene) -> SystemResult<()> {
        self.clock.advance(1.0 / 60.0);
        self.renderer.begin_frame([0.0, 0.0, 0.0, 1.0]).unwrap();
        let mut ctx = FrameContext {
            renderer: &mut self.renderer,
            libraries: &mut self.libraries,
            input: &self.input,
            config: &self.config,
            clock: &self.clock,
            surface_size: SURFACE,
        };
        let result = scene.update(&mut ctx);
        self.renderer.end_frame().unwrap();
        result
    }

    fn draws(&self) -> Vec<RenderCommand> {
        self.renderer.draws().cloned().collect()
    }
}

fn render_scene() -> Scene {
    let mut scene = Scene::new("test");
    scene.register_system(TransformSystem::new()).unwrap();
    scene.register_system(CameraSystem::new()).unwrap();
    scene.register_system(StaticMeshRenderingSystem::new()).unwrap();
    scene
}

fn spawn_cube(scene: &mut Scene, material: &str, position: Vec3) -> Entity {
    let data = MeshData::cube();
    let entity = scene.enroll_entity();
    scene.add_component(entity, Transform::from_translation(position)).unwrap();
    scene
        .add_component(entity, StaticMesh::new("cube", data.to_attributes(), data.index_buffer()))
        .unwrap();
    scene.add_component(entity, Material::new(material)).unwrap();
    entity
}

fn spawn_light(scene: &mut Scene, position: Vec3) -> Entity {
    let entity = scene.enroll_entity();
    scene.add_component(entity, Transform::from_translation(position)).unwrap();
    scene.add_component(entity, Light::new(Vec3::new(1.0, 1.0, 1.0), 1.0)).unwrap();
    entity
}

fn stats(scene: &Scene) -> crate::ecs::systems::RenderStats {
    scene.get_system::<StaticMeshRenderingSystem>().unwrap().stats()
}

fn uniforms_of(command: &RenderCommand) -> &std::collections::BTreeMap<String, UniformValue> {
    match command {
        RenderCommand::Draw { uniforms, .. } => uniforms,
        other => panic!("not a draw: {other:?}"),
    }
}

/// Records which entities its hooks saw
#[derive(Default)]
struct Recorder {
    created: Vec<Entity>,
    updated: Vec<Entity>,
}

impl System for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn filter(&self) -> Filter {
        Filter::of::<(Transform, Light)>()
    }

    fn on_create_entity(&mut self, entity: Entity, _world: &mut World, _ctx: &mut FrameContext<'_>) -> SystemResult<()> {
        self.created.push(entity);
        Ok(())
    }

    fn on_update_entity(&mut self, entity: Entity, _world: &mut World, _ctx: &mut FrameContext<'_>) -> SystemResult<()> {
        self.updated.push(entity);
        Ok(())
    }
}

#[test]
fn test_world_matrices_compose_down_the_hierarchy() {
    let mut harness = Harness::new(RenderConfig::default());
    let mut scene = render_scene();

    let root = scene.enroll_entity();
    scene
        .add_component(root, Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)))
        .unwrap();
    scene.attach_link(root, None).unwrap();
    let child = scene.enroll_entity();
    scene
        .add_component(child, Transform::from_translation(Vec3::new(0.0, 2.0, 0.0)).with_scale(Vec3::new(2.0, 2.0, 2.0)))
        .unwrap();
    scene.attach_link(child, Some(root)).unwrap();

    harness.frame(&mut scene).unwrap();

    let root_transform = scene.get_component::<Transform>(root).unwrap();
    assert_eq!(root_transform.world_matrix, root_transform.local_matrix);
    let child_world = scene.get_component::<Transform>(child).unwrap().world_matrix;
    assert_relative_eq!(translation_of(&child_world), Vec3::new(1.0, 2.0, 0.0), epsilon = 1e-5);
}

#[test]
fn test_reparenting_into_a_cycle_is_rejected() {
    let mut scene = Scene::new("links");
    let a = scene.enroll_entity();
    let b = scene.enroll_entity();
    scene.attach_link(a, None).unwrap();
    scene.attach_link(b, Some(a)).unwrap();

    let error = scene.set_parent(a, Some(b)).unwrap_err();
    assert!(matches!(error, SceneError::ParentCycle { .. }));
    assert!(error.is_fatal());
    assert!(matches!(scene.set_parent(a, Some(a)), Err(SceneError::ParentCycle { .. })));
}

#[test]
fn test_membership_follows_component_changes() {
    let mut harness = Harness::new(RenderConfig::default());
    let mut scene = Scene::new("membership");
    scene.register_system(Recorder::default()).unwrap();

    let entity = scene.enroll_entity();
    scene.add_component(entity, Transform::default()).unwrap();
    harness.frame(&mut scene).unwrap();
    assert!(scene.get_system::<Recorder>().unwrap().updated.is_empty());

    scene.add_component(entity, Light::default()).unwrap();
    harness.frame(&mut scene).unwrap();
    harness.frame(&mut scene).unwrap();
    let recorder = scene.get_system::<Recorder>().unwrap();
    assert_eq!(recorder.created, vec![entity]);
    assert_eq!(recorder.updated, vec![entity, entity]);

    scene.remove_component::<Light>(entity);
    harness.frame(&mut scene).unwrap();
    assert_eq!(scene.get_system::<Recorder>().unwrap().updated.len(), 2);

    // re-entering the membership does not fire the create hook again
    scene.add_component(entity, Light::default()).unwrap();
    harness.frame(&mut scene).unwrap();
    let recorder = scene.get_system::<Recorder>().unwrap();
    assert_eq!(recorder.created, vec![entity]);
    assert_eq!(recorder.updated.len(), 3);
}

#[test]
fn test_paused_system_is_enumerable_but_idle() {
    let mut harness = Harness::new(RenderConfig::default());
    let mut scene = Scene::new("pause");
    scene.register_system(Recorder::default()).unwrap();
    spawn_light(&mut scene, Vec3::zeros());

    harness.frame(&mut scene).unwrap();
    scene.pause_system("recorder").unwrap();
    harness.frame(&mut scene).unwrap();
    harness.frame(&mut scene).unwrap();

    assert_eq!(scene.get_system::<Recorder>().unwrap().updated.len(), 1);
    let systems = scene.get_systems();
    assert_eq!(systems.len(), 1);
    assert_eq!(systems[0].state, SystemState::Pause);
    assert_eq!(systems[0].entity_count, 1);

    scene.resume_system("recorder").unwrap();
    harness.frame(&mut scene).unwrap();
    assert_eq!(scene.get_system::<Recorder>().unwrap().updated.len(), 2);

    scene.destroy_system("recorder").unwrap();
    assert!(matches!(
        scene.resume_system("recorder"),
        Err(SceneError::InvalidTransition { .. })
    ));
}

#[test]
fn test_scene_without_lights_stages_only_the_count() {
    let mut harness = Harness::new(RenderConfig::default());
    let mut scene = render_scene();
    spawn_cube(&mut scene, "M_Lit", Vec3::zeros());

    harness.frame(&mut scene).unwrap();

    let draws = harness.draws();
    assert_eq!(draws.len(), 1);
    let uniforms = uniforms_of(&draws[0]);
    assert_eq!(uniforms.get("u_LightCount"), Some(&UniformValue::Int(0)));
    assert!(!uniforms.contains_key("u_LightPositions"));
    assert!(!uniforms.contains_key("u_LightIntensities"));
}

#[test]
fn test_lights_are_staged_at_world_positions() {
    let mut harness = Harness::new(RenderConfig::default());
    let mut scene = render_scene();
    spawn_cube(&mut scene, "M_Lit", Vec3::zeros());
    spawn_light(&mut scene, Vec3::new(0.0, 10.0, 0.0));
    spawn_light(&mut scene, Vec3::new(5.0, 1.0, 0.0));

    harness.frame(&mut scene).unwrap();

    let draws = harness.draws();
    let uniforms = uniforms_of(&draws[0]);
    assert_eq!(uniforms.get("u_LightCount"), Some(&UniformValue::Int(2)));
    let Some(UniformValue::Vec3Array(positions)) = uniforms.get("u_LightPositions") else {
        panic!("light positions not staged: {uniforms:?}");
    };
    assert_relative_eq!(positions[0], Vec3::new(0.0, 10.0, 0.0), epsilon = 1e-5);
    assert_relative_eq!(positions[1], Vec3::new(5.0, 1.0, 0.0), epsilon = 1e-5);
}

#[test]
fn test_seventeen_lights_abort_the_frame() {
    let mut harness = Harness::new(RenderConfig::default());
    let mut scene = render_scene();
    spawn_cube(&mut scene, "M_Lit", Vec3::zeros());
    for i in 0..17 {
        spawn_light(&mut scene, Vec3::new(i as f32, 1.0, 0.0));
    }

    let error = harness.frame(&mut scene).unwrap_err();
    assert!(error.is_fatal());
    assert!(matches!(
        error,
        SystemError::Render(RenderError::LightLimitExceeded { count: 17, max: 16 })
    ));
    assert_eq!(harness.renderer.draw_count(), 0);
}

#[test]
fn test_libraries_build_each_name_once() {
    let mut harness = Harness::new(RenderConfig::default());
    let sources = ShaderSources::graphics(LIT_VERTEX, LIT_FRAGMENT);
    let first = harness.libraries.shaders.build("S_Lit", sources.clone(), &mut harness.renderer).unwrap();
    let second = harness.libraries.shaders.build("S_Lit", sources, &mut harness.renderer).unwrap();
    assert_eq!(first, second);
    assert_eq!(harness.libraries.shaders.build_count(), 1);
    assert_eq!(harness.renderer.live_programs(), 1);

    let again = harness
        .libraries
        .materials
        .build("M_Lit", MaterialData::new("S_Lit"), None, &harness.libraries.shaders)
        .unwrap();
    assert_eq!(Some(again), harness.libraries.materials.handle("M_Lit"));
    assert_eq!(harness.libraries.materials.build_count(), 1);

    for _ in 0..3 {
        harness
            .libraries
            .textures
            .build("checker", TextureData::empty(4, 4), None, &mut harness.renderer)
            .unwrap();
    }
    assert_eq!(harness.libraries.textures.build_count(), 1);
    assert_eq!(harness.renderer.live_textures(), 1);
}

#[test]
fn test_changed_mesh_is_rebuilt_once() {
    let mut harness = Harness::new(RenderConfig::default());
    let mut scene = render_scene();
    let cube = spawn_cube(&mut scene, "M_Lit", Vec3::zeros());

    harness.frame(&mut scene).unwrap();
    assert_eq!(stats(&scene).rebuilds, 1);
    assert_eq!(harness.renderer.live_batches(), 1);

    harness.frame(&mut scene).unwrap();
    assert_eq!(stats(&scene).rebuilds, 0);

    scene.get_component_mut::<StaticMesh>(cube).unwrap().changed = true;
    harness.frame(&mut scene).unwrap();
    assert_eq!(stats(&scene).rebuilds, 1);
    assert_eq!(harness.renderer.live_batches(), 1);
    assert!(!scene.get_component::<StaticMesh>(cube).unwrap().changed);
}

#[test]
fn test_destroyed_entity_batch_is_released_next_frame() {
    let mut harness = Harness::new(RenderConfig::default());
    let mut scene = render_scene();
    let cube = spawn_cube(&mut scene, "M_Lit", Vec3::zeros());
    harness.frame(&mut scene).unwrap();
    let batch = scene.get_component::<StaticMesh>(cube).unwrap().batch.unwrap();

    scene.destroy_entity(cube).unwrap();
    assert_eq!(harness.renderer.live_batches(), 1);
    harness.renderer.take_commands();
    harness.frame(&mut scene).unwrap();

    assert_eq!(harness.renderer.live_batches(), 0);
    assert_eq!(stats(&scene).released_batches, 1);
    assert!(harness.renderer.commands().contains(&RenderCommand::ReleaseBatch(batch)));
    assert_eq!(harness.draws().len(), 0);
}

#[test]
fn test_replaced_mesh_batch_is_released_next_frame() {
    let mut harness = Harness::new(RenderConfig::default());
    let mut scene = render_scene();
    let cube = spawn_cube(&mut scene, "M_Lit", Vec3::zeros());
    harness.frame(&mut scene).unwrap();
    let old = scene.get_component::<StaticMesh>(cube).unwrap().batch.unwrap();

    let data = MeshData::quad();
    scene
        .add_component(cube, StaticMesh::new("quad", data.to_attributes(), data.index_buffer()))
        .unwrap();
    harness.renderer.take_commands();
    harness.frame(&mut scene).unwrap();

    assert_eq!(harness.renderer.live_batches(), 1);
    assert_eq!(stats(&scene).released_batches, 1);
    assert!(harness.renderer.commands().contains(&RenderCommand::ReleaseBatch(old)));
    assert_ne!(scene.get_component::<StaticMesh>(cube).unwrap().batch, Some(old));
    assert_eq!(harness.draws().len(), 1);
}

#[test]
fn test_removed_mesh_batch_is_released_while_entity_lives() {
    let mut harness = Harness::new(RenderConfig::default());
    let mut scene = render_scene();
    let cube = spawn_cube(&mut scene, "M_Lit", Vec3::zeros());
    harness.frame(&mut scene).unwrap();

    let removed = scene.remove_component::<StaticMesh>(cube).unwrap();
    assert_eq!(removed.batch, None);
    harness.frame(&mut scene).unwrap();

    assert!(scene.world().contains(cube));
    assert_eq!(harness.renderer.live_batches(), 0);
    assert_eq!(harness.draws().len(), 0);

    // the detached mesh comes back unbuilt and is rebuilt once
    scene.add_component(cube, removed).unwrap();
    harness.frame(&mut scene).unwrap();
    assert_eq!(stats(&scene).rebuilds, 1);
    assert_eq!(harness.renderer.live_batches(), 1);
}

#[test]
fn test_material_swap_rebuilds_the_batch() {
    let mut harness = Harness::new(RenderConfig::default());
    harness.build_lit_material("M_Other");
    let mut scene = render_scene();
    let cube = spawn_cube(&mut scene, "M_Lit", Vec3::zeros());
    harness.frame(&mut scene).unwrap();
    let old = scene.get_component::<StaticMesh>(cube).unwrap().batch.unwrap();

    scene.add_component(cube, Material::new("M_Other")).unwrap();
    harness.frame(&mut scene).unwrap();

    assert_eq!(stats(&scene).rebuilds, 1);
    assert_eq!(harness.renderer.live_batches(), 1);
    assert_ne!(scene.get_component::<StaticMesh>(cube).unwrap().batch, Some(old));
    match harness.draws().as_slice() {
        [RenderCommand::Draw { material, .. }] => assert_eq!(material, "M_Other"),
        other => panic!("expected one draw, got {other:?}"),
    }
}

#[test]
fn test_scene_release_frees_live_and_pending_batches() {
    let mut harness = Harness::new(RenderConfig::default());
    let mut scene = render_scene();
    let kept = spawn_cube(&mut scene, "M_Lit", Vec3::zeros());
    let dropped = spawn_cube(&mut scene, "M_Lit", Vec3::new(2.0, 0.0, 0.0));
    harness.frame(&mut scene).unwrap();
    assert_eq!(harness.renderer.live_batches(), 2);

    scene.destroy_entity(dropped).unwrap();
    assert_eq!(scene.release_batches(&mut harness.renderer), 2);
    assert_eq!(harness.renderer.live_batches(), 0);
    assert_eq!(scene.get_component::<StaticMesh>(kept).unwrap().batch, None);
    assert_eq!(scene.release_batches(&mut harness.renderer), 0);
}

#[test]
fn test_stale_material_handle_is_resolved_again_by_name() {
    let mut harness = Harness::new(RenderConfig::default());
    let mut scene = render_scene();
    let cube = spawn_cube(&mut scene, "M_Lit", Vec3::zeros());
    harness.frame(&mut scene).unwrap();
    let stale = scene.get_component::<Material>(cube).unwrap().instance.unwrap();

    // rebuild the library with another material in the first slot
    harness.libraries.materials.clear();
    harness.build_lit_material("M_Decoy");
    harness.build_lit_material("M_Lit");
    harness.frame(&mut scene).unwrap();

    let fresh = scene.get_component::<Material>(cube).unwrap().instance.unwrap();
    assert_ne!(fresh, stale);
    match harness.draws().as_slice() {
        [RenderCommand::Draw { material, .. }] => assert_eq!(material, "M_Lit"),
        other => panic!("expected one draw, got {other:?}"),
    }
}

#[test]
fn test_failed_rebuild_is_retried() {
    let mut harness = Harness::new(RenderConfig::default());
    let mut scene = render_scene();
    let cube = spawn_cube(&mut scene, "M_Later", Vec3::zeros());

    harness.frame(&mut scene).unwrap();
    assert_eq!(stats(&scene).failed_rebuilds, 1);
    assert!(scene.get_component::<StaticMesh>(cube).unwrap().changed);
    assert_eq!(harness.renderer.draw_count(), 0);

    harness.build_lit_material("M_Later");
    harness.frame(&mut scene).unwrap();
    assert_eq!(stats(&scene).rebuilds, 1);
    assert_eq!(stats(&scene).color_draws, 1);
}

#[test]
fn test_library_mesh_is_loaded_on_rebuild() {
    let mut harness = Harness::new(RenderConfig::default());
    harness.libraries.meshes.insert("quad", MeshData::quad());
    let mut scene = render_scene();
    let entity = scene.enroll_entity();
    scene.add_component(entity, Transform::default()).unwrap();
    scene.add_component(entity, StaticMesh::from_library("quad")).unwrap();
    scene.add_component(entity, Material::new("M_Lit")).unwrap();

    harness.frame(&mut scene).unwrap();

    let mesh = scene.get_component::<StaticMesh>(entity).unwrap();
    assert_eq!(mesh.vertex_count(), MeshData::quad().vertex_count());
    assert!(mesh.batch.is_some());
    assert_eq!(stats(&scene).color_draws, 1);
}

#[test]
fn test_disabled_entities_are_not_drawn() {
    let mut harness = Harness::new(RenderConfig::default());
    let mut scene = render_scene();
    let hidden = spawn_cube(&mut scene, "M_Lit", Vec3::zeros());
    spawn_cube(&mut scene, "M_Lit", Vec3::new(3.0, 0.0, 0.0));
    let mut info = Info::new("hidden");
    info.enabled = false;
    scene.add_component(hidden, info).unwrap();

    harness.frame(&mut scene).unwrap();
    assert_eq!(stats(&scene).color_draws, 1);
}

#[test]
fn test_undeclared_uniforms_are_not_staged() {
    let mut harness = Harness::new(RenderConfig::default());
    harness
        .libraries
        .shaders
        .build(
            "S_Flat",
            ShaderSources::graphics("uniform mat4 u_Model;\nvoid main() {}", "void main() {}"),
            &mut harness.renderer,
        )
        .unwrap();
    harness
        .libraries
        .materials
        .build("M_Flat", MaterialData::new("S_Flat"), None, &harness.libraries.shaders)
        .unwrap();
    let mut scene = render_scene();
    spawn_cube(&mut scene, "M_Flat", Vec3::zeros());
    spawn_light(&mut scene, Vec3::new(0.0, 4.0, 0.0));

    harness.frame(&mut scene).unwrap();

    let draws = harness.draws();
    let names: Vec<&String> = uniforms_of(&draws[0]).keys().collect();
    assert_eq!(names, vec!["u_Model"]);
}

#[test]
fn test_offscreen_passes_run_in_order_and_restore_the_main_target() {
    let config = RenderConfig::default().with_shadows(true).with_auxiliary_passes(true);
    let mut harness = Harness::new(config);
    harness
        .libraries
        .shaders
        .build("S_Depth", ShaderSources::graphics(DEPTH_VERTEX, "void main() {}"), &mut harness.renderer)
        .unwrap();
    harness
        .libraries
        .materials
        .build("M_DepthPrePass", MaterialData::new("S_Depth"), None, &harness.libraries.shaders)
        .unwrap();

    let mut scene = render_scene();
    spawn_cube(&mut scene, "M_Lit", Vec3::zeros());
    spawn_light(&mut scene, Vec3::new(0.0, 10.0, 0.0));
    let eye = scene.enroll_entity();
    let eye_transform = Transform::from_translation(Vec3::new(0.0, 6.0, 10.0)).with_rotation(Vec3::new(-20.0, 0.0, 0.0));
    scene.add_component(eye, eye_transform.clone()).unwrap();
    scene.add_component(eye, Camera::default().with_primary(true)).unwrap();

    harness.frame(&mut scene).unwrap();

    let stats = stats(&scene);
    assert_eq!(
        (stats.shadow_draws, stats.reflection_draws, stats.refraction_draws, stats.color_draws),
        (1, 1, 1, 1)
    );

    let draws = harness.draws();
    let targets: Vec<_> = draws
        .iter()
        .map(|draw| match draw {
            RenderCommand::Draw { target, material, .. } => (target.is_some(), material.clone()),
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(
        targets,
        vec![
            (true, "M_DepthPrePass".to_string()),
            (true, "M_Lit".to_string()),
            (true, "M_Lit".to_string()),
            (false, "M_Lit".to_string()),
        ]
    );
    assert!(uniforms_of(&draws[0]).contains_key("u_LightSpaceMatrix"));
    let clip_modes: Vec<_> = draws[1..]
        .iter()
        .map(|draw| uniforms_of(draw).get("u_ClipMode").cloned())
        .collect();
    assert_eq!(
        clip_modes,
        vec![
            Some(UniformValue::Int(1)),
            Some(UniformValue::Int(2)),
            Some(UniformValue::Int(0)),
        ]
    );

    // every offscreen pass hands the main target back at full size
    let commands = harness.renderer.commands();
    let restores = commands
        .windows(2)
        .filter(|pair| {
            pair[0] == RenderCommand::BindFramebuffer(None)
                && pair[1] == RenderCommand::Resize { width: SURFACE.0, height: SURFACE.1 }
        })
        .count();
    assert_eq!(restores, 3);
    assert_eq!(harness.renderer.bound_framebuffer(), None);
    assert_eq!(harness.renderer.viewport_size(), SURFACE);

    // the reflection camera never touches the scene's camera
    let after = scene.get_component::<Transform>(eye).unwrap();
    assert_eq!(after.translation, eye_transform.translation);
    assert_eq!(after.rotation, eye_transform.rotation);
}

#[test]
fn test_materials_can_opt_out_of_shadow_and_auxiliary_passes() {
    let config = RenderConfig::default().with_shadows(true).with_auxiliary_passes(true);
    let mut harness = Harness::new(config);
    harness
        .libraries
        .shaders
        .build("S_Depth", ShaderSources::graphics(DEPTH_VERTEX, "void main() {}"), &mut harness.renderer)
        .unwrap();
    harness
        .libraries
        .materials
        .build("M_DepthPrePass", MaterialData::new("S_Depth"), None, &harness.libraries.shaders)
        .unwrap();
    let water = MaterialDescriptor {
        cast_shadows: false,
        skip_auxiliary_passes: true,
    };
    harness
        .libraries
        .materials
        .build("M_Water", MaterialData::new("S_Lit"), Some(water), &harness.libraries.shaders)
        .unwrap();

    let mut scene = render_scene();
    spawn_cube(&mut scene, "M_Water", Vec3::zeros());
    let eye = scene.enroll_entity();
    scene.add_component(eye, Transform::from_translation(Vec3::new(0.0, 5.0, 5.0))).unwrap();
    scene.add_component(eye, Camera::default().with_primary(true)).unwrap();

    harness.frame(&mut scene).unwrap();

    let stats = stats(&scene);
    assert_eq!(
        (stats.shadow_draws, stats.reflection_draws, stats.refraction_draws, stats.color_draws),
        (0, 0, 0, 1)
    );
}

#[test]
fn test_compute_dispatch_is_followed_by_a_barrier() {
    let mut harness = Harness::new(RenderConfig::default());
    harness
        .libraries
        .shaders
        .build_compute("C_Noise", "uniform float u_Scale;\nvoid main() {}", &mut harness.renderer)
        .unwrap();
    let descriptor = TextureDescriptor {
        format: TextureFormat::Rgba32F,
        ..TextureDescriptor::default()
    };
    harness
        .libraries
        .textures
        .build("noise", TextureData::empty(64, 64), Some(descriptor), &mut harness.renderer)
        .unwrap();

    let mut scene = render_scene();
    let entity = scene.enroll_entity();
    let compute = Compute::new("C_Noise", [8, 8, 1])
        .with_image(0, "noise", ImageAccess::WriteOnly, ImageFormat::Rgba32F)
        .with_uniform("u_Scale", UniformValue::Float(2.0))
        .with_uniform("u_Unused", UniformValue::Float(1.0));
    scene.add_component(entity, compute).unwrap();

    harness.renderer.take_commands();
    harness.frame(&mut scene).unwrap();

    let commands = harness.renderer.commands();
    let dispatch = commands
        .iter()
        .position(|command| matches!(command, RenderCommand::DispatchCompute { .. }))
        .unwrap();
    assert!(matches!(
        commands[dispatch - 1],
        RenderCommand::BindImage {
            binding: 0,
            access: ImageAccess::WriteOnly,
            ..
        }
    ));
    let RenderCommand::DispatchCompute { work_groups, uniforms, .. } = &commands[dispatch] else {
        unreachable!();
    };
    assert_eq!(*work_groups, [8, 8, 1]);
    assert_eq!(uniforms, &vec![("u_Scale".to_string(), UniformValue::Float(2.0))]);
    assert_eq!(commands[dispatch + 1], RenderCommand::MemoryBarrier(BarrierFlags::SHADER_IMAGE_ACCESS));

    assert_eq!(stats(&scene).dispatches, 1);
    assert_eq!(scene.get_component::<Compute>(entity).unwrap().dispatch_count, 1);
}

#[test]
fn test_fill_mode_is_applied_before_the_color_pass() {
    let config = RenderConfig::default().with_fill_mode(crate::render::FillMode::Wireframe);
    let mut harness = Harness::new(config);
    let mut scene = render_scene();
    spawn_cube(&mut scene, "M_Lit", Vec3::zeros());

    harness.frame(&mut scene).unwrap();
    assert_eq!(harness.renderer.fill_mode(), crate::render::FillMode::Wireframe);
}
