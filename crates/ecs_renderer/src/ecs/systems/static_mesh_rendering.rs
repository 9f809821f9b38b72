//! Static mesh rendering
//!
//! Turns `StaticMesh` + `Material` + `Transform` entities into backend calls.
//! Every frame runs, in order:
//!
//! 0. maintenance: release batches of destroyed entities, rebuild changed meshes
//! 1. depth pre-pass into the shadow map (`shadows_enabled`)
//! 2. reflection and refraction passes (`auxiliary_passes_enabled`)
//! 3. compute dispatches of enabled `Compute` entities
//! 4. color pass into the main framebuffer
//!
//! Every offscreen pass restores the main framebuffer and viewport before
//! the next one starts.

use log::{debug, error, info, warn};

use crate::core::config::RenderConfig;
use crate::ecs::components::{Camera, ClipPlane, Compute, Info, Material, StaticMesh, Transform};
use crate::ecs::system::{FrameContext, System, SystemResult};
use crate::ecs::{Entity, Filter, World};
use crate::foundation::math::Mat4;
use crate::render::backend::{BarrierFlags, ClearFlags, Renderer};
use crate::render::lighting::collect_lights;
use crate::render::passes::{
    light_space_matrix, restore_main_target, stage_clip, stage_material_parameters, CameraView, ClipMode,
    FrameUniforms, OffscreenTarget, PassTargets,
};
use crate::render::resources::{MaterialHandle, MaterialInstance, MaterialLibrary, ResourceKind};
use crate::render::uniforms::UniformValue;
use crate::render::{RenderError, RenderResult};

/// Counters of the last frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Batches of destroyed entities released
    pub released_batches: usize,
    /// Meshes rebuilt
    pub rebuilds: usize,
    /// Rebuilds that failed and will be retried
    pub failed_rebuilds: usize,
    /// Draws into the shadow map
    pub shadow_draws: usize,
    /// Draws into the reflection target
    pub reflection_draws: usize,
    /// Draws into the refraction target
    pub refraction_draws: usize,
    /// Compute dispatches
    pub dispatches: usize,
    /// Draws into the main framebuffer
    pub color_draws: usize,
    /// Draws or dispatches skipped after a recoverable error
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy)]
struct DrawItem {
    entity: Entity,
    material: MaterialHandle,
    model: Mat4,
    cast_shadows: bool,
    skip_auxiliary: bool,
}

/// Render orchestrator over every drawable entity
#[derive(Debug, Default)]
pub struct StaticMeshRenderingSystem {
    targets: PassTargets,
    stats: RenderStats,
    warned_depth_material: bool,
}

impl StaticMeshRenderingSystem {
    /// Create the system; offscreen targets are created on first use
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters of the last frame
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    fn absorb(&mut self, entity: Entity, result: RenderResult<()>) -> SystemResult<bool> {
        match result {
            Ok(()) => Ok(true),
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => {
                warn!("Skipping {entity}: {e}");
                self.stats.skipped += 1;
                Ok(false)
            }
        }
    }

    fn pass_target(&mut self, pass: &str, result: RenderResult<OffscreenTarget>) -> SystemResult<Option<OffscreenTarget>> {
        match result {
            Ok(target) => Ok(Some(target)),
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => {
                error!("Skipping {pass} pass, target unavailable: {e}");
                Ok(None)
            }
        }
    }

    fn release_destroyed(&mut self, world: &mut World, renderer: &mut dyn Renderer) {
        for batch in world.drain_released_batches() {
            renderer.release_batch(batch);
            self.stats.released_batches += 1;
        }
    }

    fn rebuild_changed(&mut self, entities: &[Entity], world: &mut World, ctx: &mut FrameContext<'_>) -> SystemResult<()> {
        for &entity in entities {
            if !world.get::<StaticMesh>(entity).is_some_and(|mesh| mesh.changed) {
                continue;
            }
            match rebuild(entity, world, ctx) {
                Ok(()) => self.stats.rebuilds += 1,
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    error!("Failed to rebuild mesh of {entity}, retrying next frame: {e}");
                    self.stats.failed_rebuilds += 1;
                }
            }
        }
        Ok(())
    }

    fn collect_items(entities: &[Entity], world: &mut World, materials: &MaterialLibrary) -> Vec<DrawItem> {
        let mut items = Vec::with_capacity(entities.len());
        for &entity in entities {
            if world.get::<Info>(entity).is_some_and(|info| !info.enabled) {
                continue;
            }
            let drawable = world
                .get::<StaticMesh>(entity)
                .is_some_and(|mesh| !mesh.changed && mesh.batch.is_some());
            if !drawable {
                continue;
            }
            let material = match resolve_material(entity, world, materials) {
                Ok(handle) => handle,
                Err(e) => {
                    warn!("Skipping {entity}: {e}");
                    continue;
                }
            };
            let (Some(instance), Some(transform)) = (materials.instance(material), world.get::<Transform>(entity)) else {
                continue;
            };
            items.push(DrawItem {
                entity,
                material,
                model: transform.world_matrix,
                cast_shadows: instance.descriptor.cast_shadows,
                skip_auxiliary: instance.descriptor.skip_auxiliary_passes,
            });
        }
        items
    }

    fn shadow_pass(&mut self, items: &[DrawItem], world: &World, ctx: &mut FrameContext<'_>, frame: &FrameUniforms) -> SystemResult<()> {
        let Some(depth_material) = ctx.libraries.materials.handle(&ctx.config.depth_material) else {
            if !self.warned_depth_material {
                warn!("Shadows enabled but depth material '{}' is not built", ctx.config.depth_material);
                self.warned_depth_material = true;
            }
            return Ok(());
        };
        let result = self
            .targets
            .shadow(ctx.config, &mut *ctx.renderer, &mut ctx.libraries.textures);
        let Some(target) = self.pass_target("shadow", result)? else {
            return Ok(());
        };

        target.begin(&mut *ctx.renderer, ClearFlags::DEPTH);
        for item in items.iter().filter(|item| item.cast_shadows) {
            let Some(mesh) = world.get::<StaticMesh>(item.entity) else {
                continue;
            };
            let Some(material) = ctx.libraries.materials.instance_mut(depth_material) else {
                break;
            };
            material.clear_staged();
            frame.stage_depth(material, &item.model);
            let result = issue_draw(&mut *ctx.renderer, mesh, &item.model, material);
            if self.absorb(item.entity, result)? {
                self.stats.shadow_draws += 1;
            }
        }
        restore_main_target(&mut *ctx.renderer, ctx.surface_size);
        Ok(())
    }

    fn draw_items(
        &mut self,
        items: &[DrawItem],
        world: &World,
        ctx: &mut FrameContext<'_>,
        frame: &FrameUniforms,
        clip: ClipMode,
        plane_height: f32,
    ) -> SystemResult<usize> {
        let mut drawn = 0;
        for item in items {
            let Some(mesh) = world.get::<StaticMesh>(item.entity) else {
                continue;
            };
            let libraries = &mut *ctx.libraries;
            let Some(material) = libraries.materials.instance_mut(item.material) else {
                continue;
            };
            material.clear_staged();
            stage_material_parameters(material, &libraries.textures);
            frame.stage(material, &item.model);
            stage_clip(material, clip, plane_height);
            let result = issue_draw(&mut *ctx.renderer, mesh, &item.model, material);
            if self.absorb(item.entity, result)? {
                drawn += 1;
            }
        }
        Ok(drawn)
    }

    fn auxiliary_passes(&mut self, items: &[DrawItem], world: &World, ctx: &mut FrameContext<'_>, frame: &FrameUniforms) -> SystemResult<()> {
        let eye = world
            .main_camera_entity()
            .and_then(|entity| Some((world.get::<Camera>(entity)?, world.get::<Transform>(entity)?)));
        let Some((camera, transform)) = eye else {
            debug!("No primary camera, skipping reflection and refraction");
            return Ok(());
        };
        let plane_height = clip_plane_height(world, ctx.config);
        let eligible: Vec<DrawItem> = items.iter().filter(|item| !item.skip_auxiliary).copied().collect();

        let result = self
            .targets
            .reflection(ctx.config, &mut *ctx.renderer, &mut ctx.libraries.textures);
        if let Some(target) = self.pass_target("reflection", result)? {
            let reflected = FrameUniforms {
                camera: CameraView::reflected(transform, camera, plane_height),
                ..frame.clone()
            };
            target.begin(&mut *ctx.renderer, ClearFlags::COLOR | ClearFlags::DEPTH);
            self.stats.reflection_draws =
                self.draw_items(&eligible, world, ctx, &reflected, ClipMode::Reflection, plane_height)?;
            restore_main_target(&mut *ctx.renderer, ctx.surface_size);
        }

        let result = self
            .targets
            .refraction(ctx.config, &mut *ctx.renderer, &mut ctx.libraries.textures);
        if let Some(target) = self.pass_target("refraction", result)? {
            target.begin(&mut *ctx.renderer, ClearFlags::COLOR | ClearFlags::DEPTH);
            self.stats.refraction_draws =
                self.draw_items(&eligible, world, ctx, frame, ClipMode::Refraction, plane_height)?;
            restore_main_target(&mut *ctx.renderer, ctx.surface_size);
        }
        Ok(())
    }

    fn compute_pass(&mut self, world: &mut World, ctx: &mut FrameContext<'_>) -> SystemResult<()> {
        for entity in world.query(&Filter::of::<(Compute,)>()) {
            let Some(compute) = world.get_mut::<Compute>(entity) else {
                continue;
            };
            if !compute.enabled {
                continue;
            }
            let result = dispatch(compute, ctx);
            if self.absorb(entity, result)? {
                self.stats.dispatches += 1;
            }
        }
        Ok(())
    }
}

fn issue_draw(renderer: &mut dyn Renderer, mesh: &StaticMesh, model: &Mat4, material: &MaterialInstance) -> RenderResult<()> {
    if mesh.is_indexed() {
        renderer.draw_indexed(model, mesh, material)
    } else {
        renderer.draw(model, mesh, material)
    }
}

/// Resolve (and cache on the component) the material instance of an entity
fn resolve_material(entity: Entity, world: &mut World, materials: &MaterialLibrary) -> RenderResult<MaterialHandle> {
    let material = world
        .get_mut::<Material>(entity)
        .ok_or_else(|| RenderError::RenderingFailed(format!("{entity} has no material")))?;
    if let Some(handle) = material.instance.filter(|&handle| materials.instance(handle).is_some()) {
        return Ok(handle);
    }
    let handle = materials.handle(&material.name).ok_or_else(|| RenderError::UnknownResource {
        kind: ResourceKind::Material,
        name: material.name.clone(),
    })?;
    material.instance = Some(handle);
    Ok(handle)
}

/// Rebuild one mesh; `changed` is cleared only on success
fn rebuild(entity: Entity, world: &mut World, ctx: &mut FrameContext<'_>) -> RenderResult<()> {
    let handle = resolve_material(entity, world, &ctx.libraries.materials)?;
    let libraries = &*ctx.libraries;
    let Some(mesh) = world.get_mut::<StaticMesh>(entity) else {
        return Ok(());
    };

    if mesh.load_from_library {
        let data = libraries.meshes.get(&mesh.name).ok_or_else(|| RenderError::UnknownResource {
            kind: ResourceKind::Mesh,
            name: mesh.name.clone(),
        })?;
        mesh.attributes = data.to_attributes();
        mesh.indices = data.index_buffer();
    }

    if let Some(old) = mesh.batch.take() {
        ctx.renderer.release_batch(old);
    }
    if mesh.vertex_count() > 0 {
        let material = libraries.materials.instance(handle).ok_or_else(|| RenderError::UnknownResource {
            kind: ResourceKind::Material,
            name: format!("{handle:?}"),
        })?;
        mesh.batch = Some(ctx.renderer.add_batch(mesh, material)?);
    }
    mesh.changed = false;
    Ok(())
}

/// One compute dispatch; the program is looked up once and cached on the component
fn dispatch(compute: &mut Compute, ctx: &mut FrameContext<'_>) -> RenderResult<()> {
    let shader = ctx
        .libraries
        .shaders
        .get(&compute.shader)
        .ok_or_else(|| RenderError::UnknownResource {
            kind: ResourceKind::Shader,
            name: compute.shader.clone(),
        })?;
    let program = *compute.program.get_or_insert(shader.program);

    let mut images = Vec::with_capacity(compute.images.len());
    for image in &compute.images {
        let texture = ctx
            .libraries
            .textures
            .get_id(&image.texture)
            .ok_or_else(|| RenderError::UnknownResource {
                kind: ResourceKind::Texture,
                name: image.texture.clone(),
            })?;
        images.push((image.binding, texture, image.access, image.format));
    }
    for (binding, texture, access, format) in images {
        ctx.renderer.bind_image(binding, texture, access, format);
    }

    let uniforms: Vec<(String, UniformValue)> = compute
        .uniforms
        .iter()
        .filter(|(name, _)| shader.declares(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    ctx.renderer.dispatch_compute(program, &uniforms, compute.work_groups)?;
    ctx.renderer.memory_barrier(BarrierFlags::SHADER_IMAGE_ACCESS);
    compute.dispatch_count += 1;
    Ok(())
}

/// Height of the water plane: the first `ClipPlane` entity, else the configured default
fn clip_plane_height(world: &World, config: &RenderConfig) -> f32 {
    world
        .query(&Filter::of::<(ClipPlane, Transform)>())
        .first()
        .and_then(|&entity| Some((world.get::<ClipPlane>(entity)?, world.get::<Transform>(entity)?)))
        .map_or(config.clip_plane_height, |(plane, transform)| {
            transform.world_position().y + plane.offset
        })
}

impl System for StaticMeshRenderingSystem {
    fn name(&self) -> &str {
        "StaticMeshRenderingSystem"
    }

    fn filter(&self) -> Filter {
        Filter::of::<(StaticMesh, Material, Transform)>()
    }

    fn on_create_system(&mut self, _world: &mut World, ctx: &mut FrameContext<'_>) -> SystemResult<()> {
        info!(
            "Static mesh rendering on '{}' (shadows: {}, auxiliary passes: {})",
            ctx.renderer.name(),
            ctx.config.shadows_enabled,
            ctx.config.auxiliary_passes_enabled
        );
        Ok(())
    }

    fn on_create_entity(&mut self, entity: Entity, world: &mut World, _ctx: &mut FrameContext<'_>) -> SystemResult<()> {
        // a mesh first seen here may carry a batch built for another material
        if let Some(mesh) = world.get_mut::<StaticMesh>(entity) {
            mesh.changed = true;
        }
        Ok(())
    }

    fn on_update_system(&mut self, entities: &[Entity], world: &mut World, ctx: &mut FrameContext<'_>) -> SystemResult<()> {
        self.stats = RenderStats::default();
        self.release_destroyed(world, &mut *ctx.renderer);
        self.rebuild_changed(entities, world, ctx)?;

        let lights = collect_lights(world)?;
        let camera = world.main_camera().map_or_else(CameraView::identity, CameraView::from_camera);
        let frame = FrameUniforms {
            light_space: light_space_matrix(&lights, &camera.projection),
            camera,
            lights,
            time: ctx.elapsed(),
        };
        let items = Self::collect_items(entities, world, &ctx.libraries.materials);

        if ctx.config.shadows_enabled {
            self.shadow_pass(&items, world, ctx, &frame)?;
        }
        ctx.libraries.textures.bind_textures(&mut *ctx.renderer);
        if ctx.config.auxiliary_passes_enabled {
            self.auxiliary_passes(&items, world, ctx, &frame)?;
        }
        self.compute_pass(world, ctx)?;

        ctx.renderer.set_fill_mode(ctx.config.fill_mode);
        self.stats.color_draws = self.draw_items(&items, world, ctx, &frame, ClipMode::Disabled, 0.0)?;
        ctx.libraries.textures.unbind_textures(&mut *ctx.renderer);
        Ok(())
    }
}
