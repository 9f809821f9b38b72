//! Pass helpers for the static mesh rendering system
//!
//! Offscreen targets, the camera seen by each pass, and the per-draw uniform
//! staging shared by all passes.

use log::debug;

use super::backend::{ClearFlags, FramebufferDescriptor, FramebufferHandle, Renderer};
use super::lighting::LightSet;
use super::resources::{MaterialInstance, TextureData, TextureDescriptor, TextureLibrary};
use super::uniforms::UniformValue;
use super::RenderResult;
use crate::core::config::RenderConfig;
use crate::ecs::components::{Camera, Transform};
use crate::foundation::math::{look_at, rotation_only, Mat4, Vec3};

/// Texture backing the shadow map
pub const SHADOW_DEPTH_TEXTURE: &str = "depth_texture";
/// Texture the reflection pass renders into
pub const REFLECTION_TEXTURE: &str = "reflection_texture";
/// Texture the refraction pass renders into
pub const REFRACTION_TEXTURE: &str = "refraction_texture";
/// Depth of the refraction pass
pub const REFRACTION_DEPTH_TEXTURE: &str = "depth_refraction_texture";

/// Clipping against the water plane, as seen by `u_ClipMode`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipMode {
    /// No clipping
    Disabled = 0,
    /// Geometry above the plane, seen mirrored
    Reflection = 1,
    /// Geometry below the plane
    Refraction = 2,
}

/// An offscreen framebuffer and its size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffscreenTarget {
    /// Backend framebuffer
    pub framebuffer: FramebufferHandle,
    /// Width and height in pixels
    pub size: (u32, u32),
}

impl OffscreenTarget {
    /// Bind, set the viewport and clear the given planes
    pub fn begin(&self, renderer: &mut dyn Renderer, clear: ClearFlags) {
        renderer.resize(self.size.0, self.size.1);
        renderer.bind_framebuffer(Some(self.framebuffer));
        renderer.clear(clear);
    }
}

/// Return to the main framebuffer at its own size
pub fn restore_main_target(renderer: &mut dyn Renderer, surface_size: (u32, u32)) {
    renderer.bind_framebuffer(None);
    renderer.resize(surface_size.0, surface_size.1);
    renderer.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
}

/// Lazily created offscreen targets of the shadow and auxiliary passes
#[derive(Debug, Default)]
pub struct PassTargets {
    shadow: Option<OffscreenTarget>,
    reflection: Option<OffscreenTarget>,
    refraction: Option<OffscreenTarget>,
}

impl PassTargets {
    /// No targets created yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Depth-only shadow target
    pub fn shadow(
        &mut self,
        config: &RenderConfig,
        renderer: &mut dyn Renderer,
        textures: &mut TextureLibrary,
    ) -> RenderResult<OffscreenTarget> {
        if let Some(target) = self.shadow {
            return Ok(target);
        }
        let size = config.shadow_resolution;
        let depth = textures.build(
            SHADOW_DEPTH_TEXTURE,
            TextureData::empty(size.0, size.1),
            Some(TextureDescriptor::depth()),
            renderer,
        )?;
        let target = create_target("shadow", size, None, Some(depth), renderer)?;
        self.shadow = Some(target);
        Ok(target)
    }

    /// Reflection target: color texture plus a depth attachment
    pub fn reflection(
        &mut self,
        config: &RenderConfig,
        renderer: &mut dyn Renderer,
        textures: &mut TextureLibrary,
    ) -> RenderResult<OffscreenTarget> {
        if let Some(target) = self.reflection {
            return Ok(target);
        }
        let size = config.reflection_resolution;
        let color = textures.build(
            REFLECTION_TEXTURE,
            TextureData::empty(size.0, size.1),
            Some(TextureDescriptor::render_target()),
            renderer,
        )?;
        let target = create_target("reflection", size, Some(color), None, renderer)?;
        self.reflection = Some(target);
        Ok(target)
    }

    /// Refraction target: color and sampled depth textures
    pub fn refraction(
        &mut self,
        config: &RenderConfig,
        renderer: &mut dyn Renderer,
        textures: &mut TextureLibrary,
    ) -> RenderResult<OffscreenTarget> {
        if let Some(target) = self.refraction {
            return Ok(target);
        }
        let size = config.refraction_resolution;
        let color = textures.build(
            REFRACTION_TEXTURE,
            TextureData::empty(size.0, size.1),
            Some(TextureDescriptor::render_target()),
            renderer,
        )?;
        let depth = textures.build(
            REFRACTION_DEPTH_TEXTURE,
            TextureData::empty(size.0, size.1),
            Some(TextureDescriptor::depth()),
            renderer,
        )?;
        let target = create_target("refraction", size, Some(color), Some(depth), renderer)?;
        self.refraction = Some(target);
        Ok(target)
    }
}

fn create_target(
    name: &str,
    size: (u32, u32),
    color: Option<super::backend::TextureHandle>,
    depth: Option<super::backend::TextureHandle>,
    renderer: &mut dyn Renderer,
) -> RenderResult<OffscreenTarget> {
    let framebuffer = renderer.create_framebuffer(&FramebufferDescriptor {
        name: name.to_string(),
        size,
        color,
        depth,
    })?;
    debug!("Created {name} target {}x{}", size.0, size.1);
    Ok(OffscreenTarget { framebuffer, size })
}

/// Camera matrices used by one pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    /// World to view
    pub view: Mat4,
    /// View to clip
    pub projection: Mat4,
    /// Eye position
    pub position: Vec3,
}

impl Default for CameraView {
    fn default() -> Self {
        Self::identity()
    }
}

impl CameraView {
    /// Identity matrices, used when the scene has no primary camera
    pub fn identity() -> Self {
        Self {
            view: Mat4::identity(),
            projection: Mat4::identity(),
            position: Vec3::zeros(),
        }
    }

    /// Matrices of a resolved camera
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            view: camera.view,
            projection: camera.projection,
            position: camera.position,
        }
    }

    /// The camera mirrored across a horizontal plane
    ///
    /// Works on copies: the eye drops by twice its height above the plane and
    /// the pitch is negated. The scene's components are left untouched.
    pub fn reflected(transform: &Transform, camera: &Camera, plane_height: f32) -> Self {
        let mut mirrored = transform.clone();
        let distance = 2.0 * (mirrored.translation.y - plane_height);
        mirrored.translation.y -= distance;
        mirrored.rotation.x = -mirrored.rotation.x;
        mirrored.dirty = true;
        mirrored.resolve(None);

        let mut eye = camera.clone();
        eye.update_from_world(&mirrored.world_matrix);
        Self::from_camera(&eye)
    }

    /// Skybox-style view-projection without the view translation
    pub fn view_projection(&self) -> Mat4 {
        self.projection * rotation_only(&self.view)
    }
}

/// Light-space matrix for the shadow map
///
/// Looks from the first light (lowest entity) at the origin through the
/// camera's projection. The shadow pass and the color pass share this one
/// matrix, so the depth map is always sampled from the light it was
/// rendered from.
pub fn light_space_matrix(lights: &LightSet, projection: &Mat4) -> Option<Mat4> {
    lights
        .samples()
        .first()
        .map(|light| projection * look_at(&light.position, &Vec3::zeros(), &Vec3::y()))
}

/// Values shared by every draw of a frame
#[derive(Debug, Clone, Default)]
pub struct FrameUniforms {
    /// Camera of the current pass
    pub camera: CameraView,
    /// Aggregated lights
    pub lights: LightSet,
    /// Shadow map projection, if any light exists
    pub light_space: Option<Mat4>,
    /// Seconds since start
    pub time: f32,
}

impl FrameUniforms {
    /// Stage the per-draw uniforms of the color and auxiliary passes
    pub fn stage(&self, material: &mut MaterialInstance, model: &Mat4) {
        let camera = &self.camera;
        material.set_uniform("u_Model", UniformValue::Mat4(*model));
        material.set_uniform(
            "u_ModelViewProjection",
            UniformValue::Mat4(camera.projection * camera.view * model),
        );
        material.set_uniform("u_View", UniformValue::Mat4(camera.view));
        material.set_uniform("u_Projection", UniformValue::Mat4(camera.projection));
        material.set_uniform("u_ViewProjection", UniformValue::Mat4(camera.view_projection()));
        material.set_uniform("u_ViewPosition", UniformValue::Vec3(camera.position));
        material.set_uniform("u_Time", UniformValue::Float(self.time));
        if let Some(light_space) = self.light_space {
            material.set_uniform("u_LightSpaceMatrix", UniformValue::Mat4(light_space));
        }
        self.lights.stage(material);
    }

    /// Stage the uniforms of the depth-only pre-pass
    pub fn stage_depth(&self, material: &mut MaterialInstance, model: &Mat4) {
        material.set_uniform("u_Model", UniformValue::Mat4(*model));
        if let Some(light_space) = self.light_space {
            material.set_uniform("u_LightSpaceMatrix", UniformValue::Mat4(light_space));
        }
    }
}

/// Stage a material's own parameters
pub fn stage_material_parameters(material: &mut MaterialInstance, textures: &TextureLibrary) {
    let parameters: Vec<(String, UniformValue)> = material
        .data
        .parameters
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    for (name, value) in parameters {
        material.set_uniform(&name, value);
    }

    let color = material.data.color;
    let glossiness = material.data.glossiness;
    material.set_uniform("u_Color", UniformValue::Vec4(color));
    material.set_uniform("u_Glossiness", UniformValue::Float(glossiness));

    let slot = material
        .data
        .textures
        .first()
        .and_then(|texture| textures.get_slot(texture))
        .and_then(|slot| i32::try_from(slot).ok());
    if let Some(slot) = slot {
        material.set_uniform("u_TextureId", UniformValue::Int(slot));
    }
}

/// Stage the clip plane of an auxiliary pass
pub fn stage_clip(material: &mut MaterialInstance, mode: ClipMode, plane_height: f32) {
    material.set_uniform("u_ClipPlane", UniformValue::Float(plane_height));
    material.set_uniform("u_ClipMode", UniformValue::Int(mode as i32));
}
