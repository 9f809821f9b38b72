//! Backend abstraction for the rendering system
//!
//! [`Renderer`] is the only surface the orchestrator talks to. Backends map
//! it onto a concrete graphics API; quirks that shared systems must know
//! about are exposed through [`RendererCapabilities`] instead of branching on
//! the backend type.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::resources::{MaterialInstance, TextureData, TextureDescriptor};
use super::uniforms::UniformValue;
use super::RenderResult;
use crate::ecs::components::StaticMesh;
use crate::ecs::system::AsAny;
use crate::foundation::math::Mat4;

/// Handle to a built mesh batch (vertex buffers plus layout)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchHandle(pub u64);

/// Handle to a linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u64);

/// Handle to a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Handle to an offscreen framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferHandle(pub u64);

/// Rasterizer fill mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillMode {
    /// Filled triangles
    #[default]
    Fill,
    /// Triangle edges only
    Wireframe,
    /// Vertices only
    Point,
}

bitflags! {
    /// Framebuffer planes to clear
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        /// Color attachments
        const COLOR = 1 << 0;
        /// Depth attachment
        const DEPTH = 1 << 1;
        /// Stencil attachment
        const STENCIL = 1 << 2;
    }
}

bitflags! {
    /// Memory made visible by a barrier
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BarrierFlags: u32 {
        /// Storage image reads and writes
        const SHADER_IMAGE_ACCESS = 1 << 0;
        /// Texture sampling
        const TEXTURE_FETCH = 1 << 1;
        /// Buffer updates
        const BUFFER_UPDATE = 1 << 2;
    }
}

/// Storage image access mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAccess {
    /// Read only
    ReadOnly,
    /// Write only
    WriteOnly,
    /// Read and write
    ReadWrite,
}

/// Storage image texel format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// One 32-bit float channel
    R32F,
    /// Four 32-bit float channels
    Rgba32F,
    /// Four 8-bit normalized channels
    Rgba8,
}

/// Pipeline stage of a shader source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex stage
    Vertex,
    /// Fragment stage
    Fragment,
    /// Geometry stage
    Geometry,
    /// Tessellation control stage
    TessControl,
    /// Tessellation evaluation stage
    TessEvaluation,
    /// Compute stage
    Compute,
}

/// Source text per stage of one program
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderSources {
    /// Vertex stage
    pub vertex: Option<String>,
    /// Fragment stage
    pub fragment: Option<String>,
    /// Geometry stage
    pub geometry: Option<String>,
    /// Tessellation control stage
    pub tess_control: Option<String>,
    /// Tessellation evaluation stage
    pub tess_evaluation: Option<String>,
    /// Compute stage
    pub compute: Option<String>,
}

impl ShaderSources {
    /// Vertex plus fragment program
    pub fn graphics(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: Some(vertex.into()),
            fragment: Some(fragment.into()),
            ..Self::default()
        }
    }

    /// Compute-only program
    pub fn compute(source: impl Into<String>) -> Self {
        Self {
            compute: Some(source.into()),
            ..Self::default()
        }
    }

    /// Builder pattern: add tessellation stages
    pub fn with_tessellation(mut self, control: impl Into<String>, evaluation: impl Into<String>) -> Self {
        self.tess_control = Some(control.into());
        self.tess_evaluation = Some(evaluation.into());
        self
    }

    /// Builder pattern: add a geometry stage
    pub fn with_geometry(mut self, geometry: impl Into<String>) -> Self {
        self.geometry = Some(geometry.into());
        self
    }

    /// Present stages with their sources
    pub fn stages(&self) -> Vec<(ShaderStage, &str)> {
        [
            (ShaderStage::Vertex, &self.vertex),
            (ShaderStage::TessControl, &self.tess_control),
            (ShaderStage::TessEvaluation, &self.tess_evaluation),
            (ShaderStage::Geometry, &self.geometry),
            (ShaderStage::Fragment, &self.fragment),
            (ShaderStage::Compute, &self.compute),
        ]
        .into_iter()
        .filter_map(|(stage, source)| source.as_deref().map(|source| (stage, source)))
        .collect()
    }

    /// Whether this is a compute-only program
    pub fn is_compute(&self) -> bool {
        self.compute.is_some()
    }
}

/// Attachments of an offscreen framebuffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramebufferDescriptor {
    /// Debug name
    pub name: String,
    /// Width and height in pixels
    pub size: (u32, u32),
    /// Color attachment texture, if any
    pub color: Option<TextureHandle>,
    /// Depth attachment texture, if any
    pub depth: Option<TextureHandle>,
}

/// Backend quirks and optional features
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererCapabilities {
    /// Mouse-look axes are flipped on this backend
    pub invert_camera_controls: bool,
    /// Compute dispatch is available
    pub compute: bool,
}

impl Default for RendererCapabilities {
    fn default() -> Self {
        Self {
            invert_camera_controls: false,
            compute: true,
        }
    }
}

/// Graphics backend interface
///
/// `draw` and `draw_indexed` assume the mesh's batch was built with
/// `add_batch`. Calling `add_batch` again for a rebuilt mesh is allowed;
/// the caller releases the previous batch first.
pub trait Renderer: AsAny {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Optional features and quirks
    fn capabilities(&self) -> RendererCapabilities;

    /// One-time setup after the host context exists
    fn initialize(&mut self) -> RenderResult<()>;

    /// Set the current viewport size
    fn resize(&mut self, width: u32, height: u32);

    /// Current viewport size
    fn viewport_size(&self) -> (u32, u32);

    /// Start a frame and clear the main framebuffer
    fn begin_frame(&mut self, clear_color: [f32; 4]) -> RenderResult<()>;

    /// Finish the frame
    fn end_frame(&mut self) -> RenderResult<()>;

    /// Rasterizer fill mode
    fn set_fill_mode(&mut self, mode: FillMode);

    /// Compile and link a program; nothing is kept on failure
    fn compile_program(&mut self, name: &str, sources: &ShaderSources) -> RenderResult<ProgramHandle>;

    /// Free a program
    fn release_program(&mut self, program: ProgramHandle);

    /// Create a texture; `data.pixels == None` allocates an empty render target
    fn create_texture(&mut self, name: &str, data: &TextureData, descriptor: &TextureDescriptor) -> RenderResult<TextureHandle>;

    /// Replace a texture's contents
    fn update_texture(&mut self, texture: TextureHandle, data: &TextureData) -> RenderResult<()>;

    /// Free a texture
    fn release_texture(&mut self, texture: TextureHandle);

    /// Bind a texture to a sampler slot
    fn bind_texture(&mut self, slot: u32, texture: TextureHandle);

    /// Clear a sampler slot
    fn unbind_texture(&mut self, slot: u32);

    /// Create an offscreen framebuffer
    fn create_framebuffer(&mut self, descriptor: &FramebufferDescriptor) -> RenderResult<FramebufferHandle>;

    /// Bind an offscreen framebuffer, or the main one with `None`
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>);

    /// Clear planes of the bound framebuffer
    fn clear(&mut self, flags: ClearFlags);

    /// Upload a mesh and its vertex layout for a material
    fn add_batch(&mut self, mesh: &StaticMesh, material: &MaterialInstance) -> RenderResult<BatchHandle>;

    /// Free a batch
    fn release_batch(&mut self, batch: BatchHandle);

    /// Non-indexed draw with the material's staged uniforms
    fn draw(&mut self, model: &Mat4, mesh: &StaticMesh, material: &MaterialInstance) -> RenderResult<()>;

    /// Indexed draw with the material's staged uniforms
    fn draw_indexed(&mut self, model: &Mat4, mesh: &StaticMesh, material: &MaterialInstance) -> RenderResult<()>;

    /// Bind a texture as a storage image
    fn bind_image(&mut self, binding: u32, texture: TextureHandle, access: ImageAccess, format: ImageFormat);

    /// Run a compute program over a workgroup grid
    fn dispatch_compute(
        &mut self,
        program: ProgramHandle,
        uniforms: &[(String, UniformValue)],
        work_groups: [u32; 3],
    ) -> RenderResult<()>;

    /// Make prior writes visible to later passes
    fn memory_barrier(&mut self, barrier: BarrierFlags);
}
