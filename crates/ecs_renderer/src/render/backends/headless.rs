//! Headless reference backend
//!
//! Implements [`Renderer`] without a GPU. Every call is validated against the
//! resources it references and appended to a command log, which tests and
//! the demo inspect to verify pass ordering and uniform staging. The log
//! keeps only the most recent frames.

use std::collections::{BTreeMap, VecDeque};

use log::{debug, trace};

use crate::ecs::components::StaticMesh;
use crate::foundation::collections::{key_from_bits, key_to_bits, HandleMap};
use crate::foundation::math::Mat4;
use crate::render::backend::{
    BarrierFlags, BatchHandle, ClearFlags, FillMode, FramebufferDescriptor, FramebufferHandle, ImageAccess,
    ImageFormat, ProgramHandle, Renderer, RendererCapabilities, ShaderSources, TextureHandle,
};
use crate::render::resources::{MaterialInstance, ResourceKind, TextureData, TextureDescriptor};
use crate::render::uniforms::UniformValue;
use crate::render::{RenderError, RenderResult};

/// Marker that makes a shader stage fail to compile
const COMPILE_ERROR_DIRECTIVE: &str = "#error";

/// Frames kept in the command log by default
pub const DEFAULT_FRAME_HISTORY: usize = 2;

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// `begin_frame`
    BeginFrame,
    /// `end_frame`
    EndFrame,
    /// Viewport change
    Resize {
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// Fill mode change
    SetFillMode(FillMode),
    /// Program compiled
    CompileProgram {
        /// Shader name
        name: String,
        /// New handle
        program: ProgramHandle,
    },
    /// Program freed
    ReleaseProgram(ProgramHandle),
    /// Texture created
    CreateTexture {
        /// Texture name
        name: String,
        /// New handle
        texture: TextureHandle,
    },
    /// Texture contents replaced
    UpdateTexture(TextureHandle),
    /// Texture freed
    ReleaseTexture(TextureHandle),
    /// Sampler slot bound
    BindTexture {
        /// Slot
        slot: u32,
        /// Texture
        texture: TextureHandle,
    },
    /// Sampler slot cleared
    UnbindTexture {
        /// Slot
        slot: u32,
    },
    /// Framebuffer created
    CreateFramebuffer {
        /// Framebuffer name
        name: String,
        /// New handle
        framebuffer: FramebufferHandle,
    },
    /// Framebuffer bound; `None` is the main framebuffer
    BindFramebuffer(Option<FramebufferHandle>),
    /// Planes cleared
    Clear(ClearFlags),
    /// Mesh uploaded
    AddBatch {
        /// Mesh name
        mesh: String,
        /// New handle
        batch: BatchHandle,
    },
    /// Batch freed
    ReleaseBatch(BatchHandle),
    /// Draw call
    Draw {
        /// Mesh name
        mesh: String,
        /// Material name
        material: String,
        /// Indexed draw
        indexed: bool,
        /// Framebuffer bound at the time of the draw
        target: Option<FramebufferHandle>,
        /// Model matrix
        model: Mat4,
        /// Uniforms staged on the material
        uniforms: BTreeMap<String, UniformValue>,
    },
    /// Storage image bound
    BindImage {
        /// Image unit
        binding: u32,
        /// Texture
        texture: TextureHandle,
        /// Access mode
        access: ImageAccess,
        /// Texel format
        format: ImageFormat,
    },
    /// Compute dispatch
    DispatchCompute {
        /// Program
        program: ProgramHandle,
        /// Workgroup grid
        work_groups: [u32; 3],
        /// Uniform values
        uniforms: Vec<(String, UniformValue)>,
    },
    /// Memory barrier
    MemoryBarrier(BarrierFlags),
}

#[derive(Debug)]
struct ProgramRecord {
    name: String,
    compute: bool,
}

#[derive(Debug)]
struct TextureRecord {
    name: String,
    size: (u32, u32),
}

#[derive(Debug)]
struct BatchRecord {
    mesh: String,
    bytes: usize,
}

/// GPU-less renderer recording every call
#[derive(Debug)]
pub struct HeadlessRenderer {
    capabilities: RendererCapabilities,
    initialized: bool,
    viewport: (u32, u32),
    fill_mode: FillMode,
    bound_framebuffer: Option<FramebufferHandle>,
    programs: HandleMap<ProgramRecord>,
    textures: HandleMap<TextureRecord>,
    framebuffers: HandleMap<FramebufferDescriptor>,
    batches: HandleMap<BatchRecord>,
    commands: Vec<RenderCommand>,
    // log offsets of the retained frames' BeginFrame
    frame_starts: VecDeque<usize>,
    frame_history: usize,
    frame_count: u64,
    draw_count: u64,
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessRenderer {
    /// Renderer with a 1280x720 main framebuffer
    pub fn new() -> Self {
        Self::with_size(1280, 720)
    }

    /// Renderer with the given main framebuffer size
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            capabilities: RendererCapabilities::default(),
            initialized: false,
            viewport: (width, height),
            fill_mode: FillMode::Fill,
            bound_framebuffer: None,
            programs: HandleMap::new(),
            textures: HandleMap::new(),
            framebuffers: HandleMap::new(),
            batches: HandleMap::new(),
            commands: Vec::new(),
            frame_starts: VecDeque::new(),
            frame_history: DEFAULT_FRAME_HISTORY,
            frame_count: 0,
            draw_count: 0,
        }
    }

    /// Builder pattern: number of frames kept in the command log (at least one)
    pub fn with_frame_history(mut self, frames: usize) -> Self {
        self.frame_history = frames.max(1);
        self
    }

    /// Builder pattern: override the reported capabilities
    pub fn with_capabilities(mut self, capabilities: RendererCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Whether `initialize` ran
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Recorded commands of the retained frames
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Drain the command log
    pub fn take_commands(&mut self) -> Vec<RenderCommand> {
        self.frame_starts.clear();
        std::mem::take(&mut self.commands)
    }

    // Drop everything recorded before the oldest retained frame
    fn trim_history(&mut self) {
        if self.frame_starts.len() <= self.frame_history {
            return;
        }
        while self.frame_starts.len() > self.frame_history {
            self.frame_starts.pop_front();
        }
        let Some(&cut) = self.frame_starts.front() else {
            return;
        };
        self.commands.drain(..cut);
        for start in &mut self.frame_starts {
            *start -= cut;
        }
        trace!("Trimmed {cut} recorded commands");
    }

    /// Recorded draw commands
    pub fn draws(&self) -> impl Iterator<Item = &RenderCommand> {
        self.commands
            .iter()
            .filter(|command| matches!(command, RenderCommand::Draw { .. }))
    }

    /// Programs currently alive
    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    /// Textures currently alive
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Batches currently alive
    pub fn live_batches(&self) -> usize {
        self.batches.len()
    }

    /// Framebuffers created
    pub fn live_framebuffers(&self) -> usize {
        self.framebuffers.len()
    }

    /// Bytes uploaded across live batches
    pub fn batch_bytes(&self) -> usize {
        self.batches.values().map(|batch| batch.bytes).sum()
    }

    /// Frames begun
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Draw calls issued since creation
    pub fn draw_count(&self) -> u64 {
        self.draw_count
    }

    /// Size of a live texture
    pub fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.textures.get(key_from_bits(texture.0)).map(|record| record.size)
    }

    /// Framebuffer currently bound
    pub fn bound_framebuffer(&self) -> Option<FramebufferHandle> {
        self.bound_framebuffer
    }

    /// Current fill mode
    pub fn fill_mode(&self) -> FillMode {
        self.fill_mode
    }

    fn record_draw(&mut self, model: &Mat4, mesh: &StaticMesh, material: &MaterialInstance, indexed: bool) -> RenderResult<()> {
        let batch = mesh
            .batch
            .ok_or_else(|| RenderError::RenderingFailed(format!("mesh '{}' has no batch", mesh.name)))?;
        if !self.batches.contains_key(key_from_bits(batch.0)) {
            return Err(RenderError::RenderingFailed(format!(
                "mesh '{}' references a released batch",
                mesh.name
            )));
        }
        if !self.programs.contains_key(key_from_bits(material.program.0)) {
            return Err(RenderError::RenderingFailed(format!(
                "material '{}' references a released program",
                material.name
            )));
        }
        if indexed && !mesh.is_indexed() {
            return Err(RenderError::RenderingFailed(format!("mesh '{}' has no indices", mesh.name)));
        }

        trace!("Draw '{}' with '{}' (indexed: {indexed})", mesh.name, material.name);
        self.draw_count += 1;
        self.commands.push(RenderCommand::Draw {
            mesh: mesh.name.clone(),
            material: material.name.clone(),
            indexed,
            target: self.bound_framebuffer,
            model: *model,
            uniforms: material.staged_uniforms().clone(),
        });
        Ok(())
    }

    fn texture_exists(&self, texture: TextureHandle) -> bool {
        self.textures.contains_key(key_from_bits(texture.0))
    }
}

impl Renderer for HeadlessRenderer {
    fn name(&self) -> &str {
        "headless"
    }

    fn capabilities(&self) -> RendererCapabilities {
        self.capabilities
    }

    fn initialize(&mut self) -> RenderResult<()> {
        if self.viewport.0 == 0 || self.viewport.1 == 0 {
            return Err(RenderError::InitializationFailed(format!(
                "invalid surface size {}x{}",
                self.viewport.0, self.viewport.1
            )));
        }
        self.initialized = true;
        debug!("Headless renderer initialized at {}x{}", self.viewport.0, self.viewport.1);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
        self.commands.push(RenderCommand::Resize { width, height });
    }

    fn viewport_size(&self) -> (u32, u32) {
        self.viewport
    }

    fn begin_frame(&mut self, _clear_color: [f32; 4]) -> RenderResult<()> {
        if !self.initialized {
            return Err(RenderError::RenderingFailed("begin_frame before initialize".to_string()));
        }
        self.frame_count += 1;
        self.bound_framebuffer = None;
        self.frame_starts.push_back(self.commands.len());
        self.trim_history();
        self.commands.push(RenderCommand::BeginFrame);
        self.commands.push(RenderCommand::Clear(ClearFlags::COLOR | ClearFlags::DEPTH));
        Ok(())
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        self.commands.push(RenderCommand::EndFrame);
        Ok(())
    }

    fn set_fill_mode(&mut self, mode: FillMode) {
        if self.fill_mode != mode {
            self.fill_mode = mode;
            self.commands.push(RenderCommand::SetFillMode(mode));
        }
    }

    fn compile_program(&mut self, name: &str, sources: &ShaderSources) -> RenderResult<ProgramHandle> {
        let stages = sources.stages();
        if stages.is_empty() {
            return Err(RenderError::ResourceCreationFailed(format!("program '{name}' has no stages")));
        }
        for (stage, source) in &stages {
            if let Some(line) = source.lines().find(|line| line.trim_start().starts_with(COMPILE_ERROR_DIRECTIVE)) {
                return Err(RenderError::ShaderCompilation {
                    shader: name.to_string(),
                    stage: *stage,
                    log: line.trim().to_string(),
                });
            }
        }

        let key = self.programs.insert(ProgramRecord {
            name: name.to_string(),
            compute: sources.is_compute(),
        });
        let program = ProgramHandle(key_to_bits(key));
        self.commands.push(RenderCommand::CompileProgram {
            name: name.to_string(),
            program,
        });
        Ok(program)
    }

    fn release_program(&mut self, program: ProgramHandle) {
        if self.programs.remove(key_from_bits(program.0)).is_some() {
            self.commands.push(RenderCommand::ReleaseProgram(program));
        }
    }

    fn create_texture(&mut self, name: &str, data: &TextureData, descriptor: &TextureDescriptor) -> RenderResult<TextureHandle> {
        if data.width == 0 || data.height == 0 {
            return Err(RenderError::ResourceCreationFailed(format!("texture '{name}' has zero size")));
        }
        if let Some(pixels) = &data.pixels {
            let expected = data.width as usize * data.height as usize * descriptor.format.bytes_per_texel();
            if pixels.len() != expected {
                return Err(RenderError::ResourceCreationFailed(format!(
                    "texture '{name}' expects {expected} bytes, got {}",
                    pixels.len()
                )));
            }
        }

        let key = self.textures.insert(TextureRecord {
            name: name.to_string(),
            size: (data.width, data.height),
        });
        let texture = TextureHandle(key_to_bits(key));
        self.commands.push(RenderCommand::CreateTexture {
            name: name.to_string(),
            texture,
        });
        Ok(texture)
    }

    fn update_texture(&mut self, texture: TextureHandle, data: &TextureData) -> RenderResult<()> {
        let record = self
            .textures
            .get_mut(key_from_bits(texture.0))
            .ok_or_else(|| RenderError::UnknownResource {
                kind: ResourceKind::Texture,
                name: format!("{texture:?}"),
            })?;
        record.size = (data.width, data.height);
        trace!("Updated texture '{}'", record.name);
        self.commands.push(RenderCommand::UpdateTexture(texture));
        Ok(())
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(key_from_bits(texture.0)).is_some() {
            self.commands.push(RenderCommand::ReleaseTexture(texture));
        }
    }

    fn bind_texture(&mut self, slot: u32, texture: TextureHandle) {
        self.commands.push(RenderCommand::BindTexture { slot, texture });
    }

    fn unbind_texture(&mut self, slot: u32) {
        self.commands.push(RenderCommand::UnbindTexture { slot });
    }

    fn create_framebuffer(&mut self, descriptor: &FramebufferDescriptor) -> RenderResult<FramebufferHandle> {
        for attachment in [descriptor.color, descriptor.depth].into_iter().flatten() {
            if !self.texture_exists(attachment) {
                return Err(RenderError::ResourceCreationFailed(format!(
                    "framebuffer '{}' attaches a missing texture",
                    descriptor.name
                )));
            }
        }
        let key = self.framebuffers.insert(descriptor.clone());
        let framebuffer = FramebufferHandle(key_to_bits(key));
        self.commands.push(RenderCommand::CreateFramebuffer {
            name: descriptor.name.clone(),
            framebuffer,
        });
        Ok(framebuffer)
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>) {
        self.bound_framebuffer = framebuffer;
        self.commands.push(RenderCommand::BindFramebuffer(framebuffer));
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.commands.push(RenderCommand::Clear(flags));
    }

    fn add_batch(&mut self, mesh: &StaticMesh, material: &MaterialInstance) -> RenderResult<BatchHandle> {
        let vertex_count = mesh.vertex_count();
        if vertex_count == 0 {
            return Err(RenderError::ResourceCreationFailed(format!(
                "mesh '{}' has no vertex data",
                mesh.name
            )));
        }
        if let Some(attribute) = mesh.attributes.iter().find(|attribute| attribute.vertex_count() != vertex_count) {
            return Err(RenderError::ResourceCreationFailed(format!(
                "mesh '{}' attribute {:?} has {} vertices, expected {vertex_count}",
                mesh.name,
                attribute.kind,
                attribute.vertex_count()
            )));
        }
        let out_of_range = mesh
            .indices
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(|&index| index as usize >= vertex_count);
        if out_of_range {
            return Err(RenderError::ResourceCreationFailed(format!(
                "mesh '{}' has an index past its {vertex_count} vertices",
                mesh.name
            )));
        }
        match self.programs.get(key_from_bits(material.program.0)) {
            Some(program) if !program.compute => {}
            _ => {
                return Err(RenderError::ResourceCreationFailed(format!(
                    "material '{}' has no graphics program",
                    material.name
                )))
            }
        }

        let vertex_bytes: usize = mesh
            .attributes
            .iter()
            .map(|attribute| bytemuck::cast_slice::<f32, u8>(&attribute.data).len())
            .sum();
        let index_bytes = mesh
            .indices
            .as_deref()
            .map_or(0, |indices| bytemuck::cast_slice::<u32, u8>(indices).len());

        let key = self.batches.insert(BatchRecord {
            mesh: mesh.name.clone(),
            bytes: vertex_bytes + index_bytes,
        });
        let batch = BatchHandle(key_to_bits(key));
        debug!("Uploaded batch for '{}' ({} bytes)", mesh.name, vertex_bytes + index_bytes);
        self.commands.push(RenderCommand::AddBatch {
            mesh: mesh.name.clone(),
            batch,
        });
        Ok(batch)
    }

    fn release_batch(&mut self, batch: BatchHandle) {
        if let Some(record) = self.batches.remove(key_from_bits(batch.0)) {
            trace!("Released batch of '{}'", record.mesh);
            self.commands.push(RenderCommand::ReleaseBatch(batch));
        }
    }

    fn draw(&mut self, model: &Mat4, mesh: &StaticMesh, material: &MaterialInstance) -> RenderResult<()> {
        self.record_draw(model, mesh, material, false)
    }

    fn draw_indexed(&mut self, model: &Mat4, mesh: &StaticMesh, material: &MaterialInstance) -> RenderResult<()> {
        self.record_draw(model, mesh, material, true)
    }

    fn bind_image(&mut self, binding: u32, texture: TextureHandle, access: ImageAccess, format: ImageFormat) {
        self.commands.push(RenderCommand::BindImage {
            binding,
            texture,
            access,
            format,
        });
    }

    fn dispatch_compute(
        &mut self,
        program: ProgramHandle,
        uniforms: &[(String, UniformValue)],
        work_groups: [u32; 3],
    ) -> RenderResult<()> {
        match self.programs.get(key_from_bits(program.0)) {
            Some(record) if record.compute => {}
            Some(record) => {
                return Err(RenderError::RenderingFailed(format!(
                    "program '{}' is not a compute program",
                    record.name
                )))
            }
            None => return Err(RenderError::RenderingFailed("dispatch of a released program".to_string())),
        }
        if work_groups.contains(&0) {
            return Err(RenderError::RenderingFailed(format!("empty workgroup grid {work_groups:?}")));
        }
        self.commands.push(RenderCommand::DispatchCompute {
            program,
            work_groups,
            uniforms: uniforms.to_vec(),
        });
        Ok(())
    }

    fn memory_barrier(&mut self, barrier: BarrierFlags) {
        self.commands.push(RenderCommand::MemoryBarrier(barrier));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{AttributeKind, VertexAttribute};
    use crate::render::resources::{MaterialData, MaterialDescriptor, ShaderLibrary};

    fn material(renderer: &mut HeadlessRenderer) -> MaterialInstance {
        let mut shaders = ShaderLibrary::new();
        shaders
            .build("flat", ShaderSources::graphics("uniform mat4 u_Model;", ""), renderer)
            .unwrap();
        MaterialInstance::new(
            "M_Flat",
            MaterialData::new("flat"),
            MaterialDescriptor::default(),
            shaders.get("flat").unwrap(),
        )
    }

    fn triangle() -> StaticMesh {
        StaticMesh::new(
            "triangle",
            vec![VertexAttribute::new(AttributeKind::Position, 3, vec![0.0; 9])],
            Some(vec![0, 1, 2]),
        )
    }

    #[test]
    fn test_batch_bytes_cover_vertices_and_indices() {
        let mut renderer = HeadlessRenderer::new();
        let material = material(&mut renderer);
        let batch = renderer.add_batch(&triangle(), &material).unwrap();
        assert_eq!(renderer.batch_bytes(), 9 * 4 + 3 * 4);

        renderer.release_batch(batch);
        assert_eq!(renderer.live_batches(), 0);
    }

    #[test]
    fn test_draw_requires_a_live_batch() {
        let mut renderer = HeadlessRenderer::new();
        let material = material(&mut renderer);
        let mut mesh = triangle();
        assert!(renderer.draw(&Mat4::identity(), &mesh, &material).is_err());

        let batch = renderer.add_batch(&mesh, &material).unwrap();
        mesh.batch = Some(batch);
        renderer.draw_indexed(&Mat4::identity(), &mesh, &material).unwrap();
        renderer.release_batch(batch);
        assert!(renderer.draw_indexed(&Mat4::identity(), &mesh, &material).is_err());
        assert_eq!(renderer.draw_count(), 1);
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let mut renderer = HeadlessRenderer::new();
        let material = material(&mut renderer);
        let mut mesh = triangle();
        mesh.indices = Some(vec![0, 1, 3]);
        assert!(matches!(
            renderer.add_batch(&mesh, &material),
            Err(RenderError::ResourceCreationFailed(_))
        ));
    }

    #[test]
    fn test_compile_error_names_the_stage() {
        let mut renderer = HeadlessRenderer::new();
        let sources = ShaderSources::graphics("void main() {}", "#error unterminated block");
        match renderer.compile_program("broken", &sources) {
            Err(RenderError::ShaderCompilation { stage, log, .. }) => {
                assert_eq!(stage, crate::render::backend::ShaderStage::Fragment);
                assert_eq!(log, "#error unterminated block");
            }
            other => panic!("expected a compile error, got {other:?}"),
        }
        assert_eq!(renderer.live_programs(), 0);
    }

    #[test]
    fn test_update_texture_tracks_size() {
        let mut renderer = HeadlessRenderer::new();
        let descriptor = TextureDescriptor::default();
        let texture = renderer
            .create_texture("target", &TextureData::empty(4, 4), &descriptor)
            .unwrap();
        renderer
            .update_texture(texture, &TextureData::empty(8, 2))
            .unwrap();
        assert_eq!(renderer.texture_size(texture), Some((8, 2)));

        renderer.release_texture(texture);
        assert_eq!(renderer.texture_size(texture), None);
    }

    #[test]
    fn test_begin_frame_requires_initialize() {
        let mut renderer = HeadlessRenderer::with_size(64, 64);
        assert!(renderer.begin_frame([0.0; 4]).is_err());
        renderer.initialize().unwrap();
        renderer.begin_frame([0.0; 4]).unwrap();
        assert_eq!(renderer.frame_count(), 1);
    }

    #[test]
    fn test_command_log_keeps_recent_frames_only() {
        let mut renderer = HeadlessRenderer::new();
        renderer.initialize().unwrap();
        let material = material(&mut renderer);
        let mut mesh = triangle();
        mesh.batch = Some(renderer.add_batch(&mesh, &material).unwrap());

        let mut sizes = Vec::new();
        for _ in 0..50 {
            renderer.begin_frame([0.0; 4]).unwrap();
            renderer.draw_indexed(&Mat4::identity(), &mesh, &material).unwrap();
            renderer.end_frame().unwrap();
            sizes.push(renderer.commands().len());
        }

        // BeginFrame, Clear, Draw, EndFrame per frame
        assert_eq!(sizes[49], DEFAULT_FRAME_HISTORY * 4);
        assert_eq!(sizes[10], sizes[49]);
        assert_eq!(renderer.commands()[0], RenderCommand::BeginFrame);
        assert_eq!(renderer.draws().count(), DEFAULT_FRAME_HISTORY);
        assert_eq!(renderer.draw_count(), 50);
    }

    #[test]
    fn test_frame_history_is_configurable() {
        let mut renderer = HeadlessRenderer::new().with_frame_history(1);
        renderer.initialize().unwrap();
        renderer.begin_frame([0.0; 4]).unwrap();
        renderer.resize(64, 64);
        renderer.end_frame().unwrap();
        renderer.begin_frame([0.0; 4]).unwrap();
        renderer.end_frame().unwrap();

        assert_eq!(
            renderer.commands(),
            &[
                RenderCommand::BeginFrame,
                RenderCommand::Clear(ClearFlags::COLOR | ClearFlags::DEPTH),
                RenderCommand::EndFrame,
            ]
        );
    }
}
