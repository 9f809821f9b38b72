//! Texture library: textures cached by logical name, bound to sampler slots
//! in build order

use std::collections::HashMap;

use log::{debug, warn};

use super::ResourceKind;
use crate::render::backend::{Renderer, TextureHandle};
use crate::render::{RenderError, RenderResult};

/// Number of sampler slots bound by [`TextureLibrary::bind_textures`]
pub const MAX_TEXTURE_SLOTS: usize = 16;

/// Texel storage format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// 8-bit RGBA
    Rgba8,
    /// 8-bit RGB
    Rgb8,
    /// One 32-bit float channel
    R32F,
    /// Four 32-bit float channels
    Rgba32F,
    /// 32-bit float depth
    Depth32F,
}

impl TextureFormat {
    /// Bytes per texel
    pub fn bytes_per_texel(self) -> usize {
        match self {
            Self::Rgba8 | Self::R32F | Self::Depth32F => 4,
            Self::Rgb8 => 3,
            Self::Rgba32F => 16,
        }
    }
}

/// Edge sampling behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    /// Tile
    Repeat,
    /// Clamp to the edge texel
    ClampToEdge,
    /// Clamp to a border color
    ClampToBorder,
}

/// Minification/magnification filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Nearest texel
    Nearest,
    /// Bilinear
    Linear,
}

/// Sampling and storage parameters of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDescriptor {
    /// Storage format
    pub format: TextureFormat,
    /// Edge behavior
    pub wrap: WrapMode,
    /// Minification filter
    pub min_filter: FilterMode,
    /// Magnification filter
    pub mag_filter: FilterMode,
    /// Generate a mip chain
    pub mipmaps: bool,
}

impl Default for TextureDescriptor {
    fn default() -> Self {
        Self {
            format: TextureFormat::Rgba8,
            wrap: WrapMode::Repeat,
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
            mipmaps: true,
        }
    }
}

impl TextureDescriptor {
    /// Depth attachment sampled for shadows
    pub fn depth() -> Self {
        Self {
            format: TextureFormat::Depth32F,
            wrap: WrapMode::ClampToBorder,
            min_filter: FilterMode::Nearest,
            mag_filter: FilterMode::Nearest,
            mipmaps: false,
        }
    }

    /// Color attachment of an offscreen pass
    pub fn render_target() -> Self {
        Self {
            format: TextureFormat::Rgb8,
            wrap: WrapMode::ClampToEdge,
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
            mipmaps: false,
        }
    }
}

/// Texel data handed to the backend
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Raw bytes; `None` allocates uninitialized storage
    pub pixels: Option<Vec<u8>>,
}

impl TextureData {
    /// Uninitialized storage, e.g. a render target
    pub fn empty(width: u32, height: u32) -> Self {
        Self { width, height, pixels: None }
    }

    /// Raw byte data
    pub fn from_bytes(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels: Some(pixels),
        }
    }

    /// Float data, e.g. a height map
    pub fn from_f32(width: u32, height: u32, texels: &[f32]) -> Self {
        Self::from_bytes(width, height, bytemuck::cast_slice(texels).to_vec())
    }
}

#[derive(Debug)]
struct TextureEntry {
    name: String,
    handle: TextureHandle,
}

/// Textures by name; slot = build order
#[derive(Debug, Default)]
pub struct TextureLibrary {
    entries: Vec<TextureEntry>,
    by_name: HashMap<String, usize>,
    build_count: usize,
}

impl TextureLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a texture, or return the cached handle for `name`
    pub fn build(
        &mut self,
        name: &str,
        data: TextureData,
        descriptor: Option<TextureDescriptor>,
        renderer: &mut dyn Renderer,
    ) -> RenderResult<TextureHandle> {
        if let Some(&index) = self.by_name.get(name) {
            return Ok(self.entries[index].handle);
        }
        let descriptor = descriptor.unwrap_or_default();
        let handle = renderer.create_texture(name, &data, &descriptor)?;
        self.by_name.insert(name.to_string(), self.entries.len());
        self.entries.push(TextureEntry {
            name: name.to_string(),
            handle,
        });
        self.build_count += 1;
        debug!("Built texture '{name}' ({}x{}, {:?})", data.width, data.height, descriptor.format);
        Ok(handle)
    }

    /// Replace the contents of an existing texture
    pub fn update(&mut self, name: &str, data: TextureData, renderer: &mut dyn Renderer) -> RenderResult<()> {
        let handle = self.get_id(name).ok_or_else(|| RenderError::UnknownResource {
            kind: ResourceKind::Texture,
            name: name.to_string(),
        })?;
        renderer.update_texture(handle, &data)
    }

    /// Backend handle by name
    pub fn get_id(&self, name: &str) -> Option<TextureHandle> {
        self.by_name.get(name).map(|&index| self.entries[index].handle)
    }

    /// Sampler slot by name
    pub fn get_slot(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).and_then(|&index| u32::try_from(index).ok())
    }

    /// Bind every texture to its slot
    pub fn bind_textures(&self, renderer: &mut dyn Renderer) {
        if self.entries.len() > MAX_TEXTURE_SLOTS {
            warn!(
                "{} textures built, only the first {MAX_TEXTURE_SLOTS} are bound",
                self.entries.len()
            );
        }
        for (slot, entry) in (0u32..).zip(self.entries.iter().take(MAX_TEXTURE_SLOTS)) {
            renderer.bind_texture(slot, entry.handle);
        }
    }

    /// Clear every bound slot
    pub fn unbind_textures(&self, renderer: &mut dyn Renderer) {
        for (slot, _) in (0u32..).zip(self.entries.iter().take(MAX_TEXTURE_SLOTS)) {
            renderer.unbind_texture(slot);
        }
    }

    /// Number of textures actually created (cache hits excluded)
    pub fn build_count(&self) -> usize {
        self.build_count
    }

    /// Names in slot order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Release every texture
    pub fn clear(&mut self, renderer: &mut dyn Renderer) {
        for entry in self.entries.drain(..) {
            renderer.release_texture(entry.handle);
        }
        self.by_name.clear();
    }
}
