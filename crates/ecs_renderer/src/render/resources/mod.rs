//! Resource libraries
//!
//! GPU-facing resources are owned by the library that built them and shared
//! by logical name. Each library caches on first build; releasing happens
//! only through `clear`.

use std::fmt;

pub mod material_library;
pub mod mesh_library;
pub mod shader_library;
pub mod texture_library;

pub use material_library::{MaterialData, MaterialDescriptor, MaterialHandle, MaterialInstance, MaterialLibrary};
pub use mesh_library::{MeshData, MeshLibrary};
pub use shader_library::{ShaderData, ShaderLibrary};
pub use texture_library::{
    FilterMode, TextureData, TextureDescriptor, TextureFormat, TextureLibrary, WrapMode, MAX_TEXTURE_SLOTS,
};

use super::backend::Renderer;

/// Kind of library resource, used in lookup errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Shader program
    Shader,
    /// Material instance
    Material,
    /// Texture
    Texture,
    /// Mesh data
    Mesh,
    /// Offscreen framebuffer
    Framebuffer,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Shader => "shader",
            Self::Material => "material",
            Self::Texture => "texture",
            Self::Mesh => "mesh",
            Self::Framebuffer => "framebuffer",
        };
        f.write_str(name)
    }
}

/// Every resource library, handed to systems through the frame context
#[derive(Debug, Default)]
pub struct ResourceLibraries {
    /// Compiled programs
    pub shaders: ShaderLibrary,
    /// Material instances
    pub materials: MaterialLibrary,
    /// Textures
    pub textures: TextureLibrary,
    /// CPU mesh data
    pub meshes: MeshLibrary,
}

impl ResourceLibraries {
    /// Empty libraries
    pub fn new() -> Self {
        Self::default()
    }

    /// Release every GPU resource and drop all cached entries
    pub fn clear(&mut self, renderer: &mut dyn Renderer) {
        self.materials.clear();
        self.textures.clear(renderer);
        self.shaders.clear(renderer);
        self.meshes.clear();
    }
}
