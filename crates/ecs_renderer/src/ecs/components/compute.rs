//! Compute dispatch component

use std::collections::BTreeMap;

use crate::ecs::Component;
use crate::render::backend::{ImageAccess, ImageFormat, ProgramHandle};
use crate::render::uniforms::UniformValue;

/// A texture bound as a storage image for a dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBinding {
    /// Image unit
    pub binding: u32,
    /// Texture library key
    pub texture: String,
    /// Read/write mode
    pub access: ImageAccess,
    /// Texel format the shader sees
    pub format: ImageFormat,
}

/// Runs a compute program once per frame while `enabled`
#[derive(Debug, Clone, PartialEq)]
pub struct Compute {
    /// Shader library key of a compute program
    pub shader: String,
    /// Storage images
    pub images: Vec<ImageBinding>,
    /// Name-keyed uniform values; undeclared names are skipped
    pub uniforms: BTreeMap<String, UniformValue>,
    /// Workgroup grid
    pub work_groups: [u32; 3],
    /// Dispatch every frame while set
    pub enabled: bool,
    /// Resolved program
    pub program: Option<ProgramHandle>,
    /// Dispatches issued so far
    pub dispatch_count: u64,
}

impl Component for Compute {}

impl Compute {
    /// Enabled dispatch of a library shader over the given grid
    pub fn new(shader: impl Into<String>, work_groups: [u32; 3]) -> Self {
        Self {
            shader: shader.into(),
            images: Vec::new(),
            uniforms: BTreeMap::new(),
            work_groups,
            enabled: true,
            program: None,
            dispatch_count: 0,
        }
    }

    /// Builder pattern: bind a texture as a storage image
    pub fn with_image(mut self, binding: u32, texture: impl Into<String>, access: ImageAccess, format: ImageFormat) -> Self {
        self.images.push(ImageBinding {
            binding,
            texture: texture.into(),
            access,
            format,
        });
        self
    }

    /// Builder pattern: set a uniform value
    pub fn with_uniform(mut self, name: impl Into<String>, value: UniformValue) -> Self {
        self.uniforms.insert(name.into(), value);
        self
    }
}
