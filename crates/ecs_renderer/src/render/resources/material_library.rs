//! Material library: material instances cached by logical name
//!
//! An instance pairs material parameters with a compiled shader and keeps
//! the uniform values staged for the next draw. Staging is data driven: a
//! value is only accepted when the shader declares a uniform of that name.

use std::collections::{BTreeMap, HashMap};

use log::debug;

use super::shader_library::{ShaderData, ShaderLibrary};
use super::ResourceKind;
use crate::foundation::math::Vec4;
use crate::render::backend::ProgramHandle;
use crate::render::uniforms::{UniformType, UniformValue};
use crate::render::{RenderError, RenderResult};

/// Index of an instance in the material library
///
/// Handles taken before a [`MaterialLibrary::clear`] carry an older
/// generation and no longer resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle {
    index: u32,
    generation: u32,
}

/// Shader and parameters of a material
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialData {
    /// Shader library key
    pub shader: String,
    /// Texture library keys; the first one selects `u_TextureId`
    pub textures: Vec<String>,
    /// Base color
    pub color: Vec4,
    /// Specular exponent
    pub glossiness: f32,
    /// Extra scalar or vector parameters, staged by name
    pub parameters: BTreeMap<String, UniformValue>,
}

impl MaterialData {
    /// White material on the given shader
    pub fn new(shader: impl Into<String>) -> Self {
        Self {
            shader: shader.into(),
            textures: Vec::new(),
            color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            glossiness: 3.0,
            parameters: BTreeMap::new(),
        }
    }

    /// Builder pattern: add a texture
    pub fn with_texture(mut self, texture: impl Into<String>) -> Self {
        self.textures.push(texture.into());
        self
    }

    /// Builder pattern: set the base color
    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    /// Builder pattern: set glossiness
    pub fn with_glossiness(mut self, glossiness: f32) -> Self {
        self.glossiness = glossiness;
        self
    }

    /// Builder pattern: set a named parameter
    pub fn with_parameter(mut self, name: impl Into<String>, value: UniformValue) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }
}

/// Pass participation of a material
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialDescriptor {
    /// Drawn into the shadow map
    pub cast_shadows: bool,
    /// Excluded from the reflection and refraction passes
    pub skip_auxiliary_passes: bool,
}

impl Default for MaterialDescriptor {
    fn default() -> Self {
        Self {
            cast_shadows: true,
            skip_auxiliary_passes: false,
        }
    }
}

/// A material bound to a compiled shader
#[derive(Debug, Clone)]
pub struct MaterialInstance {
    /// Logical name
    pub name: String,
    /// Shader library key
    pub shader: String,
    /// Compiled program
    pub program: ProgramHandle,
    /// Parameters
    pub data: MaterialData,
    /// Pass participation
    pub descriptor: MaterialDescriptor,
    uniform_types: BTreeMap<String, UniformType>,
    staged: BTreeMap<String, UniformValue>,
}

impl MaterialInstance {
    /// Bind material data to a compiled shader
    pub fn new(name: impl Into<String>, data: MaterialData, descriptor: MaterialDescriptor, shader: &ShaderData) -> Self {
        Self {
            name: name.into(),
            shader: shader.name.clone(),
            program: shader.program,
            data,
            descriptor,
            uniform_types: shader.uniforms.clone(),
            staged: BTreeMap::new(),
        }
    }

    /// Whether the shader declares the uniform
    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniform_types.contains_key(name)
    }

    /// Declared uniforms
    pub fn uniform_types(&self) -> &BTreeMap<String, UniformType> {
        &self.uniform_types
    }

    /// Stage a value for the next draw; undeclared names are skipped
    ///
    /// Returns whether the value was staged.
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) -> bool {
        if !self.has_uniform(name) {
            return false;
        }
        self.staged.insert(name.to_string(), value);
        true
    }

    /// Value staged for a uniform
    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.staged.get(name)
    }

    /// Every staged value
    pub fn staged_uniforms(&self) -> &BTreeMap<String, UniformValue> {
        &self.staged
    }

    /// Drop all staged values
    pub fn clear_staged(&mut self) {
        self.staged.clear();
    }
}

/// Material instances by name
#[derive(Debug, Default)]
pub struct MaterialLibrary {
    instances: Vec<MaterialInstance>,
    by_name: HashMap<String, MaterialHandle>,
    build_count: usize,
    generation: u32,
}

impl MaterialLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an instance, or return the cached handle for `name`
    ///
    /// The material's shader must already be in the shader library.
    pub fn build(
        &mut self,
        name: &str,
        data: MaterialData,
        descriptor: Option<MaterialDescriptor>,
        shaders: &ShaderLibrary,
    ) -> RenderResult<MaterialHandle> {
        if let Some(handle) = self.by_name.get(name) {
            return Ok(*handle);
        }
        let shader = shaders.get(&data.shader).ok_or_else(|| RenderError::UnknownResource {
            kind: ResourceKind::Shader,
            name: data.shader.clone(),
        })?;

        let index = u32::try_from(self.instances.len())
            .map_err(|_| RenderError::ResourceCreationFailed("material library is full".to_string()))?;
        let handle = MaterialHandle {
            index,
            generation: self.generation,
        };
        self.instances
            .push(MaterialInstance::new(name, data, descriptor.unwrap_or_default(), shader));
        self.by_name.insert(name.to_string(), handle);
        self.build_count += 1;
        debug!("Built material '{name}' on shader '{}'", shader.name);
        Ok(handle)
    }

    /// Instance by name
    pub fn get(&self, name: &str) -> Option<&MaterialInstance> {
        self.handle(name).and_then(|handle| self.instance(handle))
    }

    /// Handle by name
    pub fn handle(&self, name: &str) -> Option<MaterialHandle> {
        self.by_name.get(name).copied()
    }

    /// Instance by handle
    pub fn instance(&self, handle: MaterialHandle) -> Option<&MaterialInstance> {
        if handle.generation != self.generation {
            return None;
        }
        self.instances.get(handle.index as usize)
    }

    /// Instance by handle, mutably
    pub fn instance_mut(&mut self, handle: MaterialHandle) -> Option<&mut MaterialInstance> {
        if handle.generation != self.generation {
            return None;
        }
        self.instances.get_mut(handle.index as usize)
    }

    /// Number of instances actually built (cache hits excluded)
    pub fn build_count(&self) -> usize {
        self.build_count
    }

    /// Drop every instance; the programs stay owned by the shader library
    pub fn clear(&mut self) {
        self.instances.clear();
        self.by_name.clear();
        self.generation = self.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::ShaderSources;
    use crate::render::backends::HeadlessRenderer;

    fn shaders() -> ShaderLibrary {
        let mut renderer = HeadlessRenderer::new();
        let mut shaders = ShaderLibrary::new();
        shaders
            .build(
                "unlit",
                ShaderSources::graphics("uniform mat4 u_Model;", "uniform vec4 u_Color;"),
                &mut renderer,
            )
            .unwrap();
        shaders
    }

    #[test]
    fn test_build_is_cached_by_name() {
        let shaders = shaders();
        let mut materials = MaterialLibrary::new();
        let first = materials.build("M_Red", MaterialData::new("unlit"), None, &shaders).unwrap();
        let second = materials.build("M_Red", MaterialData::new("unlit"), None, &shaders).unwrap();
        assert_eq!(first, second);
        assert_eq!(materials.build_count(), 1);
        assert_eq!(materials.handle("M_Red"), Some(first));
    }

    #[test]
    fn test_unknown_shader_is_reported() {
        let shaders = shaders();
        let mut materials = MaterialLibrary::new();
        let result = materials.build("M_Bad", MaterialData::new("missing"), None, &shaders);
        assert!(matches!(
            result,
            Err(RenderError::UnknownResource { kind: ResourceKind::Shader, .. })
        ));
        assert!(materials.get("M_Bad").is_none());
    }

    #[test]
    fn test_only_declared_uniforms_are_staged() {
        let shaders = shaders();
        let mut materials = MaterialLibrary::new();
        let handle = materials.build("M", MaterialData::new("unlit"), None, &shaders).unwrap();
        let instance = materials.instance_mut(handle).unwrap();

        assert!(instance.set_uniform("u_Color", UniformValue::Vec4(Vec4::new(1.0, 0.0, 0.0, 1.0))));
        assert!(!instance.set_uniform("u_Time", UniformValue::Float(1.0)));
        assert_eq!(instance.staged_uniforms().len(), 1);
        assert!(instance.uniform("u_Time").is_none());
    }

    #[test]
    fn test_descriptor_defaults_to_shadow_casting() {
        let shaders = shaders();
        let mut materials = MaterialLibrary::new();
        let descriptor = MaterialDescriptor {
            cast_shadows: false,
            skip_auxiliary_passes: true,
        };
        materials.build("A", MaterialData::new("unlit"), None, &shaders).unwrap();
        materials.build("B", MaterialData::new("unlit"), Some(descriptor), &shaders).unwrap();
        assert!(materials.get("A").unwrap().descriptor.cast_shadows);
        assert!(materials.get("B").unwrap().descriptor.skip_auxiliary_passes);
    }

    #[test]
    fn test_handles_from_before_clear_do_not_resolve() {
        let shaders = shaders();
        let mut materials = MaterialLibrary::new();
        let stale = materials.build("M_Old", MaterialData::new("unlit"), None, &shaders).unwrap();

        materials.clear();
        let fresh = materials.build("M_New", MaterialData::new("unlit"), None, &shaders).unwrap();
        assert_ne!(stale, fresh);
        assert!(materials.instance(stale).is_none());
        assert!(materials.instance_mut(stale).is_none());
        assert_eq!(materials.instance(fresh).unwrap().name, "M_New");
    }
}
