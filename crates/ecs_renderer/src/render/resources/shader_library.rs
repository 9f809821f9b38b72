//! Shader library: compiled programs cached by logical name

use std::collections::{BTreeMap, HashMap};

use log::{debug, error};

use crate::render::backend::{ProgramHandle, Renderer, ShaderSources};
use crate::render::uniforms::{parse_uniforms, UniformType};
use crate::render::RenderResult;

/// A compiled program and the uniforms its stages declare
#[derive(Debug, Clone)]
pub struct ShaderData {
    /// Logical name
    pub name: String,
    /// Backend program
    pub program: ProgramHandle,
    /// Stage sources the program was built from
    pub sources: ShaderSources,
    /// Union of the uniforms declared by every stage
    pub uniforms: BTreeMap<String, UniformType>,
}

impl ShaderData {
    /// Whether any stage declares the uniform
    pub fn declares(&self, name: &str) -> bool {
        self.uniforms.contains_key(name)
    }
}

/// Compiled programs by name
#[derive(Debug, Default)]
pub struct ShaderLibrary {
    shaders: HashMap<String, ShaderData>,
    build_count: usize,
}

impl ShaderLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a program, or return the cached one for `name`
    ///
    /// A failed compile caches nothing and surfaces the backend diagnostic.
    pub fn build(&mut self, name: &str, sources: ShaderSources, renderer: &mut dyn Renderer) -> RenderResult<ProgramHandle> {
        if let Some(shader) = self.shaders.get(name) {
            return Ok(shader.program);
        }

        let program = renderer.compile_program(name, &sources).map_err(|e| {
            error!("Shader '{name}' failed to build: {e}");
            e
        })?;
        self.build_count += 1;

        let mut uniforms = BTreeMap::new();
        for (_, source) in sources.stages() {
            uniforms.extend(Self::parse(source));
        }
        debug!("Built shader '{name}' with {} uniforms", uniforms.len());

        self.shaders.insert(
            name.to_string(),
            ShaderData {
                name: name.to_string(),
                program,
                sources,
                uniforms,
            },
        );
        Ok(program)
    }

    /// Compile a compute-only program
    pub fn build_compute(&mut self, name: &str, source: impl Into<String>, renderer: &mut dyn Renderer) -> RenderResult<ProgramHandle> {
        self.build(name, ShaderSources::compute(source), renderer)
    }

    /// Cached program data
    pub fn get(&self, name: &str) -> Option<&ShaderData> {
        self.shaders.get(name)
    }

    /// Uniform names and types declared in one source
    pub fn parse(source: &str) -> BTreeMap<String, UniformType> {
        parse_uniforms(source)
    }

    /// Number of programs actually compiled (cache hits excluded)
    pub fn build_count(&self) -> usize {
        self.build_count
    }

    /// Number of cached programs
    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }

    /// Release every program
    pub fn clear(&mut self, renderer: &mut dyn Renderer) {
        for (_, shader) in self.shaders.drain() {
            renderer.release_program(shader.program);
        }
    }
}
