//! Mesh library: CPU-side mesh data loaded once and shared by name

use std::collections::HashMap;
use std::path::Path;

use log::debug;

use crate::assets::ObjLoader;
use crate::ecs::components::{AttributeKind, VertexAttribute};
use crate::render::RenderResult;

/// Per-vertex mesh arrays
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Positions
    pub positions: Vec<[f32; 3]>,
    /// Normals, empty or one per position
    pub normals: Vec<[f32; 3]>,
    /// Texture coordinates, empty or one per position
    pub tex_coords: Vec<[f32; 2]>,
    /// Triangle list indices
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Flatten into static mesh attribute arrays
    pub fn to_attributes(&self) -> Vec<VertexAttribute> {
        let mut attributes = vec![VertexAttribute::new(
            AttributeKind::Position,
            3,
            bytemuck::cast_slice::<[f32; 3], f32>(&self.positions).to_vec(),
        )];
        if !self.normals.is_empty() {
            attributes.push(VertexAttribute::new(
                AttributeKind::Normal,
                3,
                bytemuck::cast_slice::<[f32; 3], f32>(&self.normals).to_vec(),
            ));
        }
        if !self.tex_coords.is_empty() {
            attributes.push(VertexAttribute::new(
                AttributeKind::TexCoord,
                2,
                bytemuck::cast_slice::<[f32; 2], f32>(&self.tex_coords).to_vec(),
            ));
        }
        attributes
    }

    /// Index buffer, `None` when the mesh is not indexed
    pub fn index_buffer(&self) -> Option<Vec<u32>> {
        (!self.indices.is_empty()).then(|| self.indices.clone())
    }

    /// Unit quad in the XY plane facing +Z
    pub fn quad() -> Self {
        Self {
            positions: vec![[-0.5, -0.5, 0.0], [0.5, -0.5, 0.0], [0.5, 0.5, 0.0], [-0.5, 0.5, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 4],
            tex_coords: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }

    /// Unit cube centered at the origin, four vertices per face
    pub fn cube() -> Self {
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ];
        let corners = [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)];
        let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

        let mut mesh = Self::default();
        for (normal, u, v) in faces {
            let base = mesh.positions.len() as u32;
            for ((cu, cv), uv) in corners.iter().zip(uvs) {
                let position: [f32; 3] =
                    std::array::from_fn(|axis| normal[axis] * 0.5 + u[axis] * cu + v[axis] * cv);
                mesh.positions.push(position);
                mesh.normals.push(normal);
                mesh.tex_coords.push(uv);
            }
            mesh.indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        mesh
    }
}

/// Mesh data by logical name
#[derive(Debug, Default)]
pub struct MeshLibrary {
    meshes: HashMap<String, MeshData>,
    load_count: usize,
}

impl MeshLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an OBJ file under `name`, or return the cached data
    pub fn build(&mut self, name: &str, path: impl AsRef<Path>) -> RenderResult<&MeshData> {
        if !self.meshes.contains_key(name) {
            let data = ObjLoader::load_obj(path.as_ref())?;
            debug!(
                "Loaded mesh '{name}' from {} ({} vertices)",
                path.as_ref().display(),
                data.vertex_count()
            );
            self.meshes.insert(name.to_string(), data);
            self.load_count += 1;
        }
        Ok(&self.meshes[name])
    }

    /// Register procedurally generated data; an existing entry is replaced
    pub fn insert(&mut self, name: impl Into<String>, data: MeshData) {
        self.meshes.insert(name.into(), data);
    }

    /// Mesh data by name
    pub fn get(&self, name: &str) -> Option<&MeshData> {
        self.meshes.get(name)
    }

    /// Number of files actually loaded (cache hits excluded)
    pub fn load_count(&self) -> usize {
        self.load_count
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.meshes.clear();
    }
}
