//! Static mesh component and its vertex attribute arrays

use crate::ecs::Component;
use crate::render::backend::BatchHandle;

/// Semantic of a vertex attribute array
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeKind {
    /// Object-space positions
    Position,
    /// Vertex normals
    Normal,
    /// Texture coordinates
    TexCoord,
    /// Tangents
    Tangent,
    /// Bitangents
    Bitangent,
    /// Any other named attribute
    Custom(String),
}

/// One flat attribute array, `components` floats per vertex
#[derive(Debug, Clone, PartialEq)]
pub struct VertexAttribute {
    /// Semantic
    pub kind: AttributeKind,
    /// Floats per vertex (1..=4)
    pub components: u32,
    /// Flat data, `vertex_count * components` long
    pub data: Vec<f32>,
}

impl VertexAttribute {
    /// Create an attribute array
    pub fn new(kind: AttributeKind, components: u32, data: Vec<f32>) -> Self {
        Self { kind, components, data }
    }

    /// Number of vertices described by this array
    pub fn vertex_count(&self) -> usize {
        if self.components == 0 {
            0
        } else {
            self.data.len() / self.components as usize
        }
    }
}

/// Static mesh component
///
/// Owns the GPU batch built from its attributes. Setting `changed` makes the
/// render system release the old batch and build a new one before the next
/// draw. A clone never shares the batch: it starts unbuilt and is built on
/// its own.
#[derive(Debug, PartialEq)]
pub struct StaticMesh {
    /// Logical mesh name, also the mesh library key when `load_from_library` is set
    pub name: String,
    /// Vertex attribute arrays
    pub attributes: Vec<VertexAttribute>,
    /// Optional index buffer
    pub indices: Option<Vec<u32>>,
    /// Rebuild the batch before the next draw
    pub changed: bool,
    /// Fill `attributes` and `indices` from the mesh library on rebuild
    pub load_from_library: bool,
    /// Built GPU representation
    pub batch: Option<BatchHandle>,
}

impl Component for StaticMesh {}

impl Clone for StaticMesh {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            indices: self.indices.clone(),
            changed: true,
            load_from_library: self.load_from_library,
            batch: None,
        }
    }
}

impl StaticMesh {
    /// Mesh from explicit attributes; built on first sight by the render system
    pub fn new(name: impl Into<String>, attributes: Vec<VertexAttribute>, indices: Option<Vec<u32>>) -> Self {
        Self {
            name: name.into(),
            attributes,
            indices,
            changed: true,
            load_from_library: false,
            batch: None,
        }
    }

    /// Mesh whose data is fetched from the mesh library by name
    pub fn from_library(name: impl Into<String>) -> Self {
        Self {
            load_from_library: true,
            ..Self::new(name, Vec::new(), None)
        }
    }

    /// Number of vertices, taken from the position array
    pub fn vertex_count(&self) -> usize {
        self.attribute(&AttributeKind::Position)
            .or_else(|| self.attributes.first())
            .map_or(0, VertexAttribute::vertex_count)
    }

    /// First attribute of the given kind
    pub fn attribute(&self, kind: &AttributeKind) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|attribute| attribute.kind == *kind)
    }

    /// Replace (or add) the attribute of the given kind
    pub fn set_attribute(&mut self, attribute: VertexAttribute) {
        match self.attributes.iter_mut().find(|existing| existing.kind == attribute.kind) {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
    }

    /// Whether an index buffer is present
    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_count_prefers_positions() {
        let mesh = StaticMesh::new(
            "quad",
            vec![
                VertexAttribute::new(AttributeKind::TexCoord, 2, vec![0.0; 8]),
                VertexAttribute::new(AttributeKind::Position, 3, vec![0.0; 12]),
            ],
            Some(vec![0, 1, 2, 2, 3, 0]),
        );
        assert_eq!(mesh.vertex_count(), 4);
        assert!(mesh.changed);
        assert!(mesh.is_indexed());
    }

    #[test]
    fn test_set_attribute_replaces_same_kind() {
        let mut mesh = StaticMesh::new("m", Vec::new(), None);
        mesh.set_attribute(VertexAttribute::new(AttributeKind::Position, 3, vec![0.0; 3]));
        mesh.set_attribute(VertexAttribute::new(AttributeKind::Position, 3, vec![0.0; 6]));
        assert_eq!(mesh.attributes.len(), 1);
        assert_eq!(mesh.vertex_count(), 2);
    }

    #[test]
    fn test_clone_does_not_share_the_batch() {
        let mut mesh = StaticMesh::new("m", vec![VertexAttribute::new(AttributeKind::Position, 3, vec![0.0; 9])], None);
        mesh.changed = false;
        mesh.batch = Some(BatchHandle(5));

        let copy = mesh.clone();
        assert_eq!(copy.batch, None);
        assert!(copy.changed);
        assert_eq!(copy.attributes, mesh.attributes);
        assert_eq!(mesh.batch, Some(BatchHandle(5)));
    }
}
