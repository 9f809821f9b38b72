//! Terrain patch generation
//!
//! The terrain mesh is a flat grid of `patch_resolution^2` quads, four
//! control points each, displaced later by the tessellation stages. The grid
//! is written into the entity's `StaticMesh` and flagged for rebuild.

use log::debug;

use crate::ecs::components::{AttributeKind, StaticMesh, Terrain, Transform, VertexAttribute};
use crate::ecs::system::{FrameContext, System, SystemError, SystemResult};
use crate::ecs::{Entity, Filter, World};
use crate::foundation::math::Vec2;

/// Flat patch grid centered at the origin
///
/// Returns flat positions (3 floats per vertex) and texture coordinates
/// (2 floats per vertex). Each quad emits its corners in the order
/// `(i, j), (i+1, j), (i, j+1), (i+1, j+1)`.
pub fn generate_patch_grid(scale: f32, resolution: u32) -> (Vec<f32>, Vec<f32>) {
    let quads = resolution as usize * resolution as usize;
    let mut positions = Vec::with_capacity(quads * 12);
    let mut tex_coords = Vec::with_capacity(quads * 8);
    let step = 1.0 / resolution.max(1) as f32;
    let half = scale / 2.0;

    for i in 0..resolution {
        for j in 0..resolution {
            for (di, dj) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let u = (i + di) as f32 * step;
                let v = (j + dj) as f32 * step;
                positions.extend_from_slice(&[-half + scale * u, 0.0, -half + scale * v]);
                tex_coords.extend_from_slice(&[u, v]);
            }
        }
    }
    (positions, tex_coords)
}

/// Builds and recenters terrain meshes
#[derive(Debug, Default)]
pub struct TerrainGenerationSystem {
    generated: usize,
}

impl TerrainGenerationSystem {
    /// Create the system
    pub fn new() -> Self {
        Self::default()
    }

    /// Grids generated since creation
    pub fn generated(&self) -> usize {
        self.generated
    }
}

impl System for TerrainGenerationSystem {
    fn name(&self) -> &str {
        "TerrainGenerationSystem"
    }

    fn filter(&self) -> Filter {
        Filter::of::<(Terrain, StaticMesh, Transform)>()
    }

    fn on_update_entity(&mut self, entity: Entity, world: &mut World, _ctx: &mut FrameContext<'_>) -> SystemResult<()> {
        let followed = world
            .get::<Terrain>(entity)
            .and_then(|terrain| terrain.camera)
            .and_then(|camera| world.get::<Transform>(camera))
            .map(|transform| {
                let position = transform.world_position();
                Vec2::new(position.x, position.z)
            });

        let missing = SystemError::MissingComponent {
            entity,
            component: "Terrain/Transform",
        };
        let (terrain, transform) = world.get2_mut::<Terrain, Transform>(entity).ok_or(missing)?;
        if let Some(coords) = followed.filter(|coords| *coords != terrain.camera_coords) {
            terrain.camera_coords = coords;
            terrain.camera_moved = true;
        }
        if terrain.camera_moved {
            let mut translation = transform.translation;
            translation.x = terrain.camera_coords.x;
            translation.z = terrain.camera_coords.y;
            transform.set_translation(translation);
            terrain.camera_moved = false;
        }
        if !terrain.generate {
            return Ok(());
        }
        terrain.generate = false;

        let key = (terrain.scale, terrain.patch_resolution);
        if terrain.generated_key == Some(key) {
            return Ok(());
        }
        terrain.generated_key = Some(key);

        let (positions, tex_coords) = generate_patch_grid(key.0, key.1);
        let mesh = world.get_mut::<StaticMesh>(entity).ok_or(SystemError::MissingComponent {
            entity,
            component: "StaticMesh",
        })?;
        mesh.attributes = vec![
            VertexAttribute::new(AttributeKind::Position, 3, positions),
            VertexAttribute::new(AttributeKind::TexCoord, 2, tex_coords),
        ];
        mesh.indices = None;
        mesh.load_from_library = false;
        mesh.changed = true;
        self.generated += 1;
        debug!("Generated terrain grid for {entity}: scale {}, {}x{} patches", key.0, key.1, key.1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_grid_has_four_corners_per_quad() {
        let (positions, tex_coords) = generate_patch_grid(10.0, 2);
        assert_eq!(positions.len(), 2 * 2 * 4 * 3);
        assert_eq!(tex_coords.len(), 2 * 2 * 4 * 2);
        // first quad: (-5, 0, -5) then (0, 0, -5)
        assert_relative_eq!(positions[0], -5.0);
        assert_relative_eq!(positions[2], -5.0);
        assert_relative_eq!(positions[3], 0.0);
        // last corner of the last quad is the far corner
        assert_relative_eq!(positions[positions.len() - 3], 5.0);
        assert_relative_eq!(tex_coords[tex_coords.len() - 1], 1.0);
    }

    #[test]
    fn test_zero_resolution_is_empty() {
        let (positions, tex_coords) = generate_patch_grid(10.0, 0);
        assert!(positions.is_empty() && tex_coords.is_empty());
    }
}
