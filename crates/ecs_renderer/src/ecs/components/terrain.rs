//! Procedural terrain patch parameters

use crate::ecs::{Component, Entity};
use crate::foundation::math::Vec2;

/// Flat patch grid regenerated by the terrain generation system
#[derive(Debug, Clone, PartialEq)]
pub struct Terrain {
    /// World extent of the patch along X and Z
    pub scale: f32,
    /// Height multiplier applied by the tessellation shader
    pub elevation_scale: f32,
    /// Height map resolution
    pub map_size: u32,
    /// Quads per side
    pub patch_resolution: u32,
    /// Control points per tessellation patch
    pub vertices_per_patch: u32,
    /// Camera the terrain follows
    pub camera: Option<Entity>,
    /// XZ position to move the terrain to when `camera_moved` is set
    pub camera_coords: Vec2,
    /// Regenerate the grid on the next update
    pub generate: bool,
    /// Recenter on `camera_coords` on the next update
    pub camera_moved: bool,
    /// `(scale, patch_resolution)` of the grid currently in the mesh
    pub generated_key: Option<(f32, u32)>,
}

impl Component for Terrain {}

impl Terrain {
    /// Terrain that generates on its first update
    pub fn new(scale: f32, elevation_scale: f32, map_size: u32, patch_resolution: u32) -> Self {
        Self {
            scale,
            elevation_scale,
            map_size,
            patch_resolution,
            vertices_per_patch: 4,
            camera: None,
            camera_coords: Vec2::zeros(),
            generate: true,
            camera_moved: false,
            generated_key: None,
        }
    }
}
