//! ECS Systems module
//!
//! Built-in systems, in the order a scene normally registers them:
//! camera controller, terrain generation, transform, camera, rendering.

pub mod camera;
pub mod camera_controller;
pub mod static_mesh_rendering;
pub mod terrain_generation;
pub mod transform;

pub use camera::CameraSystem;
pub use camera_controller::CameraControllerSystem;
pub use static_mesh_rendering::{RenderStats, StaticMeshRenderingSystem};
pub use terrain_generation::{generate_patch_grid, TerrainGenerationSystem};
pub use transform::{resolve_hierarchy, TransformSystem};
