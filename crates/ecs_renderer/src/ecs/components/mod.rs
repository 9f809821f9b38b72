//! ECS Components module
//!
//! Plain data records attached to entities. Logic lives in `ecs::systems`.

pub mod camera;
pub mod camera_controller;
pub mod clip_plane;
pub mod compute;
pub mod info;
pub mod light;
pub mod link;
pub mod material;
pub mod static_mesh;
pub mod terrain;
pub mod transform;

pub use camera::{Camera, CameraKind};
pub use camera_controller::CameraController;
pub use clip_plane::ClipPlane;
pub use compute::{Compute, ImageBinding};
pub use info::Info;
pub use light::Light;
pub use link::Link;
pub use material::Material;
pub use static_mesh::{AttributeKind, StaticMesh, VertexAttribute};
pub use terrain::Terrain;
pub use transform::Transform;
