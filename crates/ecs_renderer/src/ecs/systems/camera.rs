//! Camera matrices from world transforms

use crate::ecs::components::{Camera, Transform};
use crate::ecs::system::{FrameContext, System, SystemError, SystemResult};
use crate::ecs::{Entity, Filter, World};

/// Recomputes view, projection and view-projection of every camera
///
/// Cameras with `auto_aspect` follow the main surface's aspect ratio.
#[derive(Debug, Default)]
pub struct CameraSystem;

impl CameraSystem {
    /// Create the system
    pub fn new() -> Self {
        Self
    }
}

impl System for CameraSystem {
    fn name(&self) -> &str {
        "CameraSystem"
    }

    fn filter(&self) -> Filter {
        Filter::of::<(Camera, Transform)>()
    }

    fn on_update_entity(&mut self, entity: Entity, world: &mut World, ctx: &mut FrameContext<'_>) -> SystemResult<()> {
        let (camera, transform) = world
            .get2_mut::<Camera, Transform>(entity)
            .ok_or(SystemError::MissingComponent {
                entity,
                component: "Camera/Transform",
            })?;
        let (width, height) = ctx.surface_size;
        if camera.auto_aspect && width > 0 && height > 0 {
            camera.aspect_ratio = width as f32 / height as f32;
        }
        camera.update_from_world(&transform.world_matrix);
        Ok(())
    }
}
