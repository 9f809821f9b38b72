//! A loaded world and the systems that run over it

use log::info;

use super::{SceneError, SceneResult};
use crate::ecs::components::{
    Camera, CameraController, ClipPlane, Compute, Info, Light, Link, Material, StaticMesh, Terrain, Transform,
};
use crate::ecs::{Component, Entity, Filter, FrameContext, Scheduler, System, SystemInfo, SystemResult, World};
use crate::render::backend::Renderer;

/// Entities, components and ordered systems of one world
///
/// The world and the scheduler are separate fields so a frame can lend the
/// world to each system while the scheduler iterates.
pub struct Scene {
    name: String,
    world: World,
    scheduler: Scheduler,
}

impl Scene {
    /// Empty scene with the engine's component types registered
    pub fn new(name: impl Into<String>) -> Self {
        let mut world = World::new();
        world.register_component::<Transform>();
        world.register_component::<Link>();
        world.register_component::<Camera>();
        world.register_component::<StaticMesh>();
        world.register_component::<Material>();
        world.register_component::<Light>();
        world.register_component::<Info>();
        world.register_component::<ClipPlane>();
        world.register_component::<CameraController>();
        world.register_component::<Compute>();
        world.register_component::<Terrain>();
        Self {
            name: name.into(),
            world,
            scheduler: Scheduler::new(),
        }
    }

    /// Scene name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying world
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Underlying world, mutably
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Create an entity
    pub fn enroll_entity(&mut self) -> Entity {
        self.world.enroll_entity()
    }

    /// Create an entity with an `Info` tag
    pub fn enroll_tagged_entity(&mut self, tag: impl Into<String>) -> Entity {
        let entity = self.world.enroll_entity();
        // the entity was just created, so this cannot fail
        let _ = self.world.add_component(entity, Info::new(tag));
        entity
    }

    /// Destroy an entity and all its components
    pub fn destroy_entity(&mut self, entity: Entity) -> SceneResult<()> {
        self.world.destroy_entity(entity)
    }

    /// Register a custom component type for use in system filters
    pub fn register_component<T: Component>(&mut self) {
        self.world.register_component::<T>();
    }

    /// Attach a component
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> SceneResult<()> {
        self.world.add_component(entity, component)
    }

    /// Shared access to a component
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.world.get::<T>(entity)
    }

    /// Exclusive access to a component
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.world.get_mut::<T>(entity)
    }

    /// Whether the entity holds a `T`
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.world.has::<T>(entity)
    }

    /// Detach a component
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.world.remove_component::<T>(entity)
    }

    /// Attach a `Link`, optionally parented
    pub fn attach_link(&mut self, entity: Entity, parent: Option<Entity>) -> SceneResult<()> {
        self.world.attach_link(entity, parent)
    }

    /// Reparent an entity; cycles are rejected
    pub fn set_parent(&mut self, child: Entity, parent: Option<Entity>) -> SceneResult<()> {
        self.world.set_parent(child, parent)
    }

    /// Entities matching a filter
    pub fn query(&self, filter: &Filter) -> Vec<Entity> {
        self.world.query(filter)
    }

    /// Append a system
    ///
    /// Every component type in the system's filter must be registered.
    pub fn register_system(&mut self, system: impl System + 'static) -> SceneResult<()> {
        let filter = system.filter();
        if let Some(missing) = filter.types().iter().find(|type_id| !self.world.is_registered(**type_id)) {
            return Err(SceneError::UnregisteredComponent {
                system: system.name().to_string(),
                component: missing.short_name(),
            });
        }
        info!("Scene '{}': registering system '{}'", self.name, system.name());
        self.scheduler.add(Box::new(system))
    }

    /// Every registered system with its state
    pub fn get_systems(&self) -> Vec<SystemInfo> {
        self.scheduler.systems()
    }

    /// First system of type `T`
    pub fn get_system<T: System + 'static>(&self) -> Option<&T> {
        self.scheduler.get::<T>()
    }

    /// First system of type `T`, mutably
    pub fn get_system_mut<T: System + 'static>(&mut self) -> Option<&mut T> {
        self.scheduler.get_mut::<T>()
    }

    /// Pause a system by name
    pub fn pause_system(&mut self, name: &str) -> SceneResult<()> {
        self.scheduler.pause(name)
    }

    /// Resume a paused system
    pub fn resume_system(&mut self, name: &str) -> SceneResult<()> {
        self.scheduler.resume(name)
    }

    /// Destroy a system
    pub fn destroy_system(&mut self, name: &str) -> SceneResult<()> {
        self.scheduler.destroy(name)
    }

    /// Primary camera
    pub fn main_camera(&self) -> Option<&Camera> {
        self.world.main_camera()
    }

    /// Entity of the primary camera
    pub fn main_camera_entity(&self) -> Option<Entity> {
        self.world.main_camera_entity()
    }

    /// Free every batch the scene owns, including those still queued for release
    ///
    /// Returns the number of batches released.
    pub fn release_batches(&mut self, renderer: &mut dyn Renderer) -> usize {
        self.world.release_all_batches();
        let batches = self.world.drain_released_batches();
        for batch in &batches {
            renderer.release_batch(*batch);
        }
        batches.len()
    }

    /// Run one frame of every system
    pub fn update(&mut self, ctx: &mut FrameContext<'_>) -> SystemResult<()> {
        self.scheduler.run_frame(&mut self.world, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::Transform;

    struct Unregistered;
    impl Component for Unregistered {}

    struct NeedsUnregistered;
    impl System for NeedsUnregistered {
        fn name(&self) -> &str {
            "needs_unregistered"
        }

        fn filter(&self) -> Filter {
            Filter::of::<(Transform, Unregistered)>()
        }
    }

    #[test]
    fn test_unregistered_filter_type_is_fatal() {
        let mut scene = Scene::new("test");
        let error = scene.register_system(NeedsUnregistered).unwrap_err();
        assert!(matches!(error, SceneError::UnregisteredComponent { component: "Unregistered", .. }));
        assert!(error.is_fatal());
        assert!(scene.get_systems().is_empty());

        scene.register_component::<Unregistered>();
        scene.register_system(NeedsUnregistered).unwrap();
        assert_eq!(scene.get_systems().len(), 1);
    }

    #[test]
    fn test_duplicate_system_names_are_rejected() {
        let mut scene = Scene::new("test");
        scene.register_component::<Unregistered>();
        scene.register_system(NeedsUnregistered).unwrap();
        assert!(matches!(
            scene.register_system(NeedsUnregistered),
            Err(SceneError::DuplicateSystem(_))
        ));
    }
}
