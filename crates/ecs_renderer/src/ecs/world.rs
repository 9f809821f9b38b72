//! ECS World: entity registry plus component storage
//!
//! The world also enforces the cross-component invariants of the scene:
//! link consistency (no cycles, both sides of a parent/child relation kept in
//! sync), a single primary camera, and release of GPU batches owned by
//! destroyed entities.

use std::any::{Any, TypeId};
use std::collections::HashSet;

use log::{debug, warn};

use super::component::{Component, ComponentTypeId, Filter};
use super::components::{Camera, Link, Material, StaticMesh};
use super::entity::{Entity, EntityRegistry};
use super::storage::ComponentStorage;
use crate::render::backend::BatchHandle;
use crate::scene::{SceneError, SceneResult};

/// Entities and their components
#[derive(Default)]
pub struct World {
    entities: EntityRegistry,
    components: ComponentStorage,
    released_batches: Vec<BatchHandle>,
}

impl World {
    /// Create an empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new entity
    pub fn enroll_entity(&mut self) -> Entity {
        self.entities.enroll_entity()
    }

    /// Whether the entity exists
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(entity)
    }

    /// Live entities in ascending order
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter()
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Destroy an entity and every component it holds
    ///
    /// Children become roots, the entity leaves its parent's child list, and
    /// a built mesh batch is queued for release on the next render pass.
    pub fn destroy_entity(&mut self, entity: Entity) -> SceneResult<()> {
        if !self.entities.contains(entity) {
            return Err(SceneError::EntityNotFound(entity));
        }

        self.detach_link(entity);
        if let Some(batch) = self.components.get::<StaticMesh>(entity).and_then(|mesh| mesh.batch) {
            self.released_batches.push(batch);
        }

        let removed = self.components.remove_all(entity);
        self.entities.remove(entity);
        debug!("Destroyed {entity} ({removed} components)");
        Ok(())
    }

    /// Register a component type so filters naming it are accepted
    pub fn register_component<T: Component>(&mut self) {
        self.components.register::<T>();
    }

    /// Whether a component type is registered
    pub fn is_registered(&self, type_id: ComponentTypeId) -> bool {
        self.components.is_registered(type_id)
    }

    /// Attach a component, replacing any previous one of the same type
    ///
    /// Attaching a primary `Camera` demotes every other camera. A `Link`
    /// must be attached through [`World::attach_link`]. A replaced
    /// `StaticMesh` has its batch queued for release, and attaching a
    /// `Material` schedules a rebuild of the entity's mesh.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> SceneResult<()> {
        if !self.entities.contains(entity) {
            return Err(SceneError::EntityNotFound(entity));
        }
        let any: &dyn Any = &component;
        if any.is::<Link>() {
            return Err(SceneError::LinkThroughAddComponent(entity));
        }
        let demote_cameras = any.downcast_ref::<Camera>().is_some_and(|camera| camera.primary);
        let material_changed = any.is::<Material>();

        if let Some(previous) = self.components.add(entity, component) {
            self.queue_batch_release(&previous);
        }
        if demote_cameras {
            self.demote_cameras_except(entity);
        }
        if material_changed {
            if let Some(mesh) = self.components.get_mut::<StaticMesh>(entity) {
                mesh.changed = true;
            }
        }
        Ok(())
    }

    /// Shared access to a component
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.components.get::<T>(entity)
    }

    /// Exclusive access to a component
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.components.get_mut::<T>(entity)
    }

    /// Exclusive access to two distinct component types of one entity
    pub fn get2_mut<A: Component, B: Component>(&mut self, entity: Entity) -> Option<(&mut A, &mut B)> {
        self.components.get2_mut::<A, B>(entity)
    }

    /// Whether the entity holds a `T`
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.components.has::<T>(entity)
    }

    /// Detach a component
    ///
    /// Removing a `Link` detaches the entity from its parent and turns its
    /// children into roots. Removing a built `StaticMesh` queues its batch
    /// for release; the returned mesh no longer owns it.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        if TypeId::of::<T>() == TypeId::of::<Link>() {
            self.detach_link(entity);
        }
        let mut removed = self.components.remove::<T>(entity)?;
        let any: &mut dyn Any = &mut removed;
        if let Some(mesh) = any.downcast_mut::<StaticMesh>() {
            if let Some(batch) = mesh.batch.take() {
                self.released_batches.push(batch);
                mesh.changed = true;
            }
        }
        Some(removed)
    }

    /// Entities matching every type of the filter, ascending
    pub fn query(&self, filter: &Filter) -> Vec<Entity> {
        if filter.is_empty() {
            return Vec::new();
        }
        self.components.matching(filter.types())
    }

    /// Whether the entity currently matches the filter
    pub fn matches(&self, entity: Entity, filter: &Filter) -> bool {
        !filter.is_empty()
            && filter
                .types()
                .iter()
                .all(|type_id| self.components.has_type(entity, *type_id))
    }

    /// Attach a `Link`, optionally parented
    ///
    /// On a rejected parent the link is not attached.
    pub fn attach_link(&mut self, entity: Entity, parent: Option<Entity>) -> SceneResult<()> {
        if !self.entities.contains(entity) {
            return Err(SceneError::EntityNotFound(entity));
        }
        if self.components.has::<Link>(entity) {
            return self.set_parent(entity, parent);
        }
        self.components.add(entity, Link::new());
        let result = self.set_parent(entity, parent);
        if result.is_err() {
            self.components.remove::<Link>(entity);
        }
        result
    }

    /// Reparent `child` under `parent` (or make it a root)
    ///
    /// Both entities must carry a `Link`; a parent that is `child` itself or
    /// one of its descendants is rejected with [`SceneError::ParentCycle`].
    pub fn set_parent(&mut self, child: Entity, parent: Option<Entity>) -> SceneResult<()> {
        let previous = self
            .components
            .get::<Link>(child)
            .ok_or(SceneError::MissingComponent { entity: child, component: "Link" })?
            .parent();

        if let Some(parent) = parent {
            if !self.entities.contains(parent) {
                return Err(SceneError::EntityNotFound(parent));
            }
            if !self.components.has::<Link>(parent) {
                return Err(SceneError::MissingComponent { entity: parent, component: "Link" });
            }
            if self.is_ancestor_or_self(child, parent) {
                return Err(SceneError::ParentCycle { child, parent });
            }
        }

        if previous == parent {
            return Ok(());
        }
        if let Some(old_link) = previous.and_then(|old| self.components.get_mut::<Link>(old)) {
            old_link.remove_child(child);
        }
        if let Some(new_link) = parent.and_then(|new| self.components.get_mut::<Link>(new)) {
            new_link.push_child(child);
        }
        if let Some(link) = self.components.get_mut::<Link>(child) {
            link.set_parent_unchecked(parent);
        }
        Ok(())
    }

    /// Whether `ancestor` is `entity` or appears on its parent chain
    pub fn is_ancestor_or_self(&self, ancestor: Entity, entity: Entity) -> bool {
        let mut visited = HashSet::new();
        let mut current = Some(entity);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            if !visited.insert(node) {
                warn!("Link cycle detected at {node}");
                return true;
            }
            current = self.components.get::<Link>(node).and_then(Link::parent);
        }
        false
    }

    /// Make `entity` the only primary camera
    pub fn set_primary_camera(&mut self, entity: Entity) -> SceneResult<()> {
        let camera = self
            .components
            .get_mut::<Camera>(entity)
            .ok_or(SceneError::MissingComponent { entity, component: "Camera" })?;
        camera.primary = true;
        self.demote_cameras_except(entity);
        Ok(())
    }

    /// Entity of the primary camera
    pub fn main_camera_entity(&self) -> Option<Entity> {
        let cameras = self.components.storage::<Camera>()?;
        cameras
            .iter()
            .filter(|(_, camera)| camera.primary)
            .map(|(entity, _)| entity)
            .min()
    }

    /// The primary camera
    pub fn main_camera(&self) -> Option<&Camera> {
        self.main_camera_entity().and_then(|entity| self.get::<Camera>(entity))
    }

    /// Take the batches of destroyed or replaced meshes that still need releasing
    pub fn drain_released_batches(&mut self) -> Vec<BatchHandle> {
        std::mem::take(&mut self.released_batches)
    }

    /// Queue every batch still owned by a mesh; the meshes are left unbuilt
    pub fn release_all_batches(&mut self) {
        let Some(meshes) = self.components.storage_mut::<StaticMesh>() else {
            return;
        };
        let entities: Vec<Entity> = meshes.iter().map(|(entity, _)| entity).collect();
        for entity in entities {
            let Some(mesh) = meshes.get_mut(entity) else {
                continue;
            };
            if let Some(batch) = mesh.batch.take() {
                self.released_batches.push(batch);
                mesh.changed = true;
            }
        }
    }

    fn queue_batch_release<T: Component>(&mut self, component: &T) {
        let any: &dyn Any = component;
        if let Some(batch) = any.downcast_ref::<StaticMesh>().and_then(|mesh| mesh.batch) {
            self.released_batches.push(batch);
        }
    }

    fn demote_cameras_except(&mut self, keep: Entity) {
        let Some(cameras) = self.components.storage_mut::<Camera>() else {
            return;
        };
        let others: Vec<Entity> = cameras
            .iter()
            .filter(|(entity, camera)| *entity != keep && camera.primary)
            .map(|(entity, _)| entity)
            .collect();
        for entity in others {
            if let Some(camera) = cameras.get_mut(entity) {
                camera.primary = false;
                debug!("Demoted primary camera on {entity}");
            }
        }
    }

    fn detach_link(&mut self, entity: Entity) {
        let Some(link) = self.components.get::<Link>(entity) else {
            return;
        };
        let parent = link.parent();
        let children = link.children().to_vec();
        if let Some(parent_link) = parent.and_then(|parent| self.components.get_mut::<Link>(parent)) {
            parent_link.remove_child(entity);
        }
        for child in children {
            if let Some(child_link) = self.components.get_mut::<Link>(child) {
                child_link.set_parent_unchecked(None);
            }
        }
    }
}
