//! Type-partitioned component storage
//!
//! Every component type lives in its own [`TypedStorage<T>`], a hash map
//! keyed by entity. The partitions are held behind the object-safe
//! [`AnyStorage`] trait so a whole entity can be removed without knowing
//! which types it carries.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use super::component::{Component, ComponentTypeId};
use super::entity::Entity;

/// Type-erased view of one component partition
pub trait AnyStorage: Any + Send + Sync {
    /// Drop the entity's component, if any
    fn remove_entity(&mut self, entity: Entity) -> bool;
    /// Whether the entity has a component in this partition
    fn contains(&self, entity: Entity) -> bool;
    /// Number of stored components
    fn len(&self) -> usize;
    /// Entities with a component in this partition (unordered)
    fn entities(&self) -> Vec<Entity>;
    /// Upcast for downcasting to `TypedStorage<T>`
    fn as_any(&self) -> &dyn Any;
    /// Mutable upcast
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Homogeneous storage of one component type
pub struct TypedStorage<T: Component> {
    data: HashMap<Entity, T>,
}

impl<T: Component> Default for TypedStorage<T> {
    fn default() -> Self {
        Self { data: HashMap::new() }
    }
}

impl<T: Component> TypedStorage<T> {
    /// Insert or replace; returns the previous value
    pub fn insert(&mut self, entity: Entity, component: T) -> Option<T> {
        self.data.insert(entity, component)
    }

    /// Shared access
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.data.get(&entity)
    }

    /// Exclusive access
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.data.get_mut(&entity)
    }

    /// Remove and return
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        self.data.remove(&entity)
    }

    /// Iterate `(entity, component)` pairs (unordered)
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.data.iter().map(|(entity, component)| (*entity, component))
    }
}

impl<T: Component> AnyStorage for TypedStorage<T> {
    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.data.remove(&entity).is_some()
    }

    fn contains(&self, entity: Entity) -> bool {
        self.data.contains_key(&entity)
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn entities(&self) -> Vec<Entity> {
        self.data.keys().copied().collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// All component partitions of one world
#[derive(Default)]
pub struct ComponentStorage {
    partitions: HashMap<TypeId, Box<dyn AnyStorage>>,
}

impl ComponentStorage {
    /// Create empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a partition for `T` exists
    pub fn register<T: Component>(&mut self) {
        self.partitions
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(TypedStorage::<T>::default()));
    }

    /// Whether a partition for the type exists
    pub fn is_registered(&self, type_id: ComponentTypeId) -> bool {
        self.partitions.contains_key(&type_id.type_id())
    }

    /// Typed partition, if registered
    pub fn storage<T: Component>(&self) -> Option<&TypedStorage<T>> {
        self.partitions
            .get(&TypeId::of::<T>())
            .and_then(|storage| storage.as_any().downcast_ref::<TypedStorage<T>>())
    }

    /// Mutable typed partition, if registered
    pub fn storage_mut<T: Component>(&mut self) -> Option<&mut TypedStorage<T>> {
        self.partitions
            .get_mut(&TypeId::of::<T>())
            .and_then(|storage| storage.as_any_mut().downcast_mut::<TypedStorage<T>>())
    }

    /// Attach a component, registering its type on first use
    pub fn add<T: Component>(&mut self, entity: Entity, component: T) -> Option<T> {
        self.register::<T>();
        self.storage_mut::<T>()
            .and_then(|storage| storage.insert(entity, component))
    }

    /// Shared access to the entity's `T`
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.storage::<T>().and_then(|storage| storage.get(entity))
    }

    /// Exclusive access to the entity's `T`
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.storage_mut::<T>().and_then(|storage| storage.get_mut(entity))
    }

    /// Exclusive access to two different component types of one entity
    ///
    /// Returns `None` if `A` and `B` are the same type or either is missing.
    pub fn get2_mut<A: Component, B: Component>(&mut self, entity: Entity) -> Option<(&mut A, &mut B)> {
        let (a_id, b_id) = (TypeId::of::<A>(), TypeId::of::<B>());
        if a_id == b_id {
            return None;
        }
        let mut a = None;
        let mut b = None;
        for (type_id, storage) in &mut self.partitions {
            if *type_id == a_id {
                a = storage.as_any_mut().downcast_mut::<TypedStorage<A>>();
            } else if *type_id == b_id {
                b = storage.as_any_mut().downcast_mut::<TypedStorage<B>>();
            }
        }
        Some((a?.get_mut(entity)?, b?.get_mut(entity)?))
    }

    /// Whether the entity holds a `T`
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.has_type(entity, ComponentTypeId::of::<T>())
    }

    /// Whether the entity holds a component of the given type
    pub fn has_type(&self, entity: Entity, type_id: ComponentTypeId) -> bool {
        self.partitions
            .get(&type_id.type_id())
            .is_some_and(|storage| storage.contains(entity))
    }

    /// Detach and return the entity's `T`
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.storage_mut::<T>().and_then(|storage| storage.remove(entity))
    }

    /// Remove every component of the entity in one call
    pub fn remove_all(&mut self, entity: Entity) -> usize {
        self.partitions
            .values_mut()
            .map(|storage| storage.remove_entity(entity))
            .filter(|removed| *removed)
            .count()
    }

    /// Entities holding every listed type, in ascending order
    pub fn matching(&self, types: &[ComponentTypeId]) -> Vec<Entity> {
        let mut partitions = Vec::with_capacity(types.len());
        for type_id in types {
            match self.partitions.get(&type_id.type_id()) {
                Some(storage) => partitions.push(storage.as_ref()),
                None => return Vec::new(),
            }
        }
        let Some(smallest) = partitions.iter().min_by_key(|storage| storage.len()) else {
            return Vec::new();
        };
        let mut entities: Vec<Entity> = smallest
            .entities()
            .into_iter()
            .filter(|entity| partitions.iter().all(|storage| storage.contains(*entity)))
            .collect();
        entities.sort_unstable();
        entities
    }
}
