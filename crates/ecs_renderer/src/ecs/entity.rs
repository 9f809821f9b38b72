//! Entity identifiers and the registry that hands them out

use std::collections::BTreeSet;
use std::fmt;

/// Opaque entity identifier
///
/// An entity carries no data of its own; it is only a join key into
/// component storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity(u32);

impl Entity {
    /// Get the raw entity id
    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Allocates entity ids and tracks which ones are alive
///
/// Ids are never reused within one registry, so a stale `Entity` held by a
/// system can never alias a newer one.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    next_id: u32,
    alive: BTreeSet<Entity>,
}

impl EntityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh entity
    pub fn enroll_entity(&mut self) -> Entity {
        let entity = Entity(self.next_id);
        self.next_id += 1;
        self.alive.insert(entity);
        entity
    }

    /// Forget an entity; returns false if it was not alive
    pub fn remove(&mut self, entity: Entity) -> bool {
        self.alive.remove(&entity)
    }

    /// Whether the entity is alive
    pub fn contains(&self, entity: Entity) -> bool {
        self.alive.contains(&entity)
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.alive.len()
    }

    /// Whether no entity is alive
    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }

    /// Live entities in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive.iter().copied()
    }
}
