//! Entity-Component-System implementation
//!
//! Entities are plain ids, components live in type-partitioned storage, and
//! systems run in registration order over the entities matching their
//! component filter.

pub mod component;
pub mod components;
pub mod entity;
pub mod scheduler;
pub mod storage;
pub mod system;
pub mod systems;
pub mod world;

#[cfg(test)]
mod tests;

pub use component::{Component, ComponentSet, ComponentTypeId, Filter};
pub use entity::{Entity, EntityRegistry};
pub use scheduler::{Scheduler, SystemInfo};
pub use storage::{ComponentStorage, TypedStorage};
pub use system::{FrameContext, System, SystemError, SystemResult, SystemState};
pub use world::World;
