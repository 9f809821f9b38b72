//! System scheduling
//!
//! Systems run in registration order, once per frame, on a single thread.
//! Each system's membership (the entities matching its filter) is
//! recomputed at the start of its own pass, so an entity that gains a
//! component becomes eligible on the next pass. Before every per-entity hook
//! the entity is checked again, so losing a component takes effect
//! immediately.

use std::collections::BTreeSet;

use log::{debug, error, info, warn};

use super::component::Filter;
use super::entity::Entity;
use super::system::{FrameContext, System, SystemError, SystemResult, SystemState};
use super::world::World;
use crate::scene::{SceneError, SceneResult};

/// Snapshot of a registered system for enumeration
#[derive(Debug, Clone, PartialEq)]
pub struct SystemInfo {
    /// System name
    pub name: String,
    /// Lifecycle state
    pub state: SystemState,
    /// Component filter
    pub filter: Filter,
    /// Entities matched at the start of the last pass
    pub entity_count: usize,
}

struct SystemSlot {
    system: Box<dyn System>,
    name: String,
    filter: Filter,
    state: SystemState,
    members: Vec<Entity>,
    // entities whose create hook already fired; kept until the entity is destroyed
    created: BTreeSet<Entity>,
}

impl SystemSlot {
    fn refresh_membership(&mut self, world: &World) {
        self.members = world.query(&self.filter);
        self.created.retain(|entity| world.contains(*entity));
    }

    fn run(&mut self, world: &mut World, ctx: &mut FrameContext<'_>) -> SystemResult<()> {
        match self.state {
            SystemState::Destroyed => return Ok(()),
            SystemState::Created => {
                if let Err(e) = self.system.on_create_system(world, ctx) {
                    return self.recover(e, "on_create_system");
                }
                self.state = SystemState::Play;
                info!("System '{}' created", self.name);
            }
            SystemState::Play | SystemState::Pause => {}
        }

        self.refresh_membership(world);
        if self.state == SystemState::Pause {
            return Ok(());
        }

        let members = self.members.clone();
        for &entity in &members {
            if self.created.contains(&entity) || !world.matches(entity, &self.filter) {
                continue;
            }
            self.created.insert(entity);
            if let Err(e) = self.system.on_create_entity(entity, world, ctx) {
                self.recover(e, "on_create_entity")?;
            }
        }

        if let Err(e) = self.system.on_update_system(&members, world, ctx) {
            return self.recover(e, "on_update_system");
        }

        for &entity in &members {
            if !world.matches(entity, &self.filter) {
                continue;
            }
            if let Err(e) = self.system.on_update_entity(entity, world, ctx) {
                self.recover(e, "on_update_entity")?;
            }
        }
        Ok(())
    }

    fn recover(&self, error: SystemError, hook: &str) -> SystemResult<()> {
        if error.is_fatal() {
            error!("System '{}' {hook} failed fatally: {error}", self.name);
            Err(error)
        } else {
            warn!("System '{}' {hook} failed: {error}", self.name);
            Ok(())
        }
    }
}

/// Ordered list of systems with per-system lifecycle state
#[derive(Default)]
pub struct Scheduler {
    slots: Vec<SystemSlot>,
}

impl Scheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a system; names must be unique
    pub fn add(&mut self, system: Box<dyn System>) -> SceneResult<()> {
        let name = system.name().to_string();
        if self.slots.iter().any(|slot| slot.name == name) {
            return Err(SceneError::DuplicateSystem(name));
        }
        let filter = system.filter();
        debug!("Registered system '{name}' with filter {:?}", filter.types());
        self.slots.push(SystemSlot {
            system,
            name,
            filter,
            state: SystemState::Created,
            members: Vec::new(),
            created: BTreeSet::new(),
        });
        Ok(())
    }

    /// Run every system once, in registration order
    ///
    /// Returns the first fatal error; non-fatal errors are logged.
    pub fn run_frame(&mut self, world: &mut World, ctx: &mut FrameContext<'_>) -> SystemResult<()> {
        for slot in &mut self.slots {
            slot.run(world, ctx)?;
        }
        Ok(())
    }

    /// Enumerate systems in registration order, whatever their state
    pub fn systems(&self) -> Vec<SystemInfo> {
        self.slots
            .iter()
            .map(|slot| SystemInfo {
                name: slot.name.clone(),
                state: slot.state,
                filter: slot.filter.clone(),
                entity_count: slot.members.len(),
            })
            .collect()
    }

    /// State of a system by name
    pub fn state(&self, name: &str) -> Option<SystemState> {
        self.slots.iter().find(|slot| slot.name == name).map(|slot| slot.state)
    }

    /// First registered system of type `T`
    pub fn get<T: System + 'static>(&self) -> Option<&T> {
        self.slots.iter().find_map(|slot| {
            let system: &dyn System = slot.system.as_ref();
            system.as_any().downcast_ref::<T>()
        })
    }

    /// First registered system of type `T`, mutably
    pub fn get_mut<T: System + 'static>(&mut self) -> Option<&mut T> {
        self.slots.iter_mut().find_map(|slot| {
            let system: &mut dyn System = slot.system.as_mut();
            system.as_any_mut().downcast_mut::<T>()
        })
    }

    /// Suspend hooks of a playing system
    pub fn pause(&mut self, name: &str) -> SceneResult<()> {
        self.transition(name, SystemState::Pause, &[SystemState::Play, SystemState::Pause])
    }

    /// Resume a paused system
    pub fn resume(&mut self, name: &str) -> SceneResult<()> {
        self.transition(name, SystemState::Play, &[SystemState::Pause, SystemState::Play])
    }

    /// Permanently stop a system
    pub fn destroy(&mut self, name: &str) -> SceneResult<()> {
        self.transition(
            name,
            SystemState::Destroyed,
            &[SystemState::Created, SystemState::Play, SystemState::Pause, SystemState::Destroyed],
        )?;
        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.name == name) {
            slot.members.clear();
            slot.created.clear();
        }
        Ok(())
    }

    fn transition(&mut self, name: &str, to: SystemState, allowed_from: &[SystemState]) -> SceneResult<()> {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.name == name)
            .ok_or_else(|| SceneError::SystemNotFound(name.to_string()))?;
        if !allowed_from.contains(&slot.state) {
            return Err(SceneError::InvalidTransition {
                system: name.to_string(),
                from: slot.state,
                to,
            });
        }
        if slot.state != to {
            info!("System '{name}': {} -> {to}", slot.state);
            slot.state = to;
        }
        Ok(())
    }
}
