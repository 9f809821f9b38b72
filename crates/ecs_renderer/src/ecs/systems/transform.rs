//! Transform hierarchy resolution
//!
//! Depth-first from the roots, children in link order. A root is an entity
//! with a Transform and no Link, or any entity whose Link has no parent.
//! Entities without a Transform are still walked so their descendants are
//! reached; those descendants resolve as if they had no parent.

use crate::ecs::components::{Link, Transform};
use crate::ecs::system::{FrameContext, System, SystemResult};
use crate::ecs::{Entity, Filter, World};
use crate::foundation::math::Mat4;

/// Resolve every world matrix of the world; returns the number resolved
pub fn resolve_hierarchy(world: &mut World) -> usize {
    let mut roots: Vec<Entity> = world
        .query(&Filter::of::<(Transform,)>())
        .into_iter()
        .filter(|&entity| !world.has::<Link>(entity))
        .collect();
    roots.extend(
        world
            .query(&Filter::of::<(Link,)>())
            .into_iter()
            .filter(|&entity| world.get::<Link>(entity).is_some_and(Link::is_root)),
    );
    roots.sort_unstable();
    roots.dedup();

    let mut stack: Vec<(Entity, Option<Mat4>)> = roots.into_iter().rev().map(|root| (root, None)).collect();
    let mut resolved = 0;
    while let Some((entity, parent_world)) = stack.pop() {
        let world_matrix = world.get_mut::<Transform>(entity).map(|transform| {
            transform.resolve(parent_world.as_ref());
            transform.world_matrix
        });
        if world_matrix.is_some() {
            resolved += 1;
        }
        if let Some(link) = world.get::<Link>(entity) {
            stack.extend(link.children().iter().rev().map(|&child| (child, world_matrix)));
        }
    }
    resolved
}

/// Writes world matrices once per frame before anything reads them
#[derive(Debug, Default)]
pub struct TransformSystem {
    resolved_last_frame: usize,
}

impl TransformSystem {
    /// Create the system
    pub fn new() -> Self {
        Self::default()
    }

    /// Transforms resolved on the last update
    pub fn resolved_last_frame(&self) -> usize {
        self.resolved_last_frame
    }
}

impl System for TransformSystem {
    fn name(&self) -> &str {
        "TransformSystem"
    }

    fn filter(&self) -> Filter {
        Filter::of::<(Transform,)>()
    }

    fn on_update_system(&mut self, _entities: &[Entity], world: &mut World, _ctx: &mut FrameContext<'_>) -> SystemResult<()> {
        self.resolved_last_frame = resolve_hierarchy(world);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    fn world() -> World {
        let mut world = World::new();
        world.register_component::<Transform>();
        world.register_component::<Link>();
        world
    }

    fn spawn(world: &mut World, translation: Vec3) -> Entity {
        let entity = world.enroll_entity();
        world.add_component(entity, Transform::from_translation(translation)).unwrap();
        entity
    }

    #[test]
    fn test_root_world_equals_local() {
        let mut world = world();
        let root = spawn(&mut world, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(resolve_hierarchy(&mut world), 1);

        let transform = world.get::<Transform>(root).unwrap();
        assert_relative_eq!(transform.world_matrix, transform.local_matrix);
    }

    #[test]
    fn test_grandchild_composes_through_chain() {
        let mut world = world();
        let a = spawn(&mut world, Vec3::new(1.0, 0.0, 0.0));
        let b = spawn(&mut world, Vec3::new(0.0, 1.0, 0.0));
        let c = spawn(&mut world, Vec3::new(0.0, 0.0, 1.0));
        world.attach_link(a, None).unwrap();
        world.attach_link(b, Some(a)).unwrap();
        world.attach_link(c, Some(b)).unwrap();

        assert_eq!(resolve_hierarchy(&mut world), 3);
        let wa = world.get::<Transform>(a).unwrap().world_matrix;
        let wb = world.get::<Transform>(b).unwrap().world_matrix;
        let c = world.get::<Transform>(c).unwrap();
        assert_relative_eq!(wb, wa * world.get::<Transform>(b).unwrap().local_matrix);
        assert_relative_eq!(c.world_matrix, wb * c.local_matrix);
        assert_relative_eq!(c.world_position(), Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_parent_without_transform_passes_identity() {
        let mut world = world();
        let group = world.enroll_entity();
        world.attach_link(group, None).unwrap();
        let child = spawn(&mut world, Vec3::new(4.0, 0.0, 0.0));
        world.attach_link(child, Some(group)).unwrap();

        assert_eq!(resolve_hierarchy(&mut world), 1);
        assert_relative_eq!(world.get::<Transform>(child).unwrap().world_position(), Vec3::new(4.0, 0.0, 0.0));
    }

    #[test]
    fn test_parent_edit_propagates_next_resolve() {
        let mut world = world();
        let parent = spawn(&mut world, Vec3::zeros());
        let child = spawn(&mut world, Vec3::new(1.0, 0.0, 0.0));
        world.attach_link(parent, None).unwrap();
        world.attach_link(child, Some(parent)).unwrap();
        resolve_hierarchy(&mut world);

        world
            .get_mut::<Transform>(parent)
            .unwrap()
            .set_translation(Vec3::new(0.0, 5.0, 0.0));
        resolve_hierarchy(&mut world);
        assert_relative_eq!(world.get::<Transform>(child).unwrap().world_position(), Vec3::new(1.0, 5.0, 0.0));
    }
}
