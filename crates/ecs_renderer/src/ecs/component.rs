//! Component trait and typed component filters

use std::any::{type_name, TypeId};
use std::fmt;

/// Marker trait for components
pub trait Component: 'static + Send + Sync {}

/// Registry-level identifier of a component type
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentTypeId {
    id: TypeId,
    name: &'static str,
}

impl ComponentTypeId {
    /// Identifier of `T`
    pub fn of<T: Component>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Underlying `TypeId`
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Full type name, for diagnostics
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without the module path
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }
}

impl fmt::Debug for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A tuple of component types usable as a system filter
pub trait ComponentSet {
    /// Type ids of every member, in declaration order
    fn type_ids() -> Vec<ComponentTypeId>;
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            fn type_ids() -> Vec<ComponentTypeId> {
                vec![$(ComponentTypeId::of::<$name>()),+]
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);

/// Fixed set of component types an entity must hold to match
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Filter {
    types: Vec<ComponentTypeId>,
}

impl Filter {
    /// Build a filter from a typed tuple, e.g. `Filter::of::<(Transform, Camera)>()`
    pub fn of<S: ComponentSet>() -> Self {
        let mut types = S::type_ids();
        types.dedup();
        Self { types }
    }

    /// A filter matching nothing; systems using it only receive system-level hooks
    pub fn empty() -> Self {
        Self::default()
    }

    /// Required component types
    pub fn types(&self) -> &[ComponentTypeId] {
        &self.types
    }

    /// Whether the filter requires no components
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
