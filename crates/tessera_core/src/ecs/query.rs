//! # Multi-Component Joins
//!
//! A [`ComponentSet`] is a tuple of component types, `(A,)` through
//! `(A, B, C, D, E, F, G, H)`. The registry joins the storages of every
//! listed type and visits the entities present in all of them.
//!
//! ## Driver Selection
//!
//! ```text
//! Position: [1, 2, 3, 4, 5]   len 5
//! Velocity: [2, 3, 5]         len 3
//! Health:   [3]               len 1  <- driver
//! ```
//!
//! The smallest storage drives the outer loop; every other storage is only
//! probed with an O(1) `has`. Ties go to the type listed first. Iteration
//! follows the driver's dense order, not entity order.

use super::component::{component_id_of, Component, ComponentId};
use super::entity::Entity;
use super::registry::Registry;
use super::storage::{downcast_mut, downcast_ref};

/// A tuple of component types that can be joined by the registry.
///
/// Implemented for tuples of one to eight [`Component`] types.
pub trait ComponentSet: 'static {
    /// Mutable references handed to [`Registry::view`] visitors.
    type Mut<'a>;

    /// Shared references handed to [`Registry::view_ref`] visitors.
    type Ref<'a>;

    /// Ids of the listed component types, in listed order.
    fn component_ids() -> Vec<ComponentId>;

    /// Checks if `entity` carries every listed component.
    fn contained_in(registry: &Registry, entity: Entity) -> bool;

    /// Visits every joined entity with mutable access to its components.
    ///
    /// # Panics
    ///
    /// Panics if a component type is listed more than once.
    fn for_each_mut<F>(registry: &mut Registry, f: F)
    where
        F: for<'a> FnMut(Entity, Self::Mut<'a>);

    /// Visits every joined entity with shared access to its components.
    fn for_each_ref<F>(registry: &Registry, f: F)
    where
        F: for<'a> FnMut(Entity, Self::Ref<'a>);
}

/// Position of the first smallest length.
pub(crate) fn driver_index(lens: &[usize]) -> usize {
    lens.iter()
        .enumerate()
        .min_by_key(|&(_, len)| *len)
        .map_or(0, |(index, _)| index)
}

fn assert_distinct(ids: &[ComponentId]) {
    for (i, id) in ids.iter().enumerate() {
        assert!(
            !ids[..i].contains(id),
            "component type listed twice in a mutable view"
        );
    }
}

macro_rules! impl_component_set {
    ($(($T:ident, $var:ident)),+) => {
        impl<$($T: Component),+> ComponentSet for ($($T,)+) {
            type Mut<'a> = ($(&'a mut $T,)+);
            type Ref<'a> = ($(&'a $T,)+);

            fn component_ids() -> Vec<ComponentId> {
                vec![$(component_id_of::<$T>()),+]
            }

            #[inline]
            fn contained_in(registry: &Registry, entity: Entity) -> bool {
                $(registry.has_component::<$T>(entity))&&+
            }

            fn for_each_mut<Func>(registry: &mut Registry, mut f: Func)
            where
                Func: for<'a> FnMut(Entity, Self::Mut<'a>),
            {
                let ids = [$(component_id_of::<$T>()),+];
                assert_distinct(&ids);
                // A type with no storage yet makes the join empty.
                let Some([$($var),+]) = registry.erased_many_mut(ids) else {
                    return;
                };

                let driver = driver_index(&[$($var.len()),+]);
                let len = [$($var.len()),+][driver];
                for pos in 0..len {
                    let entity = {
                        let erased = [$(&**$var),+];
                        erased[driver].entity_at(pos)
                    };
                    let Some(entity) = entity else {
                        break;
                    };
                    if $($var.has(entity))&&+ {
                        f(entity, ($(downcast_mut::<$T>(&mut **$var).set_mut().get_mut(entity),)+));
                    }
                }
            }

            fn for_each_ref<Func>(registry: &Registry, mut f: Func)
            where
                Func: for<'a> FnMut(Entity, Self::Ref<'a>),
            {
                let ids = [$(component_id_of::<$T>()),+];
                let Some([$($var),+]) = registry.erased_many(ids) else {
                    return;
                };

                let erased = [$($var),+];
                let driver = driver_index(&erased.map(|storage| storage.len()));
                for pos in 0..erased[driver].len() {
                    let Some(entity) = erased[driver].entity_at(pos) else {
                        break;
                    };
                    if $($var.has(entity))&&+ {
                        f(entity, ($(downcast_ref::<$T>($var).set().get(entity),)+));
                    }
                }
            }
        }
    };
}

impl_component_set!((A, a));
impl_component_set!((A, a), (B, b));
impl_component_set!((A, a), (B, b), (C, c));
impl_component_set!((A, a), (B, b), (C, c), (D, d));
impl_component_set!((A, a), (B, b), (C, c), (D, d), (E, e));
impl_component_set!((A, a), (B, b), (C, c), (D, d), (E, e), (F, f6));
impl_component_set!((A, a), (B, b), (C, c), (D, d), (E, e), (F, f6), (G, g));
impl_component_set!((A, a), (B, b), (C, c), (D, d), (E, e), (F, f6), (G, g), (H, h));
