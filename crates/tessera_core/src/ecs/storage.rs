//! # Component Storage
//!
//! Typed storage for one component type, and the type-erased face the
//! registry uses to hold storages of different types side by side.
//!
//! The erased interface is small: entity-wide cleanup only
//! needs `erase` and `has`, and join planning only needs the dense size and
//! the entity at a dense position. Anything touching payloads downcasts back
//! to [`ComponentStorage<C>`] first.

use std::any::{type_name, Any};

use super::component::Component;
use super::entity::Entity;
use super::sparse_set::SparseSet;
use crate::config::SparseSetConfig;
use crate::error::EcsResult;

/// Type-agnostic operations on a component storage.
pub trait ErasedStorage: Any + Send + Sync {
    /// Removes `entity` from the storage. No-op if absent.
    fn erase(&mut self, entity: Entity);

    /// Checks if `entity` has a component in this storage.
    fn has(&self, entity: Entity) -> bool;

    /// Number of stored components.
    fn len(&self) -> usize;

    /// Returns `true` if nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entity at dense position `pos`.
    fn entity_at(&self, pos: usize) -> Option<Entity>;

    /// Type name of the stored component, for diagnostics.
    fn component_name(&self) -> &'static str;

    /// Upcast for downcasting to the typed storage.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the typed storage.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Storage for a single component type.
///
/// # Type Parameters
///
/// * `C` - The component type to store
#[derive(Debug)]
pub struct ComponentStorage<C: Component> {
    set: SparseSet<C>,
}

impl<C: Component> Default for ComponentStorage<C> {
    fn default() -> Self {
        Self::new(SparseSetConfig::default())
    }
}

impl<C: Component> ComponentStorage<C> {
    /// Creates an empty storage with the given sparse growth policy.
    #[must_use]
    pub fn new(config: SparseSetConfig) -> Self {
        Self {
            set: SparseSet::with_config(config),
        }
    }

    /// The underlying sparse set.
    #[inline]
    #[must_use]
    pub fn set(&self) -> &SparseSet<C> {
        &self.set
    }

    /// The underlying sparse set, mutably.
    #[inline]
    pub fn set_mut(&mut self) -> &mut SparseSet<C> {
        &mut self.set
    }

    /// Stores the value built by `make` for `entity`.
    ///
    /// # Errors
    ///
    /// Propagates [`EcsError::CapacityExceeded`](crate::EcsError::CapacityExceeded)
    /// from the sparse set.
    #[inline]
    pub fn insert_with<F>(&mut self, entity: Entity, make: F) -> EcsResult<()>
    where
        F: FnOnce() -> C,
    {
        self.set.insert_with(entity, make)
    }

    /// Removes `entity`, returning its component.
    #[inline]
    pub fn remove(&mut self, entity: Entity) -> Option<C> {
        self.set.erase(entity)
    }
}

impl<C: Component> ErasedStorage for ComponentStorage<C> {
    #[inline]
    fn erase(&mut self, entity: Entity) {
        // Dropped here; the erased caller never sees the payload.
        let _ = self.set.erase(entity);
    }

    #[inline]
    fn has(&self, entity: Entity) -> bool {
        self.set.has(entity)
    }

    #[inline]
    fn len(&self) -> usize {
        self.set.len()
    }

    #[inline]
    fn entity_at(&self, pos: usize) -> Option<Entity> {
        self.set.entity_at(pos)
    }

    fn component_name(&self) -> &'static str {
        type_name::<C>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Recovers the typed storage behind an erased one.
///
/// Storages are keyed by [`component_id_of`](super::component::component_id_of),
/// so a mismatch means the registry's table is corrupt.
pub(crate) fn downcast_ref<C: Component>(storage: &dyn ErasedStorage) -> &ComponentStorage<C> {
    match storage.as_any().downcast_ref::<ComponentStorage<C>>() {
        Some(typed) => typed,
        None => unreachable!(
            "`{}` storage filed under the id of `{}`",
            storage.component_name(),
            type_name::<C>()
        ),
    }
}

/// Mutable counterpart of [`downcast_ref`].
pub(crate) fn downcast_mut<C: Component>(
    storage: &mut dyn ErasedStorage,
) -> &mut ComponentStorage<C> {
    let name = storage.component_name();
    match storage.as_any_mut().downcast_mut::<ComponentStorage<C>>() {
        Some(typed) => typed,
        None => unreachable!(
            "`{}` storage filed under the id of `{}`",
            name,
            type_name::<C>()
        ),
    }
}
