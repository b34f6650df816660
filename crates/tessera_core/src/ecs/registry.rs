//! # ECS Registry
//!
//! The central container for entities and their components.
//!
//! One sparse-set storage exists per component type, created lazily the
//! first time a value of that type is attached. Storages are held behind
//! [`ErasedStorage`] so entity-wide cleanup can run without knowing types.
//!
//! ## Access Model
//!
//! Single writer, many readers. Everything that mutates takes `&mut self`;
//! queries take `&self` and may run on several threads at once as long as
//! nobody holds the registry mutably.

use std::any::type_name;
use std::fmt;

use super::component::{component_id_of, Component, ComponentId};
use super::entity::{Entity, EntityAllocator};
use super::query::{driver_index, ComponentSet};
use super::sparse_set::SparseSet;
use super::storage::{downcast_mut, downcast_ref, ComponentStorage, ErasedStorage};
use crate::config::RegistryConfig;
use crate::error::{EcsError, EcsResult};

/// Owner of entity ids and of one storage per component type.
///
/// # Example
///
/// ```rust
/// use tessera_core::{Component, Registry};
///
/// struct Position { x: f32, y: f32 }
/// impl Component for Position {}
///
/// struct Velocity { x: f32, y: f32 }
/// impl Component for Velocity {}
///
/// let mut registry = Registry::new();
/// let ship = registry.new_entity();
/// registry.add_component(ship, Position { x: 0.0, y: 0.0 })?;
/// registry.add_component(ship, Velocity { x: 1.0, y: 2.0 })?;
///
/// registry.view::<(Position, Velocity), _>(|_, (pos, vel)| {
///     pos.x += vel.x;
///     pos.y += vel.y;
/// });
///
/// assert_eq!(registry.get_component::<Position>(ship).y, 2.0);
/// # Ok::<(), tessera_core::EcsError>(())
/// ```
pub struct Registry {
    config: RegistryConfig,
    entities: EntityAllocator,
    /// Indexed by `ComponentId`. Id 0 is never assigned, so slot 0 stays empty.
    storages: Vec<Option<Box<dyn ErasedStorage>>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let storages: Vec<(&'static str, usize)> = self
            .storages
            .iter()
            .flatten()
            .map(|storage| (storage.component_name(), storage.len()))
            .collect();
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("entities", &self.entities.alive_count())
            .field("storages", &storages)
            .finish()
    }
}

impl Registry {
    /// Creates a registry with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from_valid_config(RegistryConfig::default())
    }

    /// Creates a registry with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the configuration fails
    /// validation.
    pub fn with_config(config: RegistryConfig) -> EcsResult<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: RegistryConfig) -> Self {
        Self {
            entities: EntityAllocator::new(config.entity_ids),
            config,
            storages: Vec::new(),
        }
    }

    /// Returns the configuration this registry was built with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // =========================================================================
    // Entity lifecycle
    // =========================================================================

    /// Allocates an entity id.
    ///
    /// The most recently removed id is reused first; otherwise a fresh id is
    /// minted. Fresh ids strictly increase.
    pub fn new_entity(&mut self) -> Entity {
        self.entities.allocate()
    }

    /// Removes every component of `entity` and frees its id for reuse.
    ///
    /// Components are swept from every storage even for ids this registry
    /// never issued. The id only goes back on the free list if it was alive
    /// here.
    ///
    /// # Returns
    ///
    /// `true` if the id was alive and has been freed.
    pub fn remove_entity(&mut self, entity: Entity) -> bool {
        for storage in self.storages.iter_mut().flatten() {
            storage.erase(entity);
        }
        self.entities.release(entity)
    }

    /// Checks if `entity` was issued by this registry and not yet removed.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of ids issued by this registry and not yet removed.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.alive_count()
    }

    // =========================================================================
    // Storage lookup
    // =========================================================================

    #[inline]
    pub(crate) fn erased(&self, id: ComponentId) -> Option<&dyn ErasedStorage> {
        self.storages.get(id.index())?.as_deref()
    }

    /// Erased storages for `ids`, or `None` if any type has no storage yet.
    pub(crate) fn erased_many<const N: usize>(
        &self,
        ids: [ComponentId; N],
    ) -> Option<[&dyn ErasedStorage; N]> {
        let found: Vec<&dyn ErasedStorage> = ids
            .iter()
            .map(|&id| self.erased(id))
            .collect::<Option<_>>()?;
        found.try_into().ok()
    }

    /// Disjoint mutable storages for distinct `ids`, or `None` if any type
    /// has no storage yet.
    pub(crate) fn erased_many_mut<const N: usize>(
        &mut self,
        ids: [ComponentId; N],
    ) -> Option<[&mut Box<dyn ErasedStorage>; N]> {
        let mut found: [Option<&mut Box<dyn ErasedStorage>>; N] = std::array::from_fn(|_| None);
        for (index, slot) in self.storages.iter_mut().enumerate() {
            let Some(storage) = slot else {
                continue;
            };
            if let Some(k) = ids.iter().position(|id| id.index() == index) {
                found[k] = Some(storage);
            }
        }
        let found: Vec<&mut Box<dyn ErasedStorage>> = found.into_iter().collect::<Option<_>>()?;
        found.try_into().ok()
    }

    fn typed_storage<C: Component>(&self) -> Option<&ComponentStorage<C>> {
        self.erased(component_id_of::<C>()).map(downcast_ref::<C>)
    }

    fn typed_storage_mut<C: Component>(&mut self) -> Option<&mut ComponentStorage<C>> {
        let slot = self.storages.get_mut(component_id_of::<C>().index())?;
        slot.as_deref_mut().map(|storage| downcast_mut::<C>(storage))
    }

    /// Finds the storage for `C`, creating it on first use.
    fn storage_or_insert<C: Component>(&mut self) -> &mut ComponentStorage<C> {
        let id = component_id_of::<C>();
        let index = id.index();
        if index >= self.storages.len() {
            self.storages.resize_with(index + 1, || None);
        }

        let sparse = self.config.sparse;
        let slot = self.storages[index].get_or_insert_with(|| {
            tracing::debug!(
                component = type_name::<C>(),
                id = id.to_raw(),
                "created component storage"
            );
            let storage: Box<dyn ErasedStorage> = Box::new(ComponentStorage::<C>::new(sparse));
            storage
        });
        downcast_mut::<C>(&mut **slot)
    }

    /// The sparse set holding every `C`, or `None` if no `C` was ever added.
    #[must_use]
    pub fn storage<C: Component>(&self) -> Option<&SparseSet<C>> {
        self.typed_storage::<C>().map(ComponentStorage::set)
    }

    /// Number of entities carrying a `C`.
    #[must_use]
    pub fn storage_len<C: Component>(&self) -> usize {
        self.erased(component_id_of::<C>())
            .map_or(0, |storage| storage.len())
    }

    /// Number of component types with a storage in this registry.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.storages.iter().flatten().count()
    }

    // =========================================================================
    // Component operations
    // =========================================================================

    /// Attaches `value` to `entity`, replacing any existing `C`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ReservedEntity`] for [`Entity::NONE`], and
    /// [`EcsError::CapacityExceeded`] if `entity` is past the sparse ceiling.
    /// Nothing is stored in either case.
    pub fn add_component<C: Component>(&mut self, entity: Entity, value: C) -> EcsResult<()> {
        self.add_component_with(entity, || value)
    }

    /// Attaches the value built by `make` to `entity`, replacing any
    /// existing `C`. `make` only runs if the insert can succeed.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ReservedEntity`] for [`Entity::NONE`], and
    /// [`EcsError::CapacityExceeded`] if `entity` is past the sparse ceiling.
    pub fn add_component_with<C, F>(&mut self, entity: Entity, make: F) -> EcsResult<()>
    where
        C: Component,
        F: FnOnce() -> C,
    {
        if entity.is_none() {
            return Err(EcsError::ReservedEntity);
        }
        self.storage_or_insert::<C>().insert_with(entity, make)
    }

    /// Detaches and returns the `C` of `entity`, if any.
    pub fn remove_component<C: Component>(&mut self, entity: Entity) -> Option<C> {
        self.typed_storage_mut::<C>()?.remove(entity)
    }

    /// Checks if `entity` carries a `C`.
    #[inline]
    #[must_use]
    pub fn has_component<C: Component>(&self, entity: Entity) -> bool {
        self.erased(component_id_of::<C>())
            .is_some_and(|storage| storage.has(entity))
    }

    /// Checks if `entity` carries every component in `Q`.
    #[inline]
    #[must_use]
    pub fn has_all<Q: ComponentSet>(&self, entity: Entity) -> bool {
        Q::contained_in(self, entity)
    }

    /// Gets the `C` of `entity`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` has no `C`. Use [`Registry::try_get_component`] or
    /// [`Registry::require_component`] when absence is expected.
    #[must_use]
    pub fn get_component<C: Component>(&self, entity: Entity) -> &C {
        match self.require_component::<C>(entity) {
            Ok(component) => component,
            Err(err) => panic!("{err}"),
        }
    }

    /// Gets the `C` of `entity` mutably.
    ///
    /// # Panics
    ///
    /// Panics if `entity` has no `C`.
    pub fn get_component_mut<C: Component>(&mut self, entity: Entity) -> &mut C {
        match self.try_get_component_mut::<C>(entity) {
            Some(component) => component,
            None => panic!(
                "{}",
                EcsError::PreconditionViolated {
                    entity,
                    component: type_name::<C>(),
                }
            ),
        }
    }

    /// Gets the `C` of `entity`, or `None` if absent.
    #[must_use]
    pub fn try_get_component<C: Component>(&self, entity: Entity) -> Option<&C> {
        self.typed_storage::<C>()?.set().try_get(entity)
    }

    /// Gets the `C` of `entity` mutably, or `None` if absent.
    pub fn try_get_component_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        self.typed_storage_mut::<C>()?.set_mut().try_get_mut(entity)
    }

    /// Gets the `C` of `entity`, reporting absence as an error.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::PreconditionViolated`] if `entity` has no `C`.
    pub fn require_component<C: Component>(&self, entity: Entity) -> EcsResult<&C> {
        self.try_get_component::<C>(entity)
            .ok_or(EcsError::PreconditionViolated {
                entity,
                component: type_name::<C>(),
            })
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    /// Calls `f` for every entity carrying a `C`, in dense order.
    pub fn each<C, F>(&mut self, mut f: F)
    where
        C: Component,
        F: FnMut(Entity, &mut C),
    {
        let Some(storage) = self.typed_storage_mut::<C>() else {
            return;
        };
        for (entity, component) in storage.set_mut().iter_mut() {
            f(entity, component);
        }
    }

    /// Shared-access counterpart of [`Registry::each`].
    pub fn each_ref<C, F>(&self, mut f: F)
    where
        C: Component,
        F: FnMut(Entity, &C),
    {
        let Some(storage) = self.typed_storage::<C>() else {
            return;
        };
        for (entity, component) in storage.set().iter() {
            f(entity, component);
        }
    }

    /// Calls `f` for every entity carrying all components in `Q`, with
    /// mutable access to them.
    ///
    /// The smallest storage in `Q` drives the traversal (first listed wins
    /// a tie), so the order is that storage's dense order.
    ///
    /// # Panics
    ///
    /// Panics if `Q` lists a component type twice.
    pub fn view<Q, F>(&mut self, f: F)
    where
        Q: ComponentSet,
        F: for<'a> FnMut(Entity, Q::Mut<'a>),
    {
        Q::for_each_mut(self, f);
    }

    /// Shared-access counterpart of [`Registry::view`].
    pub fn view_ref<Q, F>(&self, f: F)
    where
        Q: ComponentSet,
        F: for<'a> FnMut(Entity, Q::Ref<'a>),
    {
        Q::for_each_ref(self, f);
    }

    /// Calls `f` for every entity carrying all components in `Q`, handing it
    /// the whole registry so it can add or remove components and entities.
    ///
    /// The driver storage is re-read after every call:
    /// - Adding or removing non-driver components is safe for the rest of
    ///   the traversal.
    /// - Removing the current entity's driver component (or the entity) is
    ///   safe; whatever is swapped into its slot is still visited.
    /// - Driver components added during the traversal are not visited, even
    ///   when they land on a recycled id or on an id removed earlier in the
    ///   same call.
    /// - Removing driver components of other entities may cause unvisited
    ///   entities to be skipped.
    pub fn view_entities<Q, F>(&mut self, mut f: F)
    where
        Q: ComponentSet,
        F: FnMut(&mut Registry, Entity),
    {
        let ids = Q::component_ids();
        let Some(lens) = ids
            .iter()
            .map(|&id| self.erased(id).map(|storage| storage.len()))
            .collect::<Option<Vec<usize>>>()
        else {
            return;
        };

        let driver = ids[driver_index(&lens)];
        let driver_len = |registry: &Registry| registry.erased(driver).map_or(0, |s| s.len());
        let entity_at = |registry: &Registry, pos: usize| {
            registry.erased(driver).and_then(|s| s.entity_at(pos))
        };

        // Every unvisited entity sits in `pos..end`.
        let mut end = driver_len(self);
        let mut pos = 0;
        while pos < end.min(driver_len(self)) {
            let Some(entity) = entity_at(self, pos) else {
                break;
            };
            if !Q::contained_in(self, entity) {
                pos += 1;
                continue;
            }

            let tail = entity_at(self, end - 1);
            f(self, entity);

            let now = entity_at(self, pos);
            if now != Some(entity) && now.is_some() && now == tail {
                // The last unvisited entity was swapped into `pos`.
                end -= 1;
            } else {
                pos += 1;
            }
        }
    }
}
