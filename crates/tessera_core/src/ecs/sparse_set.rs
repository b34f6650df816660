//! # Sparse Set
//!
//! Single-type storage keyed by entity id.
//!
//! ```text
//! sparse:  [NONE, 2, NONE, 0, 1, ...]   entity id -> dense position
//! dense:   [(3, C), (4, D), (1, A)]     packed (entity, payload) pairs
//! ```
//!
//! - `has` / `get`: O(1), one bounds check and one indirection, no hashing
//! - `insert`: O(1) amortized, appends to the dense array
//! - `erase`: O(1) swap-and-pop, moves the last slot into the hole
//! - Iteration walks the dense array only
//!
//! Erasing reorders the dense array, so iteration order is insertion order
//! modulo swaps.
//!
//! Any id is accepted, including 0. [`Registry`](crate::Registry) is what
//! keeps [`Entity::NONE`] out of its storages.

use crate::config::SparseSetConfig;
use crate::ecs::entity::Entity;
use crate::error::{EcsError, EcsResult};

/// Sparse entry for an entity that is not in the set.
const NONE: usize = usize::MAX;

/// One packed dense slot.
#[derive(Clone, Debug)]
struct Slot<T> {
    entity: Entity,
    payload: T,
}

/// Packed container of `T` keyed by [`Entity`].
///
/// # Invariants
///
/// For every live entity `e`: `sparse[e] < len` and
/// `dense[sparse[e]].entity == e`. For every `i < len`:
/// `sparse[dense[i].entity] == i`.
#[derive(Clone, Debug)]
pub struct SparseSet<T> {
    /// Entity id -> dense position, or `NONE`.
    sparse: Vec<usize>,
    /// Live slots; the vector length is the logical size.
    dense: Vec<Slot<T>>,
    /// Ceiling on `sparse.len()`.
    max_sparse_len: usize,
}

impl<T> Default for SparseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SparseSet<T> {
    /// Creates an empty set with the default growth policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SparseSetConfig::default())
    }

    /// Creates an empty set with the given growth policy.
    ///
    /// An `initial_len` above `max_len` is clamped to `max_len`.
    #[must_use]
    pub fn with_config(config: SparseSetConfig) -> Self {
        Self {
            sparse: vec![NONE; config.initial_len.min(config.max_len)],
            dense: Vec::new(),
            max_sparse_len: config.max_len,
        }
    }

    /// Returns the number of live entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Returns `true` if the set holds nothing.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Current length of the sparse lookup array.
    #[inline]
    #[must_use]
    pub fn sparse_len(&self) -> usize {
        self.sparse.len()
    }

    /// Ceiling on the sparse lookup array.
    #[inline]
    #[must_use]
    pub fn max_sparse_len(&self) -> usize {
        self.max_sparse_len
    }

    /// Dense position of `entity`, if it is live.
    #[inline]
    fn position(&self, entity: Entity) -> Option<usize> {
        let pos = *self.sparse.get(entity.index())?;
        match self.dense.get(pos) {
            Some(slot) if slot.entity == entity => Some(pos),
            _ => None,
        }
    }

    /// Checks if `entity` is live in the set.
    #[inline]
    #[must_use]
    pub fn has(&self, entity: Entity) -> bool {
        self.position(entity).is_some()
    }

    /// Gets the payload of `entity`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not in the set. Use [`SparseSet::try_get`] when
    /// absence is expected.
    #[inline]
    #[must_use]
    pub fn get(&self, entity: Entity) -> &T {
        match self.try_get(entity) {
            Some(payload) => payload,
            None => panic!("entity {entity} is not in the sparse set"),
        }
    }

    /// Gets the payload of `entity` mutably.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not in the set.
    #[inline]
    pub fn get_mut(&mut self, entity: Entity) -> &mut T {
        match self.try_get_mut(entity) {
            Some(payload) => payload,
            None => panic!("entity {entity} is not in the sparse set"),
        }
    }

    /// Gets the payload of `entity`, or `None` if absent.
    #[inline]
    #[must_use]
    pub fn try_get(&self, entity: Entity) -> Option<&T> {
        let pos = self.position(entity)?;
        Some(&self.dense[pos].payload)
    }

    /// Gets the payload of `entity` mutably, or `None` if absent.
    #[inline]
    pub fn try_get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let pos = self.position(entity)?;
        Some(&mut self.dense[pos].payload)
    }

    /// Makes `entity` addressable in the sparse array.
    ///
    /// Doubles the current length, at least to `entity + 1`, at most to the
    /// ceiling. Fails without mutating anything if `entity` is past the
    /// ceiling.
    fn grow_sparse_to(&mut self, entity: Entity) -> EcsResult<()> {
        let index = entity.index();
        if index < self.sparse.len() {
            return Ok(());
        }
        if index >= self.max_sparse_len {
            tracing::warn!(
                entity = %entity,
                max = self.max_sparse_len,
                "sparse set capacity exceeded"
            );
            return Err(EcsError::CapacityExceeded {
                entity,
                max: self.max_sparse_len,
            });
        }
        let new_len = (self.sparse.len() * 2)
            .max(index + 1)
            .min(self.max_sparse_len);
        self.sparse.resize(new_len, NONE);
        Ok(())
    }

    /// Stores `value` for `entity`, overwriting any existing payload.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::CapacityExceeded`] if `entity` does not fit under
    /// the sparse ceiling. The set is unchanged in that case.
    pub fn insert(&mut self, entity: Entity, value: T) -> EcsResult<()> {
        self.insert_with(entity, || value)
    }

    /// Stores the value built by `make` for `entity`, overwriting any
    /// existing payload.
    ///
    /// `make` is not called when the insert fails.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::CapacityExceeded`] if `entity` does not fit under
    /// the sparse ceiling.
    pub fn insert_with<F>(&mut self, entity: Entity, make: F) -> EcsResult<()>
    where
        F: FnOnce() -> T,
    {
        self.grow_sparse_to(entity)?;

        if let Some(pos) = self.position(entity) {
            self.dense[pos].payload = make();
            return Ok(());
        }

        self.sparse[entity.index()] = self.dense.len();
        self.dense.push(Slot {
            entity,
            payload: make(),
        });
        Ok(())
    }

    /// Removes `entity`, returning its payload. No-op if absent.
    pub fn erase(&mut self, entity: Entity) -> Option<T> {
        let pos = self.position(entity)?;
        let removed = self.dense.swap_remove(pos);
        if let Some(moved) = self.dense.get(pos) {
            self.sparse[moved.entity.index()] = pos;
        }
        self.sparse[entity.index()] = NONE;
        Some(removed.payload)
    }

    /// Drops every payload. The sparse array keeps its length.
    pub fn clear(&mut self) {
        for slot in &self.dense {
            self.sparse[slot.entity.index()] = NONE;
        }
        self.dense.clear();
    }

    /// Live entity ids in dense order.
    #[inline]
    pub fn entities(&self) -> impl ExactSizeIterator<Item = Entity> + '_ {
        self.dense.iter().map(|slot| slot.entity)
    }

    /// Entity at dense position `pos`, if `pos` is live.
    #[inline]
    #[must_use]
    pub fn entity_at(&self, pos: usize) -> Option<Entity> {
        self.dense.get(pos).map(|slot| slot.entity)
    }

    /// Iterates over `(entity, payload)` pairs in dense order.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (Entity, &T)> + '_ {
        self.dense.iter().map(|slot| (slot.entity, &slot.payload))
    }

    /// Iterates mutably over `(entity, payload)` pairs in dense order.
    #[inline]
    pub fn iter_mut(&mut self) -> impl ExactSizeIterator<Item = (Entity, &mut T)> + '_ {
        self.dense
            .iter_mut()
            .map(|slot| (slot.entity, &mut slot.payload))
    }

    /// Checks both directions of the sparse/dense mapping.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        for (pos, slot) in self.dense.iter().enumerate() {
            assert_eq!(self.sparse[slot.entity.index()], pos);
        }
        for (index, &pos) in self.sparse.iter().enumerate() {
            if pos != NONE {
                assert!(pos < self.dense.len());
                assert_eq!(self.dense[pos].entity.index(), index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(raw: u64) -> Entity {
        Entity::from_raw(raw)
    }

    #[test]
    fn test_insert_and_get() {
        let mut set = SparseSet::new();
        set.insert(e(5), "five").unwrap();

        assert_eq!(set.len(), 1);
        assert!(set.has(e(5)));
        assert!(!set.has(e(4)));
        assert_eq!(*set.get(e(5)), "five");
        assert_eq!(set.try_get(e(6)), None);
        set.assert_consistent();
    }

    #[test]
    fn test_overwrite_keeps_size() {
        let mut set = SparseSet::new();
        set.insert(e(7), (0, 0)).unwrap();
        set.insert(e(7), (9, 9)).unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(*set.get(e(7)), (9, 9));
    }

    #[test]
    fn test_swap_and_pop() {
        let mut set = SparseSet::new();
        set.insert(e(1), 'A').unwrap();
        set.insert(e(2), 'B').unwrap();
        set.insert(e(3), 'C').unwrap();

        assert_eq!(set.erase(e(2)), Some('B'));
        set.assert_consistent();

        let pairs: Vec<_> = set.iter().map(|(id, c)| (id.to_raw(), *c)).collect();
        assert_eq!(pairs, vec![(1, 'A'), (3, 'C')]);
        assert_eq!(set.entity_at(1), Some(e(3)));
    }

    #[test]
    fn test_erase_absent_is_noop() {
        let mut set: SparseSet<u32> = SparseSet::new();
        assert_eq!(set.erase(e(3)), None);
        assert_eq!(set.erase(e(5_000_000)), None);

        set.insert(e(3), 1).unwrap();
        assert_eq!(set.erase(e(3)), Some(1));
        assert_eq!(set.erase(e(3)), None);
        assert!(set.is_empty());
    }

    #[test]
    fn test_erase_last_slot() {
        let mut set = SparseSet::new();
        set.insert(e(1), 10).unwrap();
        set.insert(e(2), 20).unwrap();

        assert_eq!(set.erase(e(2)), Some(20));
        set.assert_consistent();
        assert_eq!(*set.get(e(1)), 10);
    }

    #[test]
    fn test_sparse_growth_doubles() {
        let mut set = SparseSet::with_config(SparseSetConfig {
            initial_len: 4,
            max_len: 100,
        });
        set.insert(e(4), ()).unwrap();
        assert_eq!(set.sparse_len(), 8);

        set.insert(e(20), ()).unwrap();
        assert_eq!(set.sparse_len(), 21);

        // Doubling would pass the ceiling; clamp instead.
        set.insert(e(99), ()).unwrap();
        assert_eq!(set.sparse_len(), 100);
    }

    #[test]
    fn test_capacity_exceeded_leaves_set_unchanged() {
        let mut set = SparseSet::with_config(SparseSetConfig {
            initial_len: 8,
            max_len: 16,
        });
        set.insert(e(1), 1).unwrap();

        let mut called = false;
        let err = set
            .insert_with(e(16), || {
                called = true;
                2
            })
            .unwrap_err();

        assert_eq!(
            err,
            EcsError::CapacityExceeded {
                entity: e(16),
                max: 16
            }
        );
        assert!(!called);
        assert_eq!(set.len(), 1);
        assert_eq!(set.sparse_len(), 8);
        set.assert_consistent();
    }

    #[test]
    fn test_default_ceiling() {
        let mut set = SparseSet::new();
        assert!(set.insert(e(999_999), 0u8).is_ok());
        assert!(set.insert(e(1_000_000), 0u8).is_err());
    }

    #[test]
    fn test_compact_allocates_lazily() {
        let mut set = SparseSet::with_config(SparseSetConfig::compact());
        assert_eq!(set.sparse_len(), 0);
        set.insert(e(0), 1).unwrap();
        assert_eq!(set.sparse_len(), 1);
        set.insert(e(1), 2).unwrap();
        assert_eq!(set.sparse_len(), 2);
    }

    #[test]
    fn test_clear() {
        let mut set = SparseSet::new();
        for raw in 1..=10 {
            set.insert(e(raw), raw).unwrap();
        }
        set.clear();
        assert!(set.is_empty());
        assert!(!set.has(e(3)));
        set.assert_consistent();

        set.insert(e(3), 30).unwrap();
        assert_eq!(*set.get(e(3)), 30);
    }

    #[test]
    fn test_iter_mut() {
        let mut set = SparseSet::new();
        set.insert(e(1), 1).unwrap();
        set.insert(e(2), 2).unwrap();

        for (_, value) in set.iter_mut() {
            *value *= 10;
        }
        assert_eq!(*set.get(e(1)), 10);
        assert_eq!(*set.get(e(2)), 20);
    }

    #[test]
    fn test_payload_dropped_on_erase() {
        use std::rc::Rc;

        let tracker = Rc::new(());
        let mut set = SparseSet::new();
        set.insert(e(1), Rc::clone(&tracker)).unwrap();
        set.insert(e(2), Rc::clone(&tracker)).unwrap();
        assert_eq!(Rc::strong_count(&tracker), 3);

        drop(set.erase(e(1)));
        assert_eq!(Rc::strong_count(&tracker), 2);

        drop(set);
        assert_eq!(Rc::strong_count(&tracker), 1);
    }

    #[test]
    #[should_panic(expected = "not in the sparse set")]
    fn test_get_absent_panics() {
        let set: SparseSet<u32> = SparseSet::new();
        let _ = set.get(e(1));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    #[derive(Clone, Debug)]
    enum Op {
        Insert(u64, u32),
        Erase(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u64..64, any::<u32>()).prop_map(|(id, v)| Op::Insert(id, v)),
            (0u64..64).prop_map(Op::Erase),
        ]
    }

    proptest! {
        #[test]
        fn matches_hashmap_model(ops in prop::collection::vec(op(), 0..200)) {
            let mut set = SparseSet::with_config(SparseSetConfig {
                initial_len: 2,
                max_len: 64,
            });
            let mut model = HashMap::new();

            for op in ops {
                match op {
                    Op::Insert(id, v) => {
                        set.insert(Entity::from_raw(id), v).unwrap();
                        model.insert(id, v);
                    }
                    Op::Erase(id) => {
                        prop_assert_eq!(set.erase(Entity::from_raw(id)), model.remove(&id));
                    }
                }
                set.assert_consistent();
                prop_assert_eq!(set.len(), model.len());
            }

            for id in 0u64..64 {
                prop_assert_eq!(set.try_get(Entity::from_raw(id)), model.get(&id));
            }
        }

        #[test]
        fn iteration_visits_each_live_entity_once(ids in prop::collection::vec(0u64..500, 0..100)) {
            let mut set = SparseSet::new();
            for &id in &ids {
                set.insert(Entity::from_raw(id), id).unwrap();
            }

            let mut seen: Vec<u64> = set.iter().map(|(e, v)| {
                assert_eq!(e.to_raw(), *v);
                *v
            }).collect();
            seen.sort_unstable();

            let mut expected = ids.clone();
            expected.sort_unstable();
            expected.dedup();
            prop_assert_eq!(seen, expected);
        }
    }
}
