//! # Entity Management
//!
//! Entities are plain integer handles. They carry no data of their own;
//! everything attached to them lives in component storages.
//!
//! Ids are handed out by an [`EntityAllocator`]:
//! - Freed ids are reused LIFO before any fresh id is minted
//! - Fresh ids come from a process-wide counter by default, so two
//!   registries in the same process never mint the same id

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::EntityIdSpace;

/// Next never-issued id, shared by every registry using [`EntityIdSpace::Process`].
static NEXT_PROCESS_ENTITY: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an entity.
///
/// `0` is reserved as [`Entity::NONE`]; live ids start at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Entity(u64);

impl Entity {
    /// The reserved "no entity" id.
    pub const NONE: Self = Self(0);

    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn to_raw(self) -> u64 {
        self.0
    }

    /// Returns the id as an index into a sparse array.
    ///
    /// Ids that do not fit in `usize` saturate, which every sparse ceiling
    /// rejects.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }

    /// Checks if this is the reserved "no entity" id.
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where fresh ids come from.
#[derive(Debug)]
enum IdSource {
    /// The process-wide counter.
    Process,
    /// A counter owned by this allocator.
    Isolated { next: u64 },
}

/// Issues and recycles entity ids for one registry.
#[derive(Debug)]
pub(crate) struct EntityAllocator {
    source: IdSource,
    /// Freed ids, reused LIFO.
    free: Vec<Entity>,
    /// Alive flag per id, indexed by `Entity::index`.
    alive: Vec<bool>,
    /// Number of `true` flags in `alive`.
    alive_count: usize,
}

impl EntityAllocator {
    /// Creates an allocator drawing fresh ids from `space`.
    pub(crate) fn new(space: EntityIdSpace) -> Self {
        let source = match space {
            EntityIdSpace::Process => IdSource::Process,
            EntityIdSpace::Isolated => IdSource::Isolated { next: 1 },
        };
        Self {
            source,
            free: Vec::new(),
            alive: Vec::new(),
            alive_count: 0,
        }
    }

    /// Returns the last freed id, or a fresh one if nothing is free.
    pub(crate) fn allocate(&mut self) -> Entity {
        let entity = if let Some(recycled) = self.free.pop() {
            tracing::trace!(entity = %recycled, "recycled entity id");
            recycled
        } else {
            self.mint()
        };
        let index = entity.index();
        if index >= self.alive.len() {
            self.alive.resize(index + 1, false);
        }
        self.alive[index] = true;
        self.alive_count += 1;
        entity
    }

    fn mint(&mut self) -> Entity {
        match &mut self.source {
            IdSource::Process => Entity(NEXT_PROCESS_ENTITY.fetch_add(1, Ordering::Relaxed)),
            IdSource::Isolated { next } => {
                let entity = Entity(*next);
                *next += 1;
                entity
            }
        }
    }

    /// Returns `entity` to the free list.
    ///
    /// Only ids currently alive in this allocator are accepted, so the free
    /// list never holds the same id twice.
    pub(crate) fn release(&mut self, entity: Entity) -> bool {
        match self.alive.get_mut(entity.index()) {
            Some(flag) if *flag => *flag = false,
            _ => return false,
        }
        self.alive_count -= 1;
        self.free.push(entity);
        true
    }

    #[inline]
    pub(crate) fn is_alive(&self, entity: Entity) -> bool {
        self.alive.get(entity.index()).copied().unwrap_or(false)
    }

    #[inline]
    pub(crate) fn alive_count(&self) -> usize {
        self.alive_count
    }
}
