//! # Component System
//!
//! Components are plain data attached to entities. Each component type gets
//! a dense [`ComponentId`] the first time it is used, stable for the rest of
//! the process and shared by every registry.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use parking_lot::RwLock;

/// Marker trait for ECS components.
///
/// Components must be:
/// - `'static`: Owned data, no borrowed references
/// - `Send + Sync`: A registry can be shared with reader threads
///
/// # Example
///
/// ```rust
/// use tessera_core::Component;
///
/// struct Health(u32);
///
/// impl Component for Health {}
/// ```
pub trait Component: Send + Sync + 'static {}

/// Dense, process-wide identifier of a component type. Ids start at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ComponentId(u64);

impl ComponentId {
    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn to_raw(self) -> u64 {
        self.0
    }

    /// Returns the id as an index into a per-type table.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

static COMPONENT_IDS: OnceLock<RwLock<HashMap<TypeId, ComponentId>>> = OnceLock::new();

fn component_ids() -> &'static RwLock<HashMap<TypeId, ComponentId>> {
    COMPONENT_IDS.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Returns the id of component type `T`, assigning one on first use.
///
/// Repeated calls for the same `T` return the same id; distinct types
/// never share an id. Safe to call from any thread.
#[must_use]
pub fn component_id_of<T: Component>() -> ComponentId {
    let key = TypeId::of::<T>();
    if let Some(&id) = component_ids().read().get(&key) {
        return id;
    }

    // Another thread may have won the race between the two locks.
    *component_ids().write().entry(key).or_insert_with(|| {
        let id = ComponentId(NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed));
        tracing::trace!(component = type_name::<T>(), id = id.0, "assigned component id");
        id
    })
}
