//! # Tessera Core
//!
//! Sparse-set Entity Component System designed for:
//! - O(1) component insert, erase and lookup by entity id
//! - Dense, cache-friendly iteration over each component type
//! - Joins across any number of component types, driven by the smallest
//!
//! ## Architecture Rules
//!
//! 1. **Data-oriented design** - Components are stored in contiguous arrays
//! 2. **Swap-and-pop removal** - Storages never have holes
//! 3. **Single writer** - Mutation needs `&mut Registry`; readers share `&Registry`
//!
//! ## Example
//!
//! ```rust
//! use tessera_core::{Component, Registry};
//!
//! struct Health(u32);
//! impl Component for Health {}
//!
//! let mut registry = Registry::new();
//! let hero = registry.new_entity();
//! registry.add_component(hero, Health(100))?;
//!
//! registry.each::<Health, _>(|_, health| health.0 -= 10);
//! assert_eq!(registry.get_component::<Health>(hero).0, 90);
//! # Ok::<(), tessera_core::EcsError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;

pub use config::{EntityIdSpace, RegistryConfig, SparseSetConfig};
pub use ecs::{
    component_id_of, Component, ComponentId, ComponentSet, ComponentStorage, Entity,
    ErasedStorage, Registry, SparseSet,
};
pub use error::{EcsError, EcsResult};
