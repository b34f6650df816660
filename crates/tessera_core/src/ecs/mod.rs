//! # Entity Component System
//!
//! Sparse-set ECS: one packed storage per component type, keyed by entity id.
//!
//! ## Design Philosophy
//!
//! - Components live in dense arrays for cache-friendly iteration
//! - Entity ids index a sparse lookup array directly, no hashing
//! - Storages are created lazily and held behind a type-erased interface
//! - Multi-component joins are driven by the smallest storage

mod component;
mod entity;
mod query;
mod registry;
mod sparse_set;
mod storage;

pub use component::{component_id_of, Component, ComponentId};
pub use entity::Entity;
pub use query::ComponentSet;
pub use registry::Registry;
pub use sparse_set::SparseSet;
pub use storage::{ComponentStorage, ErasedStorage};
