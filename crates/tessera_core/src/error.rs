//! # Registry Error Types
//!
//! All errors that can occur while storing or reading components.

use thiserror::Error;

use crate::ecs::Entity;

/// Errors that can occur in the ECS registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The entity id does not fit under the sparse array ceiling.
    #[error("entity {entity} exceeds maximum sparse capacity of {max}")]
    CapacityExceeded {
        /// The entity that was being inserted.
        entity: Entity,
        /// The configured sparse ceiling.
        max: usize,
    },

    /// A component was required on an entity that does not carry it.
    #[error("entity {entity} has no `{component}` component")]
    PreconditionViolated {
        /// The entity that was queried.
        entity: Entity,
        /// Type name of the missing component.
        component: &'static str,
    },

    /// Components were attached to [`Entity::NONE`].
    #[error("entity id 0 is reserved and cannot hold components")]
    ReservedEntity,

    /// Configuration could not be parsed or failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for registry operations.
pub type EcsResult<T> = Result<T, EcsError>;
