//! # Registry Configuration
//!
//! Tunables for entity id allocation and sparse array growth.
//! Loaded once at startup, either built in code or parsed from TOML:
//!
//! ```toml
//! entity_ids = "isolated"
//!
//! [sparse]
//! initial_len = 256
//! max_len = 65536
//! ```

use serde::Deserialize;

use crate::error::{EcsError, EcsResult};

/// Where a registry draws fresh entity ids from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityIdSpace {
    /// One counter shared by every registry in the process.
    #[default]
    Process,
    /// A counter owned by the registry, starting at 1.
    Isolated,
}

/// Growth policy for a sparse set's lookup array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SparseSetConfig {
    /// Sparse array length allocated up front.
    pub initial_len: usize,
    /// Hard ceiling on the sparse array length. Entity ids at or above this
    /// value cannot be stored.
    pub max_len: usize,
}

impl Default for SparseSetConfig {
    fn default() -> Self {
        Self {
            initial_len: 1024,
            max_len: 1_000_000,
        }
    }
}

impl SparseSetConfig {
    /// Small footprint for tools and tests: nothing allocated until the
    /// first insert.
    #[must_use]
    pub const fn compact() -> Self {
        Self {
            initial_len: 0,
            max_len: 1_000_000,
        }
    }

    /// Checks the policy is usable.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the ceiling is zero or the
    /// initial length exceeds it.
    pub fn validate(&self) -> EcsResult<()> {
        if self.max_len == 0 {
            return Err(EcsError::InvalidConfig("sparse.max_len must be > 0".into()));
        }
        if self.initial_len > self.max_len {
            return Err(EcsError::InvalidConfig(format!(
                "sparse.initial_len ({}) exceeds sparse.max_len ({})",
                self.initial_len, self.max_len
            )));
        }
        Ok(())
    }
}

/// Configuration for a [`Registry`](crate::Registry).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Source of fresh entity ids.
    pub entity_ids: EntityIdSpace,
    /// Policy applied to every storage the registry creates.
    pub sparse: SparseSetConfig,
}

impl RegistryConfig {
    /// Default policy with a registry-local id counter.
    #[must_use]
    pub fn isolated() -> Self {
        Self {
            entity_ids: EntityIdSpace::Isolated,
            ..Self::default()
        }
    }

    /// Parses and validates a TOML document.
    ///
    /// Missing keys fall back to [`RegistryConfig::default`].
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] on malformed TOML or a policy
    /// rejected by [`RegistryConfig::validate`].
    pub fn from_toml_str(source: &str) -> EcsResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| EcsError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the sparse policy is invalid.
    pub fn validate(&self) -> EcsResult<()> {
        self.sparse.validate()
    }
}
