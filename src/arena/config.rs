//! Arena construction parameters and their JSON form.

use core::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::allocator::constants::{mib, DEFAULT_BLOCK_CAPACITY};

/// Construction parameters for an [`Arena`](super::Arena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArenaConfig {
    /// Minimum capacity of every block, in bytes. Must be non-zero.
    pub initial_block_capacity: usize,
    /// Whether the arena may add blocks once the first is exhausted.
    pub can_grow: bool,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            initial_block_capacity: DEFAULT_BLOCK_CAPACITY,
            can_grow: true,
        }
    }
}

impl ArenaConfig {
    /// An arena that lives for the whole process (64 MiB blocks).
    pub const fn permanent() -> Self {
        Self {
            initial_block_capacity: mib(64),
            can_grow: true,
        }
    }

    /// An arena cleared once per loop iteration (128 MiB blocks).
    pub const fn transient() -> Self {
        Self {
            initial_block_capacity: mib(128),
            can_grow: true,
        }
    }

    /// A single block of `capacity` bytes that can never grow.
    pub const fn fixed(capacity: usize) -> Self {
        Self {
            initial_block_capacity: capacity,
            can_grow: false,
        }
    }

    /// Checks values that would otherwise be fatal at construction.
    ///
    /// # Errors
    /// Returns [`ConfigError::ZeroCapacity`] for a zero block capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_block_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }

    /// Parses and validates a JSON configuration. Missing fields take their
    /// default values.
    ///
    /// # Errors
    /// Returns [`ConfigError::Json`] for malformed input, or a validation error.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration from `path`.
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(&text)
    }
}

/// Errors from loading an [`ArenaConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io(std::io::Error),
    /// The configuration is not valid JSON for this type.
    Json(serde_json::Error),
    /// `initial_block_capacity` was zero.
    ZeroCapacity,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read arena config: {err}"),
            Self::Json(err) => write!(f, "invalid arena config: {err}"),
            Self::ZeroCapacity => f.write_str("initial_block_capacity cannot be zero"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::ZeroCapacity => None,
        }
    }
}
