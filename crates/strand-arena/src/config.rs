//! Store configuration parameters.

use crate::buffer::RECORD_ALIGN;
use crate::error::ArenaError;

/// Configuration for a [`NodeStore`](crate::NodeStore).
///
/// Controls the initial buffer size and the single-allocation ceiling.
/// Validated at construction; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// Initial buffer capacity in bytes (records plus table of contents).
    ///
    /// Default: 65_536. Must be a multiple of 4 and at least 256.
    pub initial_capacity: usize,

    /// Largest buffer the store may grow to, in bytes.
    ///
    /// Default: 1GB. Growth that would exceed this is reported as
    /// [`ArenaError::CapacityExceeded`], which callers treat as fatal.
    pub max_capacity: usize,
}

impl StoreConfig {
    /// Default initial capacity: 64KB.
    pub const DEFAULT_INITIAL_CAPACITY: usize = 64 * 1024;

    /// Default growth ceiling: 1GB.
    pub const DEFAULT_MAX_CAPACITY: usize = 1024 * 1024 * 1024;

    /// Smallest accepted initial capacity.
    pub const MIN_CAPACITY: usize = 256;

    /// Create a config with the given initial capacity and the default ceiling.
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            max_capacity: Self::DEFAULT_MAX_CAPACITY,
        }
    }

    /// Set the growth ceiling.
    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Check the structural invariants documented on each field.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.initial_capacity < Self::MIN_CAPACITY {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "initial_capacity must be >= {} (got {})",
                    Self::MIN_CAPACITY,
                    self.initial_capacity
                ),
            });
        }
        if self.initial_capacity % RECORD_ALIGN != 0 || self.max_capacity % RECORD_ALIGN != 0 {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "capacities must be multiples of {RECORD_ALIGN} (got {} / {})",
                    self.initial_capacity, self.max_capacity
                ),
            });
        }
        if self.initial_capacity > self.max_capacity {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "initial_capacity {} exceeds max_capacity {}",
                    self.initial_capacity, self.max_capacity
                ),
            });
        }
        if self.max_capacity > i32::MAX as usize {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "max_capacity {} does not fit a signed 32-bit offset",
                    self.max_capacity
                ),
            });
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INITIAL_CAPACITY)
    }
}
