//! Store configuration.

use std::num::NonZeroUsize;

/// Limits shared by every unit of work a store hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Maximum number of units of work holding an open transaction at once.
    /// Further `begin` calls wait for a slot.
    pub max_concurrent_units: NonZeroUsize,
}

impl StoreConfig {
    /// Default cap on concurrently open transactions.
    pub const DEFAULT_MAX_CONCURRENT_UNITS: NonZeroUsize = NonZeroUsize::new(8).unwrap();

    /// Creates a configuration with the given concurrency cap.
    #[must_use]
    pub fn new(max_concurrent_units: NonZeroUsize) -> Self {
        Self {
            max_concurrent_units,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_CONCURRENT_UNITS)
    }
}
