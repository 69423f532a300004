//! Pool configuration

use crate::error::{PoolError, PoolResult};
use crate::pool::free_list::MAX_SLOTS;

/// Maximum number of free-index levels a pool may be configured with.
///
/// Level 0 is the canonical address-ordered chain; higher levels are the
/// skip acceleration.
pub const MAX_INDEX_LEVELS: usize = 8;

/// Configuration for a slot pool
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of slots in the initial backing region
    pub capacity: usize,

    /// Serve requests spanning more than one slot (contiguous runs)
    pub support_runs: bool,

    /// On exhaustion, append one extra region of the original capacity and
    /// retry the request exactly once
    pub growable: bool,

    /// Free-index levels; 1 keeps the plain ordered free list
    pub index_levels: usize,

    /// Fixed seed for the skip-level generator (deterministic tests);
    /// `None` seeds from the OS once at construction
    pub index_seed: Option<u64>,

    /// Enable statistics tracking
    pub track_stats: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            support_runs: false,
            growable: false,
            index_levels: 1,
            index_seed: None,
            track_stats: cfg!(debug_assertions),
        }
    }
}

impl PoolConfig {
    /// Production configuration - optimized for performance
    #[must_use]
    pub fn production() -> Self {
        Self {
            index_levels: 4,
            track_stats: false,
            ..Self::default()
        }
    }

    /// Debug configuration - optimized for debugging
    #[must_use]
    pub fn debug() -> Self {
        Self {
            track_stats: true,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> PoolResult<()> {
        if self.capacity == 0 {
            return Err(PoolError::invalid_config("capacity must be non-zero"));
        }
        if self.capacity > MAX_SLOTS {
            return Err(PoolError::invalid_config("capacity exceeds slot id space"));
        }
        if self.index_levels == 0 || self.index_levels > MAX_INDEX_LEVELS {
            return Err(PoolError::invalid_config(
                "index_levels must be between 1 and MAX_INDEX_LEVELS",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(PoolConfig::default().validate().is_ok());
        assert!(PoolConfig::production().validate().is_ok());
        assert!(PoolConfig::debug().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let config = PoolConfig {
            capacity: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PoolError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_index_levels() {
        for index_levels in [0, MAX_INDEX_LEVELS + 1] {
            let config = PoolConfig {
                index_levels,
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }
    }
}
