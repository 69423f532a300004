//! Error types for the slot pool allocator
//!
//! Uses thiserror for clean, idiomatic Rust error definitions.

use thiserror::Error;
use tracing::{error, warn};

/// Slot pool errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    // --- Allocation errors ---
    #[error("no free run of {requested_slots} slot(s) available ({free_slots} free)")]
    PoolExhausted {
        requested_slots: usize,
        free_slots: usize,
    },

    #[error("invalid allocation size: {size} bytes")]
    InvalidSize { size: usize },

    #[error("backing region allocation failed: {size} bytes with {align} byte alignment")]
    AllocationFailed { size: usize, align: usize },

    // --- Deallocation errors ---
    #[error("address {addr:#x} is not owned by this pool")]
    UnownedAddress { addr: usize },

    #[error("address {addr:#x} is already free")]
    DoubleFree { addr: usize },

    // --- Lifecycle errors ---
    #[error("cannot resize with {outstanding} allocation(s) outstanding")]
    OutstandingAllocations { outstanding: usize },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl PoolError {
    /// Check if the error is recoverable by retrying later (after frees)
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PoolExhausted { .. })
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::PoolExhausted { .. } => "POOL:ALLOC:EXHAUSTED",
            Self::InvalidSize { .. } => "POOL:ALLOC:SIZE",
            Self::AllocationFailed { .. } => "POOL:ALLOC:BACKING",
            Self::UnownedAddress { .. } => "POOL:FREE:UNOWNED",
            Self::DoubleFree { .. } => "POOL:FREE:DOUBLE",
            Self::OutstandingAllocations { .. } => "POOL:RESIZE:OUTSTANDING",
            Self::InvalidConfig { .. } => "POOL:CONFIG:INVALID",
        }
    }

    // --- Convenience constructors ---

    /// Create pool exhausted error
    pub fn exhausted(requested_slots: usize, free_slots: usize) -> Self {
        warn!(requested_slots, free_slots, "slot pool exhausted");

        Self::PoolExhausted {
            requested_slots,
            free_slots,
        }
    }

    /// Create invalid size error
    #[must_use]
    pub fn invalid_size(size: usize) -> Self {
        Self::InvalidSize { size }
    }

    /// Create backing allocation failed error
    pub fn allocation_failed(size: usize, align: usize) -> Self {
        error!(size, align, "backing region allocation failed");

        Self::AllocationFailed { size, align }
    }

    /// Create unowned address error
    #[must_use]
    pub fn unowned_address(addr: usize) -> Self {
        Self::UnownedAddress { addr }
    }

    /// Create double free error
    pub fn double_free(addr: usize) -> Self {
        error!(addr, "double free detected");

        Self::DoubleFree { addr }
    }

    /// Create outstanding allocations error
    #[must_use]
    pub fn outstanding_allocations(outstanding: usize) -> Self {
        Self::OutstandingAllocations { outstanding }
    }

    /// Create invalid config error
    pub fn invalid_config(reason: &str) -> Self {
        Self::InvalidConfig {
            reason: reason.to_string(),
        }
    }
}

/// Result type for pool operations
pub type PoolResult<T> = core::result::Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = PoolError::exhausted(4, 2);
        assert!(error.to_string().contains('4'));
        assert!(error.to_string().contains('2'));

        let error = PoolError::unowned_address(0xdead_0000);
        assert!(error.to_string().contains("0xdead0000"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(PoolError::exhausted(1, 0).code(), "POOL:ALLOC:EXHAUSTED");
        assert_eq!(PoolError::invalid_size(0).code(), "POOL:ALLOC:SIZE");
        assert_eq!(
            PoolError::outstanding_allocations(3).code(),
            "POOL:RESIZE:OUTSTANDING"
        );
    }

    #[test]
    fn test_retryable() {
        assert!(PoolError::exhausted(1, 0).is_retryable());
        assert!(!PoolError::invalid_size(0).is_retryable());
        assert!(!PoolError::double_free(0x1000).is_retryable());
    }
}
