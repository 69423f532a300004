//! Pool usage statistics
//!
//! Counters are atomics so a shared pool can be observed without taking the
//! allocation lock; the pool only updates them when `track_stats` is set.

use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::util::atomic_max;

/// Atomic counters owned by a pool instance
#[derive(Debug, Default)]
pub(crate) struct PoolStats {
    allocs: AtomicU64,
    frees: AtomicU64,
    failed_allocs: AtomicU64,
    regions_grown: AtomicU64,
    peak_slots_in_use: AtomicUsize,
}

impl PoolStats {
    pub(crate) fn record_alloc(&self, slots_in_use: usize) {
        self.allocs.fetch_add(1, Ordering::Relaxed);
        atomic_max(&self.peak_slots_in_use, slots_in_use);
    }

    pub(crate) fn record_free(&self) {
        self.frees.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed_alloc(&self) {
        self.failed_allocs.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_grow(&self) {
        self.regions_grown.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        self.allocs.store(0, Ordering::Relaxed);
        self.frees.store(0, Ordering::Relaxed);
        self.failed_allocs.store(0, Ordering::Relaxed);
        self.regions_grown.store(0, Ordering::Relaxed);
        self.peak_slots_in_use.store(0, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, slots_in_use: usize, capacity: usize) -> StatsSnapshot {
        StatsSnapshot {
            allocs: self.allocs.load(Ordering::Relaxed),
            frees: self.frees.load(Ordering::Relaxed),
            failed_allocs: self.failed_allocs.load(Ordering::Relaxed),
            regions_grown: self.regions_grown.load(Ordering::Relaxed),
            peak_slots_in_use: self.peak_slots_in_use.load(Ordering::Relaxed),
            slots_in_use,
            capacity,
        }
    }
}

/// Point-in-time view of a pool's statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Successful allocations (single slots and runs each count once)
    pub allocs: u64,
    /// Successful frees
    pub frees: u64,
    /// Allocation requests that returned an error
    pub failed_allocs: u64,
    /// Backing regions appended by growable pools
    pub regions_grown: u64,
    /// Highest observed number of allocated slots
    pub peak_slots_in_use: usize,
    /// Currently allocated slots
    pub slots_in_use: usize,
    /// Total slots across all regions
    pub capacity: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_and_peak() {
        let stats = PoolStats::default();
        stats.record_alloc(3);
        stats.record_alloc(7);
        stats.record_free();
        stats.record_alloc(5);

        let snapshot = stats.snapshot(5, 16);
        assert_eq!(snapshot.allocs, 3);
        assert_eq!(snapshot.frees, 1);
        assert_eq!(snapshot.peak_slots_in_use, 7);
        assert_eq!(snapshot.slots_in_use, 5);

        stats.reset();
        assert_eq!(stats.snapshot(0, 16).allocs, 0);
    }
}
