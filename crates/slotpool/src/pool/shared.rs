//! Mutex-guarded facade for multi-threaded use
//!
//! One lock per pool instance covers `allocate` and `free` (and `resize`)
//! for their full duration, so operations from different threads observe a
//! total order consistent with lock acquisition. The guard is an RAII lock,
//! released on every exit path including error returns.

use core::ptr::NonNull;
use std::alloc::Layout;

use parking_lot::Mutex;

use super::SlotPool;
use crate::config::PoolConfig;
use crate::error::PoolResult;
use crate::stats::StatsSnapshot;

/// Thread-safe slot pool.
///
/// Resize requires externally guaranteeing that no allocation is
/// outstanding; the lock serializes the call itself, but the
/// zero-outstanding precondition remains the caller's contract.
pub struct SharedSlotPool {
    inner: Mutex<SlotPool>,
}

impl SharedSlotPool {
    /// Wraps an existing pool.
    pub fn new(pool: SlotPool) -> Self {
        Self {
            inner: Mutex::new(pool),
        }
    }

    /// Creates a shared pool whose slot layout is derived from `T`.
    pub fn for_type<T>(config: PoolConfig) -> PoolResult<Self> {
        SlotPool::for_type::<T>(config).map(Self::new)
    }

    /// Creates a shared pool for payloads described by `layout`.
    pub fn with_slot_layout(layout: Layout, config: PoolConfig) -> PoolResult<Self> {
        SlotPool::with_slot_layout(layout, config).map(Self::new)
    }

    /// See [`SlotPool::allocate`].
    pub fn allocate(&self, size: usize) -> PoolResult<NonNull<u8>> {
        self.inner.lock().allocate(size)
    }

    /// See [`SlotPool::free`].
    pub fn free(&self, ptr: *mut u8) -> PoolResult<()> {
        self.inner.lock().free(ptr)
    }

    /// See [`SlotPool::resize`].
    pub fn resize(&self, new_capacity: usize) -> PoolResult<()> {
        self.inner.lock().resize(new_capacity)
    }

    /// Size of each slot in bytes.
    pub fn slot_size(&self) -> usize {
        self.inner.lock().slot_size()
    }

    /// Alignment of each slot.
    pub fn slot_align(&self) -> usize {
        self.inner.lock().slot_align()
    }

    /// Total slots across all regions.
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    /// Currently free slots.
    pub fn free_slot_count(&self) -> usize {
        self.inner.lock().free_slot_count()
    }

    /// Currently allocated slots.
    pub fn slots_in_use(&self) -> usize {
        self.inner.lock().slots_in_use()
    }

    /// Outstanding multi-slot allocations.
    pub fn outstanding_runs(&self) -> usize {
        self.inner.lock().outstanding_runs()
    }

    /// Point-in-time statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.lock().stats()
    }

    /// Unwraps the single-threaded pool.
    pub fn into_inner(self) -> SlotPool {
        self.inner.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_concurrent_allocate_and_free() {
        let pool = Arc::new(
            SharedSlotPool::for_type::<u64>(PoolConfig {
                capacity: 100,
                ..Default::default()
            })
            .unwrap(),
        );

        let handles: Vec<_> = (0..4u64)
            .map(|thread_id| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    let mut held = Vec::new();
                    for i in 0..10u64 {
                        let ptr = pool.allocate(8).unwrap();
                        // SAFETY: the slot is 8 bytes, u64-aligned, and
                        // exclusively ours until freed.
                        unsafe { ptr.cast::<u64>().as_ptr().write(thread_id * 1000 + i) };
                        held.push(ptr);
                    }

                    for (i, ptr) in held.iter().enumerate() {
                        // SAFETY: written above, still allocated.
                        let value = unsafe { ptr.cast::<u64>().as_ptr().read() };
                        assert_eq!(value, thread_id * 1000 + i as u64);
                    }

                    for ptr in held {
                        pool.free(ptr.as_ptr()).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(pool.slots_in_use(), 0);
        assert_eq!(pool.free_slot_count(), 100);
    }

    #[test]
    fn test_resize_through_the_lock() {
        let pool = SharedSlotPool::for_type::<u64>(PoolConfig {
            capacity: 8,
            ..Default::default()
        })
        .unwrap();

        pool.resize(32).unwrap();
        assert_eq!(pool.capacity(), 32);
        assert_eq!(pool.into_inner().free_slot_count(), 32);
    }
}
