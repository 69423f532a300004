//! RAII helper for pool-allocated objects
//!
//! # Safety
//!
//! - `PoolBox::ptr` is written exactly once in `new_in` and read back only
//!   in `into_inner` (which forgets `self`) or `Drop` (which runs the
//!   destructor in place), so the value is never dropped twice
//! - The handle borrows the pool, so it cannot outlive it and the slot
//!   behind `ptr` stays valid for the handle's whole lifetime

use core::ops::{Deref, DerefMut};
use core::ptr::NonNull;

use super::SharedSlotPool;
use crate::error::{PoolError, PoolResult};

/// A `T` stored in a pool slot, returned to the pool on drop.
///
/// Payloads larger than one slot occupy a contiguous run and release it as
/// a whole, the same as any run allocation.
pub struct PoolBox<'a, T> {
    ptr: NonNull<T>,
    pool: &'a SharedSlotPool,
}

impl<'a, T> PoolBox<'a, T> {
    /// Moves `value` into a slot of `pool`.
    ///
    /// # Errors
    ///
    /// Fails with [`PoolError::InvalidConfig`] when `T` requires stricter
    /// alignment than the pool's slots provide, or propagates the pool's
    /// allocation error.
    pub fn new_in(value: T, pool: &'a SharedSlotPool) -> PoolResult<Self> {
        if align_of::<T>() > pool.slot_align() {
            return Err(PoolError::invalid_config(
                "payload alignment exceeds pool slot alignment",
            ));
        }
        let ptr = pool.allocate(size_of::<T>().max(1))?.cast::<T>();
        // SAFETY: the allocation spans at least size_of::<T>() bytes, the
        // alignment was checked above, and the slot is exclusively ours.
        unsafe { ptr.as_ptr().write(value) };
        Ok(Self { ptr, pool })
    }

    /// Gets a reference to the pool this value lives in.
    pub fn pool(&self) -> &SharedSlotPool {
        self.pool
    }

    /// Consumes the handle and returns the contained value.
    pub fn into_inner(self) -> T {
        // SAFETY: written in new_in; forget below prevents Drop from
        // reading the slot again after it is returned to the pool.
        let value = unsafe { self.ptr.as_ptr().read() };
        let _ = self.pool.free(self.ptr.as_ptr().cast());
        core::mem::forget(self);
        value
    }
}

impl<T> Deref for PoolBox<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: ptr is valid and initialized for the handle's lifetime.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T> DerefMut for PoolBox<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: ptr is valid and initialized for the handle's lifetime.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T> AsRef<T> for PoolBox<'_, T> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T> AsMut<T> for PoolBox<'_, T> {
    fn as_mut(&mut self) -> &mut T {
        self
    }
}

impl<T> Drop for PoolBox<'_, T> {
    fn drop(&mut self) {
        // SAFETY: ptr was written in new_in and the value not yet consumed;
        // the slot is handed back exactly once.
        unsafe { core::ptr::drop_in_place(self.ptr.as_ptr()) };
        let _ = self.pool.free(self.ptr.as_ptr().cast());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;

    fn shared_pool(capacity: usize) -> SharedSlotPool {
        SharedSlotPool::for_type::<u64>(PoolConfig {
            capacity,
            support_runs: true,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_value_round_trip() {
        let pool = shared_pool(8);

        let mut boxed = PoolBox::new_in(42u64, &pool).unwrap();
        assert_eq!(*boxed, 42);
        *boxed = 100;

        let value = boxed.into_inner();
        assert_eq!(value, 100);
        assert_eq!(pool.slots_in_use(), 0);
    }

    #[test]
    fn test_drop_returns_slot() {
        let pool = shared_pool(8);

        let boxed = PoolBox::new_in(7u64, &pool).unwrap();
        assert_eq!(pool.slots_in_use(), 1);
        drop(boxed);
        assert_eq!(pool.slots_in_use(), 0);
    }

    #[test]
    fn test_destructor_runs_on_drop() {
        let pool = SharedSlotPool::for_type::<Vec<u8>>(PoolConfig {
            capacity: 4,
            ..Default::default()
        })
        .unwrap();

        let boxed = PoolBox::new_in(vec![1u8, 2, 3], &pool).unwrap();
        assert_eq!(boxed.len(), 3);
        drop(boxed);
        assert_eq!(pool.slots_in_use(), 0);
    }

    #[test]
    fn test_multi_slot_payload_uses_a_run() {
        let pool = shared_pool(8);

        let boxed = PoolBox::new_in([1u64, 2, 3], &pool).unwrap();
        assert_eq!(pool.slots_in_use(), 3);
        assert_eq!(pool.outstanding_runs(), 1);
        assert_eq!(boxed[2], 3);

        drop(boxed);
        assert_eq!(pool.slots_in_use(), 0);
        assert_eq!(pool.outstanding_runs(), 0);
    }

    #[test]
    fn test_alignment_mismatch_is_rejected() {
        let pool = SharedSlotPool::for_type::<u8>(PoolConfig::default()).unwrap();
        let result = PoolBox::new_in(1u64, &pool);
        assert!(matches!(result, Err(PoolError::InvalidConfig { .. })));
    }
}
