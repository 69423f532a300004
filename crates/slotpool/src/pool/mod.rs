//! Fixed-block slot pool
//!
//! A pool carves one or more backing regions into equal-sized slots and
//! serves them through an address-ordered free list. Single-slot requests
//! pop the list head; larger requests reserve a contiguous run of slots and
//! are remembered in the run table until freed.
//!
//! # Memory layout
//! ```text
//! region 0: [slot 0][slot 1][slot 2] ... [slot C-1]
//! region 1: [slot C][slot C+1]      ...              (growable pools only)
//! ```
//!
//! Callers receive raw addresses into the regions and own the slots behind
//! them until `free`; the pool always owns the regions themselves.

pub(crate) mod free_list;
mod boxed;
mod run_table;
mod shared;

use core::fmt;
use core::ptr::NonNull;
use std::alloc::{Layout, alloc, dealloc};

use rand::SeedableRng as _;
use rand::rngs::SmallRng;
use tracing::{debug, trace};

use self::free_list::{FreeList, MAX_SLOTS};
use self::run_table::RunTable;
use crate::config::PoolConfig;
use crate::error::{PoolError, PoolResult};
use crate::stats::{PoolStats, StatsSnapshot};
use crate::util::align_up;

pub use self::boxed::PoolBox;
pub use self::shared::SharedSlotPool;

/// One backing allocation, carved into `slots` fixed-size slots.
struct Region {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl Region {
    fn new(slot_size: usize, slot_align: usize, slots: usize) -> PoolResult<Self> {
        let bytes = slot_size
            .checked_mul(slots)
            .ok_or_else(|| PoolError::invalid_config("region byte size overflows"))?;
        let layout = Layout::from_size_align(bytes, slot_align)
            .map_err(|_| PoolError::invalid_config("region layout is invalid"))?;

        // SAFETY: the layout has a non-zero size (slot_size carries a
        // pointer-width floor and slots >= 1) and a power-of-two alignment.
        // The pointer is null-checked below and released in Drop with the
        // same layout.
        let ptr = unsafe { alloc(layout) };
        let ptr =
            NonNull::new(ptr).ok_or_else(|| PoolError::allocation_failed(bytes, slot_align))?;

        Ok(Self { ptr, layout })
    }

    fn base(&self) -> usize {
        self.ptr.as_ptr() as usize
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        // SAFETY: allocated in Region::new with this exact layout.
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

/// Fixed-block pool allocator over equal-sized slots.
///
/// Operations take `&mut self`; wrap the pool in [`SharedSlotPool`] for
/// multi-threaded use.
pub struct SlotPool {
    regions: Vec<Region>,
    slot_size: usize,
    slot_align: usize,
    /// Slots per region; region boundaries break physical adjacency.
    region_slots: usize,
    free: FreeList,
    runs: RunTable,
    rng: SmallRng,
    config: PoolConfig,
    stats: PoolStats,
}

impl SlotPool {
    /// Creates a pool whose slot size and alignment are derived from `T`.
    ///
    /// The slot size is `size_of::<T>()` with a pointer-width floor, rounded
    /// up to the alignment of `T`.
    pub fn for_type<T>(config: PoolConfig) -> PoolResult<Self> {
        Self::with_slot_layout(Layout::new::<T>(), config)
    }

    /// Creates a pool for payloads described by `layout`.
    pub fn with_slot_layout(layout: Layout, config: PoolConfig) -> PoolResult<Self> {
        config.validate()?;

        let slot_align = layout.align();
        let slot_size = align_up(layout.size().max(size_of::<usize>()), slot_align);

        let mut rng = match config.index_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        let mut free = FreeList::new(config.index_levels, config.capacity);
        free.append_slots(config.capacity, &mut rng);
        let region = Region::new(slot_size, slot_align, config.capacity)?;

        debug!(
            slot_size,
            capacity = config.capacity,
            index_levels = config.index_levels,
            "slot pool initialized"
        );

        Ok(Self {
            regions: vec![region],
            slot_size,
            slot_align,
            region_slots: config.capacity,
            free,
            runs: RunTable::default(),
            rng,
            config,
            stats: PoolStats::default(),
        })
    }

    /// Allocates `size` bytes, occupying `ceil(size / slot_size)` slots.
    ///
    /// A request that fits one slot pops the free-list head. Larger requests
    /// reserve the lowest contiguous run of slots, all-or-nothing: a failed
    /// run request leaves the free list and run table untouched.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidSize`] for `size == 0`, or for a multi-slot
    ///   request when `support_runs` is off
    /// - [`PoolError::PoolExhausted`] when no slot (or no run of the needed
    ///   length) is available; growable pools first append one region of the
    ///   original capacity and retry exactly once
    pub fn allocate(&mut self, size: usize) -> PoolResult<NonNull<u8>> {
        match self.allocate_inner(size) {
            Ok(ptr) => Ok(ptr),
            Err(err) => {
                if self.config.track_stats {
                    self.stats.record_failed_alloc();
                }
                Err(err)
            }
        }
    }

    fn allocate_inner(&mut self, size: usize) -> PoolResult<NonNull<u8>> {
        if size == 0 {
            return Err(PoolError::invalid_size(0));
        }
        let n = size.div_ceil(self.slot_size);
        if n > 1 && !self.config.support_runs {
            return Err(PoolError::invalid_size(size));
        }

        match self.reserve(n) {
            Ok(slot) => Ok(self.slot_ptr(slot)),
            Err(err) if err.is_retryable() && self.config.growable => {
                self.grow()?;
                let slot = self.reserve(n)?;
                Ok(self.slot_ptr(slot))
            }
            Err(err) => Err(err),
        }
    }

    /// Takes `n` slots off the free list, recording runs of more than one.
    fn reserve(&mut self, n: usize) -> PoolResult<u32> {
        debug_assert!(n >= 1);

        if n == 1 {
            let slot = self
                .free
                .pop_head()
                .ok_or_else(|| PoolError::exhausted(1, 0))?;
            self.note_alloc();
            return Ok(slot);
        }

        if n > self.capacity() {
            // Oversized requests fail without scanning the list.
            return Err(PoolError::exhausted(n, self.free.len()));
        }
        trace!(slots = n, "searching for contiguous run");
        let start = self
            .free
            .find_run(n)
            .ok_or_else(|| PoolError::exhausted(n, self.free.len()))?;
        self.free.remove_run(start, n);
        self.runs.record(start, n as u32);
        self.note_alloc();
        Ok(start)
    }

    fn note_alloc(&self) {
        if self.config.track_stats {
            self.stats.record_alloc(self.slots_in_use());
        }
    }

    /// Appends one region of the original capacity and links its slots.
    fn grow(&mut self) -> PoolResult<()> {
        if self.capacity() + self.region_slots > MAX_SLOTS {
            return Err(PoolError::exhausted(self.region_slots, self.free.len()));
        }
        let region = Region::new(self.slot_size, self.slot_align, self.region_slots)?;
        self.regions.push(region);
        self.free.append_slots(self.region_slots, &mut self.rng);
        if self.config.track_stats {
            self.stats.record_grow();
        }
        debug!(
            regions = self.regions.len(),
            capacity = self.capacity(),
            "pool grown by one region"
        );
        Ok(())
    }

    /// Returns an allocation to the pool.
    ///
    /// A null pointer is a no-op. If `ptr` started a recorded run, every
    /// slot of that run is re-inserted at its sorted position and the run
    /// entry is dropped; otherwise a single slot is returned.
    ///
    /// # Errors
    ///
    /// - [`PoolError::UnownedAddress`] when `ptr` lies outside every backing
    ///   region or is not on a slot boundary
    /// - [`PoolError::DoubleFree`] when any slot of the allocation is
    ///   already free; the free list is left unchanged
    pub fn free(&mut self, ptr: *mut u8) -> PoolResult<()> {
        if ptr.is_null() {
            return Ok(());
        }
        let addr = ptr as usize;
        let slot = self
            .slot_of(addr)
            .ok_or_else(|| PoolError::unowned_address(addr))?;

        let n = self.runs.lookup(slot);
        for offset in 0..n {
            if self.free.contains(slot + offset) {
                let addr = self.slot_ptr(slot + offset).as_ptr() as usize;
                return Err(PoolError::double_free(addr));
            }
        }
        for offset in 0..n {
            self.free.insert(slot + offset, &mut self.rng);
        }
        self.runs.erase(slot);
        if self.config.track_stats {
            self.stats.record_free();
        }
        Ok(())
    }

    /// Replaces the backing storage with a single fresh region of
    /// `new_capacity` slots.
    ///
    /// Valid only while nothing is allocated; every address previously
    /// handed out becomes invalid.
    ///
    /// # Errors
    ///
    /// - [`PoolError::OutstandingAllocations`] when any slot is still
    ///   allocated
    /// - [`PoolError::InvalidConfig`] for a zero or unrepresentable capacity
    pub fn resize(&mut self, new_capacity: usize) -> PoolResult<()> {
        let outstanding = self.slots_in_use();
        if outstanding > 0 {
            return Err(PoolError::outstanding_allocations(outstanding));
        }
        if new_capacity == 0 || new_capacity > MAX_SLOTS {
            return Err(PoolError::invalid_config("capacity must be non-zero"));
        }

        let region = Region::new(self.slot_size, self.slot_align, new_capacity)?;
        let mut free = FreeList::new(self.config.index_levels, new_capacity);
        free.append_slots(new_capacity, &mut self.rng);

        self.regions.clear();
        self.regions.push(region);
        self.region_slots = new_capacity;
        self.free = free;
        self.runs.clear();

        debug!(capacity = new_capacity, "pool resized");
        Ok(())
    }

    /// Size of each slot in bytes.
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Alignment of each slot.
    pub fn slot_align(&self) -> usize {
        self.slot_align
    }

    /// Total slots across all regions.
    pub fn capacity(&self) -> usize {
        self.regions.len() * self.region_slots
    }

    /// Currently free slots.
    pub fn free_slot_count(&self) -> usize {
        self.free.len()
    }

    /// Currently allocated slots.
    pub fn slots_in_use(&self) -> usize {
        self.capacity() - self.free.len()
    }

    /// Outstanding multi-slot allocations.
    pub fn outstanding_runs(&self) -> usize {
        self.runs.len()
    }

    /// Whether `ptr` points into one of this pool's regions.
    pub fn contains(&self, ptr: *const u8) -> bool {
        let addr = ptr as usize;
        self.regions
            .iter()
            .any(|r| addr >= r.base() && addr < r.base() + r.layout.size())
    }

    /// Lazy, read-only view of the free slots in ascending address order.
    ///
    /// Diagnostic surface for tests; never mutates the pool.
    pub fn free_slots(&self) -> impl Iterator<Item = NonNull<u8>> + '_ {
        self.free.iter().map(|slot| self.slot_ptr(slot))
    }

    /// Point-in-time statistics. Counters stay zero unless
    /// [`track_stats`](PoolConfig::track_stats) is set.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.slots_in_use(), self.capacity())
    }

    fn slot_ptr(&self, slot: u32) -> NonNull<u8> {
        let region = &self.regions[slot as usize / self.region_slots];
        let offset = (slot as usize % self.region_slots) * self.slot_size;
        // SAFETY: slot ids are bounded by regions.len() * region_slots, so
        // the offset stays inside the region allocation.
        unsafe { NonNull::new_unchecked(region.ptr.as_ptr().add(offset)) }
    }

    fn slot_of(&self, addr: usize) -> Option<u32> {
        for (index, region) in self.regions.iter().enumerate() {
            let base = region.base();
            if addr >= base && addr < base + region.layout.size() {
                let offset = addr - base;
                if offset % self.slot_size != 0 {
                    return None;
                }
                return Some((index * self.region_slots + offset / self.slot_size) as u32);
            }
        }
        None
    }
}

// SAFETY: the pool exclusively owns its backing regions; its raw pointers
// are not shared with any other owner.
unsafe impl Send for SlotPool {}

impl fmt::Debug for SlotPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotPool")
            .field("slot_size", &self.slot_size)
            .field("capacity", &self.capacity())
            .field("free_slots", &self.free.len())
            .field("outstanding_runs", &self.runs.len())
            .field("regions", &self.regions.len())
            .finish_non_exhaustive()
    }
}
