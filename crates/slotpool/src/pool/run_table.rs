//! Bookkeeping for outstanding multi-slot allocations

use hashbrown::HashMap;

/// Maps a run's start slot to its length, for runs of more than one slot.
///
/// Single-slot allocations are never recorded; a lookup miss means an
/// implicit length of 1. Ordering lives in the free list, so a hash map is
/// the right container here.
#[derive(Debug, Default)]
pub(crate) struct RunTable {
    runs: HashMap<u32, u32>,
}

impl RunTable {
    /// Records a served run. Recording the same start twice is a logic
    /// defect in the allocator, not a runtime condition.
    pub(crate) fn record(&mut self, start: u32, len: u32) {
        debug_assert!(len > 1);
        let previous = self.runs.insert(start, len);
        debug_assert!(previous.is_none(), "run start {start} recorded twice");
    }

    /// Length of the allocation beginning at `start`; 1 when unrecorded.
    pub(crate) fn lookup(&self, start: u32) -> u32 {
        self.runs.get(&start).copied().unwrap_or(1)
    }

    /// Drops the entry for `start`, if any. Absence just means the freed
    /// allocation was a single slot.
    pub(crate) fn erase(&mut self, start: u32) {
        self.runs.remove(&start);
    }

    /// Number of outstanding runs.
    pub(crate) fn len(&self) -> usize {
        self.runs.len()
    }

    pub(crate) fn clear(&mut self) {
        self.runs.clear();
    }
}
