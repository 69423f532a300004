//! Address-ordered free-slot list with an optional skip index
//!
//! Free slots are tracked by `u32` slot id, never by raw address: links live
//! in side tables owned by this structure, so a stale link can at worst point
//! at a wrong slot id, not at freed memory. Level 0 is the canonical chain,
//! sorted ascending by slot id, which is the property the contiguous-run
//! search relies on (ids adjacent within one region are physically adjacent).
//!
//! Levels 1.. are a classic layered skip index over the same key space. They
//! only accelerate predecessor location for insertion and run removal; run
//! discovery itself always walks level 0, so enabling the index can never
//! change which run is found.

use rand::Rng as _;
use rand::rngs::SmallRng;

use crate::config::MAX_INDEX_LEVELS;

/// Sentinel for "no link"; also caps the representable slot id space.
pub(crate) const NIL: u32 = u32::MAX;

/// Largest slot count a pool may address (`NIL` is reserved).
pub(crate) const MAX_SLOTS: usize = NIL as usize;

pub(crate) struct FreeList {
    /// Forward links, `levels` entries per slot: `forward[slot * levels + lvl]`.
    /// Only the first `node_level[slot]` entries are meaningful, and only
    /// while the slot is free.
    forward: Vec<u32>,
    /// Chain membership: 0 = allocated, n > 0 = free and linked at levels 0..n.
    node_level: Vec<u8>,
    /// Entry link of each level chain.
    head: [u32; MAX_INDEX_LEVELS],
    /// Configured level count; 1 means a plain ordered list.
    levels: usize,
    /// Physical adjacency breaks at multiples of this (slots per region).
    region_slots: u32,
    len: usize,
}

impl FreeList {
    /// Creates an empty list covering zero slots; populate with
    /// [`append_slots`](Self::append_slots).
    pub(crate) fn new(levels: usize, region_slots: usize) -> Self {
        debug_assert!(levels >= 1 && levels <= MAX_INDEX_LEVELS);
        debug_assert!(region_slots >= 1 && region_slots <= MAX_SLOTS);

        Self {
            forward: Vec::new(),
            node_level: Vec::new(),
            head: [NIL; MAX_INDEX_LEVELS],
            levels,
            region_slots: region_slots as u32,
            len: 0,
        }
    }

    /// Number of free slots.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Total slots tracked (free or allocated).
    pub(crate) fn total_slots(&self) -> usize {
        self.node_level.len()
    }

    /// Whether `slot` is currently on the free list.
    pub(crate) fn contains(&self, slot: u32) -> bool {
        self.node_level[slot as usize] > 0
    }

    #[inline]
    fn next(&self, slot: u32, lvl: usize) -> u32 {
        self.forward[slot as usize * self.levels + lvl]
    }

    #[inline]
    fn set_next(&mut self, slot: u32, lvl: usize, to: u32) {
        self.forward[slot as usize * self.levels + lvl] = to;
    }

    /// Unbiased geometric draw: level k with probability 2^-k, capped.
    fn random_level(&self, rng: &mut SmallRng) -> u8 {
        let mut lvl = 1u8;
        while (lvl as usize) < self.levels && rng.random::<bool>() {
            lvl += 1;
        }
        lvl
    }

    /// Predecessor of `target` at every level; `NIL` stands for the list head.
    fn seek(&self, target: u32) -> [u32; MAX_INDEX_LEVELS] {
        let mut preds = [NIL; MAX_INDEX_LEVELS];
        let mut pred = NIL;
        for lvl in (0..self.levels).rev() {
            let mut next = if pred == NIL {
                self.head[lvl]
            } else {
                self.next(pred, lvl)
            };
            while next != NIL && next < target {
                pred = next;
                next = self.next(pred, lvl);
            }
            preds[lvl] = pred;
        }
        preds
    }

    /// Links `count` fresh slots after the current tail. The new ids are
    /// `total_slots()..total_slots() + count`, which sort after every
    /// existing slot, so this covers both initial population and region
    /// growth.
    pub(crate) fn append_slots(&mut self, count: usize, rng: &mut SmallRng) {
        let first = self.total_slots() as u32;
        debug_assert!(first as usize + count <= MAX_SLOTS);

        self.node_level.resize(self.node_level.len() + count, 0);
        self.forward.resize(self.forward.len() + count * self.levels, NIL);

        let mut tails = self.seek(NIL);
        for slot in first..first + count as u32 {
            let lvl = self.random_level(rng);
            self.node_level[slot as usize] = lvl;
            for l in 0..lvl as usize {
                match tails[l] {
                    NIL => self.head[l] = slot,
                    tail => self.set_next(tail, l, slot),
                }
                self.set_next(slot, l, NIL);
                tails[l] = slot;
            }
        }
        self.len += count;
    }

    /// Removes and returns the lowest free slot.
    pub(crate) fn pop_head(&mut self) -> Option<u32> {
        let slot = self.head[0];
        if slot == NIL {
            return None;
        }
        // The minimum key fronts every chain it belongs to.
        let lvl = self.node_level[slot as usize] as usize;
        for l in 0..lvl {
            debug_assert_eq!(self.head[l], slot);
            self.head[l] = self.next(slot, l);
        }
        self.node_level[slot as usize] = 0;
        self.len -= 1;
        Some(slot)
    }

    /// Links `slot` at its sorted position. The caller guarantees the slot
    /// is not already free (see [`contains`](Self::contains)).
    pub(crate) fn insert(&mut self, slot: u32, rng: &mut SmallRng) {
        debug_assert!(!self.contains(slot));

        let preds = self.seek(slot);
        let lvl = self.random_level(rng);
        self.node_level[slot as usize] = lvl;
        for l in 0..lvl as usize {
            let succ = match preds[l] {
                NIL => self.head[l],
                pred => self.next(pred, l),
            };
            debug_assert_ne!(succ, slot);
            self.set_next(slot, l, succ);
            match preds[l] {
                NIL => self.head[l] = slot,
                pred => self.set_next(pred, l, slot),
            }
        }
        self.len += 1;
    }

    /// Finds the lowest run of `n` physically contiguous free slots.
    ///
    /// Walks level 0 keeping a run counter: the counter extends while the
    /// next node's id is exactly one above the current node's and does not
    /// cross a region boundary, and resets past any gap. Because level 0 is
    /// sorted, a counted run is both an id range and a chain sub-sequence.
    pub(crate) fn find_run(&self, n: usize) -> Option<u32> {
        if n == 0 || n > self.len {
            return None;
        }
        let mut start = self.head[0];
        while start != NIL {
            let mut cur = start;
            let mut count = 1;
            while count < n {
                let next = self.next(cur, 0);
                if next == cur + 1 && next % self.region_slots != 0 {
                    cur = next;
                    count += 1;
                } else {
                    break;
                }
            }
            if count == n {
                return Some(start);
            }
            // The node past the break starts the next candidate segment.
            start = self.next(cur, 0);
        }
        None
    }

    /// Unlinks the `n` successive nodes beginning at `start`, walking from
    /// the predecessors located by a seek. `start` must come from
    /// [`find_run`](Self::find_run) with the same `n`.
    pub(crate) fn remove_run(&mut self, start: u32, n: usize) {
        let preds = self.seek(start);
        for _ in 0..n {
            let slot = match preds[0] {
                NIL => self.head[0],
                pred => self.next(pred, 0),
            };
            debug_assert_ne!(slot, NIL);
            let lvl = self.node_level[slot as usize] as usize;
            for l in 0..lvl {
                let succ = self.next(slot, l);
                match preds[l] {
                    NIL => {
                        debug_assert_eq!(self.head[l], slot);
                        self.head[l] = succ;
                    }
                    pred => {
                        debug_assert_eq!(self.next(pred, l), slot);
                        self.set_next(pred, l, succ);
                    }
                }
            }
            self.node_level[slot as usize] = 0;
            self.len -= 1;
        }
    }

    /// Lazy, read-only walk of the level-0 chain in ascending order.
    pub(crate) fn iter(&self) -> FreeSlots<'_> {
        FreeSlots {
            list: self,
            cur: self.head[0],
        }
    }

    /// Structural validation used by tests: every chain sorted, every higher
    /// chain a sub-sequence of level 0, membership bytes consistent.
    #[cfg(test)]
    pub(crate) fn assert_valid(&self) {
        let level0: Vec<u32> = self.iter().collect();
        assert_eq!(level0.len(), self.len);
        assert!(level0.windows(2).all(|w| w[0] < w[1]), "level 0 unsorted");
        for &slot in &level0 {
            assert!(self.contains(slot));
        }
        for lvl in 1..self.levels {
            let mut chain = Vec::new();
            let mut cur = self.head[lvl];
            while cur != NIL {
                chain.push(cur);
                cur = self.next(cur, lvl);
            }
            assert!(chain.windows(2).all(|w| w[0] < w[1]), "level {lvl} unsorted");
            for &slot in &chain {
                assert!(
                    (self.node_level[slot as usize] as usize) > lvl,
                    "slot {slot} linked above its level"
                );
                assert!(level0.binary_search(&slot).is_ok());
            }
        }
    }
}

/// Iterator over free slot ids in level-0 order.
pub(crate) struct FreeSlots<'a> {
    list: &'a FreeList,
    cur: u32,
}

impl Iterator for FreeSlots<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.cur == NIL {
            return None;
        }
        let slot = self.cur;
        self.cur = self.list.next(slot, 0);
        Some(slot)
    }
}
