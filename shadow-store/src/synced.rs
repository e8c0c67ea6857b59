//! Monotonic set of synced item indices.
//!
//! Backed by a bitset sized for the whole collection. There is no removal:
//! once an index is inserted it stays synced for the life of the store.

use crate::range::IndexRange;

const WORD_BITS: usize = 64;

/// Set of indices whose cached bytes are valid.
#[derive(Debug, Clone)]
pub struct SyncedSet {
    words: Vec<u64>,
    capacity: usize,
    count: usize,
}

impl SyncedSet {
    /// Creates an empty set for indices `0..capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(WORD_BITS)],
            capacity,
            count: 0,
        }
    }

    /// Number of synced indices.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Size of the index space.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` once every index is synced.
    pub fn is_full(&self) -> bool {
        self.count >= self.capacity
    }

    pub fn contains(&self, index: usize) -> bool {
        if index >= self.capacity {
            return false;
        }
        self.words[index / WORD_BITS] & (1 << (index % WORD_BITS)) != 0
    }

    /// Inserts `index`, returning `true` if it was not synced before.
    pub fn insert(&mut self, index: usize) -> bool {
        if index >= self.capacity {
            return false;
        }
        let word = &mut self.words[index / WORD_BITS];
        let mask = 1 << (index % WORD_BITS);
        if *word & mask != 0 {
            return false;
        }
        *word |= mask;
        self.count += 1;
        true
    }

    /// Inserts `count` contiguous indices from `start`, returning how many
    /// were newly added.
    pub fn insert_run(&mut self, start: usize, count: usize) -> usize {
        (start..start + count).filter(|&i| self.insert(i)).count()
    }

    /// Returns `true` if every index of `range` is synced. Empty ranges are
    /// vacuously synced.
    pub fn contains_range(&self, range: &IndexRange) -> bool {
        if self.is_full() {
            return true;
        }
        range.iter().all(|i| self.contains(i))
    }

    /// Maximal contiguous runs `(start, count)` of unsynced indices in
    /// `range`. Strided ranges yield single-item runs.
    pub fn missing_runs(&self, range: &IndexRange) -> Vec<(usize, usize)> {
        let mut runs: Vec<(usize, usize)> = Vec::new();
        for index in range.iter().filter(|&i| !self.contains(i)) {
            match runs.last_mut() {
                Some((start, count)) if range.step == 1 && *start + *count == index => {
                    *count += 1;
                }
                _ => runs.push((index, 1)),
            }
        }
        runs
    }
}
