//! # Index Ranges
//!
//! Normalization of slice expressions into canonical forward ranges.
//!
//! A [`SliceSpec`] is what callers write: optional bounds that may be
//! negative (counted from the end) and an optional, possibly negative, step.
//! An [`IndexRange`] is what the store and the sync worker operate on:
//! `start <= stop`, both within `[0, len]`, `step >= 1`.
//!
//! ## Negative steps
//!
//! [`resolve_range`] handles a negative step by taking its absolute value and
//! swapping the bounds. The result iterates forward and does not reproduce
//! reverse order; for open-ended reverse slices it is even empty. Callers
//! that need the exact element sequence of a reverse slice use
//! [`slice_indices`] instead.

use crate::error::{Result, StoreError};
use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

/// A slice expression as written by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SliceSpec {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: Option<isize>,
}

impl SliceSpec {
    pub fn new(start: Option<isize>, stop: Option<isize>, step: Option<isize>) -> Self {
        Self { start, stop, step }
    }

    /// The whole collection, `[:]`.
    pub fn full() -> Self {
        Self::default()
    }

    /// Returns a copy of this slice with the given step.
    pub fn with_step(mut self, step: isize) -> Self {
        self.step = Some(step);
        self
    }

    /// Returns `true` if the step is negative.
    pub fn is_reversed(&self) -> bool {
        self.step.map(|s| s < 0).unwrap_or(false)
    }
}

impl From<Range<isize>> for SliceSpec {
    fn from(r: Range<isize>) -> Self {
        Self::new(Some(r.start), Some(r.end), None)
    }
}

impl From<RangeFrom<isize>> for SliceSpec {
    fn from(r: RangeFrom<isize>) -> Self {
        Self::new(Some(r.start), None, None)
    }
}

impl From<RangeTo<isize>> for SliceSpec {
    fn from(r: RangeTo<isize>) -> Self {
        Self::new(None, Some(r.end), None)
    }
}

impl From<RangeFull> for SliceSpec {
    fn from(_: RangeFull) -> Self {
        Self::full()
    }
}

/// A canonical forward range of item indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexRange {
    pub start: usize,
    pub stop: usize,
    pub step: usize,
}

impl IndexRange {
    /// Creates a range; a zero step is treated as one.
    pub fn new(start: usize, stop: usize, step: usize) -> Self {
        Self {
            start,
            stop,
            step: step.max(1),
        }
    }

    /// Contiguous range `start..stop`.
    pub fn contiguous(start: usize, stop: usize) -> Self {
        Self::new(start, stop, 1)
    }

    /// Range covering only `index`.
    pub fn single(index: usize) -> Self {
        Self::new(index, index + 1, 1)
    }

    /// Number of indices covered.
    pub fn len(&self) -> usize {
        if self.stop <= self.start {
            0
        } else {
            (self.stop - self.start).div_ceil(self.step)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the range covers `index`.
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.stop && (index - self.start) % self.step == 0
    }

    /// Iterates the covered indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> {
        let stop = self.stop.max(self.start);
        (self.start..stop).step_by(self.step)
    }

    /// Last covered index plus one, or `start` when empty.
    pub fn end(&self) -> usize {
        match self.len() {
            0 => self.start,
            n => self.start + (n - 1) * self.step + 1,
        }
    }
}

fn clamp_bound(value: isize, len: usize) -> usize {
    let len_i = len as isize;
    let value = if value < 0 { len_i + value } else { value };
    value.clamp(0, len_i) as usize
}

/// Normalizes `spec` against a collection of `len` items.
///
/// Negative bounds count from the end, open bounds default to `0` and `len`,
/// and every bound is clamped into `[0, len]`. A negative step swaps the
/// bounds (see the module documentation).
pub fn resolve_range(spec: &SliceSpec, len: usize) -> Result<IndexRange> {
    let step = spec.step.unwrap_or(1);
    if step == 0 {
        return Err(StoreError::InvalidIndex("slice step cannot be zero".to_string()));
    }

    let mut start = clamp_bound(spec.start.unwrap_or(0), len);
    let mut stop = spec.stop.map(|s| clamp_bound(s, len)).unwrap_or(len);

    if step < 0 {
        std::mem::swap(&mut start, &mut stop);
    }

    Ok(IndexRange::new(start, stop, step.unsigned_abs()))
}

/// Exact element sequence selected by `spec`, including reverse order.
pub fn slice_indices(spec: &SliceSpec, len: usize) -> Result<Vec<usize>> {
    let step = spec.step.unwrap_or(1);
    if step == 0 {
        return Err(StoreError::InvalidIndex("slice step cannot be zero".to_string()));
    }

    let len_i = len as isize;
    if step > 0 {
        let start = spec.start.map(|s| clamp_bound(s, len)).unwrap_or(0);
        let stop = spec.stop.map(|s| clamp_bound(s, len)).unwrap_or(len);
        return Ok(IndexRange::new(start, stop, step as usize).iter().collect());
    }

    // Reverse bounds live in [-1, len - 1]; -1 means "before the first item".
    let reverse_bound = |value: isize| {
        let value = if value < 0 { len_i + value } else { value };
        value.clamp(-1, len_i - 1)
    };
    let start = spec.start.map(reverse_bound).unwrap_or(len_i - 1);
    let stop = spec.stop.map(reverse_bound).unwrap_or(-1);

    let mut indices = Vec::new();
    let mut i = start;
    while i > stop {
        indices.push(i as usize);
        i += step;
    }
    Ok(indices)
}

/// Resolves a single possibly-negative index.
pub fn resolve_index(index: isize, len: usize) -> Result<usize> {
    let resolved = if index < 0 { len as isize + index } else { index };
    if resolved < 0 || resolved >= len as isize {
        return Err(StoreError::OutOfBounds { index, len });
    }
    Ok(resolved as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(start: Option<isize>, stop: Option<isize>, step: Option<isize>) -> SliceSpec {
        SliceSpec::new(start, stop, step)
    }

    #[test]
    fn test_resolve_open_bounds() {
        let r = resolve_range(&SliceSpec::full(), 10).unwrap();
        assert_eq!(r, IndexRange::new(0, 10, 1));
        assert_eq!(r.len(), 10);
    }

    #[test]
    fn test_resolve_negative_bounds() {
        let r = resolve_range(&spec(Some(-3), None, None), 10).unwrap();
        assert_eq!(r, IndexRange::new(7, 10, 1));

        let r = resolve_range(&spec(Some(-30), Some(-8), None), 10).unwrap();
        assert_eq!(r, IndexRange::new(0, 2, 1));
    }

    #[test]
    fn test_resolve_clamps_to_len() {
        let r = resolve_range(&spec(Some(4), Some(40), Some(2)), 10).unwrap();
        assert_eq!(r, IndexRange::new(4, 10, 2));
        assert_eq!(r.iter().collect::<Vec<_>>(), vec![4, 6, 8]);
    }

    #[test]
    fn test_resolve_negative_step_swaps_bounds() {
        let r = resolve_range(&spec(Some(8), Some(2), Some(-2)), 10).unwrap();
        assert_eq!(r, IndexRange::new(2, 8, 2));

        // Open-ended reverse slices collapse to an empty range.
        let r = resolve_range(&SliceSpec::full().with_step(-1), 10).unwrap();
        assert!(r.is_empty());
    }

    #[test]
    fn test_resolve_zero_step() {
        assert!(matches!(
            resolve_range(&SliceSpec::full().with_step(0), 10),
            Err(StoreError::InvalidIndex(_))
        ));
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let r = resolve_range(&spec(Some(6), Some(2), None), 10).unwrap();
        assert!(r.is_empty());
        assert_eq!(r.iter().count(), 0);
        assert_eq!(r.end(), 6);
    }

    #[test]
    fn test_index_range_helpers() {
        let r = IndexRange::new(1, 8, 3);
        assert_eq!(r.len(), 3);
        assert!(r.contains(4));
        assert!(!r.contains(5));
        assert!(!r.contains(8));
        assert_eq!(r.end(), 8);
        assert_eq!(IndexRange::single(5).iter().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn test_slice_indices_forward() {
        let idx = slice_indices(&spec(Some(1), Some(-1), Some(3)), 10).unwrap();
        assert_eq!(idx, vec![1, 4, 7]);
    }

    #[test]
    fn test_slice_indices_reverse() {
        assert_eq!(
            slice_indices(&SliceSpec::full().with_step(-1), 5).unwrap(),
            vec![4, 3, 2, 1, 0]
        );
        assert_eq!(
            slice_indices(&spec(Some(8), Some(2), Some(-2)), 10).unwrap(),
            vec![8, 6, 4]
        );
        assert_eq!(
            slice_indices(&spec(Some(-1), Some(-4), Some(-1)), 10).unwrap(),
            vec![9, 8, 7]
        );
        assert!(slice_indices(&spec(Some(2), Some(5), Some(-1)), 10)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_resolve_index() {
        assert_eq!(resolve_index(3, 10).unwrap(), 3);
        assert_eq!(resolve_index(-1, 10).unwrap(), 9);
        assert_eq!(resolve_index(-10, 10).unwrap(), 0);
        assert!(matches!(
            resolve_index(10, 10),
            Err(StoreError::OutOfBounds { index: 10, len: 10 })
        ));
        assert!(resolve_index(-11, 10).is_err());
    }

    #[test]
    fn test_range_conversions() {
        assert_eq!(SliceSpec::from(2..5), spec(Some(2), Some(5), None));
        assert_eq!(SliceSpec::from(2..), spec(Some(2), None, None));
        assert_eq!(SliceSpec::from(..5), spec(None, Some(5), None));
        assert_eq!(SliceSpec::from(..), SliceSpec::full());
        assert!(SliceSpec::full().with_step(-1).is_reversed());
    }
}
