//! Index expressions accepted by [`CacheView::get`](crate::CacheView::get).
//!
//! ```rust
//! use shadow_view::Index;
//!
//! assert_eq!(Index::from(-1isize), Index::Scalar(-1));
//! assert!(matches!(Index::from(2isize..5), Index::Slice(_)));
//! assert!(matches!(Index::from(vec![true, false]), Index::Mask(_)));
//! assert!(matches!(Index::from((0isize, 1isize)), Index::Compound(_)));
//! ```

use shadow_store::SliceSpec;
use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

/// A resolved-at-the-boundary index expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Index {
    /// One item; negative counts from the end.
    Scalar(isize),
    /// Python-style slice with optional bounds and step.
    Slice(SliceSpec),
    /// Explicit positions; negatives and duplicates allowed.
    List(Vec<isize>),
    /// Boolean selection over the whole axis.
    Mask(Vec<bool>),
    /// Item selector followed by an element selector.
    Compound(Vec<Index>),
}

impl Index {
    pub fn slice(start: Option<isize>, stop: Option<isize>, step: Option<isize>) -> Self {
        Index::Slice(SliceSpec::new(start, stop, step))
    }

    /// Everything along the axis.
    pub fn all() -> Self {
        Index::Slice(SliceSpec::full())
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Index::Scalar(_))
    }
}

impl From<isize> for Index {
    fn from(index: isize) -> Self {
        Index::Scalar(index)
    }
}

impl From<SliceSpec> for Index {
    fn from(spec: SliceSpec) -> Self {
        Index::Slice(spec)
    }
}

impl From<Range<isize>> for Index {
    fn from(range: Range<isize>) -> Self {
        Index::Slice(range.into())
    }
}

impl From<RangeFrom<isize>> for Index {
    fn from(range: RangeFrom<isize>) -> Self {
        Index::Slice(range.into())
    }
}

impl From<RangeTo<isize>> for Index {
    fn from(range: RangeTo<isize>) -> Self {
        Index::Slice(range.into())
    }
}

impl From<RangeFull> for Index {
    fn from(range: RangeFull) -> Self {
        Index::Slice(range.into())
    }
}

impl From<Vec<isize>> for Index {
    fn from(list: Vec<isize>) -> Self {
        Index::List(list)
    }
}

impl From<&[isize]> for Index {
    fn from(list: &[isize]) -> Self {
        Index::List(list.to_vec())
    }
}

impl From<Vec<bool>> for Index {
    fn from(mask: Vec<bool>) -> Self {
        Index::Mask(mask)
    }
}

impl From<&[bool]> for Index {
    fn from(mask: &[bool]) -> Self {
        Index::Mask(mask.to_vec())
    }
}

impl<A: Into<Index>, B: Into<Index>> From<(A, B)> for Index {
    fn from((items, elements): (A, B)) -> Self {
        Index::Compound(vec![items.into(), elements.into()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_conversions() {
        assert_eq!(Index::from(..), Index::all());
        assert_eq!(Index::from(3isize..), Index::slice(Some(3), None, None));
        assert_eq!(Index::from(..-2isize), Index::slice(None, Some(-2), None));
    }

    #[test]
    fn test_list_and_mask_conversions() {
        let list: &[isize] = &[1, -1];
        assert_eq!(Index::from(list), Index::List(vec![1, -1]));
        let mask: &[bool] = &[true];
        assert_eq!(Index::from(mask), Index::Mask(vec![true]));
    }

    #[test]
    fn test_compound_conversion() {
        assert_eq!(
            Index::from((1isize, ..)),
            Index::Compound(vec![Index::Scalar(1), Index::all()])
        );
        assert!(Index::from(0isize).is_scalar());
    }
}
