//! Index expressions against a mirrored collection agree with direct indexing.

use shadow_runtime::MirrorConfig;
use shadow_store::VecSource;
use shadow_view::{CacheView, Index, ViewError};
use std::sync::Arc;

const N: usize = 40;

fn view() -> (Vec<i64>, CacheView<i64>) {
    let values: Vec<i64> = (0..N as i64).map(|v| v * v - 7).collect();
    let source = Arc::new(VecSource::from_elements(&values, 1).unwrap());
    let view = CacheView::open(source, MirrorConfig::default()).unwrap();
    (values, view)
}

fn direct(values: &[i64], i: isize) -> i64 {
    let len = values.len() as isize;
    let resolved = if i < 0 { len + i } else { i };
    values[resolved as usize]
}

#[test]
fn test_negative_scalars_match_direct_indexing() {
    let (values, view) = view();
    for i in [-1isize, -2, -40, 0, 39] {
        assert_eq!(view.item(i).unwrap().scalar(), Some(direct(&values, i)));
    }
}

#[test]
fn test_list_with_duplicates_and_negatives() {
    let (values, view) = view();
    let list = vec![3isize, -1, 3, 0, -40, 17, 18, 19, -22];
    let expected: Vec<i64> = list.iter().map(|&i| direct(&values, i)).collect();
    let block = view.get(list).unwrap();
    assert_eq!(block.shape, vec![9]);
    assert_eq!(block.values, expected);
}

#[test]
fn test_mask_matches_positions() {
    let (values, view) = view();
    let mask: Vec<bool> = (0..N).map(|i| i % 3 == 1).collect();
    let expected: Vec<i64> = values
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 3 == 1)
        .map(|(_, &v)| v)
        .collect();
    let block = view.get(mask).unwrap();
    assert_eq!(block.values, expected);
    assert_eq!(block.shape, vec![expected.len()]);
}

#[test]
fn test_reverse_slices_keep_true_order() {
    let (values, view) = view();

    let reversed = view.get(Index::slice(None, None, Some(-1))).unwrap();
    let expected: Vec<i64> = values.iter().rev().copied().collect();
    assert_eq!(reversed.values, expected);

    let stepped = view.get(Index::slice(Some(8), Some(2), Some(-2))).unwrap();
    assert_eq!(
        stepped.values,
        vec![values[8], values[6], values[4]]
    );
}

#[test]
fn test_forward_slices() {
    let (values, view) = view();
    assert_eq!(view.get(-3isize..).unwrap().values, values[37..].to_vec());
    assert_eq!(view.get(..5isize).unwrap().values, values[..5].to_vec());
    assert_eq!(view.get(5isize..100).unwrap().values, values[5..].to_vec());

    let empty = view.get(10isize..4).unwrap();
    assert_eq!(empty.shape, vec![0]);
    assert!(empty.is_empty());
}

#[test]
fn test_invalid_indices_touch_nothing() {
    let (_, view) = view();

    let cases: Vec<Index> = vec![
        Index::Scalar(40),
        Index::Scalar(-41),
        Index::List(vec![0, 1, 40]),
        Index::Mask(vec![true; N - 1]),
        Index::slice(None, None, Some(0)),
        Index::Compound(vec![]),
    ];
    for index in cases {
        assert!(
            matches!(view.get(index.clone()), Err(ViewError::InvalidIndex(_))),
            "expected {:?} to be rejected",
            index
        );
    }
    assert_eq!(view.copy_ratio(), 0.0);
}

#[test]
fn test_values_match_source_once_fully_copied() {
    let (values, view) = view();
    view.get(Index::Mask(vec![true; N])).unwrap();
    assert!(view.fully_copied());
    for (i, &value) in values.iter().enumerate() {
        assert_eq!(view.item(i as isize).unwrap().scalar(), Some(value));
    }
}
