//! # Cache View
//!
//! Read-only, lazily synchronized view of a source collection.
//!
//! Every read resolves its index expression first, asks the sync engine to
//! bypass whatever part of it is not cached yet, then reads the bytes from the
//! cache file and decodes them as `E`.
//!
//! ## Shapes
//!
//! A view over `N` items of `item_size` bytes has shape `[N]` when an item is
//! a single element and `[N, item_size / E::SIZE]` otherwise. A scalar read
//! returns the item shape; every other read prepends the number of selected
//! items.

use crate::block::Block;
use crate::error::{Result, ViewError};
use crate::index::Index;
use crate::registry::MirrorId;
use shadow_runtime::logging::strip_path;
use shadow_runtime::{EventBus, MirrorConfig, MirrorEvent};
use shadow_store::{
    decode_all, resolve_index, resolve_range, slice_indices, CacheStore, Element, IndexRange,
    SourceAdapter, StoreError,
};
use shadow_sync::{EngineOptions, SyncEngine, Termination};
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Items selected by the first index component.
enum Rows {
    Scalar(usize),
    Range(IndexRange),
    List(Vec<usize>),
}

impl Rows {
    fn count(&self) -> Option<usize> {
        match self {
            Rows::Scalar(_) => None,
            Rows::Range(range) => Some(range.len()),
            Rows::List(list) => Some(list.len()),
        }
    }
}

/// Elements selected inside each item by the second index component.
struct Columns {
    indices: Vec<usize>,
    scalar: bool,
}

/// Lazily mirrored, typed view over a source collection.
pub struct CacheView<E: Element> {
    id: MirrorId,
    store: Arc<CacheStore>,
    engine: SyncEngine,
    events: EventBus,
    item_shape: Vec<usize>,
    closed: AtomicBool,
    _element: PhantomData<fn() -> E>,
}

impl<E: Element> CacheView<E> {
    /// Opens a view with its own event bus.
    pub fn open(source: Arc<dyn SourceAdapter>, config: MirrorConfig) -> Result<Self> {
        let events = EventBus::new(config.event_buffer);
        Self::open_with_events(source, config, events)
    }

    /// Opens a view that publishes progress on `events`.
    pub fn open_with_events(
        source: Arc<dyn SourceAdapter>,
        config: MirrorConfig,
        events: EventBus,
    ) -> Result<Self> {
        config.validate()?;

        let item_size = source.item_size();
        if item_size == 0 || item_size % E::SIZE != 0 {
            return Err(ViewError::ElementSize {
                item_size,
                element_size: E::SIZE,
            });
        }
        let item_shape = match item_size / E::SIZE {
            1 => Vec::new(),
            n => vec![n],
        };

        let id = MirrorId::new();
        let store = Arc::new(CacheStore::open(
            config.cache_location.as_deref(),
            source.item_count(),
            item_size,
        )?);
        let options = EngineOptions::from_config(&config, item_size)
            .with_mirror_id(id.to_string())
            .with_events(events.clone());
        let engine = SyncEngine::spawn(Arc::clone(&store), source, options)?;

        info!(
            mirror_id = %id,
            items = store.len(),
            item_size,
            file = %strip_path(&store.path().to_string_lossy()),
            ephemeral = store.is_ephemeral(),
            "Opened cache view"
        );

        Ok(Self {
            id,
            store,
            engine,
            events,
            item_shape,
            closed: AtomicBool::new(false),
            _element: PhantomData,
        })
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Reads the items selected by `index`, syncing them first if needed.
    #[instrument(level = "debug", skip(self, index), fields(mirror_id = %self.id))]
    pub fn get(&self, index: impl Into<Index>) -> Result<Block<E>> {
        self.ensure_open()?;
        match index.into() {
            Index::Compound(parts) => self.get_compound(parts),
            index => {
                let rows = self.resolve_rows(&index)?;
                let values = self.fetch_rows(&rows)?;
                Ok(Block::new(self.block_shape(rows.count()), values))
            }
        }
    }

    /// Reads a single item as a block of the item shape.
    pub fn item(&self, index: isize) -> Result<Block<E>> {
        self.get(Index::Scalar(index))
    }

    /// Reads every item.
    pub fn to_block(&self) -> Result<Block<E>> {
        self.get(Index::all())
    }

    fn get_compound(&self, parts: Vec<Index>) -> Result<Block<E>> {
        if parts.iter().any(|p| matches!(p, Index::Compound(_))) {
            return Err(ViewError::InvalidIndex(
                "nested compound index".to_string(),
            ));
        }
        let mut parts = parts.into_iter();
        let (first, second) = match (parts.next(), parts.next(), parts.next()) {
            (Some(first), second, None) => (first, second),
            (None, _, _) => return Err(ViewError::InvalidIndex("empty compound index".to_string())),
            _ => {
                return Err(ViewError::InvalidIndex(
                    "too many indices for a two-dimensional view".to_string(),
                ))
            }
        };

        let rows = self.resolve_rows(&first)?;
        let Some(second) = second else {
            let values = self.fetch_rows(&rows)?;
            return Ok(Block::new(self.block_shape(rows.count()), values));
        };
        let columns = self.resolve_columns(&second)?;

        let values = self.fetch_rows(&rows)?;
        let width = self.item_width();
        let selected: Vec<E> = values
            .chunks_exact(width)
            .flat_map(|row| columns.indices.iter().map(move |&c| row[c]))
            .collect();

        let mut shape = Vec::with_capacity(2);
        if let Some(count) = rows.count() {
            shape.push(count);
        }
        if !columns.scalar {
            shape.push(columns.indices.len());
        }
        Ok(Block::new(shape, selected))
    }

    // ------------------------------------------------------------------------
    // Resolution (no engine interaction)
    // ------------------------------------------------------------------------

    fn resolve_rows(&self, index: &Index) -> Result<Rows> {
        let len = self.len();
        match index {
            Index::Scalar(i) => resolve_index(*i, len)
                .map(Rows::Scalar)
                .map_err(ViewError::from_resolution),
            Index::Slice(spec) if spec.is_reversed() => slice_indices(spec, len)
                .map(Rows::List)
                .map_err(ViewError::from_resolution),
            Index::Slice(spec) => resolve_range(spec, len)
                .map(Rows::Range)
                .map_err(ViewError::from_resolution),
            Index::List(list) => resolve_list(list, len).map(Rows::List),
            Index::Mask(mask) => mask_positions(mask, len).map(Rows::List),
            Index::Compound(_) => Err(ViewError::InvalidIndex(
                "nested compound index".to_string(),
            )),
        }
    }

    fn resolve_columns(&self, index: &Index) -> Result<Columns> {
        if self.item_shape.is_empty() {
            return Err(ViewError::InvalidIndex(
                "items hold a single element; no element axis to index".to_string(),
            ));
        }
        let width = self.item_width();
        let (indices, scalar) = match index {
            Index::Scalar(i) => (
                vec![resolve_index(*i, width).map_err(ViewError::from_resolution)?],
                true,
            ),
            Index::Slice(spec) => (
                slice_indices(spec, width).map_err(ViewError::from_resolution)?,
                false,
            ),
            Index::List(list) => (resolve_list(list, width)?, false),
            Index::Mask(mask) => (mask_positions(mask, width)?, false),
            Index::Compound(_) => {
                return Err(ViewError::InvalidIndex(
                    "nested compound index".to_string(),
                ))
            }
        };
        Ok(Columns { indices, scalar })
    }

    // ------------------------------------------------------------------------
    // Fetching
    // ------------------------------------------------------------------------

    fn fetch_rows(&self, rows: &Rows) -> Result<Vec<E>> {
        let bytes = match rows {
            Rows::Scalar(i) => {
                self.ensure_synced(&[*i])?;
                self.store.read_item(*i)?
            }
            Rows::Range(range) => {
                if !range.is_empty() {
                    self.engine.bypass(*range)?;
                }
                self.store.read_range(range)?
            }
            Rows::List(list) => {
                self.ensure_synced(list)?;
                self.store.read_indices(list)?
            }
        };
        Ok(decode_all(&bytes))
    }

    /// Bypasses every maximal run of unsynced indices among `indices`.
    fn ensure_synced(&self, indices: &[usize]) -> Result<()> {
        if self.store.fully_copied() {
            return Ok(());
        }
        let mut missing: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| !self.store.is_item_synced(i))
            .collect();
        missing.sort_unstable();
        missing.dedup();

        for (start, count) in contiguous_runs(&missing) {
            debug!(mirror_id = %self.id, start, count, "Requesting bypass for run");
            self.engine
                .bypass(IndexRange::contiguous(start, start + count))?;
        }
        Ok(())
    }

    fn block_shape(&self, count: Option<usize>) -> Vec<usize> {
        let mut shape = Vec::with_capacity(1 + self.item_shape.len());
        if let Some(count) = count {
            shape.push(count);
        }
        shape.extend_from_slice(&self.item_shape);
        shape
    }

    fn item_width(&self) -> usize {
        self.item_shape.first().copied().unwrap_or(1)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(ViewError::Store(StoreError::Closed));
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn id(&self) -> MirrorId {
        self.id
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// `[N]` followed by the item shape.
    pub fn shape(&self) -> Vec<usize> {
        self.block_shape(Some(self.len()))
    }

    pub fn ndim(&self) -> usize {
        1 + self.item_shape.len()
    }

    pub fn item_shape(&self) -> &[usize] {
        &self.item_shape
    }

    /// Location of the cache file.
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    pub fn is_ephemeral(&self) -> bool {
        self.store.is_ephemeral()
    }

    pub fn copy_ratio(&self) -> f64 {
        self.engine.copy_ratio()
    }

    pub fn fully_copied(&self) -> bool {
        self.engine.fully_copied()
    }

    pub fn bandwidth_share(&self) -> f64 {
        self.engine.bandwidth_share()
    }

    /// Sets the background bandwidth share, clamped into `[0, 1]`.
    pub fn set_bandwidth_share(&self, share: f64) -> f64 {
        self.engine.set_bandwidth_share(share)
    }

    pub fn sync_item_duration(&self) -> Option<Duration> {
        self.engine.sync_item_duration()
    }

    /// Why the sync worker stopped, if it has.
    pub fn termination(&self) -> Option<Termination> {
        self.engine.termination()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stops the sync worker and releases the cache file. Ephemeral files are
    /// deleted. Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.engine.close();
        self.store.release()?;

        let _ = self.events.emit(MirrorEvent::Closed {
            mirror_id: self.id.to_string(),
        });
        info!(mirror_id = %self.id, copy_ratio = self.copy_ratio(), "Closed cache view");
        Ok(())
    }
}

impl<E: Element> Drop for CacheView<E> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            error!(mirror_id = %self.id, "Failed to close cache view: {}", e);
        }
    }
}

impl<E: Element> fmt::Debug for CacheView<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheView")
            .field("id", &self.id)
            .field("shape", &self.shape())
            .field("path", &self.store.path())
            .field("copy_ratio", &self.copy_ratio())
            .field("closed", &self.is_closed())
            .finish()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn resolve_list(list: &[isize], len: usize) -> Result<Vec<usize>> {
    list.iter()
        .map(|&i| resolve_index(i, len).map_err(ViewError::from_resolution))
        .collect()
}

fn mask_positions(mask: &[bool], len: usize) -> Result<Vec<usize>> {
    if mask.len() != len {
        return Err(ViewError::InvalidIndex(format!(
            "mask of length {} does not match axis of length {}",
            mask.len(),
            len
        )));
    }
    Ok(mask
        .iter()
        .enumerate()
        .filter_map(|(i, &keep)| keep.then_some(i))
        .collect())
}

/// Groups sorted, deduplicated indices into `(start, count)` runs.
fn contiguous_runs(sorted: &[usize]) -> Vec<(usize, usize)> {
    let mut runs: Vec<(usize, usize)> = Vec::new();
    for &index in sorted {
        match runs.last_mut() {
            Some((start, count)) if *start + *count == index => *count += 1,
            _ => runs.push((index, 1)),
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadow_runtime::ChunkSize;
    use shadow_store::VecSource;

    fn grid(rows: usize, cols: usize) -> CacheView<u16> {
        let values: Vec<u16> = (0..(rows * cols) as u16).collect();
        let source = Arc::new(VecSource::from_elements(&values, cols).unwrap());
        CacheView::open(source, MirrorConfig::default()).unwrap()
    }

    #[test]
    fn test_contiguous_runs() {
        assert_eq!(contiguous_runs(&[]), vec![]);
        assert_eq!(
            contiguous_runs(&[1, 4, 5, 6, 95, 96, 99]),
            vec![(1, 1), (4, 3), (95, 2), (99, 1)]
        );
    }

    #[test]
    fn test_mask_positions() {
        assert_eq!(mask_positions(&[true, false, true], 3).unwrap(), vec![0, 2]);
        assert!(matches!(
            mask_positions(&[true], 3),
            Err(ViewError::InvalidIndex(_))
        ));
    }

    #[test]
    fn test_shape_accessors() {
        let view = grid(5, 3);
        assert_eq!(view.shape(), vec![5, 3]);
        assert_eq!(view.ndim(), 2);
        assert_eq!(view.item_shape(), &[3]);
        assert_eq!(view.len(), 5);
        assert!(view.is_ephemeral());
    }

    #[test]
    fn test_scalar_and_slice_shapes() {
        let view = grid(5, 3);
        let item = view.item(-1).unwrap();
        assert_eq!(item.shape, vec![3]);
        assert_eq!(item.values, vec![12, 13, 14]);

        let block = view.get(1isize..3).unwrap();
        assert_eq!(block.shape, vec![2, 3]);
        assert_eq!(block.values, vec![3, 4, 5, 6, 7, 8]);
        assert_eq!(view.copy_ratio(), 0.6);
    }

    #[test]
    fn test_compound_index() {
        let view = grid(4, 3);
        assert_eq!(view.get((2isize, 1isize)).unwrap().scalar(), Some(7));

        let column = view.get((.., -1isize)).unwrap();
        assert_eq!(column.shape, vec![4]);
        assert_eq!(column.values, vec![2, 5, 8, 11]);

        let corner = view.get((vec![0isize, 3], 0isize..2)).unwrap();
        assert_eq!(corner.shape, vec![2, 2]);
        assert_eq!(corner.values, vec![0, 1, 9, 10]);

        let row = view.get((1isize, vec![true, false, true])).unwrap();
        assert_eq!(row.shape, vec![2]);
        assert_eq!(row.values, vec![3, 5]);
    }

    #[test]
    fn test_invalid_compound() {
        let view = grid(4, 3);
        let three = Index::Compound(vec![Index::Scalar(0), Index::Scalar(0), Index::Scalar(0)]);
        assert!(matches!(view.get(three), Err(ViewError::InvalidIndex(_))));

        let nested = Index::Compound(vec![Index::from((0isize, 0isize))]);
        assert!(matches!(view.get(nested), Err(ViewError::InvalidIndex(_))));

        assert!(matches!(
            view.get((0isize, 3isize)),
            Err(ViewError::InvalidIndex(_))
        ));
        assert_eq!(view.copy_ratio(), 0.0);
    }

    #[test]
    fn test_single_element_items_have_no_element_axis() {
        let source = Arc::new(VecSource::from_elements(&[1i32, 2, 3], 1).unwrap());
        let view: CacheView<i32> = CacheView::open(source, MirrorConfig::default()).unwrap();
        assert_eq!(view.shape(), vec![3]);
        assert_eq!(view.item(1).unwrap().scalar(), Some(2));
        assert!(matches!(
            view.get((0isize, 0isize)),
            Err(ViewError::InvalidIndex(_))
        ));
    }

    #[test]
    fn test_element_size_mismatch() {
        let source = Arc::new(VecSource::new(vec![0; 9], 3).unwrap());
        assert!(matches!(
            CacheView::<u16>::open(source, MirrorConfig::default()),
            Err(ViewError::ElementSize {
                item_size: 3,
                element_size: 2
            })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let source = Arc::new(VecSource::new(vec![0; 4], 1).unwrap());
        let config = MirrorConfig::default().with_bandwidth_share(1.5);
        assert!(matches!(
            CacheView::<u8>::open(source, config),
            Err(ViewError::Config(_))
        ));
    }

    #[test]
    fn test_read_after_close() {
        let view = grid(4, 2);
        view.close().unwrap();
        view.close().unwrap();
        assert!(matches!(
            view.item(0),
            Err(ViewError::Store(StoreError::Closed))
        ));
        assert_eq!(view.termination(), Some(Termination::Requested));
    }

    #[test]
    fn test_strided_slice_single_bypass() {
        let values: Vec<u8> = (0..20).collect();
        let source = Arc::new(VecSource::from_elements(&values, 1).unwrap());
        let config = MirrorConfig::default().with_chunk_size(ChunkSize::Items(4));
        let view: CacheView<u8> = CacheView::open(source, config).unwrap();

        let block = view.get(Index::slice(Some(1), None, Some(5))).unwrap();
        assert_eq!(block.values, vec![1, 6, 11, 16]);
        assert_eq!(view.copy_ratio(), 0.2);
    }
}
