//! # Cache Store
//!
//! File-backed byte region holding one slot per source item, plus the set of
//! slots whose bytes are valid.
//!
//! ## Layout
//!
//! The file is the source's byte layout concatenated in index order: item `i`
//! occupies `[i * item_size, (i + 1) * item_size)`. There is no header and no
//! side index; which items are valid lives only in memory.
//!
//! ## Consistency
//!
//! Item bytes are written before the item is published into the synced set,
//! so a reader that observes `is_synced` can read the slot without further
//! coordination. Only the sync worker calls [`CacheStore::copy`].
//!
//! ## Backing file
//!
//! - no location: an ephemeral temp file, deleted on [`CacheStore::release`]
//!   (or on drop)
//! - existing location: reopened in place; the length must match the layout
//! - missing location: created and sized

use crate::error::{Result, StoreError};
use crate::io::{read_exact_at, write_all_at};
use crate::range::{resolve_index, resolve_range, IndexRange, SliceSpec};
use crate::source::SourceAdapter;
use crate::synced::SyncedSet;
use parking_lot::Mutex;
use shadow_runtime::logging::strip_path;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

/// Upper bound on a single source read during a copy.
const MAX_IO_BYTES: usize = 8 * 1024 * 1024;

/// Local byte-exact mirror of a source collection.
pub struct CacheStore {
    file: File,
    path: PathBuf,
    temp: Mutex<Option<NamedTempFile>>,
    ephemeral: bool,
    item_count: usize,
    item_size: usize,
    synced: Mutex<SyncedSet>,
    closed: AtomicBool,
}

fn layout_bytes(item_count: usize, item_size: usize) -> Result<u64> {
    if item_size == 0 {
        return Err(StoreError::Source(
            "item size must be greater than 0".to_string(),
        ));
    }
    (item_count as u64)
        .checked_mul(item_size as u64)
        .ok_or_else(|| StoreError::Source("collection too large to mirror".to_string()))
}

impl CacheStore {
    /// Opens a store at `location`, or an ephemeral one when `None`.
    pub fn open(location: Option<&Path>, item_count: usize, item_size: usize) -> Result<Self> {
        match location {
            Some(path) => Self::at_path(path, item_count, item_size),
            None => Self::ephemeral(item_count, item_size),
        }
    }

    /// Creates a store backed by a temp file that is deleted on release.
    pub fn ephemeral(item_count: usize, item_size: usize) -> Result<Self> {
        let byte_len = layout_bytes(item_count, item_size)?;
        let temp = tempfile::Builder::new()
            .prefix("shadow-")
            .suffix(".cache")
            .tempfile()?;
        temp.as_file().set_len(byte_len)?;

        let file = temp.as_file().try_clone()?;
        let path = temp.path().to_path_buf();
        info!(
            file = %strip_path(&path.to_string_lossy()),
            item_count,
            item_size,
            "Allocated ephemeral cache file"
        );

        Ok(Self::with_file(file, path, Some(temp), item_count, item_size))
    }

    /// Creates or reopens a persistent store at `path`.
    pub fn at_path(path: &Path, item_count: usize, item_size: usize) -> Result<Self> {
        let byte_len = layout_bytes(item_count, item_size)?;
        let existed = path.exists();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let actual = file.metadata()?.len();
        if existed && actual != 0 && actual != byte_len {
            return Err(StoreError::SizeMismatch {
                expected: byte_len,
                actual,
            });
        }
        if actual != byte_len {
            file.set_len(byte_len)?;
        }

        info!(
            file = %strip_path(&path.to_string_lossy()),
            item_count,
            item_size,
            reopened = existed,
            "Opened cache file"
        );

        Ok(Self::with_file(file, path.to_path_buf(), None, item_count, item_size))
    }

    fn with_file(
        file: File,
        path: PathBuf,
        temp: Option<NamedTempFile>,
        item_count: usize,
        item_size: usize,
    ) -> Self {
        Self {
            file,
            path,
            ephemeral: temp.is_some(),
            temp: Mutex::new(temp),
            item_count,
            item_size,
            synced: Mutex::new(SyncedSet::new(item_count)),
            closed: AtomicBool::new(false),
        }
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.item_count
    }

    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }

    /// Size of one item in bytes.
    pub fn item_size(&self) -> usize {
        self.item_size
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if the backing file is deleted on release.
    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Normalizes a slice expression against this store's length.
    pub fn resolve_range(&self, spec: &SliceSpec) -> Result<IndexRange> {
        resolve_range(spec, self.item_count)
    }

    /// Normalizes a possibly-negative scalar index.
    pub fn resolve_index(&self, index: isize) -> Result<usize> {
        resolve_index(index, self.item_count)
    }

    /// Returns `true` if every index of `range` is synced.
    pub fn is_synced(&self, range: &IndexRange) -> bool {
        self.synced.lock().contains_range(range)
    }

    pub fn is_item_synced(&self, index: usize) -> bool {
        self.synced.lock().contains(index)
    }

    /// Number of synced items.
    pub fn synced_count(&self) -> usize {
        self.synced.lock().len()
    }

    /// Fraction of items synced; an empty collection counts as complete.
    pub fn copy_ratio(&self) -> f64 {
        if self.item_count == 0 {
            return 1.0;
        }
        self.synced_count() as f64 / self.item_count as f64
    }

    pub fn fully_copied(&self) -> bool {
        self.copy_ratio() >= 1.0
    }

    /// Copies every unsynced index of `range` from `source`, returning the
    /// number of newly synced items. Already-synced indices are skipped.
    #[instrument(level = "debug", skip(self, source))]
    pub fn copy(&self, source: &dyn SourceAdapter, range: &IndexRange) -> Result<usize> {
        self.ensure_open()?;
        self.check_bounds(range)?;

        let runs = self.synced.lock().missing_runs(range);
        if runs.is_empty() {
            return Ok(0);
        }

        let max_items = (MAX_IO_BYTES / self.item_size).max(1);
        let mut buf = Vec::new();
        let mut newly = 0;

        for (start, count) in runs {
            let mut done = 0;
            while done < count {
                let first = start + done;
                let n = (count - done).min(max_items);
                buf.resize(n * self.item_size, 0);
                source.read_items(first, n, &mut buf)?;
                write_all_at(&self.file, &buf, self.offset_of(first))?;
                newly += self.synced.lock().insert_run(first, n);
                done += n;
            }
        }

        debug!(newly, "Copied range into cache");
        Ok(newly)
    }

    /// Reads the cached bytes of one item.
    pub fn read_item(&self, index: usize) -> Result<Vec<u8>> {
        self.read_range(&IndexRange::single(index))
    }

    /// Reads the cached bytes of every index in `range`, in order.
    pub fn read_range(&self, range: &IndexRange) -> Result<Vec<u8>> {
        self.ensure_open()?;
        self.check_bounds(range)?;

        let mut out = vec![0u8; range.len() * self.item_size];
        if range.is_empty() {
            return Ok(out);
        }
        if range.step == 1 {
            read_exact_at(&self.file, &mut out, self.offset_of(range.start))?;
        } else {
            for (slot, index) in out.chunks_exact_mut(self.item_size).zip(range.iter()) {
                read_exact_at(&self.file, slot, self.offset_of(index))?;
            }
        }
        Ok(out)
    }

    /// Reads the cached bytes of `indices` in the given order. Ascending
    /// contiguous runs are read with a single call.
    pub fn read_indices(&self, indices: &[usize]) -> Result<Vec<u8>> {
        self.ensure_open()?;
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.item_count) {
            return Err(StoreError::OutOfBounds {
                index: bad as isize,
                len: self.item_count,
            });
        }

        let mut out = vec![0u8; indices.len() * self.item_size];
        let mut pos = 0;
        while pos < indices.len() {
            let mut run = 1;
            while pos + run < indices.len() && indices[pos + run] == indices[pos] + run {
                run += 1;
            }
            let slot = &mut out[pos * self.item_size..(pos + run) * self.item_size];
            read_exact_at(&self.file, slot, self.offset_of(indices[pos]))?;
            pos += run;
        }
        Ok(out)
    }

    /// Closes the store. Ephemeral backing files are deleted; persistent
    /// ones are left in place. Releasing twice is a no-op.
    pub fn release(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        self.file.sync_data().ok();
        if let Some(temp) = self.temp.lock().take() {
            temp.close()?;
            info!(
                file = %strip_path(&self.path.to_string_lossy()),
                "Deleted ephemeral cache file"
            );
        }
        Ok(())
    }

    fn offset_of(&self, index: usize) -> u64 {
        index as u64 * self.item_size as u64
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn check_bounds(&self, range: &IndexRange) -> Result<()> {
        if range.end() > self.item_count {
            return Err(StoreError::OutOfBounds {
                index: range.end() as isize - 1,
                len: self.item_count,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("path", &self.path)
            .field("ephemeral", &self.ephemeral)
            .field("item_count", &self.item_count)
            .field("item_size", &self.item_size)
            .field("synced", &self.synced_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}
