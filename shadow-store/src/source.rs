//! # Source Adapters
//!
//! The mirrored collection is an external collaborator. The store and the
//! sync worker only need its shape (item count and item size) and a way to
//! copy contiguous items into a byte buffer.
//!
//! ```rust
//! use shadow_store::{SourceAdapter, VecSource};
//!
//! let source = VecSource::from_elements(&[1.0f32, 2.0, 3.0, 4.0], 2).unwrap();
//! assert_eq!(source.item_count(), 2);
//! assert_eq!(source.item_size(), 8);
//!
//! let mut row = vec![0u8; 8];
//! source.read_items(1, 1, &mut row).unwrap();
//! assert_eq!(&row[..4], &3.0f32.to_le_bytes());
//! ```

use crate::element::{encode_all, Element};
use crate::error::{Result, StoreError};

/// Read-only, fixed-size, randomly addressable collection.
pub trait SourceAdapter: Send + Sync {
    /// Number of items in the collection.
    fn item_count(&self) -> usize;

    /// Size of one item in bytes.
    fn item_size(&self) -> usize;

    /// Copies `count` items starting at `start` into `dest`.
    ///
    /// `dest` is exactly `count * item_size()` bytes long.
    fn read_items(&self, start: usize, count: usize, dest: &mut [u8]) -> Result<()>;

    /// Total byte length of the collection.
    fn byte_len(&self) -> u64 {
        self.item_count() as u64 * self.item_size() as u64
    }
}

/// In-memory source over an owned byte buffer.
#[derive(Debug, Clone)]
pub struct VecSource {
    bytes: Vec<u8>,
    item_size: usize,
}

impl VecSource {
    /// Wraps `bytes` as a collection of `item_size`-byte items.
    pub fn new(bytes: Vec<u8>, item_size: usize) -> Result<Self> {
        if item_size == 0 {
            return Err(StoreError::InvalidIndex(
                "item size must be greater than 0".to_string(),
            ));
        }
        if bytes.len() % item_size != 0 {
            return Err(StoreError::Source(format!(
                "buffer of {} bytes is not a multiple of item size {}",
                bytes.len(),
                item_size
            )));
        }
        Ok(Self { bytes, item_size })
    }

    /// Builds a source whose items are rows of `row_len` elements.
    pub fn from_elements<E: Element>(values: &[E], row_len: usize) -> Result<Self> {
        Self::new(encode_all(values), row_len * E::SIZE)
    }

    /// Raw bytes of the whole collection.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl SourceAdapter for VecSource {
    fn item_count(&self) -> usize {
        self.bytes.len() / self.item_size
    }

    fn item_size(&self) -> usize {
        self.item_size
    }

    fn read_items(&self, start: usize, count: usize, dest: &mut [u8]) -> Result<()> {
        let stop = start
            .checked_add(count)
            .filter(|&stop| stop <= self.item_count())
            .ok_or_else(|| StoreError::OutOfBounds {
                index: start.saturating_add(count) as isize,
                len: self.item_count(),
            })?;

        let bytes = &self.bytes[start * self.item_size..stop * self.item_size];
        if dest.len() != bytes.len() {
            return Err(StoreError::Source(format!(
                "destination holds {} bytes, expected {}",
                dest.len(),
                bytes.len()
            )));
        }
        dest.copy_from_slice(bytes);
        Ok(())
    }
}
