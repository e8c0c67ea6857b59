//! # Store Error Types

use thiserror::Error;

/// Errors raised by the cache store and source adapters.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Index expression cannot be resolved (e.g. zero step).
    #[error("Invalid index: {0}")]
    InvalidIndex(String),

    /// Index or range lies outside the collection.
    #[error("Index {index} out of bounds for length {len}")]
    OutOfBounds { index: isize, len: usize },

    /// Existing cache file does not match the source layout.
    #[error("Cache file holds {actual} bytes, expected {expected}")]
    SizeMismatch { expected: u64, actual: u64 },

    /// The source collection failed to produce data.
    #[error("Source error: {0}")]
    Source(String),

    /// The store was released and can no longer be used.
    #[error("Cache store is closed")]
    Closed,

    /// I/O error on the backing file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
