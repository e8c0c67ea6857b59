//! # View Error Types

use shadow_store::StoreError;
use shadow_sync::SyncError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewError {
    /// Index expression cannot be applied to this view. Raised before any
    /// interaction with the sync worker.
    #[error("Invalid index: {0}")]
    InvalidIndex(String),

    /// The source item size is not a whole number of elements.
    #[error("Item size {item_size} is not a multiple of element size {element_size}")]
    ElementSize {
        item_size: usize,
        element_size: usize,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] shadow_runtime::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),
}

impl ViewError {
    /// Maps index resolution failures onto [`ViewError::InvalidIndex`].
    pub(crate) fn from_resolution(err: StoreError) -> Self {
        match err {
            StoreError::InvalidIndex(msg) => ViewError::InvalidIndex(msg),
            StoreError::OutOfBounds { index, len } => ViewError::InvalidIndex(format!(
                "index {} out of bounds for length {}",
                index, len
            )),
            other => ViewError::Store(other),
        }
    }

    /// `true` when a blocking read failed because the worker is gone.
    pub fn is_synchronization_failure(&self) -> bool {
        matches!(self, ViewError::Sync(SyncError::SynchronizationFailed(_)))
    }
}

pub type Result<T> = std::result::Result<T, ViewError>;
