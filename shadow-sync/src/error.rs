use shadow_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// Internal protocol misuse. Fatal to the sync worker.
    #[error("Programming error: {0}")]
    Programming(String),

    /// The worker terminated while a caller still needed unsynced data.
    #[error("Synchronization failed: {0}")]
    SynchronizationFailed(String),

    #[error("Failed to spawn sync worker: {0}")]
    Spawn(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
