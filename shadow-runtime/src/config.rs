//! # Mirror Configuration
//!
//! Construction options for a shadow mirror: where the cache file lives, how
//! large the background sweep steps are and how much wall-clock time the sync
//! worker may spend copying.
//!
//! ## Usage
//!
//! ```rust
//! use shadow_runtime::config::{ChunkSize, MirrorConfig};
//!
//! let config = MirrorConfig::new()
//!     .with_chunk_size(ChunkSize::Items(64))
//!     .with_bandwidth_share(0.25);
//!
//! assert!(config.validate().is_ok());
//! ```
//!
//! Configurations can also be loaded from JSON; omitted fields fall back to
//! their defaults:
//!
//! ```rust
//! use shadow_runtime::config::MirrorConfig;
//!
//! let config = MirrorConfig::from_json(r#"{ "initial_bandwidth_share": 0.5 }"#).unwrap();
//! assert_eq!(config.initial_bandwidth_share, 0.5);
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default background chunk size in bytes (256 KiB).
pub const DEFAULT_CHUNK_BYTES: usize = 256 * 1024;

/// Default interval at which a blocked reader re-checks worker liveness.
pub const DEFAULT_BYPASS_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Default sync worker thread name.
pub const DEFAULT_WORKER_NAME: &str = "shadow-sync";

/// Granularity of the background traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkSize {
    /// Chunk holds as many items as fit in this many bytes (at least one).
    Bytes(usize),
    /// Chunk holds exactly this many items.
    Items(usize),
}

impl Default for ChunkSize {
    fn default() -> Self {
        ChunkSize::Bytes(DEFAULT_CHUNK_BYTES)
    }
}

impl ChunkSize {
    /// Number of items per traversal step for items of `item_size` bytes.
    pub fn items_per_chunk(&self, item_size: usize) -> usize {
        match *self {
            ChunkSize::Bytes(bytes) => {
                if item_size == 0 {
                    return 1;
                }
                bytes.div_ceil(item_size).max(1)
            }
            ChunkSize::Items(items) => items.max(1),
        }
    }
}

/// Configuration for a single mirror instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Cache file location. `None` allocates an ephemeral file that is
    /// deleted on close; an existing path is reopened in place.
    pub cache_location: Option<PathBuf>,

    /// Background traversal granularity (default: 256 KiB)
    pub chunk_size: ChunkSize,

    /// Fraction of wall-clock time the worker may spend copying, in [0, 1]
    /// (default: 0, on-demand only)
    pub initial_bandwidth_share: f64,

    /// How often a blocked reader checks whether the worker is still alive
    /// (default: 10ms)
    pub bypass_poll_interval: Duration,

    /// Name given to the sync worker thread
    pub worker_name: String,

    /// Event bus buffer size per subscriber (default: 100)
    pub event_buffer: usize,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            cache_location: None,
            chunk_size: ChunkSize::default(),
            initial_bandwidth_share: 0.0,
            bypass_poll_interval: DEFAULT_BYPASS_POLL_INTERVAL,
            worker_name: DEFAULT_WORKER_NAME.to_string(),
            event_buffer: crate::events::DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl MirrorConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON, validating the result.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid mirror configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Use a persistent cache file at `path`.
    pub fn with_cache_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_location = Some(path.into());
        self
    }

    /// Set background traversal granularity.
    pub fn with_chunk_size(mut self, chunk_size: ChunkSize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the initial bandwidth share.
    pub fn with_bandwidth_share(mut self, share: f64) -> Self {
        self.initial_bandwidth_share = share;
        self
    }

    /// Set the liveness polling interval for blocked readers.
    pub fn with_bypass_poll_interval(mut self, interval: Duration) -> Self {
        self.bypass_poll_interval = interval;
        self
    }

    /// Set the sync worker thread name.
    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    /// Set the event buffer size.
    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity;
        self
    }

    /// Returns `true` if the cache file is deleted on close.
    pub fn is_ephemeral(&self) -> bool {
        self.cache_location.is_none()
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.initial_bandwidth_share) {
            return Err(Error::Config(format!(
                "initial_bandwidth_share must be within [0, 1], got {}",
                self.initial_bandwidth_share
            )));
        }

        match self.chunk_size {
            ChunkSize::Bytes(0) | ChunkSize::Items(0) => {
                return Err(Error::Config("chunk_size must be greater than 0".to_string()));
            }
            _ => {}
        }

        if self.bypass_poll_interval.is_zero() {
            return Err(Error::Config(
                "bypass_poll_interval must be greater than 0".to_string(),
            ));
        }

        if self.worker_name.is_empty() {
            return Err(Error::Config("worker_name cannot be empty".to_string()));
        }

        if self.event_buffer == 0 {
            return Err(Error::Config("event_buffer must be at least 1".to_string()));
        }

        if let Some(path) = &self.cache_location {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("cache_location cannot be empty".to_string()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MirrorConfig::default();
        assert!(config.cache_location.is_none());
        assert!(config.is_ephemeral());
        assert_eq!(config.chunk_size, ChunkSize::Bytes(DEFAULT_CHUNK_BYTES));
        assert_eq!(config.initial_bandwidth_share, 0.0);
        assert_eq!(config.worker_name, DEFAULT_WORKER_NAME);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = MirrorConfig::new()
            .with_cache_location("/tmp/mirror.bin")
            .with_chunk_size(ChunkSize::Items(16))
            .with_bandwidth_share(0.5)
            .with_bypass_poll_interval(Duration::from_millis(5))
            .with_worker_name("mirror-worker")
            .with_event_buffer(8);

        assert_eq!(config.cache_location, Some(PathBuf::from("/tmp/mirror.bin")));
        assert!(!config.is_ephemeral());
        assert_eq!(config.chunk_size, ChunkSize::Items(16));
        assert_eq!(config.initial_bandwidth_share, 0.5);
        assert_eq!(config.bypass_poll_interval, Duration::from_millis(5));
        assert_eq!(config.worker_name, "mirror-worker");
        assert_eq!(config.event_buffer, 8);
    }

    #[test]
    fn test_config_validation() {
        assert!(MirrorConfig::default().with_bandwidth_share(1.0).validate().is_ok());
        assert!(MirrorConfig::default().with_bandwidth_share(1.5).validate().is_err());
        assert!(MirrorConfig::default().with_bandwidth_share(-0.1).validate().is_err());
        assert!(MirrorConfig::default().with_bandwidth_share(f64::NAN).validate().is_err());
        assert!(MirrorConfig::default()
            .with_chunk_size(ChunkSize::Items(0))
            .validate()
            .is_err());
        assert!(MirrorConfig::default()
            .with_bypass_poll_interval(Duration::ZERO)
            .validate()
            .is_err());
        assert!(MirrorConfig::default().with_worker_name("").validate().is_err());
        assert!(MirrorConfig::default().with_event_buffer(0).validate().is_err());
        assert!(MirrorConfig::default().with_cache_location("").validate().is_err());
    }

    #[test]
    fn test_items_per_chunk() {
        assert_eq!(ChunkSize::Bytes(256 * 1024).items_per_chunk(32), 8192);
        assert_eq!(ChunkSize::Bytes(10).items_per_chunk(4), 3);
        assert_eq!(ChunkSize::Bytes(1).items_per_chunk(4096), 1);
        assert_eq!(ChunkSize::Bytes(64).items_per_chunk(0), 1);
        assert_eq!(ChunkSize::Items(7).items_per_chunk(4096), 7);
        assert_eq!(ChunkSize::Items(0).items_per_chunk(4), 1);
    }

    #[test]
    fn test_from_json() {
        let config = MirrorConfig::from_json(
            r#"{ "chunk_size": { "items": 4 }, "initial_bandwidth_share": 0.25 }"#,
        )
        .unwrap();
        assert_eq!(config.chunk_size, ChunkSize::Items(4));
        assert_eq!(config.initial_bandwidth_share, 0.25);
        assert_eq!(config.worker_name, DEFAULT_WORKER_NAME);

        assert!(MirrorConfig::from_json(r#"{ "initial_bandwidth_share": 2.0 }"#).is_err());
        assert!(MirrorConfig::from_json("not json").is_err());
    }
}
