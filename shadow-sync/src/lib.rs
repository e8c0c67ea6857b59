//! # Shadow Sync
//!
//! The active half of a shadow mirror: a background worker that copies the
//! source into its [`CacheStore`](shadow_store::CacheStore) at a throttled
//! rate, and services on-demand bypass requests from readers.
//!
//! ## Components
//!
//! - **Sync Engine** (`engine`): worker thread, bypass protocol, lifecycle
//! - **Rate Controller** (`rate`): bandwidth share to inter-step wait
//! - **Commands** (`command`): worker messages and bypass reply tickets
//! - **Traversal** (`traversal`): lazy chunked walk over the index space
//!
//! ## Usage
//!
//! ```rust
//! use shadow_store::{CacheStore, IndexRange, VecSource};
//! use shadow_sync::{EngineOptions, SyncEngine};
//! use std::sync::Arc;
//!
//! let source = Arc::new(VecSource::from_elements(&[1u16, 2, 3, 4], 1).unwrap());
//! let store = Arc::new(CacheStore::ephemeral(4, 2).unwrap());
//! let engine = SyncEngine::spawn(store.clone(), source, EngineOptions::default()).unwrap();
//!
//! engine.bypass(IndexRange::contiguous(1, 3)).unwrap();
//! assert_eq!(store.read_item(2).unwrap(), 3u16.to_le_bytes());
//! assert_eq!(engine.copy_ratio(), 0.5);
//! engine.close();
//! ```

pub mod command;
pub mod engine;
pub mod error;
pub mod rate;
pub mod traversal;

pub use command::{BypassTicket, Command, TicketState};
pub use engine::{EngineOptions, EngineState, SyncEngine, Termination};
pub use error::{Result, SyncError};
pub use rate::RateController;
pub use traversal::Traversal;
