//! # Shadow Runtime
//!
//! Foundational infrastructure shared by the shadow mirror crates:
//! - Logging and tracing setup
//! - Mirror configuration with validation
//! - Event bus for sync progress notifications
//!
//! ## Overview
//!
//! Nothing in here knows about sources or cache files. The store, the sync
//! engine and the view layer all depend on this crate for their ambient
//! concerns so that they log, configure and report progress the same way.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{ChunkSize, MirrorConfig};
pub use error::{Error, Result};
pub use events::{EventBus, MirrorEvent};
