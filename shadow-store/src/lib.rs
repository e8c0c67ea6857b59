//! # Shadow Store
//!
//! The passive half of a shadow mirror: a file-backed byte region sized for
//! every source item, and the bookkeeping of which items are already valid.
//!
//! ## Components
//!
//! - **Cache Store** (`store`): backing file, positional reads, idempotent copy
//! - **Synced Set** (`synced`): monotonic bitset of valid items
//! - **Source Adapter** (`source`): the capability the mirrored collection exposes
//! - **Index Ranges** (`range`): slice normalization into canonical forward ranges
//! - **Elements** (`element`): little-endian decoding of cached bytes
//!
//! There is no threading in this crate. The sync engine owns the only writer.

pub mod element;
pub mod error;
mod io;
pub mod range;
pub mod source;
pub mod store;
pub mod synced;

pub use element::{decode_all, encode_all, Element};
pub use error::{Result, StoreError};
pub use range::{resolve_index, resolve_range, slice_indices, IndexRange, SliceSpec};
pub use source::{SourceAdapter, VecSource};
pub use store::CacheStore;
pub use synced::SyncedSet;
