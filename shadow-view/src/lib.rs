//! # Shadow View
//!
//! Typed, lazily synchronized read access to a source collection.
//!
//! A [`CacheView`] looks like a read-only array over the source. The first
//! read of any item pulls it through the sync engine into the cache file;
//! later reads hit the file only. With a non-zero bandwidth share the engine
//! also copies the rest of the source in the background until the mirror is
//! complete.
//!
//! ## Usage
//!
//! ```rust
//! use shadow_runtime::MirrorConfig;
//! use shadow_store::VecSource;
//! use shadow_view::{CacheView, Index};
//! use std::sync::Arc;
//!
//! let values: Vec<f32> = (0..12).map(|v| v as f32).collect();
//! let source = Arc::new(VecSource::from_elements(&values, 3).unwrap());
//! let view: CacheView<f32> = CacheView::open(source, MirrorConfig::default()).unwrap();
//!
//! assert_eq!(view.shape(), vec![4, 3]);
//! assert_eq!(view.item(-1).unwrap().values, vec![9.0, 10.0, 11.0]);
//! assert_eq!(view.get((Index::all(), Index::Scalar(0))).unwrap().values, vec![0.0, 3.0, 6.0, 9.0]);
//! assert!(view.fully_copied());
//! view.close().unwrap();
//! ```

pub mod block;
pub mod error;
pub mod index;
pub mod registry;
pub mod view;

pub use block::Block;
pub use error::{Result, ViewError};
pub use index::Index;
pub use registry::{Mirror, MirrorId, MirrorRegistry};
pub use view::CacheView;
