//! Workspace facade crate.
//!
//! Exposes the shadow mirror crates behind feature flags so host applications
//! can depend on `shadow-workspace` alone:
//!
//! - always: `runtime` (config, logging, events) and `store` (cache file)
//! - `engine`: the background sync worker
//! - `view` (default): typed lazy views and the mirror registry

pub use shadow_runtime as runtime;
pub use shadow_store as store;

#[cfg(feature = "engine")]
pub use shadow_sync as sync;

#[cfg(feature = "view")]
pub use shadow_view as view;
