//! # Mirror Registry
//!
//! Tracks live views so an application can shut every mirror down at a
//! well-defined point. The registry holds weak references only: dropping the
//! last handle to a view still closes it, and the registry forgets it.
//!
//! ```rust
//! use shadow_runtime::MirrorConfig;
//! use shadow_store::VecSource;
//! use shadow_view::{CacheView, MirrorRegistry};
//! use std::sync::Arc;
//!
//! let registry = MirrorRegistry::new();
//! let source = Arc::new(VecSource::from_elements(&[1.0f64, 2.0], 1).unwrap());
//! let view = registry.open::<f64>(source, MirrorConfig::default()).unwrap();
//! assert_eq!(registry.len(), 1);
//!
//! registry.close_all().unwrap();
//! assert!(view.is_closed());
//! ```

use crate::error::Result;
use crate::view::CacheView;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shadow_runtime::MirrorConfig;
use shadow_store::{Element, SourceAdapter};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{error, info};
use uuid::Uuid;

/// Unique identifier of a mirror instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MirrorId(Uuid);

impl MirrorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MirrorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MirrorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type-erased handle used by the registry.
pub trait Mirror: Send + Sync {
    fn id(&self) -> MirrorId;
    fn close(&self) -> Result<()>;
    fn is_closed(&self) -> bool;
}

impl<E: Element> Mirror for CacheView<E> {
    fn id(&self) -> MirrorId {
        CacheView::id(self)
    }

    fn close(&self) -> Result<()> {
        CacheView::close(self)
    }

    fn is_closed(&self) -> bool {
        CacheView::is_closed(self)
    }
}

/// Owner-controlled set of live mirrors.
#[derive(Default)]
pub struct MirrorRegistry {
    mirrors: Mutex<HashMap<MirrorId, Weak<dyn Mirror>>>,
}

impl MirrorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a view and tracks it.
    pub fn open<E: Element>(
        &self,
        source: Arc<dyn SourceAdapter>,
        config: MirrorConfig,
    ) -> Result<Arc<CacheView<E>>> {
        let view = Arc::new(CacheView::open(source, config)?);
        self.track(&view);
        Ok(view)
    }

    /// Tracks an already opened view.
    pub fn track<M: Mirror + 'static>(&self, mirror: &Arc<M>) {
        let weak: Weak<dyn Mirror> = Arc::downgrade(mirror) as Weak<dyn Mirror>;
        let mut mirrors = self.mirrors.lock();
        mirrors.retain(|_, m| m.strong_count() > 0);
        mirrors.insert(mirror.id(), weak);
    }

    /// Stops tracking `id` without closing it.
    pub fn untrack(&self, id: MirrorId) -> bool {
        self.mirrors.lock().remove(&id).is_some()
    }

    /// Number of tracked mirrors that are still alive and open.
    pub fn len(&self) -> usize {
        self.live().iter().filter(|m| !m.is_closed()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: MirrorId) -> bool {
        self.mirrors
            .lock()
            .get(&id)
            .and_then(Weak::upgrade)
            .is_some_and(|m| !m.is_closed())
    }

    /// Closes every live mirror and forgets all of them. Every mirror is
    /// attempted; the first failure is returned.
    pub fn close_all(&self) -> Result<usize> {
        let live = self.live();
        self.mirrors.lock().clear();

        let mut closed = 0;
        let mut first_error = None;
        for mirror in live {
            if mirror.is_closed() {
                continue;
            }
            match mirror.close() {
                Ok(()) => closed += 1,
                Err(e) => {
                    error!(mirror_id = %mirror.id(), "Failed to close mirror: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        if closed > 0 {
            info!(closed, "Closed registered mirrors");
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(closed),
        }
    }

    fn live(&self) -> Vec<Arc<dyn Mirror>> {
        self.mirrors
            .lock()
            .values()
            .filter_map(Weak::upgrade)
            .collect()
    }
}

impl Drop for MirrorRegistry {
    fn drop(&mut self) {
        // Errors are already logged per mirror.
        let _ = self.close_all();
    }
}

impl fmt::Debug for MirrorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MirrorRegistry")
            .field("mirrors", &self.mirrors.lock().len())
            .finish()
    }
}
