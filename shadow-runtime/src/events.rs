//! # Event Bus System
//!
//! Progress notifications for shadow mirrors, published through
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The sync worker runs on a plain OS thread, so it only ever uses the
//! non-blocking `send` side of the channel. Subscribers may consume events
//! either from async code (`recv().await`) or by polling with `try_recv`.
//!
//! ```text
//! ┌─────────────┐     emit      ┌───────────┐     subscribe    ┌────────────┐
//! │ Sync worker ├──────────────>│ EventBus  ├─────────────────>│ Subscriber │
//! └─────────────┘               └───────────┘                  └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use shadow_runtime::events::{EventBus, MirrorEvent};
//!
//! let bus = EventBus::new(16);
//! let mut events = bus.subscribe();
//!
//! bus.emit(MirrorEvent::Progress {
//!     mirror_id: "m-1".to_string(),
//!     copied: 4,
//!     total: 8,
//! })
//! .ok();
//!
//! assert!(matches!(events.try_recv(), Ok(MirrorEvent::Progress { copied: 4, .. })));
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//! - **`RecvError::Closed`**: All senders have been dropped.
//!
//! Emitting with no subscribers returns an error which publishers ignore.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError, TryRecvError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Events describing the life of a single mirror.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum MirrorEvent {
    /// Sync worker started.
    Started {
        /// Identifier of the mirror.
        mirror_id: String,
        /// Number of items in the source.
        total: u64,
    },
    /// Background traversal copied a chunk.
    Progress {
        /// Identifier of the mirror.
        mirror_id: String,
        /// Items synced so far.
        copied: u64,
        /// Number of items in the source.
        total: u64,
    },
    /// A foreground bypass request was serviced.
    BypassServiced {
        /// Identifier of the mirror.
        mirror_id: String,
        /// First requested index.
        start: u64,
        /// One past the last requested index.
        stop: u64,
        /// Items newly synced by this request.
        copied: u64,
    },
    /// Every item is synced and the traversal is exhausted.
    Completed {
        /// Identifier of the mirror.
        mirror_id: String,
        /// Number of items in the source.
        total: u64,
    },
    /// Worker stopped before the mirror was complete.
    Failed {
        /// Identifier of the mirror.
        mirror_id: String,
        /// Human-readable reason.
        reason: String,
    },
    /// Mirror was closed by its owner.
    Closed {
        /// Identifier of the mirror.
        mirror_id: String,
    },
}

impl MirrorEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            MirrorEvent::Started { .. } => "Sync worker started",
            MirrorEvent::Progress { .. } => "Background copy progressed",
            MirrorEvent::BypassServiced { .. } => "Bypass request serviced",
            MirrorEvent::Completed { .. } => "Mirror fully copied",
            MirrorEvent::Failed { .. } => "Sync worker failed",
            MirrorEvent::Closed { .. } => "Mirror closed",
        }
    }

    /// Returns the identifier of the mirror that emitted the event.
    pub fn mirror_id(&self) -> &str {
        match self {
            MirrorEvent::Started { mirror_id, .. }
            | MirrorEvent::Progress { mirror_id, .. }
            | MirrorEvent::BypassServiced { mirror_id, .. }
            | MirrorEvent::Completed { mirror_id, .. }
            | MirrorEvent::Failed { mirror_id, .. }
            | MirrorEvent::Closed { mirror_id } => mirror_id,
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            MirrorEvent::Failed { .. } => EventSeverity::Error,
            MirrorEvent::Started { .. }
            | MirrorEvent::Completed { .. }
            | MirrorEvent::Closed { .. } => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

/// Broadcast channel shared by the mirrors of an application.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<MirrorEvent>,
}

impl EventBus {
    /// A subscriber more than `capacity` events behind gets `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Fails only when nobody is subscribed; workers ignore that case.
    pub fn emit(&self, event: MirrorEvent) -> Result<usize, SendError<MirrorEvent>> {
        self.sender.send(event)
    }

    /// Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<MirrorEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
