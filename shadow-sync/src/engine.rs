//! # Sync Engine
//!
//! One background worker thread per mirror. The worker owns the only write
//! path into the [`CacheStore`]; readers ask it to copy what they need through
//! bypass requests and otherwise read the store directly.
//!
//! ## Worker loop
//!
//! 1. Ask the [`RateController`] how long to wait before the next step.
//! 2. Wait on the command channel for at most that long. Nothing arriving
//!    becomes a tick.
//! 3. A tick advances the background traversal to the first chunk that is not
//!    yet synced and copies it.
//! 4. A bypass copies the requested range at once, whatever the share.
//!
//! Copies are never interrupted. A `Stop` is honored between steps.
//!
//! ## Bypass protocol
//!
//! Callers are serialized by a gate. The caller that holds the gate claims the
//! single bypass slot, enqueues the command and polls its [`BypassTicket`]
//! until the worker replies or goes away.
//!
//! [`BypassTicket`]: crate::command::BypassTicket

use crate::command::{bypass_request, Command, TicketState};
use crate::error::{Result, SyncError};
use crate::rate::RateController;
use crate::traversal::Traversal;
use parking_lot::Mutex;
use shadow_runtime::config::{DEFAULT_BYPASS_POLL_INTERVAL, DEFAULT_WORKER_NAME};
use shadow_runtime::{ChunkSize, EventBus, MirrorConfig, MirrorEvent};
use shadow_store::{CacheStore, IndexRange, SourceAdapter};
use std::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

// ============================================================================
// State
// ============================================================================

/// What the worker is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Copying,
    Bypassing,
    Stopped,
}

/// Why the worker stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The owner closed the engine.
    Requested,
    /// The traversal finished with every item synced.
    Completed,
    /// The traversal finished but some items were never synced.
    Inconsistent,
    /// A copy failed or the worker hit an internal error.
    Faulted(String),
}

impl Termination {
    /// `true` for stops that are not failures.
    pub fn is_normal(&self) -> bool {
        matches!(self, Termination::Requested | Termination::Completed)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Requested => write!(f, "sync worker was closed"),
            Termination::Completed => write!(f, "sync worker completed"),
            Termination::Inconsistent => {
                write!(f, "traversal finished with unsynced items")
            }
            Termination::Faulted(reason) => write!(f, "sync worker faulted: {}", reason),
        }
    }
}

// ============================================================================
// Options
// ============================================================================

/// Settings for a single engine.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Identifier carried by log lines and events.
    pub mirror_id: String,
    /// Items per background traversal step.
    pub chunk_items: usize,
    /// Initial bandwidth share in `[0, 1]`.
    pub bandwidth_share: f64,
    /// How often a blocked bypass caller re-checks the worker.
    pub poll_interval: Duration,
    /// Name of the worker thread.
    pub worker_name: String,
    /// Optional sink for progress events.
    pub events: Option<EventBus>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            mirror_id: "mirror".to_string(),
            chunk_items: 1,
            bandwidth_share: 0.0,
            poll_interval: DEFAULT_BYPASS_POLL_INTERVAL,
            worker_name: DEFAULT_WORKER_NAME.to_string(),
            events: None,
        }
    }
}

impl EngineOptions {
    /// Derives engine options from a mirror configuration for items of
    /// `item_size` bytes.
    pub fn from_config(config: &MirrorConfig, item_size: usize) -> Self {
        Self {
            chunk_items: config.chunk_size.items_per_chunk(item_size),
            bandwidth_share: config.initial_bandwidth_share,
            poll_interval: config.bypass_poll_interval,
            worker_name: config.worker_name.clone(),
            ..Self::default()
        }
    }

    pub fn with_mirror_id(mut self, id: impl Into<String>) -> Self {
        self.mirror_id = id.into();
        self
    }

    pub fn with_chunk(mut self, chunk: ChunkSize, item_size: usize) -> Self {
        self.chunk_items = chunk.items_per_chunk(item_size);
        self
    }

    pub fn with_bandwidth_share(mut self, share: f64) -> Self {
        self.bandwidth_share = share;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }
}

// ============================================================================
// Shared worker state
// ============================================================================

struct Shared {
    mirror_id: String,
    store: Arc<CacheStore>,
    source: Arc<dyn SourceAdapter>,
    rate: Mutex<RateController>,
    slot: Mutex<Option<IndexRange>>,
    state: Mutex<EngineState>,
    termination: Mutex<Option<Termination>>,
    events: Option<EventBus>,
}

impl Shared {
    fn set_state(&self, state: EngineState) {
        *self.state.lock() = state;
    }

    fn emit(&self, event: MirrorEvent) {
        if let Some(bus) = &self.events {
            // No subscribers is fine.
            let _ = bus.emit(event);
        }
    }

    fn total(&self) -> u64 {
        self.store.len() as u64
    }

    /// Copies a bypass range. The slot must hold exactly this range.
    fn service_bypass(&self, range: IndexRange) -> Result<usize> {
        let claimed = self.slot.lock().take();
        if claimed != Some(range) {
            return Err(SyncError::Programming(format!(
                "bypass for {:?} found slot holding {:?}",
                range, claimed
            )));
        }

        self.set_state(EngineState::Bypassing);
        let copied = self.store.copy(self.source.as_ref(), &range);
        self.set_state(EngineState::Idle);
        let copied = copied?;

        debug!(
            mirror_id = %self.mirror_id,
            start = range.start,
            stop = range.stop,
            copied,
            "Serviced bypass"
        );
        self.emit(MirrorEvent::BypassServiced {
            mirror_id: self.mirror_id.clone(),
            start: range.start as u64,
            stop: range.stop as u64,
            copied: copied as u64,
        });
        Ok(copied)
    }

    /// Copies the next unsynced chunk. `None` once the traversal is exhausted.
    fn background_step(&self, traversal: &mut Traversal) -> Result<Option<usize>> {
        for chunk in traversal.by_ref() {
            if self.store.is_synced(&chunk) {
                continue;
            }

            self.set_state(EngineState::Copying);
            let started = Instant::now();
            let copied = self.store.copy(self.source.as_ref(), &chunk);
            let elapsed = started.elapsed();
            self.set_state(EngineState::Idle);
            let copied = copied?;

            self.rate.lock().record(copied, elapsed);
            self.emit(MirrorEvent::Progress {
                mirror_id: self.mirror_id.clone(),
                copied: self.store.synced_count() as u64,
                total: self.total(),
            });
            return Ok(Some(copied));
        }
        Ok(None)
    }

    /// Records the termination once, then publishes it before marking the
    /// worker stopped.
    fn finish(&self, termination: Termination) {
        {
            let mut slot = self.termination.lock();
            if slot.is_some() {
                return;
            }
            *slot = Some(termination.clone());
        }

        match &termination {
            Termination::Completed => {
                info!(mirror_id = %self.mirror_id, total = self.total(), "Mirror fully copied");
                self.emit(MirrorEvent::Completed {
                    mirror_id: self.mirror_id.clone(),
                    total: self.total(),
                });
            }
            Termination::Requested => {
                info!(mirror_id = %self.mirror_id, "Sync worker stopped");
            }
            other => {
                error!(mirror_id = %self.mirror_id, "Sync worker stopped: {}", other);
                self.emit(MirrorEvent::Failed {
                    mirror_id: self.mirror_id.clone(),
                    reason: other.to_string(),
                });
            }
        }
        self.set_state(EngineState::Stopped);
    }
}

/// Marks the engine stopped if the worker unwinds.
struct ExitGuard(Arc<Shared>);

impl Drop for ExitGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0
                .finish(Termination::Faulted("sync worker panicked".to_string()));
        }
    }
}

// ============================================================================
// Worker
// ============================================================================

enum Step {
    Command(Command),
    Tick,
    Disconnected,
}

fn next_step(commands: &Receiver<Command>, wait: Option<Duration>) -> Step {
    match wait {
        None => match commands.recv() {
            Ok(command) => Step::Command(command),
            Err(_) => Step::Disconnected,
        },
        Some(wait) if wait.is_zero() => match commands.try_recv() {
            Ok(command) => Step::Command(command),
            Err(TryRecvError::Empty) => Step::Tick,
            Err(TryRecvError::Disconnected) => Step::Disconnected,
        },
        Some(wait) => match commands.recv_timeout(wait) {
            Ok(command) => Step::Command(command),
            Err(RecvTimeoutError::Timeout) => Step::Tick,
            Err(RecvTimeoutError::Disconnected) => Step::Disconnected,
        },
    }
}

fn run_worker(shared: Arc<Shared>, commands: Receiver<Command>, mut traversal: Traversal) {
    let _guard = ExitGuard(Arc::clone(&shared));

    info!(
        mirror_id = %shared.mirror_id,
        total = shared.total(),
        chunk = traversal.chunk(),
        "Sync worker started"
    );
    shared.emit(MirrorEvent::Started {
        mirror_id: shared.mirror_id.clone(),
        total: shared.total(),
    });

    let termination = loop {
        let wait = shared.rate.lock().next_wait();
        match next_step(&commands, wait) {
            Step::Command(Command::Wake) => {
                debug!(mirror_id = %shared.mirror_id, "Sync worker woken");
            }
            Step::Command(Command::Stop) | Step::Disconnected => {
                break Termination::Requested;
            }
            Step::Command(Command::Bypass { range, reply }) => {
                match shared.service_bypass(range) {
                    Ok(copied) => {
                        // The caller may have given up on the reply.
                        let _ = reply.send(Ok(copied));
                    }
                    Err(e) => {
                        let reason = e.to_string();
                        let _ = reply.send(Err(SyncError::SynchronizationFailed(reason.clone())));
                        break Termination::Faulted(reason);
                    }
                }
            }
            Step::Tick => {
                if shared.rate.lock().is_passive() {
                    continue;
                }
                match shared.background_step(&mut traversal) {
                    Ok(Some(_)) => {}
                    Ok(None) if shared.store.fully_copied() => break Termination::Completed,
                    Ok(None) => {
                        warn!(
                            mirror_id = %shared.mirror_id,
                            synced = shared.store.synced_count(),
                            total = shared.total(),
                            "Traversal exhausted before every item was synced"
                        );
                        break Termination::Inconsistent;
                    }
                    Err(e) => break Termination::Faulted(e.to_string()),
                }
            }
        }
    };

    shared.finish(termination);
}

// ============================================================================
// Engine
// ============================================================================

/// Handle to a running sync worker.
pub struct SyncEngine {
    shared: Arc<Shared>,
    commands: Sender<Command>,
    worker: Mutex<Option<JoinHandle<()>>>,
    gate: Mutex<()>,
    poll_interval: Duration,
}

impl SyncEngine {
    /// Starts a worker mirroring `source` into `store`.
    pub fn spawn(
        store: Arc<CacheStore>,
        source: Arc<dyn SourceAdapter>,
        options: EngineOptions,
    ) -> Result<Self> {
        if source.item_count() != store.len() || source.item_size() != store.item_size() {
            return Err(SyncError::Programming(format!(
                "source layout {}x{} does not match store layout {}x{}",
                source.item_count(),
                source.item_size(),
                store.len(),
                store.item_size()
            )));
        }

        let traversal = Traversal::new(store.len(), options.chunk_items);
        Self::spawn_with_traversal(store, source, options, traversal)
    }

    /// Starts a worker that walks `traversal` instead of the whole store.
    pub(crate) fn spawn_with_traversal(
        store: Arc<CacheStore>,
        source: Arc<dyn SourceAdapter>,
        options: EngineOptions,
        traversal: Traversal,
    ) -> Result<Self> {
        let rate = RateController::new(options.bandwidth_share);
        let shared = Arc::new(Shared {
            mirror_id: options.mirror_id,
            store,
            source,
            rate: Mutex::new(rate),
            slot: Mutex::new(None),
            state: Mutex::new(EngineState::Idle),
            termination: Mutex::new(None),
            events: options.events,
        });

        let (commands, receiver) = mpsc::channel();
        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(options.worker_name)
            .spawn(move || run_worker(worker_shared, receiver, traversal))
            .map_err(|e| SyncError::Spawn(e.to_string()))?;

        Ok(Self {
            shared,
            commands,
            worker: Mutex::new(Some(handle)),
            gate: Mutex::new(()),
            poll_interval: options.poll_interval.max(Duration::from_micros(100)),
        })
    }

    /// Blocks until every index of `range` is synced.
    ///
    /// Returns at once when the range is already synced. Fails with
    /// [`SyncError::SynchronizationFailed`] if the worker is gone and the
    /// range can no longer be synced.
    #[instrument(level = "debug", skip(self), fields(mirror_id = %self.shared.mirror_id))]
    pub fn bypass(&self, range: IndexRange) -> Result<()> {
        if self.is_available(&range) {
            return Ok(());
        }

        let _gate = self.gate.lock();
        // Another caller may have synced the range while we waited.
        if self.is_available(&range) {
            return Ok(());
        }
        if !self.is_running() {
            return self.terminated_outcome(&range);
        }

        // The gate guarantees the slot is empty here.
        *self.shared.slot.lock() = Some(range);

        let (command, ticket) = bypass_request(range);
        if self.commands.send(command).is_err() {
            self.shared.slot.lock().take();
            return self.terminated_outcome(&range);
        }

        loop {
            match ticket.poll(self.poll_interval) {
                TicketState::Pending => continue,
                TicketState::Completed(result) => return result.map(|_| ()),
                TicketState::ProducerTerminated => {
                    self.shared.slot.lock().take();
                    return self.terminated_outcome(&range);
                }
            }
        }
    }

    fn is_available(&self, range: &IndexRange) -> bool {
        self.shared.store.fully_copied() || self.shared.store.is_synced(range)
    }

    fn terminated_outcome(&self, range: &IndexRange) -> Result<()> {
        if self.is_available(range) {
            return Ok(());
        }
        let reason = self
            .termination()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "sync worker exited".to_string());
        warn!(mirror_id = %self.shared.mirror_id, "Bypass on stopped worker: {}", reason);
        Err(SyncError::SynchronizationFailed(reason))
    }

    /// Changes the bandwidth share and wakes the worker. Returns the stored
    /// (clamped) value.
    pub fn set_bandwidth_share(&self, share: f64) -> f64 {
        let stored = self.shared.rate.lock().set_share(share);
        debug!(mirror_id = %self.shared.mirror_id, share = stored, "Bandwidth share changed");
        // A stopped worker has nothing to wake.
        let _ = self.commands.send(Command::Wake);
        stored
    }

    pub fn bandwidth_share(&self) -> f64 {
        self.shared.rate.lock().share()
    }

    /// Smoothed time to sync one item, once a background step has run.
    pub fn sync_item_duration(&self) -> Option<Duration> {
        self.shared.rate.lock().average()
    }

    pub fn state(&self) -> EngineState {
        *self.shared.state.lock()
    }

    /// Why the worker stopped, or `None` while it runs.
    pub fn termination(&self) -> Option<Termination> {
        self.shared.termination.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.state() != EngineState::Stopped
    }

    pub fn copy_ratio(&self) -> f64 {
        self.shared.store.copy_ratio()
    }

    pub fn fully_copied(&self) -> bool {
        self.shared.store.fully_copied()
    }

    pub fn mirror_id(&self) -> &str {
        &self.shared.mirror_id
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.shared.store
    }

    /// Stops the worker and waits for it. Later calls do nothing.
    pub fn close(&self) {
        let mut worker = self.worker.lock();
        let handle = worker.take();
        drop(worker);
        let Some(handle) = handle else {
            return;
        };
        let _ = self.commands.send(Command::Stop);
        if handle.join().is_err() {
            error!(mirror_id = %self.shared.mirror_id, "Sync worker panicked");
        }
        info!(mirror_id = %self.shared.mirror_id, "Sync engine closed");
    }

    pub fn is_closed(&self) -> bool {
        self.worker.lock().is_none()
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncEngine")
            .field("mirror_id", &self.shared.mirror_id)
            .field("state", &self.state())
            .field("copy_ratio", &self.copy_ratio())
            .field("bandwidth_share", &self.bandwidth_share())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadow_store::VecSource;

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    fn engine(items: usize, options: EngineOptions) -> SyncEngine {
        let values: Vec<u32> = (0..items as u32).collect();
        let source = Arc::new(VecSource::from_elements(&values, 1).unwrap());
        let store = Arc::new(CacheStore::ephemeral(items, 4).unwrap());
        SyncEngine::spawn(store, source, options).unwrap()
    }

    #[test]
    fn test_passive_engine_copies_nothing() {
        let engine = engine(64, EngineOptions::default());
        thread::sleep(Duration::from_millis(30));
        assert_eq!(engine.copy_ratio(), 0.0);
        assert_eq!(engine.state(), EngineState::Idle);
        assert!(engine.is_running());
        assert_eq!(engine.sync_item_duration(), None);
        engine.close();
    }

    #[test]
    fn test_bypass_copies_range() {
        let engine = engine(64, EngineOptions::default());
        engine.bypass(IndexRange::contiguous(10, 20)).unwrap();
        assert!(engine.store().is_synced(&IndexRange::contiguous(10, 20)));
        assert_eq!(engine.store().synced_count(), 10);
        assert_eq!(engine.store().read_item(12).unwrap(), 12u32.to_le_bytes());
        // Bypass steps do not feed the rate estimate.
        assert_eq!(engine.sync_item_duration(), None);
        engine.close();
    }

    #[test]
    fn test_active_engine_completes() {
        let engine = engine(
            100,
            EngineOptions::default()
                .with_bandwidth_share(1.0)
                .with_chunk(ChunkSize::Items(7), 4),
        );
        assert!(wait_until(|| !engine.is_running()));
        assert_eq!(engine.termination(), Some(Termination::Completed));
        assert!(engine.fully_copied());
        assert!(engine.sync_item_duration().unwrap() > Duration::ZERO);

        // Completed mirrors still serve bypasses.
        engine.bypass(IndexRange::contiguous(0, 100)).unwrap();
        engine.close();
    }

    #[test]
    fn test_share_change_wakes_worker() {
        let engine = engine(50, EngineOptions::default());
        thread::sleep(Duration::from_millis(10));
        assert_eq!(engine.copy_ratio(), 0.0);

        assert_eq!(engine.set_bandwidth_share(3.0), 1.0);
        assert!(wait_until(|| engine.fully_copied()));
        engine.close();
    }

    #[test]
    fn test_empty_collection_completes() {
        let engine = engine(0, EngineOptions::default().with_bandwidth_share(0.5));
        assert!(wait_until(|| !engine.is_running()));
        assert_eq!(engine.termination(), Some(Termination::Completed));
        assert_eq!(engine.copy_ratio(), 1.0);
    }

    #[test]
    fn test_close_is_idempotent() {
        let engine = engine(16, EngineOptions::default());
        engine.close();
        assert!(engine.is_closed());
        assert_eq!(engine.termination(), Some(Termination::Requested));
        engine.close();
        assert_eq!(engine.state(), EngineState::Stopped);
    }

    #[test]
    fn test_bypass_after_close() {
        let engine = engine(16, EngineOptions::default());
        engine.bypass(IndexRange::contiguous(0, 4)).unwrap();
        engine.close();

        // Already synced data stays readable.
        engine.bypass(IndexRange::contiguous(0, 4)).unwrap();
        assert!(matches!(
            engine.bypass(IndexRange::contiguous(4, 8)),
            Err(SyncError::SynchronizationFailed(_))
        ));
    }

    #[test]
    fn test_empty_slot_is_programming_error() {
        let engine = engine(16, EngineOptions::default());
        // Enqueue a bypass without claiming the slot.
        let (command, ticket) = bypass_request(IndexRange::contiguous(0, 2));
        engine.commands.send(command).unwrap();

        match ticket.poll(Duration::from_secs(10)) {
            TicketState::Completed(Err(SyncError::SynchronizationFailed(reason))) => {
                assert!(reason.contains("Programming error"));
            }
            other => panic!("unexpected ticket state: {:?}", other),
        }
        assert!(wait_until(|| !engine.is_running()));
        assert!(matches!(
            engine.termination(),
            Some(Termination::Faulted(_))
        ));
        assert!(engine.bypass(IndexRange::contiguous(0, 2)).is_err());
    }

    #[test]
    fn test_layout_mismatch_rejected() {
        let source = Arc::new(VecSource::new(vec![0; 16], 4).unwrap());
        let store = Arc::new(CacheStore::ephemeral(8, 4).unwrap());
        assert!(matches!(
            SyncEngine::spawn(store, source, EngineOptions::default()),
            Err(SyncError::Programming(_))
        ));
    }

    #[test]
    fn test_events_published() {
        let bus = EventBus::new(64);
        let mut events = bus.subscribe();
        let engine = engine(
            8,
            EngineOptions::default()
                .with_mirror_id("m-1")
                .with_bandwidth_share(1.0)
                .with_chunk(ChunkSize::Items(4), 4)
                .with_events(bus),
        );
        assert!(wait_until(|| !engine.is_running()));

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            assert_eq!(event.mirror_id(), "m-1");
            seen.push(event);
        }
        assert!(matches!(seen.first(), Some(MirrorEvent::Started { total: 8, .. })));
        assert!(matches!(seen.last(), Some(MirrorEvent::Completed { total: 8, .. })));
        assert_eq!(
            seen.iter()
                .filter(|e| matches!(e, MirrorEvent::Progress { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn test_short_traversal_is_inconsistent() {
        let bus = EventBus::new(64);
        let mut events = bus.subscribe();
        let values: Vec<u32> = (0..32).collect();
        let source = Arc::new(VecSource::from_elements(&values, 1).unwrap());
        let store = Arc::new(CacheStore::ephemeral(32, 4).unwrap());
        let engine = SyncEngine::spawn_with_traversal(
            store,
            source,
            EngineOptions::default()
                .with_bandwidth_share(1.0)
                .with_events(bus),
            Traversal::new(28, 8),
        )
        .unwrap();

        assert!(wait_until(|| !engine.is_running()));
        assert_eq!(engine.termination(), Some(Termination::Inconsistent));
        assert_eq!(engine.store().synced_count(), 28);

        let mut failed = false;
        while let Ok(event) = events.try_recv() {
            failed |= matches!(event, MirrorEvent::Failed { .. });
        }
        assert!(failed);

        engine.bypass(IndexRange::contiguous(0, 28)).unwrap();
        assert!(matches!(
            engine.bypass(IndexRange::contiguous(28, 32)),
            Err(SyncError::SynchronizationFailed(_))
        ));
    }

    #[test]
    fn test_is_closed_during_close() {
        let engine = Arc::new(engine(
            20_000,
            EngineOptions::default()
                .with_bandwidth_share(1.0)
                .with_chunk(ChunkSize::Items(1), 4),
        ));
        let closer = {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.close())
        };
        assert!(wait_until(|| engine.is_closed()));
        closer.join().unwrap();
        assert!(engine.is_closed());
        assert!(!engine.is_running());
    }

    #[test]
    fn test_termination_display() {
        assert!(Termination::Faulted("disk".into()).to_string().contains("disk"));
        assert!(Termination::Completed.is_normal());
        assert!(!Termination::Inconsistent.is_normal());
    }
}
