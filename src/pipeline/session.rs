// SPDX-License-Identifier: GPL-3.0-only

//! Session thread and liveness token
//!
//! The frame source pushes batches from its own thread. Those batches are
//! stamped with the session token and queued on a channel; a single session
//! thread drains the channel in order and is the only code that touches the
//! aggregator and the overlay builder.
//!
//! The channel is bounded. When the session thread falls behind, the sink
//! drops the new batch instead of blocking the producer or queueing without
//! limit; dropped batches are counted in [`SessionStats`].
//!
//! Stopping a session invalidates the token before the source is detached.
//! The session thread checks the token of every batch when it dequeues it,
//! so batches that were already in the channel when the stop happened are
//! dropped instead of applied.

use super::aggregator::{AcceptOutcome, SessionAggregator};
use super::classifier::classify;
use super::overlay::{OverlayBuilder, OverlayFrame, OverlayHandle};
use super::types::{RawObservation, ScanMode};
use crate::backends::BatchSink;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, trace, warn};

/// Epoch value meaning "no live session"
const CLOSED_EPOCH: u64 = 0;

/// Log every Nth batch dropped at a full queue
const DROP_LOG_INTERVAL: u64 = 100;

/// Source of session epochs; each `start()` takes a fresh one
static NEXT_EPOCH: AtomicU64 = AtomicU64::new(1);

/// Token identifying the session a batch was produced for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionToken {
    epoch: u64,
}

/// Shared liveness flag consulted before any batch mutates session state
#[derive(Debug, Default)]
pub struct Liveness {
    current: AtomicU64,
}

impl Liveness {
    pub fn new() -> Self {
        Self {
            current: AtomicU64::new(CLOSED_EPOCH),
        }
    }

    /// Open a new epoch and return its token
    pub fn issue(&self) -> SessionToken {
        let epoch = NEXT_EPOCH.fetch_add(1, Ordering::SeqCst);
        self.current.store(epoch, Ordering::SeqCst);
        SessionToken { epoch }
    }

    /// Close the current epoch; every outstanding token becomes stale
    pub fn invalidate(&self) {
        self.current.store(CLOSED_EPOCH, Ordering::SeqCst);
    }

    pub fn is_live(&self, token: SessionToken) -> bool {
        token.epoch != CLOSED_EPOCH && self.current.load(Ordering::SeqCst) == token.epoch
    }
}

/// Counters kept by the session thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    /// Batches applied to session state
    pub batches_applied: u64,
    /// Batches dropped because their token was stale
    pub batches_discarded: u64,
    /// Batches dropped at the sink because the session queue was full
    pub batches_dropped: u64,
    /// Payloads newly accepted
    pub codes_accepted: u64,
    /// Payloads offered again after acceptance
    pub duplicates: u64,
}

/// Work items for the session thread
pub(crate) enum SessionCommand {
    Batch {
        token: SessionToken,
        observations: Vec<RawObservation>,
    },
    SetMode(ScanMode),
    Snapshot {
        reply: SyncSender<SessionSnapshot>,
    },
    Shutdown,
}

/// State copied out of the session thread on request
#[derive(Debug, Clone)]
pub(crate) struct SessionSnapshot {
    pub codes: Vec<String>,
    pub stats: SessionStats,
}

/// `BatchSink` handed to the frame source
///
/// Never blocks the producer. Batches that find the queue full are dropped
/// and counted; batches sent after the session thread has gone away are
/// silently dropped.
pub struct SessionSink {
    token: SessionToken,
    commands: SyncSender<SessionCommand>,
    dropped: Arc<AtomicU64>,
}

impl SessionSink {
    pub(crate) fn new(
        token: SessionToken,
        commands: SyncSender<SessionCommand>,
        dropped: Arc<AtomicU64>,
    ) -> Self {
        Self {
            token,
            commands,
            dropped,
        }
    }
}

impl BatchSink for SessionSink {
    fn on_batch(&self, observations: Vec<RawObservation>) {
        let command = SessionCommand::Batch {
            token: self.token,
            observations,
        };
        match self.commands.try_send(command) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped == 1 || dropped.is_multiple_of(DROP_LOG_INTERVAL) {
                    debug!(dropped, "Batch dropped (session queue full)");
                }
            }
            Err(TrySendError::Disconnected(_)) => {
                trace!("Session closed, batch dropped at the sink");
            }
        }
    }
}

/// State owned by the session thread
struct SessionWorker {
    liveness: Arc<Liveness>,
    mode: ScanMode,
    aggregator: SessionAggregator,
    builder: OverlayBuilder,
    overlay: OverlayHandle,
    sequence: u64,
    stats: SessionStats,
    dropped: Arc<AtomicU64>,
}

impl SessionWorker {
    fn run(mut self, commands: Receiver<SessionCommand>) {
        debug!(mode = %self.mode, "Session thread started");

        while let Ok(command) = commands.recv() {
            match command {
                SessionCommand::Batch {
                    token,
                    observations,
                } => self.process_batch(token, observations),
                SessionCommand::SetMode(mode) => self.set_mode(mode),
                SessionCommand::Snapshot { reply } => {
                    let _ = reply.send(SessionSnapshot {
                        codes: self.aggregator.snapshot(self.mode),
                        stats: self.stats(),
                    });
                }
                SessionCommand::Shutdown => break,
            }
        }

        let stats = self.stats();
        info!(
            applied = stats.batches_applied,
            discarded = stats.batches_discarded,
            dropped = stats.batches_dropped,
            accepted = stats.codes_accepted,
            "Session thread exiting"
        );
    }

    fn stats(&self) -> SessionStats {
        SessionStats {
            batches_dropped: self.dropped.load(Ordering::Relaxed),
            ..self.stats
        }
    }

    fn process_batch(&mut self, token: SessionToken, observations: Vec<RawObservation>) {
        if !self.liveness.is_live(token) {
            self.stats.batches_discarded += 1;
            trace!(count = observations.len(), "Dropping batch from a stopped session");
            return;
        }

        for observation in &observations {
            let Some(classification) = classify(observation) else {
                trace!("Observation has neither payload nor geometry");
                continue;
            };

            match self.aggregator.accept(&classification, self.mode) {
                AcceptOutcome::Accepted => self.stats.codes_accepted += 1,
                AcceptOutcome::Duplicate => self.stats.duplicates += 1,
                AcceptOutcome::NoPayload | AcceptOutcome::ModeMismatch => {}
            }
        }

        self.sequence += 1;
        self.stats.batches_applied += 1;
        let frame = self.builder.build(self.sequence, &observations, self.mode);
        trace!(
            sequence = frame.sequence,
            shapes = frame.shapes.len(),
            "Publishing overlay"
        );
        self.overlay.publish(frame);
    }

    fn set_mode(&mut self, mode: ScanMode) {
        if mode == self.mode {
            return;
        }

        info!(from = %self.mode, to = %mode, "Scan mode changed");
        self.mode = mode;
        // Shapes of the previous mode must not linger until the next batch
        self.overlay.publish(OverlayFrame::empty(self.sequence));
    }
}

/// Running session thread
pub(crate) struct SessionThread {
    commands: SyncSender<SessionCommand>,
    dropped: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl SessionThread {
    /// Spawn the session thread with room for `capacity` queued commands
    pub fn spawn(
        liveness: Arc<Liveness>,
        mode: ScanMode,
        builder: OverlayBuilder,
        overlay: OverlayHandle,
        capacity: usize,
    ) -> std::io::Result<Self> {
        let (commands, receiver) = mpsc::sync_channel(capacity.max(1));
        let dropped = Arc::new(AtomicU64::new(0));

        let worker = SessionWorker {
            liveness,
            mode,
            aggregator: SessionAggregator::new(),
            builder,
            overlay,
            sequence: 0,
            stats: SessionStats::default(),
            dropped: Arc::clone(&dropped),
        };

        let handle = thread::Builder::new()
            .name("scanner-session".to_string())
            .spawn(move || worker.run(receiver))?;

        Ok(Self {
            commands,
            dropped,
            handle: Some(handle),
        })
    }

    /// Sink for a frame source, bound to `token`
    pub fn sink(&self, token: SessionToken) -> SessionSink {
        SessionSink::new(token, self.commands.clone(), Arc::clone(&self.dropped))
    }

    /// Queue a command, waiting for room; returns false if the thread is gone
    pub fn send(&self, command: SessionCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Copy state out of the session thread
    ///
    /// Runs after every command queued before it, so the snapshot reflects
    /// all batches delivered up to this call.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        let (reply, response) = mpsc::sync_channel(1);
        if !self.send(SessionCommand::Snapshot { reply }) {
            return None;
        }
        response.recv().ok()
    }

    /// Ask the thread to exit and wait for it
    pub fn shutdown(&mut self) {
        let _ = self.commands.send(SessionCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.join() {
                warn!("Session thread panicked: {:?}", e);
            }
        }
    }
}

impl Drop for SessionThread {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{NormalizedRect, Quad, SurfaceSize};

    fn spawn(mode: ScanMode) -> (Arc<Liveness>, OverlayHandle, SessionThread) {
        spawn_with_capacity(mode, 64)
    }

    fn spawn_with_capacity(
        mode: ScanMode,
        capacity: usize,
    ) -> (Arc<Liveness>, OverlayHandle, SessionThread) {
        let liveness = Arc::new(Liveness::new());
        let overlay = OverlayHandle::new();
        let thread = SessionThread::spawn(
            Arc::clone(&liveness),
            mode,
            OverlayBuilder::new(SurfaceSize::new(100.0, 100.0)),
            overlay.clone(),
            capacity,
        )
        .unwrap();
        (liveness, overlay, thread)
    }

    fn qr(payload: &str) -> RawObservation {
        RawObservation::qr(
            Quad::from_rect(&NormalizedRect::new(0.0, 0.0, 0.5, 0.5)),
            Some(payload),
        )
    }

    #[test]
    fn test_liveness_tokens() {
        let liveness = Liveness::new();
        let first = liveness.issue();
        assert!(liveness.is_live(first));

        let second = liveness.issue();
        assert!(!liveness.is_live(first));
        assert!(liveness.is_live(second));

        liveness.invalidate();
        assert!(!liveness.is_live(second));
    }

    #[test]
    fn test_batches_apply_in_order() {
        let (liveness, overlay, mut thread) = spawn(ScanMode::Qr);
        let sink = thread.sink(liveness.issue());

        sink.on_batch(vec![qr("B")]);
        sink.on_batch(vec![qr("A"), qr("B")]);

        let snapshot = thread.snapshot().unwrap();
        assert_eq!(snapshot.codes, vec!["B", "A"]);
        assert_eq!(snapshot.stats.batches_applied, 2);
        assert_eq!(snapshot.stats.duplicates, 1);
        assert_eq!(overlay.current().sequence, 2);

        thread.shutdown();
    }

    #[test]
    fn test_stale_batch_dropped() {
        let (liveness, _overlay, mut thread) = spawn(ScanMode::Qr);
        let sink = thread.sink(liveness.issue());

        sink.on_batch(vec![qr("A")]);
        // Make sure the first batch has been dequeued before stopping
        thread.snapshot().unwrap();
        liveness.invalidate();
        sink.on_batch(vec![qr("B")]);

        let snapshot = thread.snapshot().unwrap();
        assert_eq!(snapshot.codes, vec!["A"]);
        assert_eq!(snapshot.stats.batches_discarded, 1);

        thread.shutdown();
    }

    #[test]
    fn test_sink_after_shutdown_is_silent() {
        let (liveness, _overlay, mut thread) = spawn(ScanMode::Qr);
        let sink = thread.sink(liveness.issue());
        thread.shutdown();

        sink.on_batch(vec![qr("A")]);
        assert!(thread.snapshot().is_none());
    }

    #[test]
    fn test_full_queue_drops_batches() {
        let liveness = Liveness::new();
        let (commands, receiver) = mpsc::sync_channel(1);
        let dropped = Arc::new(AtomicU64::new(0));
        let sink = SessionSink::new(liveness.issue(), commands, Arc::clone(&dropped));

        // Nobody drains the queue: the first batch fits, the rest are dropped
        sink.on_batch(vec![qr("A")]);
        sink.on_batch(vec![qr("B")]);
        sink.on_batch(vec![qr("C")]);

        assert_eq!(dropped.load(Ordering::Relaxed), 2);
        match receiver.try_recv() {
            Ok(SessionCommand::Batch { observations, .. }) => {
                assert_eq!(observations[0].payload.as_deref(), Some("A"));
            }
            _ => panic!("expected the first batch to be queued"),
        }
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_dropped_batches_reported_in_stats() {
        let (liveness, _overlay, mut thread) = spawn_with_capacity(ScanMode::Qr, 1);
        let sink = thread.sink(liveness.issue());

        for i in 0..500 {
            sink.on_batch(vec![qr(&format!("CODE-{}", i))]);
        }

        let snapshot = thread.snapshot().unwrap();
        let stats = snapshot.stats;
        assert_eq!(stats.batches_applied + stats.batches_dropped, 500);
        assert_eq!(snapshot.codes.len() as u64, stats.batches_applied);

        thread.shutdown();
    }
}
