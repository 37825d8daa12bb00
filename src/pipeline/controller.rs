// SPDX-License-Identifier: GPL-3.0-only

//! Pipeline controller
//!
//! Owns one scanning session: the lifecycle of the frame source, the
//! session thread, the active mode and the completion signal returned to
//! whoever started the session.
//!
//! ```text
//!  Idle ──start()──▶ Running ──begin_stop()──▶ Stopping ──stop()──▶ Stopped
//!                       │                                   ▲
//!                       └──────────── stop() ───────────────┘
//! ```

use super::overlay::{OverlayBuilder, OverlayFrame, OverlayHandle};
use super::session::{Liveness, SessionCommand, SessionSink, SessionStats, SessionThread};
use super::types::{ScanMode, SessionOutcome, SurfaceSize};
use crate::backends::{BatchSink, FrameSource};
use crate::constants::DEFAULT_SESSION_QUEUE_CAPACITY;
use crate::errors::{PipelineError, PipelineResult};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lifecycle state of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    /// Constructed, no frame source attached
    Idle,
    /// Frame source attached, batches being processed
    Running,
    /// Source detached; batches still in flight are being discarded
    Stopping,
    /// Terminal; all resources released
    Stopped,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PipelineState::Idle => "idle",
            PipelineState::Running => "running",
            PipelineState::Stopping => "stopping",
            PipelineState::Stopped => "stopped",
        })
    }
}

/// Receives the outcome of a session
///
/// Resolves once the session is finished or cancelled. A controller that is
/// dropped without either counts as cancelled.
#[derive(Debug, Clone)]
pub struct SessionOutcomeReceiver {
    rx: watch::Receiver<Option<SessionOutcome>>,
}

impl SessionOutcomeReceiver {
    /// Wait for the session to end
    pub async fn recv(&mut self) -> SessionOutcome {
        if let Ok(outcome) = self.rx.wait_for(Option::is_some).await {
            return outcome.clone().unwrap_or(SessionOutcome::Cancelled);
        }
        // Controller gone; it may still have published before dropping
        self.try_get().unwrap_or(SessionOutcome::Cancelled)
    }

    /// Outcome, if the session has already ended
    pub fn try_get(&self) -> Option<SessionOutcome> {
        self.rx.borrow().clone()
    }
}

/// Orchestrates one scanning session
pub struct PipelineController {
    session_id: Uuid,
    state: PipelineState,
    mode: ScanMode,
    surface: SurfaceSize,
    queue_capacity: usize,
    liveness: Arc<Liveness>,
    overlay: OverlayHandle,
    session: Option<SessionThread>,
    source: Option<Box<dyn FrameSource>>,
    sink: Option<Arc<SessionSink>>,
    final_stats: SessionStats,
    outcome: watch::Sender<Option<SessionOutcome>>,
}

impl PipelineController {
    /// Create an idle controller
    pub fn new(mode: ScanMode, surface: SurfaceSize) -> Self {
        let (outcome, _) = watch::channel(None);

        Self {
            session_id: Uuid::new_v4(),
            state: PipelineState::Idle,
            mode,
            surface,
            queue_capacity: DEFAULT_SESSION_QUEUE_CAPACITY,
            liveness: Arc::new(Liveness::new()),
            overlay: OverlayHandle::new(),
            session: None,
            source: None,
            sink: None,
            final_stats: SessionStats::default(),
            outcome,
        }
    }

    /// Number of batches that may wait for the session thread
    ///
    /// Batches arriving while the queue is full are dropped and counted in
    /// [`SessionStats::batches_dropped`]. Takes effect at the next `start()`.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Mode applied to batches delivered from now on
    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    /// Most recently built overlay; readable from any thread at any time
    pub fn current_overlay(&self) -> Arc<OverlayFrame> {
        self.overlay.current()
    }

    /// Shared handle to the published overlay, for a renderer on another thread
    pub fn overlay_handle(&self) -> OverlayHandle {
        self.overlay.clone()
    }

    /// Subscribe to the session outcome
    pub fn outcome(&self) -> SessionOutcomeReceiver {
        SessionOutcomeReceiver {
            rx: self.outcome.subscribe(),
        }
    }

    /// Attach `source` and begin processing its batches
    ///
    /// If the source fails to start, the session thread is torn down, the
    /// source's error is returned and the controller stays idle.
    pub fn start(&mut self, mut source: Box<dyn FrameSource>) -> PipelineResult<()> {
        self.expect_state("start", &[PipelineState::Idle])?;

        let token = self.liveness.issue();
        let mut session = match SessionThread::spawn(
            Arc::clone(&self.liveness),
            self.mode,
            OverlayBuilder::new(self.surface),
            self.overlay.clone(),
            self.queue_capacity,
        ) {
            Ok(session) => session,
            Err(e) => {
                self.liveness.invalidate();
                return Err(PipelineError::SessionUnavailable(e.to_string()));
            }
        };

        let sink = Arc::new(session.sink(token));
        let source_sink: Arc<dyn BatchSink> = sink.clone();
        if let Err(e) = source.start(source_sink) {
            warn!(source = source.name(), error = %e, "Frame source failed to start");
            self.liveness.invalidate();
            session.shutdown();
            return Err(e.into());
        }

        info!(
            session = %self.session_id,
            source = source.name(),
            mode = %self.mode,
            "Scanning session started"
        );

        self.session = Some(session);
        self.source = Some(source);
        self.sink = Some(sink);
        self.state = PipelineState::Running;
        Ok(())
    }

    /// Callback path for hosts that deliver batches themselves
    ///
    /// The returned sink is bound to the running session; once the session
    /// stops, batches pushed through it are discarded.
    pub fn sink(&self) -> PipelineResult<Arc<dyn BatchSink>> {
        self.expect_state("obtain a sink", &[PipelineState::Running])?;
        let sink: Arc<dyn BatchSink> = self.sink.clone().ok_or_else(|| {
            PipelineError::SessionUnavailable("no session sink".to_string())
        })?;
        Ok(sink)
    }

    /// Switch the active mode for subsequent batches
    pub fn set_mode(&mut self, mode: ScanMode) -> PipelineResult<()> {
        self.expect_state("set mode", &[PipelineState::Running])?;

        if !self.session_thread()?.send(SessionCommand::SetMode(mode)) {
            return Err(PipelineError::SessionUnavailable(
                "session thread exited".to_string(),
            ));
        }
        self.mode = mode;
        Ok(())
    }

    /// Accepted payloads of the active mode, in first-seen order
    ///
    /// Taken on the session thread after every batch queued before this
    /// call. Does not stop the pipeline.
    pub fn finalize(&mut self) -> PipelineResult<Vec<String>> {
        self.expect_state(
            "finalize",
            &[PipelineState::Running, PipelineState::Stopping],
        )?;

        let snapshot = self.session_thread()?.snapshot().ok_or_else(|| {
            PipelineError::SessionUnavailable("session thread exited".to_string())
        })?;
        self.final_stats = snapshot.stats;
        Ok(snapshot.codes)
    }

    /// Detach the frame source and invalidate the session token
    ///
    /// Any batch already queued, or pushed later through an old sink, is
    /// discarded by the session thread. `finalize()` stays available.
    pub fn begin_stop(&mut self) -> PipelineResult<()> {
        self.expect_state("stop", &[PipelineState::Running])?;

        // Token first: the source may already have queued a batch
        self.liveness.invalidate();
        self.state = PipelineState::Stopping;
        self.sink = None;

        if let Some(mut source) = self.source.take() {
            debug!(source = source.name(), "Detaching frame source");
            source.stop();
        }

        info!(session = %self.session_id, "Scanning session stopping");
        Ok(())
    }

    /// Stop the session and release the session thread
    pub fn stop(&mut self) -> PipelineResult<()> {
        self.expect_state("stop", &[PipelineState::Running, PipelineState::Stopping])?;

        if self.state == PipelineState::Running {
            self.begin_stop()?;
        }

        if let Some(mut session) = self.session.take() {
            if let Some(snapshot) = session.snapshot() {
                self.final_stats = snapshot.stats;
            }
            session.shutdown();
        }

        self.state = PipelineState::Stopped;
        info!(
            session = %self.session_id,
            applied = self.final_stats.batches_applied,
            discarded = self.final_stats.batches_discarded,
            dropped = self.final_stats.batches_dropped,
            "Scanning session stopped"
        );
        Ok(())
    }

    /// End the session with a result
    ///
    /// Takes the final list, stops the pipeline and signals
    /// [`SessionOutcome::Completed`] to outcome subscribers.
    pub fn finish(&mut self) -> PipelineResult<Vec<String>> {
        let codes = self.finalize()?;
        self.stop()?;

        info!(session = %self.session_id, count = codes.len(), "Scanning session completed");
        self.outcome
            .send_replace(Some(SessionOutcome::Completed(codes.clone())));
        Ok(codes)
    }

    /// End the session without a result
    ///
    /// Signals [`SessionOutcome::Cancelled`] to outcome subscribers.
    pub fn cancel(&mut self) -> PipelineResult<()> {
        self.expect_state(
            "cancel",
            &[
                PipelineState::Idle,
                PipelineState::Running,
                PipelineState::Stopping,
            ],
        )?;

        if self.state == PipelineState::Idle {
            self.state = PipelineState::Stopped;
        } else {
            self.stop()?;
        }

        info!(session = %self.session_id, "Scanning session cancelled");
        self.outcome.send_replace(Some(SessionOutcome::Cancelled));
        Ok(())
    }

    /// Whether the attached frame source is still producing
    pub fn source_running(&self) -> bool {
        self.source
            .as_ref()
            .map(|source| source.is_running())
            .unwrap_or(false)
    }

    /// Session counters; live while running, final once stopped
    pub fn stats(&self) -> SessionStats {
        self.session
            .as_ref()
            .and_then(|session| session.snapshot())
            .map(|snapshot| snapshot.stats)
            .unwrap_or(self.final_stats)
    }

    fn session_thread(&self) -> PipelineResult<&SessionThread> {
        self.session.as_ref().ok_or_else(|| {
            PipelineError::SessionUnavailable("session thread not running".to_string())
        })
    }

    fn expect_state(
        &self,
        operation: &'static str,
        allowed: &[PipelineState],
    ) -> PipelineResult<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(PipelineError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }
}

impl Drop for PipelineController {
    fn drop(&mut self) {
        if matches!(
            self.state,
            PipelineState::Running | PipelineState::Stopping
        ) {
            debug!(session = %self.session_id, "Controller dropped while live, stopping");
            let _ = self.stop();
        }
    }
}
