// SPDX-License-Identifier: GPL-3.0-only

//! Replay of recorded detection batches
//!
//! Recordings are JSON Lines: one JSON array of observations per analyzed
//! frame. A blank line is a frame in which nothing was detected.
//!
//! ```text
//! [{"symbology":"qr","payload":"ABC","corners":{...}}]
//!
//! [{"symbology":"ean13","payload":"4006381333931","bounding_box":{...}}]
//! ```

use super::frame_loop::{CaptureLoopController, LoopAction};
use super::types::{BackendError, BackendResult};
use super::{BatchSink, FrameSource};
use crate::pipeline::RawObservation;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Parse a JSON Lines recording into batches
pub fn parse_batches(text: &str) -> BackendResult<Vec<Vec<RawObservation>>> {
    text.lines()
        .enumerate()
        .map(|(index, line)| {
            let line = line.trim();
            if line.is_empty() {
                return Ok(Vec::new());
            }
            serde_json::from_str(line).map_err(|e| {
                BackendError::InvalidData(format!("line {}: {}", index + 1, e))
            })
        })
        .collect()
}

/// Frame source that plays back recorded batches at a fixed frame interval
pub struct ReplaySource {
    batches: Arc<Vec<Vec<RawObservation>>>,
    interval: Duration,
    looping: bool,
    capture_loop: Option<CaptureLoopController>,
}

impl ReplaySource {
    /// Replay in-memory batches
    pub fn from_batches(batches: Vec<Vec<RawObservation>>, interval: Duration) -> Self {
        Self {
            batches: Arc::new(batches),
            interval,
            looping: false,
            capture_loop: None,
        }
    }

    /// Load a JSON Lines recording
    pub fn from_file(path: &Path, interval: Duration) -> BackendResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BackendError::NotFound(path.display().to_string()),
            _ => BackendError::IoError(format!("{}: {}", path.display(), e)),
        })?;

        let batches = parse_batches(&text)?;
        info!(path = %path.display(), frames = batches.len(), "Loaded replay recording");

        Ok(Self::from_batches(batches, interval))
    }

    /// Restart from the first batch after the last one
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Number of recorded frames
    pub fn frame_count(&self) -> usize {
        self.batches.len()
    }
}

impl FrameSource for ReplaySource {
    fn name(&self) -> &str {
        "replay"
    }

    fn start(&mut self, sink: Arc<dyn BatchSink>) -> BackendResult<()> {
        if self.is_running() {
            return Err(BackendError::AlreadyRunning);
        }

        let batches = Arc::clone(&self.batches);
        let interval = self.interval;
        let looping = self.looping && !batches.is_empty();
        let mut position = 0usize;

        let controller = CaptureLoopController::start("replay-source", move |stop| {
            let Some(batch) = batches.get(position) else {
                debug!(frames = position, "Replay finished");
                return LoopAction::Stop;
            };

            sink.on_batch(batch.clone());
            position += 1;
            if looping && position == batches.len() {
                position = 0;
            }

            if stop.sleep(interval) {
                LoopAction::Continue
            } else {
                LoopAction::Stop
            }
        })?;

        self.capture_loop = Some(controller);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut controller) = self.capture_loop.take() {
            controller.stop();
        }
    }

    fn is_running(&self) -> bool {
        self.capture_loop
            .as_ref()
            .map(|c| c.is_running())
            .unwrap_or(false)
    }
}
