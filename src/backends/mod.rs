// SPDX-License-Identifier: GPL-3.0-only

//! Frame source abstraction
//!
//! A frame source owns its producer thread, analyzes frames and pushes one
//! batch of observations per frame into a [`BatchSink`]. The pipeline
//! controller attaches and detaches sources; everything else about the
//! source (devices, files, decoding) stays behind this trait.
//!
//! ```text
//! ┌──────────────────────┐   on_batch()   ┌─────────────────────┐
//! │ FrameSource          │ ─────────────▶ │ BatchSink           │
//! │ (producer thread)    │                │ (session channel)   │
//! └──────────────────────┘                └──────────┬──────────┘
//!   ReplaySource                                     │
//!   ImageSequenceSource                              ▼
//!                                           session thread
//! ```

pub mod detector;
pub mod frame_loop;
pub mod image_source;
pub mod replay;
pub mod types;

pub use detector::QrDetector;
pub use image_source::ImageSequenceSource;
pub use replay::ReplaySource;
pub use types::{BackendError, BackendResult};

use crate::pipeline::RawObservation;
use std::sync::Arc;

/// Receiver of per-frame detection batches
///
/// Called once per analyzed frame, from the source's own thread, with no
/// return value. Implementations must not block the producer.
pub trait BatchSink: Send + Sync {
    fn on_batch(&self, observations: Vec<RawObservation>);
}

/// A push-based producer of detection batches
pub trait FrameSource: Send {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Start producing batches into `sink`
    ///
    /// Failures of the underlying device or file are reported here and
    /// nowhere else.
    fn start(&mut self, sink: Arc<dyn BatchSink>) -> BackendResult<()>;

    /// Stop producing and release the producer thread
    ///
    /// Returns once no further `on_batch` call will be made.
    fn stop(&mut self);

    /// Whether the producer is still running
    fn is_running(&self) -> bool;
}
