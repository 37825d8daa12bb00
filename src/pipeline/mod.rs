// SPDX-License-Identifier: GPL-3.0-only

//! Scanning pipeline
//!
//! Batches of observations flow from a frame source through the
//! classifier into two paths: the session aggregator, which keeps the
//! deduplicated list of accepted payloads, and the overlay builder, which
//! turns the batch into screen shapes. Both live on a single session
//! thread driven by the [`PipelineController`].
//!
//! # Coordinate System
//!
//! Observations use normalized coordinates (0.0 to 1.0) with the origin at
//! the bottom-left. Overlays use screen pixels with the origin at the
//! top-left. See [`geometry`].

pub mod aggregator;
pub mod classifier;
pub mod controller;
pub mod geometry;
pub mod overlay;
pub mod session;
pub mod types;

pub use aggregator::{AcceptOutcome, SessionAggregator};
pub use classifier::{Classification, Geometry, classify};
pub use controller::{PipelineController, PipelineState, SessionOutcomeReceiver};
pub use overlay::{OverlayBuilder, OverlayFrame, OverlayHandle};
pub use session::{SessionSink, SessionStats};
pub use types::{
    NormalizedPoint, NormalizedRect, Quad, RawObservation, ScanMode, ScreenPoint, ScreenRect,
    ScreenShape, SessionOutcome, SurfaceSize, SymbolKind, Symbology, UnknownModeError,
};
