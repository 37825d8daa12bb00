// SPDX-License-Identifier: GPL-3.0-only

//! Scanner - live barcode and QR code scanning pipeline
//!
//! This library analyzes a stream of detection batches, keeps a
//! deduplicated list of scanned payloads per session and builds a screen
//! overlay for every frame.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`pipeline`]: Classification, aggregation, overlay and the pipeline controller
//! - [`backends`]: Frame source abstraction, replay and image sources, QR detector
//! - [`config`]: User configuration handling
//! - [`errors`]: Error types
//!
//! # Example
//!
//! ```ignore
//! let mut controller = PipelineController::new(ScanMode::Qr, config.surface_size());
//! controller.start(Box::new(ReplaySource::from_file(path, config.frame_interval())?))?;
//! // ...
//! let codes = controller.finish()?;
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipeline;

// Re-export commonly used types
pub use config::Config;
pub use errors::{AppError, AppResult, PipelineError};
pub use pipeline::{PipelineController, PipelineState, RawObservation, ScanMode, SessionOutcome};
