// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection on still frames
//!
//! Wraps the `rqrr` decoder. Frames are converted to grayscale and
//! downscaled for speed, then every QR grid found becomes one
//! [`RawObservation`] in the pipeline's normalized space (origin at the
//! bottom-left). Grids that are found but cannot be decoded are still
//! reported, without a payload, so they can be outlined on screen.

use super::types::{BackendError, BackendResult};
use crate::constants::DEFAULT_DETECTOR_MAX_DIMENSION;
use crate::pipeline::{NormalizedPoint, NormalizedRect, Quad, RawObservation, Symbology};
use image::DynamicImage;
use image::imageops::FilterType;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// QR code detector
///
/// Optimized for real-time processing with frame downscaling.
#[derive(Debug, Clone)]
pub struct QrDetector {
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDetector {
    /// Create a new QR detector with default settings
    pub fn new() -> Self {
        Self {
            max_dimension: DEFAULT_DETECTOR_MAX_DIMENSION,
        }
    }

    /// Create a QR detector with custom max dimension
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Detect QR codes in a frame
    ///
    /// Runs the CPU-heavy work on tokio's blocking pool.
    pub async fn detect(&self, frame: Arc<DynamicImage>) -> BackendResult<Vec<RawObservation>> {
        let detector = self.clone();

        tokio::task::spawn_blocking(move || detector.detect_sync(&frame))
            .await
            .map_err(|e| {
                warn!(error = %e, "QR detection task failed");
                BackendError::Detector(e.to_string())
            })
    }

    /// Synchronous detection, for callers already on a worker thread
    pub fn detect_sync(&self, frame: &DynamicImage) -> Vec<RawObservation> {
        let start = std::time::Instant::now();

        let (width, height) = (frame.width(), frame.height());
        if width == 0 || height == 0 {
            return Vec::new();
        }

        let gray = if width > self.max_dimension || height > self.max_dimension {
            frame
                .resize(self.max_dimension, self.max_dimension, FilterType::Triangle)
                .to_luma8()
        } else {
            frame.to_luma8()
        };

        let (proc_width, proc_height) = gray.dimensions();
        trace!(proc_width, proc_height, "Prepared grayscale frame");

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            proc_width as usize,
            proc_height as usize,
            |x, y| gray.get_pixel(x as u32, y as u32).0[0],
        );
        let grids = prepared.detect_grids();

        let to_normalized = |p: &rqrr::Point| {
            NormalizedPoint::new(
                f64::from(p.x) / f64::from(proc_width),
                1.0 - f64::from(p.y) / f64::from(proc_height),
            )
        };

        let observations: Vec<RawObservation> = grids
            .iter()
            .map(|grid| {
                // rqrr reports corners clockwise from the symbol's top-left
                let corners = Quad {
                    top_left: to_normalized(&grid.bounds[0]),
                    top_right: to_normalized(&grid.bounds[1]),
                    bottom_right: to_normalized(&grid.bounds[2]),
                    bottom_left: to_normalized(&grid.bounds[3]),
                };

                let payload = match grid.decode() {
                    Ok((_meta, content)) => Some(content),
                    Err(e) => {
                        debug!(error = %e, "Failed to decode QR code");
                        None
                    }
                };

                RawObservation {
                    bounding_box: Some(NormalizedRect::enclosing(&corners)),
                    corners: Some(corners),
                    payload,
                    symbology: Symbology::Qr,
                }
            })
            .collect();

        if !observations.is_empty() {
            debug!(
                count = observations.len(),
                total_ms = start.elapsed().as_millis(),
                "QR detection found codes"
            );
        }

        observations
    }
}

/// Load an image file for detection
///
/// Supports common image formats: PNG, JPEG, GIF, BMP, WebP
pub fn load_image(path: &Path) -> BackendResult<DynamicImage> {
    debug!(path = %path.display(), "Loading image file");

    if !path.exists() {
        return Err(BackendError::NotFound(path.display().to_string()));
    }

    image::open(path).map_err(|e| {
        BackendError::InvalidData(format!("Failed to load image '{}': {}", path.display(), e))
    })
}
