// SPDX-License-Identifier: GPL-3.0-only

//! Frame source that runs the QR detector over still images
//!
//! Each image is treated as one captured frame: it is loaded, analyzed and
//! delivered as one batch, then the producer waits for the frame interval.
//! Unreadable images are skipped with a warning so one bad file does not end
//! the session.

use super::detector::{QrDetector, load_image};
use super::frame_loop::{CaptureLoopController, LoopAction};
use super::types::{BackendError, BackendResult};
use super::{BatchSink, FrameSource};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// File extensions picked up when scanning a directory
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "webp"];

/// Image files directly inside `dir`, sorted by file name
pub fn list_images(dir: &Path) -> BackendResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => BackendError::NotFound(dir.display().to_string()),
        _ => BackendError::IoError(format!("{}: {}", dir.display(), e)),
    })?;

    let mut images: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .map(|ext| {
                    let ext = ext.to_string_lossy();
                    IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e))
                })
                .unwrap_or(false)
        })
        .collect();

    images.sort();
    Ok(images)
}

/// Plays a sequence of image files through the QR detector
pub struct ImageSequenceSource {
    paths: Arc<Vec<PathBuf>>,
    detector: QrDetector,
    interval: Duration,
    looping: bool,
    capture_loop: Option<CaptureLoopController>,
}

impl ImageSequenceSource {
    pub fn new(paths: Vec<PathBuf>, detector: QrDetector, interval: Duration) -> Self {
        Self {
            paths: Arc::new(paths),
            detector,
            interval,
            looping: false,
            capture_loop: None,
        }
    }

    /// Source for a single image file or every image in a directory
    pub fn from_path(path: &Path, detector: QrDetector, interval: Duration) -> BackendResult<Self> {
        let paths = if path.is_dir() {
            list_images(path)?
        } else if path.exists() {
            vec![path.to_path_buf()]
        } else {
            return Err(BackendError::NotFound(path.display().to_string()));
        };

        if paths.is_empty() {
            return Err(BackendError::NotFound(format!(
                "no images in {}",
                path.display()
            )));
        }

        info!(path = %path.display(), frames = paths.len(), "Prepared image sequence");
        Ok(Self::new(paths, detector, interval))
    }

    /// Restart from the first image after the last one
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn frame_count(&self) -> usize {
        self.paths.len()
    }
}

impl FrameSource for ImageSequenceSource {
    fn name(&self) -> &str {
        "images"
    }

    fn start(&mut self, sink: Arc<dyn BatchSink>) -> BackendResult<()> {
        if self.is_running() {
            return Err(BackendError::AlreadyRunning);
        }

        let paths = Arc::clone(&self.paths);
        let detector = self.detector.clone();
        let interval = self.interval;
        let looping = self.looping && !paths.is_empty();
        let mut position = 0usize;

        let controller = CaptureLoopController::start("image-source", move |stop| {
            let Some(path) = paths.get(position) else {
                debug!(frames = position, "Image sequence finished");
                return LoopAction::Stop;
            };

            match load_image(path) {
                Ok(frame) => sink.on_batch(detector.detect_sync(&frame)),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable image"),
            }

            position += 1;
            if looping && position == paths.len() {
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
