// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for scanning sessions
//!
//! This module provides command-line functionality for:
//! - Running a scanning session over recorded batches or images
//! - Running the QR detector on a single image
//! - Showing the effective configuration

use chrono::Local;
use scanner::backends::{FrameSource, ImageSequenceSource, QrDetector, ReplaySource};
use scanner::backends::detector::load_image;
use scanner::constants::CLI_POLL_INTERVAL;
use scanner::errors::{AppResult, ConfigError};
use scanner::{Config, PipelineController, ScanMode, SessionOutcome};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::info;
use uuid::Uuid;

/// Options of the `scan` command
pub struct ScanOptions {
    pub mode: Option<ScanMode>,
    pub replay: Option<PathBuf>,
    pub images: Option<PathBuf>,
    pub duration: Option<u64>,
    pub looping: bool,
    pub overlay_svg: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

/// Result file written by `scan --output`
#[derive(Serialize)]
struct ScanExport<'a> {
    session_id: Uuid,
    mode: ScanMode,
    scanned_at: String,
    codes: &'a [String],
}

/// Load the configuration from `path`, or from the default location
///
/// Systems without a configuration directory run with defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::load_from(path),
        None => match Config::load() {
            Err(ConfigError::NoConfigDir) => Ok(Config::default()),
            other => other,
        },
    }
}

/// Run one scanning session
pub fn scan(config: &Config, options: ScanOptions) -> AppResult<()> {
    let mode = options.mode.unwrap_or(config.default_mode);
    let looping = options.looping || config.loop_replay;

    let source: Box<dyn FrameSource> = match (&options.replay, &options.images) {
        (Some(path), _) => Box::new(
            ReplaySource::from_file(path, config.frame_interval())?.with_looping(looping),
        ),
        (None, Some(path)) => Box::new(
            ImageSequenceSource::from_path(
                path,
                QrDetector::with_max_dimension(config.detector_max_dimension),
                config.frame_interval(),
            )?
            .with_looping(looping),
        ),
        (None, None) => return Err("Either --replay or --images is required".into()),
    };

    let mut controller = PipelineController::new(mode, config.surface_size())
        .with_queue_capacity(config.session_queue_capacity);
    let mut outcome = controller.outcome();
    controller.start(source)?;

    println!("Scanning for {} codes... (press Ctrl+C to cancel)", mode);

    // Set up Ctrl+C handler
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let cancel_flag_clone = cancel_flag.clone();
    ctrlc::set_handler(move || {
        cancel_flag_clone.store(true, Ordering::SeqCst);
    })
    .map_err(|e| format!("Failed to install Ctrl+C handler: {}", e))?;

    let deadline = options
        .duration
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    let mut reported = 0usize;

    // Wait for end of input, the deadline or Ctrl+C, printing codes as they arrive
    let cancelled = loop {
        if cancel_flag.load(Ordering::SeqCst) {
            break true;
        }

        let codes = controller.finalize()?;
        for (index, code) in codes.iter().enumerate().skip(reported) {
            println!("  [{}] {}", index + 1, code);
        }
        reported = codes.len();

        if !controller.source_running() {
            info!("Input exhausted");
            break false;
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            info!("Scan duration elapsed");
            break false;
        }

        std::thread::sleep(CLI_POLL_INTERVAL);
    };

    if let Some(path) = &options.overlay_svg {
        let overlay = controller.current_overlay();
        std::fs::write(path, overlay.to_svg(controller.surface()))?;
        println!(
            "Overlay saved: {} ({} shapes)",
            path.display(),
            overlay.shapes.len()
        );
    }

    if cancelled {
        controller.cancel()?;
    } else {
        controller.finish()?;
    }

    // Outcome is delivered the same way a host application would receive it
    let rt = tokio::runtime::Runtime::new()?;
    match rt.block_on(outcome.recv()) {
        SessionOutcome::Completed(codes) => {
            println!();
            println!("Scanned {} {} code(s)", codes.len(), mode);
            for code in &codes {
                println!("{}", code);
            }

            if let Some(path) = &options.output {
                let export = ScanExport {
                    session_id: controller.session_id(),
                    mode,
                    scanned_at: Local::now().to_rfc3339(),
                    codes: &codes,
                };
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                std::fs::write(path, serde_json::to_string_pretty(&export)?)?;
                println!("Result saved: {}", path.display());
            }
        }
        SessionOutcome::Cancelled => {
            println!();
            println!("Scan cancelled, no result");
        }
    }

    Ok(())
}

/// Run the QR detector on a single image
pub fn detect(config: &Config, path: &Path) -> AppResult<()> {
    let frame = Arc::new(load_image(path)?);
    let detector = QrDetector::with_max_dimension(config.detector_max_dimension);

    let rt = tokio::runtime::Runtime::new()?;
    let observations = rt.block_on(detector.detect(frame))?;

    info!(count = observations.len(), "Detection complete");
    println!("{}", serde_json::to_string_pretty(&observations)?);
    Ok(())
}

/// Print the effective configuration and where it comes from
pub fn show_config(config: &Config, path: Option<&Path>) -> AppResult<()> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::default_path()?,
    };

    let state = if path.exists() { "" } else { " (not present, defaults)" };
    println!("Config file: {}{}", path.display(), state);
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
