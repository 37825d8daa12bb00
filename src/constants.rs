// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Application name, used for the configuration directory
pub const APP_NAME: &str = "scanner";

/// Configuration file name inside the configuration directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Default drawing surface (portrait phone-sized preview)
pub const DEFAULT_SURFACE_WIDTH: f64 = 1080.0;
pub const DEFAULT_SURFACE_HEIGHT: f64 = 1920.0;

/// Default delay between analyzed frames (about 30 fps)
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 33;

/// Frames are downscaled to this size before QR detection.
/// QR codes are typically large enough to be detected at this resolution.
pub const DEFAULT_DETECTOR_MAX_DIMENSION: u32 = 640;

/// Batches that may wait for the session thread before new ones are dropped
pub const DEFAULT_SESSION_QUEUE_CAPACITY: usize = 8;

/// How often the CLI checks for Ctrl+C, end of input or the deadline
pub const CLI_POLL_INTERVAL: Duration = Duration::from_millis(50);
