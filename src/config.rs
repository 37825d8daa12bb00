// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON in `<config dir>/scanner/config.json`. A missing file
//! means defaults; a file that exists but cannot be parsed is an error so
//! a typo never silently resets the user's settings.

use crate::constants::{
    APP_NAME, CONFIG_FILE_NAME, DEFAULT_DETECTOR_MAX_DIMENSION, DEFAULT_FRAME_INTERVAL_MS,
    DEFAULT_SESSION_QUEUE_CAPACITY, DEFAULT_SURFACE_HEIGHT, DEFAULT_SURFACE_WIDTH,
};
use crate::errors::ConfigError;
use crate::pipeline::{ScanMode, SurfaceSize};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mode a new session starts in
    pub default_mode: ScanMode,
    /// Overlay surface width in pixels
    pub surface_width: f64,
    /// Overlay surface height in pixels
    pub surface_height: f64,
    /// Delay between frames delivered by file-based sources
    pub frame_interval_ms: u64,
    /// Frames are downscaled to this size before detection
    pub detector_max_dimension: u32,
    /// Restart file-based sources from the beginning when they run out
    pub loop_replay: bool,
    /// Batches that may wait for the session thread before new ones are dropped
    pub session_queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_mode: ScanMode::default(),
            surface_width: DEFAULT_SURFACE_WIDTH,
            surface_height: DEFAULT_SURFACE_HEIGHT,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            detector_max_dimension: DEFAULT_DETECTOR_MAX_DIMENSION,
            loop_replay: false,
            session_queue_capacity: DEFAULT_SESSION_QUEUE_CAPACITY,
        }
    }
}

impl Config {
    /// Default location of the configuration file
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_NAME).join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load from the default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path`, falling back to defaults if the file does not exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No configuration file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Io(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let config: Self =
            serde_json::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Write to `path`, creating parent directories as needed
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Io(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let text =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, text)
            .map_err(|e| ConfigError::Io(format!("Failed to write {}: {}", path.display(), e)))?;

        debug!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.surface_width > 0.0 && self.surface_width.is_finite())
            || !(self.surface_height > 0.0 && self.surface_height.is_finite())
        {
            return Err(ConfigError::Invalid(format!(
                "surface size {}x{} must be positive",
                self.surface_width, self.surface_height
            )));
        }
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "frame_interval_ms must be at least 1".to_string(),
            ));
        }
        if self.detector_max_dimension == 0 {
            return Err(ConfigError::Invalid(
                "detector_max_dimension must be at least 1".to_string(),
            ));
        }
        if self.session_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "session_queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn surface_size(&self) -> SurfaceSize {
        SurfaceSize::new(self.surface_width, self.surface_height)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}
