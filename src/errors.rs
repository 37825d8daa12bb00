// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanner
//!
//! Only lifecycle misuse, frame source failures and configuration problems
//! are errors. Unusable observations, mode mismatches, duplicates and stale
//! batches are normal states handled silently by the pipeline.

use crate::backends::BackendError;
use crate::pipeline::PipelineState;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for pipeline controller operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Pipeline controller errors
    Pipeline(PipelineError),
    /// Frame source / detector errors
    Backend(BackendError),
    /// Configuration errors
    Config(ConfigError),
    /// Filesystem errors
    Io(String),
    /// Generic error with message
    Other(String),
}

/// Pipeline controller errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Operation is not valid in the controller's current state
    InvalidState {
        operation: &'static str,
        state: PipelineState,
    },
    /// The frame source refused to start
    Source(BackendError),
    /// The session thread could not be started or is no longer running
    SessionUnavailable(String),
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No configuration directory on this system
    NoConfigDir,
    /// Reading or writing the file failed
    Io(String),
    /// File contents are not valid configuration
    Parse(String),
    /// A value is out of range
    Invalid(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Pipeline(e) => write!(f, "Pipeline error: {}", e),
            AppError::Backend(e) => write!(f, "Frame source error: {}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Io(msg) => write!(f, "I/O error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::InvalidState { operation, state } => {
                write!(f, "Cannot {} while {}", operation, state)
            }
            PipelineError::Source(e) => write!(f, "Frame source failed to start: {}", e),
            PipelineError::SessionUnavailable(msg) => {
                write!(f, "Session thread unavailable: {}", msg)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoConfigDir => write!(f, "No configuration directory available"),
            ConfigError::Io(msg) => write!(f, "{}", msg),
            ConfigError::Parse(msg) => write!(f, "Invalid configuration file: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid value: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for PipelineError {}
impl std::error::Error for ConfigError {}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::Pipeline(err)
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Backend(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<BackendError> for PipelineError {
    fn from(err: BackendError) -> Self {
        PipelineError::Source(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Other(format!("JSON error: {}", err))
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_message() {
        let err = PipelineError::InvalidState {
            operation: "set mode",
            state: PipelineState::Stopped,
        };
        assert_eq!(err.to_string(), "Cannot set mode while stopped");
    }

    #[test]
    fn test_conversions() {
        let err: AppError = BackendError::NotFound("frames.jsonl".to_string()).into();
        assert!(matches!(err, AppError::Backend(_)));

        let err: PipelineError = BackendError::Other("boom".to_string()).into();
        assert!(matches!(err, PipelineError::Source(_)));

        let err: AppError = ConfigError::NoConfigDir.into();
        assert!(err.to_string().starts_with("Configuration error"));

        let err: AppError = BackendError::Detector("task cancelled".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Frame source error: Detector error: task cancelled"
        );
    }

    #[test]
    fn test_conversions_from_std() {
        let err: AppError = std::io::Error::other("disk full").into();
        assert!(matches!(err, AppError::Io(_)));

        let err: AppError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(err.to_string().starts_with("JSON error"));

        let err: AppError = "plain message".into();
        assert_eq!(err.to_string(), "plain message");

        let err: AppError = format!("code {}", 7).into();
        assert!(matches!(err, AppError::Other(ref msg) if msg == "code 7"));
    }
}
