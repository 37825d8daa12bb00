// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for frame sources

/// Result type for frame source operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for frame source operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Input file or directory not found
    NotFound(String),
    /// Input exists but could not be understood
    InvalidData(String),
    /// Source was started twice
    AlreadyRunning,
    /// Detector failed on a frame
    Detector(String),
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotFound(msg) => write!(f, "Not found: {}", msg),
            BackendError::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
            BackendError::AlreadyRunning => write!(f, "Frame source already running"),
            BackendError::Detector(msg) => write!(f, "Detector error: {}", msg),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            BackendError::NotFound(err.to_string())
        } else {
            BackendError::IoError(err.to_string())
        }
    }
}
