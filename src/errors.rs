// SPDX-License-Identifier: MPL-2.0

//! Error types for the camera engine

use std::fmt;
use std::path::PathBuf;

use crate::backends::camera::BackendError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Top-level error used by the command-line front-end
#[derive(Debug)]
pub enum AppError {
    /// Capture library errors
    Backend(BackendError),
    /// Settings persistence errors
    Config(ConfigError),
    /// No camera could be selected
    NoCameraFound,
    /// The device could not be opened at the requested format
    OpenFailed { device: i32 },
    /// No frame arrived before the session stopped running
    NoFrame,
    /// Unknown control mode name given on the command line
    UnknownMode(String),
    /// Snapshot encoding or writing failed
    Snapshot(String),
}

/// Errors raised while reading or writing the persisted camera settings
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// No per-user configuration directory on this system
    NoConfigDir,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Backend(e) => write!(f, "Capture library error: {}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::NoCameraFound => write!(f, "No camera devices found"),
            AppError::OpenFailed { device } => write!(f, "Failed to open camera {}", device),
            AppError::NoFrame => write!(f, "Camera stopped before delivering a frame"),
            AppError::UnknownMode(name) => write!(f, "Unknown camera setting '{}'", name),
            AppError::Snapshot(msg) => write!(f, "Snapshot failed: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "Failed to access '{}': {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "Failed to parse '{}': {}", path.display(), source)
            }
            ConfigError::NoConfigDir => write!(f, "No configuration directory available"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Backend(e) => Some(e),
            AppError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::NoConfigDir => None,
        }
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

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Snapshot(err.to_string())
    }
}
