// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera backends

use crate::constants::FLAGS_AUTO;

/// A capture device as reported by one enumeration call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// 0-based index assigned by the capture library
    pub index: usize,
    /// Human-readable device name
    pub name: String,
}

impl std::fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.index, self.name)
    }
}

/// Lifecycle of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No device set up
    #[default]
    Closed,
    /// Device set up, frames not being delivered
    Open,
    /// Frames are delivered by `get_frame`
    Running,
    /// The device stopped delivering frames; terminal
    Disconnected,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Closed => write!(f, "closed"),
            SessionState::Open => write!(f, "open"),
            SessionState::Running => write!(f, "running"),
            SessionState::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Device property addressed by the capture library's settings calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoProperty {
    Brightness,
    Gain,
    Exposure,
    Sharpness,
    Focus,
    Gamma,
    WhiteBalance,
    BacklightCompensation,
    Hue,
}

impl VideoProperty {
    pub const ALL: [VideoProperty; 9] = [
        VideoProperty::Brightness,
        VideoProperty::Gain,
        VideoProperty::Exposure,
        VideoProperty::Sharpness,
        VideoProperty::Focus,
        VideoProperty::Gamma,
        VideoProperty::WhiteBalance,
        VideoProperty::BacklightCompensation,
        VideoProperty::Hue,
    ];
}

/// Compressed stream subtype a device can be asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSubtype {
    Mjpeg,
}

/// Live range and value of one device property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PropertyRange {
    pub min: i32,
    pub max: i32,
    pub step: i32,
    pub value: i32,
    /// `FLAGS_AUTO` or `FLAGS_MANUAL`
    pub flags: i32,
    pub default: i32,
}

impl PropertyRange {
    pub fn is_auto(&self) -> bool {
        self.flags == FLAGS_AUTO
    }
}

/// Result type for capture library operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for capture library operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// No device at this index
    DeviceNotFound(usize),
    /// The device refused the requested setup
    InitializationFailed(String),
    /// The device does not expose this property or mode
    NotSupported(String),
    /// General I/O error
    IoError(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::DeviceNotFound(index) => write!(f, "Device {} not found", index),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::NotSupported(msg) => write!(f, "Not supported: {}", msg),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::IoError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FLAGS_MANUAL;

    #[test]
    fn test_device_descriptor_display() {
        let device = DeviceDescriptor {
            index: 1,
            name: "HD Webcam".to_string(),
        };
        assert_eq!(device.to_string(), "1: HD Webcam");
    }

    #[test]
    fn test_property_range_auto_flag() {
        let mut range = PropertyRange {
            flags: FLAGS_AUTO,
            ..Default::default()
        };
        assert!(range.is_auto());
        range.flags = FLAGS_MANUAL;
        assert!(!range.is_auto());
    }

    #[test]
    fn test_backend_error_display() {
        assert_eq!(
            BackendError::DeviceNotFound(4).to_string(),
            "Device 4 not found"
        );
        assert!(
            BackendError::NotSupported("gamma".to_string())
                .to_string()
                .contains("gamma")
        );
    }
}
