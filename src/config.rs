// SPDX-License-Identifier: GPL-3.0-only

//! Persisted camera configuration
//!
//! The engine reads its [`CameraConfig`] through a [`SettingsStore`] when a
//! camera is selected and writes it back when the camera is closed. Where
//! and how the configuration lives is up to the store.

use crate::backends::camera::CameraSetting;
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Persisted value of one camera control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingValue {
    /// Let the device adjust the control
    Auto,
    /// Reset the control to its hardware default
    Default,
    /// Fixed manual value
    Value(i32),
}

/// Per-control values applied when the camera is opened
///
/// `None` leaves the device's current value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<SettingValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain: Option<SettingValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure: Option<SettingValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharpness: Option<SettingValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<SettingValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gamma: Option<SettingValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub white_balance: Option<SettingValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backlight: Option<SettingValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_hue: Option<SettingValue>,
}

impl ControlSettings {
    pub fn get(&self, setting: CameraSetting) -> Option<SettingValue> {
        match setting {
            CameraSetting::Brightness => self.brightness,
            CameraSetting::Gain => self.gain,
            CameraSetting::Exposure => self.exposure,
            CameraSetting::Sharpness => self.sharpness,
            CameraSetting::Focus => self.focus,
            CameraSetting::Gamma => self.gamma,
            CameraSetting::WhiteBalance => self.white_balance,
            CameraSetting::Backlight => self.backlight,
            CameraSetting::ColorHue => self.color_hue,
        }
    }

    pub fn set(&mut self, setting: CameraSetting, value: Option<SettingValue>) {
        let slot = match setting {
            CameraSetting::Brightness => &mut self.brightness,
            CameraSetting::Gain => &mut self.gain,
            CameraSetting::Exposure => &mut self.exposure,
            CameraSetting::Sharpness => &mut self.sharpness,
            CameraSetting::Focus => &mut self.focus,
            CameraSetting::Gamma => &mut self.gamma,
            CameraSetting::WhiteBalance => &mut self.white_balance,
            CameraSetting::Backlight => &mut self.backlight,
            CameraSetting::ColorHue => &mut self.color_hue,
        };
        *slot = value;
    }
}

/// Camera selection, capture format and control values
///
/// Width, height and fps use `0` (or any non-positive value) for "pick the
/// default"; after a successful open they hold the negotiated values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Requested device index, clamped to the available devices
    pub device: i32,
    pub cam_width: i32,
    pub cam_height: i32,
    pub cam_fps: i32,
    /// Request MJPEG from the device
    pub compress: bool,
    /// Deliver colour frames; grayscale otherwise
    pub color: bool,
    /// Deliver only the crop region described by the `frame_*` fields
    pub frame: bool,
    /// Left edge of the crop region, centred when unset
    pub frame_xoff: Option<u32>,
    /// Top edge of the crop region, centred when unset
    pub frame_yoff: Option<u32>,
    /// Crop width, full width when unset or larger than the frame
    pub frame_width: Option<u32>,
    /// Crop height, full height when unset or larger than the frame
    pub frame_height: Option<u32>,
    pub controls: ControlSettings,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: 0,
            cam_width: 0,
            cam_height: 0,
            cam_fps: 0,
            compress: false,
            color: true,
            frame: false,
            frame_xoff: None,
            frame_yoff: None,
            frame_width: None,
            frame_height: None,
            controls: ControlSettings::default(),
        }
    }
}

/// Durable home of a [`CameraConfig`]
pub trait SettingsStore {
    /// Read the stored configuration, or defaults when nothing is stored yet
    fn load(&self) -> Result<CameraConfig, ConfigError>;

    /// Replace the stored configuration
    fn save(&mut self, config: &CameraConfig) -> Result<(), ConfigError>;
}

/// Configuration kept as pretty-printed JSON on disk
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<config dir>/camera-engine/camera.json`
    pub fn at_default_location() -> Result<Self, ConfigError> {
        default_path().map(Self::new).ok_or(ConfigError::NoConfigDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> Result<CameraConfig, ConfigError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No stored camera settings, using defaults");
            return Ok(CameraConfig::default());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: self.path.clone(),
            source: e,
        })
    }

    fn save(&mut self, config: &CameraConfig) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(config).map_err(|e| ConfigError::Parse {
            path: self.path.clone(),
            source: e,
        })?;
        std::fs::write(&self.path, json).map_err(|e| ConfigError::Io {
            path: self.path.clone(),
            source: e,
        })?;

        info!(path = %self.path.display(), "Saved camera settings");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    config: CameraConfig,
    saves: usize,
}

/// In-memory store; clones share the same configuration
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySettingsStore {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState { config, saves: 0 })),
        }
    }

    /// Current stored configuration
    pub fn config(&self) -> CameraConfig {
        self.lock().config.clone()
    }

    /// Number of successful saves
    pub fn saves(&self) -> usize {
        self.lock().saves
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock still holds a valid config
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<CameraConfig, ConfigError> {
        Ok(self.lock().config.clone())
    }

    fn save(&mut self, config: &CameraConfig) -> Result<(), ConfigError> {
        let mut state = self.lock();
        state.config = config.clone();
        state.saves += 1;
        Ok(())
    }
}

/// Default location of the JSON settings file
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("camera-engine").join("camera.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_requests_defaults() {
        let config = CameraConfig::default();
        assert_eq!(config.cam_width, 0);
        assert_eq!(config.cam_height, 0);
        assert_eq!(config.cam_fps, 0);
        assert!(config.color);
        assert!(!config.frame);
    }

    #[test]
    fn test_setting_value_json_shape() {
        assert_eq!(serde_json::to_string(&SettingValue::Auto).unwrap(), "\"auto\"");
        assert_eq!(
            serde_json::to_string(&SettingValue::Default).unwrap(),
            "\"default\""
        );
        assert_eq!(
            serde_json::to_string(&SettingValue::Value(42)).unwrap(),
            "{\"value\":42}"
        );
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: CameraConfig =
            serde_json::from_str(r#"{"device": 2, "controls": {"gain": "auto"}}"#).unwrap();
        assert_eq!(config.device, 2);
        assert!(config.color);
        assert_eq!(config.controls.gain, Some(SettingValue::Auto));
        assert_eq!(config.controls.brightness, None);
    }

    #[test]
    fn test_control_settings_get_set() {
        let mut controls = ControlSettings::default();
        for setting in CameraSetting::ALL {
            assert_eq!(controls.get(setting), None);
            controls.set(setting, Some(SettingValue::Value(7)));
            assert_eq!(controls.get(setting), Some(SettingValue::Value(7)));
        }
    }

    #[test]
    fn test_memory_store_clones_share_state() {
        let mut store = MemorySettingsStore::default();
        let observer = store.clone();

        let config = CameraConfig {
            device: 3,
            ..Default::default()
        };
        store.save(&config).unwrap();

        assert_eq!(observer.config().device, 3);
        assert_eq!(observer.saves(), 1);
    }
}
