// SPDX-License-Identifier: MPL-2.0

//! Camera engine abstraction
//!
//! Every camera backend exposes the same [`CameraEngine`] contract. This
//! crate provides one engine, [`CaptureCamera`], which adapts any
//! [`CaptureLibrary`] to the contract.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  Caller (CLI, app)  │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraEngine Trait  │  ← Common contract, integer modes, bool results
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CaptureCamera<L>    │  ← Session state, lost frames, pixel conversion
//! └──────────┬──────────┘
//!            │
//!            ▼
//!     ┌──────────────┐
//!     │CaptureLibrary│  ← V4L2, or the mock used by tests
//!     └──────────────┘
//! ```
//!
//! # Usage
//!
//! A single caller drives an engine at a time. Frames returned by
//! [`CameraEngine::get_frame`] borrow the engine's frame buffer and are
//! overwritten by the next poll.

pub mod adapter;
pub mod format_converters;
pub mod frame_loop;
pub mod library;
pub mod mock;
pub mod settings;
pub mod stream;
pub mod types;
pub mod v4l2;
pub mod v4l2_controls;

pub use adapter::CaptureCamera;
pub use library::CaptureLibrary;
pub use settings::CameraSetting;
pub use types::*;

use crate::config::{CameraConfig, SettingValue};
use std::time::Duration;
use tracing::debug;

/// Contract shared by all camera backends
///
/// Control modes are the integers in [`crate::constants::modes`]; a
/// backend answers `false`/`0` for modes it does not support.
pub trait CameraEngine {
    // ===== Enumeration =====

    /// Devices currently available
    fn list_devices(&self) -> Vec<DeviceDescriptor>;

    /// Load the configuration and select the configured device
    ///
    /// The configured index is clamped into the available range. Returns
    /// `false` only when no device is available.
    fn find_camera(&mut self) -> bool;

    // ===== Session =====

    /// Set up the selected device and allocate the frame buffer
    fn init_camera(&mut self) -> bool;

    /// Begin delivering frames
    fn start_camera(&mut self) -> bool;

    /// Poll the device once without sleeping
    ///
    /// Returns `true` when a new frame was converted into the frame buffer.
    fn poll_frame(&mut self) -> bool;

    /// Contents of the last converted frame
    fn frame_buffer(&self) -> &[u8];

    /// Pause to take after an unsuccessful poll
    fn poll_tick(&self) -> Duration;

    /// Poll for a frame, sleeping one tick when none is available
    fn get_frame(&mut self) -> Option<&[u8]> {
        if self.poll_frame() {
            Some(self.frame_buffer())
        } else {
            std::thread::sleep(self.poll_tick());
            None
        }
    }

    /// Stop delivering frames; `false` if not running
    fn stop_camera(&mut self) -> bool;

    fn reset_camera(&mut self) -> bool {
        self.stop_camera() && self.start_camera()
    }

    /// Persist settings and release the device
    fn close_camera(&mut self) -> bool;

    fn still_running(&self) -> bool;

    /// Key input hook; unused by this backend
    fn control(&mut self, _key: i32) {}

    /// Show the device's own settings UI while running; returns `lock`
    fn show_settings_dialog(&mut self, lock: bool) -> bool;

    // ===== Settings =====

    fn has_camera_setting(&self, mode: i32) -> bool;
    fn has_camera_setting_auto(&self, mode: i32) -> bool;
    fn set_camera_setting_auto(&mut self, mode: i32, enabled: bool) -> bool;
    fn get_camera_setting_auto(&self, mode: i32) -> bool;
    fn set_camera_setting(&mut self, mode: i32, value: i32) -> bool;
    fn get_camera_setting(&self, mode: i32) -> i32;
    fn get_min_camera_setting(&self, mode: i32) -> i32;
    fn get_max_camera_setting(&self, mode: i32) -> i32;
    fn get_camera_setting_step(&self, mode: i32) -> i32;
    fn get_default_camera_setting(&self, mode: i32) -> i32;
    fn set_default_camera_setting(&mut self, mode: i32) -> bool;

    // ===== Configuration =====

    fn config(&self) -> &CameraConfig;
    fn config_mut(&mut self) -> &mut CameraConfig;

    /// Push the persisted control values to the device
    fn apply_camera_settings(&mut self) {
        for setting in CameraSetting::ALL {
            let mode = setting.mode();
            if !self.has_camera_setting(mode) {
                continue;
            }

            match self.config().controls.get(setting) {
                None => {}
                Some(SettingValue::Auto) => {
                    if self.has_camera_setting_auto(mode) {
                        self.set_camera_setting_auto(mode, true);
                    }
                }
                Some(SettingValue::Default) => {
                    self.set_default_camera_setting(mode);
                }
                Some(SettingValue::Value(value)) => {
                    self.set_camera_setting(mode, value);
                }
            }
        }
    }

    /// Copy the device's live control values into the configuration
    fn update_settings(&mut self) {
        for setting in CameraSetting::ALL {
            let mode = setting.mode();
            if !self.has_camera_setting(mode) {
                continue;
            }

            // Controls without a range are not exposed by the device
            if self.get_min_camera_setting(mode) == self.get_max_camera_setting(mode) {
                debug!(%setting, "Skipping control without range");
                continue;
            }

            let value = if self.has_camera_setting_auto(mode) && self.get_camera_setting_auto(mode)
            {
                SettingValue::Auto
            } else {
                SettingValue::Value(self.get_camera_setting(mode))
            };
            self.config_mut().controls.set(setting, Some(value));
        }
    }
}
