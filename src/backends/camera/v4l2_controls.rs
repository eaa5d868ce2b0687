// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera control interface
//!
//! Queries and sets V4L2 controls through `VIDIOC_QUERYCTRL`,
//! `VIDIOC_G_CTRL` and `VIDIOC_S_CTRL`, and maps the engine's video
//! properties onto control IDs. Properties with an automatic mode pair a
//! value control with a separate auto control.
//!
//! Inspired by [cameractrls](https://github.com/soyersoyer/cameractrls).

use super::types::{BackendError, BackendResult, PropertyRange, VideoProperty};
use crate::constants::{FLAGS_AUTO, FLAGS_MANUAL};
use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use tracing::debug;

// ===== V4L2 Control Class Bases =====
const V4L2_CTRL_CLASS_USER: u32 = 0x00980000;
const V4L2_CTRL_CLASS_CAMERA: u32 = 0x009a0000;

const V4L2_CID_BASE: u32 = V4L2_CTRL_CLASS_USER | 0x900;
const V4L2_CID_CAMERA_CLASS_BASE: u32 = V4L2_CTRL_CLASS_CAMERA | 0x900;

// ===== V4L2 Control IDs (User Class) =====

pub const V4L2_CID_BRIGHTNESS: u32 = V4L2_CID_BASE;
pub const V4L2_CID_HUE: u32 = V4L2_CID_BASE + 3;
/// Automatic white balance
pub const V4L2_CID_AUTO_WHITE_BALANCE: u32 = V4L2_CID_BASE + 12;
pub const V4L2_CID_GAMMA: u32 = V4L2_CID_BASE + 16;
/// Automatic gain control
pub const V4L2_CID_AUTOGAIN: u32 = V4L2_CID_BASE + 18;
pub const V4L2_CID_GAIN: u32 = V4L2_CID_BASE + 19;
/// Automatic hue
pub const V4L2_CID_HUE_AUTO: u32 = V4L2_CID_BASE + 25;
/// White balance temperature in Kelvin
pub const V4L2_CID_WHITE_BALANCE_TEMPERATURE: u32 = V4L2_CID_BASE + 26;
pub const V4L2_CID_SHARPNESS: u32 = V4L2_CID_BASE + 27;
/// Backlight compensation - helps with backlit subjects
pub const V4L2_CID_BACKLIGHT_COMPENSATION: u32 = V4L2_CID_BASE + 28;

// ===== V4L2 Control IDs (Camera Class) =====

/// Exposure mode: Auto, Manual, Shutter Priority, Aperture Priority
pub const V4L2_CID_EXPOSURE_AUTO: u32 = V4L2_CID_CAMERA_CLASS_BASE + 1;
/// Absolute exposure time in 100µs units
pub const V4L2_CID_EXPOSURE_ABSOLUTE: u32 = V4L2_CID_CAMERA_CLASS_BASE + 2;
/// Focus control (manual focus position)
pub const V4L2_CID_FOCUS_ABSOLUTE: u32 = V4L2_CID_CAMERA_CLASS_BASE + 10;
/// Auto focus enable
pub const V4L2_CID_FOCUS_AUTO: u32 = V4L2_CID_CAMERA_CLASS_BASE + 12;

// ===== V4L2 Exposure Auto Menu Values =====

/// Manual exposure time and iris
pub const V4L2_EXPOSURE_MANUAL: i32 = 1;
/// Auto exposure time, manual iris (aperture priority)
///
/// UVC webcams expose this as their only automatic mode.
pub const V4L2_EXPOSURE_APERTURE_PRIORITY: i32 = 3;

// ===== V4L2 Control Flags =====
const V4L2_CTRL_FLAG_DISABLED: u32 = 0x0001;

// ===== V4L2 ioctl Numbers =====
// Calculated as: (dir << 30) | (size << 16) | ('V' << 8) | nr
// where dir: 2=READ, 1=WRITE, 3=READ|WRITE

/// Get control value (v4l2_control: 8 bytes)
const VIDIOC_G_CTRL: libc::c_ulong = 0xC008561B;
/// Set control value (v4l2_control: 8 bytes)
const VIDIOC_S_CTRL: libc::c_ulong = 0xC008561C;
/// Query control info (v4l2_queryctrl: 68 bytes)
const VIDIOC_QUERYCTRL: libc::c_ulong = 0xC0445624;

// ===== V4L2 ioctl Structures =====

#[repr(C)]
struct V4l2Control {
    id: u32,
    value: i32,
}

#[repr(C)]
struct V4l2Queryctrl {
    id: u32,
    ctrl_type: u32,
    name: [u8; 32],
    minimum: i32,
    maximum: i32,
    step: i32,
    default_value: i32,
    flags: u32,
    reserved: [u32; 2],
}

/// Range and default of a V4L2 control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlInfo {
    pub id: u32,
    pub name: String,
    pub minimum: i32,
    pub maximum: i32,
    pub step: i32,
    pub default_value: i32,
    pub flags: u32,
}

impl ControlInfo {
    pub fn is_disabled(&self) -> bool {
        self.flags & V4L2_CTRL_FLAG_DISABLED != 0
    }
}

/// Auto control paired with a value control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoControl {
    pub id: u32,
    /// Value that enables the automatic mode
    pub on: i32,
    /// Value that selects manual operation
    pub off: i32,
}

impl AutoControl {
    const fn boolean(id: u32) -> Self {
        Self { id, on: 1, off: 0 }
    }

    /// Whether a control value means the automatic mode is active
    pub fn is_on(&self, value: i32) -> bool {
        value != self.off
    }
}

/// V4L2 controls backing one video property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyControls {
    pub value: u32,
    pub auto: Option<AutoControl>,
}

/// Control IDs for a video property
pub fn property_controls(property: VideoProperty) -> PropertyControls {
    let (value, auto) = match property {
        VideoProperty::Brightness => (V4L2_CID_BRIGHTNESS, None),
        VideoProperty::Gain => (
            V4L2_CID_GAIN,
            Some(AutoControl::boolean(V4L2_CID_AUTOGAIN)),
        ),
        VideoProperty::Exposure => (
            V4L2_CID_EXPOSURE_ABSOLUTE,
            Some(AutoControl {
                id: V4L2_CID_EXPOSURE_AUTO,
                on: V4L2_EXPOSURE_APERTURE_PRIORITY,
                off: V4L2_EXPOSURE_MANUAL,
            }),
        ),
        VideoProperty::Sharpness => (V4L2_CID_SHARPNESS, None),
        VideoProperty::Focus => (
            V4L2_CID_FOCUS_ABSOLUTE,
            Some(AutoControl::boolean(V4L2_CID_FOCUS_AUTO)),
        ),
        VideoProperty::Gamma => (V4L2_CID_GAMMA, None),
        VideoProperty::WhiteBalance => (
            V4L2_CID_WHITE_BALANCE_TEMPERATURE,
            Some(AutoControl::boolean(V4L2_CID_AUTO_WHITE_BALANCE)),
        ),
        VideoProperty::BacklightCompensation => (V4L2_CID_BACKLIGHT_COMPENSATION, None),
        VideoProperty::Hue => (V4L2_CID_HUE, Some(AutoControl::boolean(V4L2_CID_HUE_AUTO))),
    };
    PropertyControls { value, auto }
}

/// Extract a null-terminated string from a fixed-size byte array
fn extract_name(bytes: &[u8; 32]) -> String {
    let name_len = bytes.iter().position(|&c| c == 0).unwrap_or(32);
    String::from_utf8_lossy(&bytes[..name_len]).to_string()
}

/// Open V4L2 device used for control ioctls
#[derive(Debug)]
pub struct ControlHandle {
    file: File,
}

impl ControlHandle {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            file: File::open(path)?,
        })
    }

    /// Query if a control exists and get its information
    pub fn query(&self, control_id: u32) -> Option<ControlInfo> {
        let mut qctrl = V4l2Queryctrl {
            id: control_id,
            ctrl_type: 0,
            name: [0; 32],
            minimum: 0,
            maximum: 0,
            step: 0,
            default_value: 0,
            flags: 0,
            reserved: [0; 2],
        };

        let result = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                VIDIOC_QUERYCTRL,
                &mut qctrl as *mut V4l2Queryctrl,
            )
        };
        if result < 0 {
            return None;
        }

        Some(ControlInfo {
            id: qctrl.id,
            name: extract_name(&qctrl.name),
            minimum: qctrl.minimum,
            maximum: qctrl.maximum,
            step: qctrl.step,
            default_value: qctrl.default_value,
            flags: qctrl.flags,
        })
    }

    /// Get current value of a control
    pub fn get(&self, control_id: u32) -> Option<i32> {
        let mut ctrl = V4l2Control {
            id: control_id,
            value: 0,
        };

        let result = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                VIDIOC_G_CTRL,
                &mut ctrl as *mut V4l2Control,
            )
        };
        if result < 0 {
            debug!(control_id, "Failed to get V4L2 control");
            return None;
        }

        Some(ctrl.value)
    }

    /// Set value of a control
    pub fn set(&self, control_id: u32, value: i32) -> io::Result<()> {
        let mut ctrl = V4l2Control {
            id: control_id,
            value,
        };

        let result = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                VIDIOC_S_CTRL,
                &mut ctrl as *mut V4l2Control,
            )
        };
        if result < 0 {
            return Err(io::Error::last_os_error());
        }

        if ctrl.value != value {
            debug!(
                control_id,
                requested = value,
                actual = ctrl.value,
                "V4L2 control value was clamped"
            );
        }
        Ok(())
    }

    /// Range, value and auto state of a property
    pub fn read_property(&self, property: VideoProperty) -> Option<PropertyRange> {
        let controls = property_controls(property);
        let info = self.query(controls.value).filter(|info| !info.is_disabled())?;
        let value = self.get(controls.value)?;

        let auto = controls
            .auto
            .and_then(|auto| self.get(auto.id).map(|value| auto.is_on(value)))
            .unwrap_or(false);

        Some(PropertyRange {
            min: info.minimum,
            max: info.maximum,
            step: info.step,
            value,
            flags: if auto { FLAGS_AUTO } else { FLAGS_MANUAL },
            default: info.default_value,
        })
    }

    /// Write a property value, switch its automatic mode, or reset it
    pub fn write_property(
        &self,
        property: VideoProperty,
        value: i32,
        flags: i32,
        use_default: bool,
    ) -> BackendResult<()> {
        let controls = property_controls(property);
        let info = self
            .query(controls.value)
            .filter(|info| !info.is_disabled())
            .ok_or_else(|| BackendError::NotSupported(format!("{:?}", property)))?;

        if use_default {
            self.set(controls.value, info.default_value)?;
            return Ok(());
        }

        if flags == FLAGS_AUTO {
            let auto = controls.auto.ok_or_else(|| {
                BackendError::NotSupported(format!("automatic {:?}", property))
            })?;
            self.set(auto.id, auto.on)?;
            return Ok(());
        }

        // Manual values are rejected while the automatic mode is active
        if let Some(auto) = controls.auto
            && self.query(auto.id).is_some()
        {
            self.set(auto.id, auto.off)?;
        }
        self.set(controls.value, value.clamp(info.minimum, info.maximum))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_id_values() {
        assert_eq!(V4L2_CID_BRIGHTNESS, 0x00980900);
        assert_eq!(V4L2_CID_GAMMA, 0x00980910);
        assert_eq!(V4L2_CID_GAIN, 0x00980913);
        assert_eq!(V4L2_CID_HUE_AUTO, 0x00980919);
        assert_eq!(V4L2_CID_EXPOSURE_AUTO, 0x009a0901);
        assert_eq!(V4L2_CID_EXPOSURE_ABSOLUTE, 0x009a0902);
        assert_eq!(V4L2_CID_FOCUS_AUTO, 0x009a090c);
    }

    #[test]
    fn test_exposure_auto_menu() {
        let auto = property_controls(VideoProperty::Exposure).auto.unwrap();
        assert!(!auto.is_on(V4L2_EXPOSURE_MANUAL));
        assert!(auto.is_on(V4L2_EXPOSURE_APERTURE_PRIORITY));
        // Full auto and shutter priority count as automatic too
        assert!(auto.is_on(0));
        assert!(auto.is_on(2));
    }

    #[test]
    fn test_properties_without_auto_mode() {
        for property in [
            VideoProperty::Brightness,
            VideoProperty::Sharpness,
            VideoProperty::Gamma,
            VideoProperty::BacklightCompensation,
        ] {
            assert_eq!(property_controls(property).auto, None, "{:?}", property);
        }
    }

    #[test]
    fn test_value_controls_are_distinct() {
        let ids: std::collections::HashSet<u32> = VideoProperty::ALL
            .into_iter()
            .map(|property| property_controls(property).value)
            .collect();
        assert_eq!(ids.len(), VideoProperty::ALL.len());
    }

    #[test]
    fn test_open_missing_device() {
        assert!(ControlHandle::open("/nonexistent/video99").is_err());
    }
}
