// SPDX-License-Identifier: GPL-3.0-only

//! Engine-wide constants
//!
//! Capture defaults, the lost-frame timeout and the numeric mode selectors
//! shared by every `CameraEngine` backend.

use std::time::Duration;

/// Width used when the configuration leaves it unset or non-positive
pub const DEFAULT_WIDTH: i32 = 640;

/// Height used when the configuration leaves it unset or non-positive
pub const DEFAULT_HEIGHT: i32 = 480;

/// Frame rate used when the configuration leaves it unset or non-positive
pub const DEFAULT_FPS: i32 = 30;

/// Consecutive missed polls tolerated before the device counts as gone
pub const DEFAULT_FRAME_TIMEOUT: u32 = 2000;

/// Sleep after each unsuccessful frame poll
pub const POLL_TICK: Duration = Duration::from_millis(1);

/// Bytes per pixel of the frames a capture library hands over (BGR24)
pub const SOURCE_BYTES_PER_PIXEL: usize = 3;

/// Bytes per pixel of colour output frames
pub const COLOR_BYTES_PER_PIXEL: usize = 3;

/// Bytes per pixel of grayscale output frames
pub const GRAY_BYTES_PER_PIXEL: usize = 1;

/// Control flag: the device adjusts the property itself
pub const FLAGS_AUTO: i32 = 0x0001;

/// Control flag: the property holds the value last written
pub const FLAGS_MANUAL: i32 = 0x0002;

/// Numeric camera control selectors
///
/// These integers are shared by all engine backends. A backend reports
/// which of them it supports through `has_camera_setting`.
pub mod modes {
    pub const BRIGHTNESS: i32 = 100;
    pub const CONTRAST: i32 = 101;
    pub const SHARPNESS: i32 = 102;
    pub const AUTO_GAIN: i32 = 103;
    pub const GAIN: i32 = 104;
    pub const AUTO_EXPOSURE: i32 = 105;
    pub const EXPOSURE: i32 = 106;
    pub const SHUTTER: i32 = 107;
    pub const AUTO_FOCUS: i32 = 108;
    pub const FOCUS: i32 = 109;
    pub const AUTO_WHITE: i32 = 110;
    pub const WHITE: i32 = 111;
    pub const GAMMA: i32 = 112;
    pub const POWERLINE: i32 = 113;
    pub const BACKLIGHT: i32 = 114;
    pub const SATURATION: i32 = 115;
    pub const AUTO_HUE: i32 = 116;
    pub const COLOR_HUE: i32 = 117;
    pub const COLOR_RED: i32 = 118;
    pub const COLOR_GREEN: i32 = 119;
    pub const COLOR_BLUE: i32 = 120;
}
