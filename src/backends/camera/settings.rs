// SPDX-License-Identifier: GPL-3.0-only

//! Camera control modes
//!
//! Maps the numeric mode selectors of the engine contract onto the device
//! properties of the capture library. Every settings operation goes through
//! [`CameraSetting::from_mode`], so an unsupported mode is rejected in one
//! place.

use super::types::VideoProperty;
use crate::constants::modes;

/// A camera control the adapter supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraSetting {
    Brightness,
    Gain,
    Exposure,
    Sharpness,
    Focus,
    Gamma,
    WhiteBalance,
    Backlight,
    ColorHue,
}

/// Mode selector, property and name of every supported control
const SETTINGS: [(CameraSetting, i32, VideoProperty, &str); 9] = [
    (CameraSetting::Brightness, modes::BRIGHTNESS, VideoProperty::Brightness, "brightness"),
    (CameraSetting::Gain, modes::GAIN, VideoProperty::Gain, "gain"),
    (CameraSetting::Exposure, modes::EXPOSURE, VideoProperty::Exposure, "exposure"),
    (CameraSetting::Sharpness, modes::SHARPNESS, VideoProperty::Sharpness, "sharpness"),
    (CameraSetting::Focus, modes::FOCUS, VideoProperty::Focus, "focus"),
    (CameraSetting::Gamma, modes::GAMMA, VideoProperty::Gamma, "gamma"),
    (CameraSetting::WhiteBalance, modes::WHITE, VideoProperty::WhiteBalance, "white"),
    (
        CameraSetting::Backlight,
        modes::BACKLIGHT,
        VideoProperty::BacklightCompensation,
        "backlight",
    ),
    (CameraSetting::ColorHue, modes::COLOR_HUE, VideoProperty::Hue, "hue"),
];

impl CameraSetting {
    pub const ALL: [CameraSetting; 9] = [
        CameraSetting::Brightness,
        CameraSetting::Gain,
        CameraSetting::Exposure,
        CameraSetting::Sharpness,
        CameraSetting::Focus,
        CameraSetting::Gamma,
        CameraSetting::WhiteBalance,
        CameraSetting::Backlight,
        CameraSetting::ColorHue,
    ];

    /// Supported control for a numeric mode, `None` for any other integer
    pub fn from_mode(mode: i32) -> Option<Self> {
        SETTINGS
            .iter()
            .find(|(_, m, _, _)| *m == mode)
            .map(|(setting, _, _, _)| *setting)
    }

    /// Parse a control name as used on the command line
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        SETTINGS
            .iter()
            .find(|(_, _, _, n)| *n == name)
            .map(|(setting, _, _, _)| *setting)
    }

    /// Numeric mode selector of this control
    pub fn mode(self) -> i32 {
        self.entry().1
    }

    /// Device property backing this control
    pub fn property(self) -> VideoProperty {
        self.entry().2
    }

    pub fn name(self) -> &'static str {
        self.entry().3
    }

    fn entry(self) -> &'static (CameraSetting, i32, VideoProperty, &'static str) {
        // ALL and SETTINGS list the same nine controls
        &SETTINGS[self as usize]
    }
}

impl std::fmt::Display for CameraSetting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
