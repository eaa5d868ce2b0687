// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use camera_engine::CameraSetting;
use camera_engine::constants::{FLAGS_AUTO, FLAGS_MANUAL, modes};

#[test]
fn test_mode_selectors_are_unique() {
    let all = [
        modes::BRIGHTNESS,
        modes::CONTRAST,
        modes::SHARPNESS,
        modes::AUTO_GAIN,
        modes::GAIN,
        modes::AUTO_EXPOSURE,
        modes::EXPOSURE,
        modes::SHUTTER,
        modes::AUTO_FOCUS,
        modes::FOCUS,
        modes::AUTO_WHITE,
        modes::WHITE,
        modes::GAMMA,
        modes::POWERLINE,
        modes::BACKLIGHT,
        modes::SATURATION,
        modes::AUTO_HUE,
        modes::COLOR_HUE,
        modes::COLOR_RED,
        modes::COLOR_GREEN,
        modes::COLOR_BLUE,
    ];
    let mut sorted = all.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), all.len(), "Mode selectors must be distinct");
}

#[test]
fn test_supported_modes_are_the_nine_controls() {
    let supported: Vec<i32> = (-1000..=1000)
        .filter(|mode| CameraSetting::from_mode(*mode).is_some())
        .collect();

    let mut expected = vec![
        modes::BRIGHTNESS,
        modes::SHARPNESS,
        modes::GAIN,
        modes::EXPOSURE,
        modes::FOCUS,
        modes::WHITE,
        modes::GAMMA,
        modes::BACKLIGHT,
        modes::COLOR_HUE,
    ];
    expected.sort_unstable();
    assert_eq!(supported, expected);
}

#[test]
fn test_control_flags_differ() {
    assert_ne!(FLAGS_AUTO, FLAGS_MANUAL);
}
