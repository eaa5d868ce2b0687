// SPDX-License-Identifier: GPL-3.0-only

//! Capture library interface
//!
//! The engine adapter drives devices exclusively through this trait. A
//! library addresses devices by the index it assigned during enumeration
//! and may capture on its own background thread.
//!
//! # Pixel layout
//!
//! Frames returned by [`CaptureLibrary::pixels`] are packed BGR24 stored
//! bottom-up (the last image row first), `width * height * 3` bytes.

use super::types::{BackendResult, MediaSubtype, PropertyRange, VideoProperty};

pub trait CaptureLibrary {
    /// Names of the devices currently available, in index order
    fn device_list(&self) -> Vec<String>;

    /// Frame rate to ask for on the next `setup_device`
    fn set_ideal_framerate(&mut self, device: usize, fps: u32);

    /// Compressed subtype to ask for on the next `setup_device`
    fn set_requested_media_subtype(&mut self, subtype: MediaSubtype);

    /// Open the device and start capturing at (or near) the requested size
    fn setup_device(&mut self, device: usize, width: u32, height: u32) -> BackendResult<()>;

    /// Negotiated frame width of a set-up device
    fn width(&self, device: usize) -> u32;

    /// Negotiated frame height of a set-up device
    fn height(&self, device: usize) -> u32;

    /// Whether a frame arrived since the last call to `pixels`
    fn is_frame_new(&self, device: usize) -> bool;

    /// Latest frame, `None` when the device produced no usable pixel data
    fn pixels(&mut self, device: usize) -> Option<&[u8]>;

    /// Stop capturing and release the device
    fn stop_device(&mut self, device: usize);

    /// Ask for the device's own settings UI without waiting for it
    fn show_settings_window(&mut self, device: usize);

    /// Range, value and flags of a property, `None` if the device lacks it
    fn get_video_setting(&self, device: usize, property: VideoProperty) -> Option<PropertyRange>;

    /// Write a property value with `FLAGS_AUTO`/`FLAGS_MANUAL`, or reset it
    /// to the hardware default when `use_default` is set
    fn set_video_setting(
        &mut self,
        device: usize,
        property: VideoProperty,
        value: i32,
        flags: i32,
        use_default: bool,
    ) -> BackendResult<()>;
}
