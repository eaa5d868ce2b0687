// SPDX-License-Identifier: GPL-3.0-only

//! Scripted capture library
//!
//! Serves frames from a queue and keeps controls in memory, counting the
//! calls the adapter makes. Used by the tests and by `--mock` on the
//! command line.

use super::library::CaptureLibrary;
use super::types::{BackendError, BackendResult, MediaSubtype, PropertyRange, VideoProperty};
use crate::constants::{FLAGS_MANUAL, SOURCE_BYTES_PER_PIXEL};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// One scripted poll result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFrame {
    /// A new frame with these bytes
    Pixels(Vec<u8>),
    /// A new frame rendered as a gradient at the negotiated size
    Pattern,
    /// Frame reported new but without pixel data
    Null,
    /// No new frame
    Stale,
}

#[derive(Debug)]
pub struct MockLibrary {
    devices: Vec<String>,
    negotiated: Option<(u32, u32)>,
    fail_setup: bool,
    /// Serve a pattern frame whenever the queue is empty
    continuous: bool,
    frames: RefCell<VecDeque<MockFrame>>,
    current: Vec<u8>,
    width: u32,
    height: u32,
    properties: HashMap<VideoProperty, PropertyRange>,
    framerate: Option<u32>,
    subtype: Option<MediaSubtype>,
    setup_calls: usize,
    set_calls: usize,
    get_calls: Cell<usize>,
    stop_calls: usize,
    settings_window_calls: usize,
    sequence: u8,
}

impl MockLibrary {
    pub fn with_devices(names: &[&str]) -> Self {
        let properties = VideoProperty::ALL
            .into_iter()
            .map(|property| (property, default_range(property)))
            .collect();

        Self {
            devices: names.iter().map(|name| name.to_string()).collect(),
            negotiated: None,
            fail_setup: false,
            continuous: false,
            frames: RefCell::new(VecDeque::new()),
            current: Vec::new(),
            width: 0,
            height: 0,
            properties,
            framerate: None,
            subtype: None,
            setup_calls: 0,
            set_calls: 0,
            get_calls: Cell::new(0),
            stop_calls: 0,
            settings_window_calls: 0,
            sequence: 0,
        }
    }

    /// Report this size after setup regardless of the request
    pub fn negotiating(mut self, width: u32, height: u32) -> Self {
        self.negotiated = Some((width, height));
        self
    }

    /// Make `setup_device` fail
    pub fn failing_setup(mut self) -> Self {
        self.fail_setup = true;
        self
    }

    /// Deliver a fresh pattern frame on every poll once the queue runs dry
    pub fn continuous(mut self) -> Self {
        self.continuous = true;
        self
    }

    pub fn with_property(mut self, property: VideoProperty, range: PropertyRange) -> Self {
        self.properties.insert(property, range);
        self
    }

    pub fn without_property(mut self, property: VideoProperty) -> Self {
        self.properties.remove(&property);
        self
    }

    pub fn push_frame(&mut self, frame: MockFrame) {
        self.frames.get_mut().push_back(frame);
    }

    pub fn push_frames(&mut self, frames: impl IntoIterator<Item = MockFrame>) {
        self.frames.get_mut().extend(frames);
    }

    /// Current state of a property, without counting a query
    pub fn property(&self, property: VideoProperty) -> Option<PropertyRange> {
        self.properties.get(&property).copied()
    }

    pub fn requested_framerate(&self) -> Option<u32> {
        self.framerate
    }

    pub fn requested_subtype(&self) -> Option<MediaSubtype> {
        self.subtype
    }

    pub fn setup_calls(&self) -> usize {
        self.setup_calls
    }

    pub fn set_calls(&self) -> usize {
        self.set_calls
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.get()
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls
    }

    pub fn settings_window_calls(&self) -> usize {
        self.settings_window_calls
    }

    /// Bottom-up BGR gradient that shifts with every frame
    pub fn pattern_frame(width: u32, height: u32, shift: u8) -> Vec<u8> {
        let (width, height) = (width as usize, height as usize);
        let mut frame = Vec::with_capacity(width * height * SOURCE_BYTES_PER_PIXEL);
        for row in 0..height {
            for col in 0..width {
                let x = (col * 255 / width.max(1)) as u8;
                let y = (row * 255 / height.max(1)) as u8;
                frame.extend_from_slice(&[x.wrapping_add(shift), y, 128]);
            }
        }
        frame
    }

    fn render_pattern(&mut self) {
        self.current = Self::pattern_frame(self.width, self.height, self.sequence);
        self.sequence = self.sequence.wrapping_add(1);
    }
}

fn default_range(property: VideoProperty) -> PropertyRange {
    let (min, max, default) = match property {
        VideoProperty::Exposure => (-13, -1, -6),
        VideoProperty::WhiteBalance => (2800, 6500, 4600),
        VideoProperty::BacklightCompensation => (0, 2, 1),
        VideoProperty::Hue => (-180, 180, 0),
        _ => (0, 255, 128),
    };
    PropertyRange {
        min,
        max,
        step: 1,
        value: default,
        flags: FLAGS_MANUAL,
        default,
    }
}

impl CaptureLibrary for MockLibrary {
    fn device_list(&self) -> Vec<String> {
        self.devices.clone()
    }

    fn set_ideal_framerate(&mut self, _device: usize, fps: u32) {
        self.framerate = Some(fps);
    }

    fn set_requested_media_subtype(&mut self, subtype: MediaSubtype) {
        self.subtype = Some(subtype);
    }

    fn setup_device(&mut self, device: usize, width: u32, height: u32) -> BackendResult<()> {
        self.setup_calls += 1;
        if device >= self.devices.len() {
            return Err(BackendError::DeviceNotFound(device));
        }
        if self.fail_setup {
            return Err(BackendError::InitializationFailed(format!(
                "mock device {} refused setup",
                device
            )));
        }

        (self.width, self.height) = self.negotiated.unwrap_or((width, height));
        debug!(device, width = self.width, height = self.height, "Mock device set up");
        Ok(())
    }

    fn width(&self, _device: usize) -> u32 {
        self.width
    }

    fn height(&self, _device: usize) -> u32 {
        self.height
    }

    fn is_frame_new(&self, _device: usize) -> bool {
        let mut frames = self.frames.borrow_mut();
        match frames.front() {
            Some(MockFrame::Stale) => {
                frames.pop_front();
                false
            }
            Some(_) => true,
            None => self.continuous,
        }
    }

    fn pixels(&mut self, _device: usize) -> Option<&[u8]> {
        match self.frames.get_mut().pop_front() {
            Some(MockFrame::Pixels(data)) => self.current = data,
            Some(MockFrame::Pattern) => self.render_pattern(),
            Some(MockFrame::Null) | Some(MockFrame::Stale) => return None,
            None if self.continuous => self.render_pattern(),
            None => return None,
        }
        Some(self.current.as_slice())
    }

    fn stop_device(&mut self, _device: usize) {
        self.stop_calls += 1;
    }

    fn show_settings_window(&mut self, _device: usize) {
        self.settings_window_calls += 1;
    }

    fn get_video_setting(&self, _device: usize, property: VideoProperty) -> Option<PropertyRange> {
        self.get_calls.set(self.get_calls.get() + 1);
        self.properties.get(&property).copied()
    }

    fn set_video_setting(
        &mut self,
        _device: usize,
        property: VideoProperty,
        value: i32,
        flags: i32,
        use_default: bool,
    ) -> BackendResult<()> {
        self.set_calls += 1;
        let range = self
            .properties
            .get_mut(&property)
            .ok_or_else(|| BackendError::NotSupported(format!("{:?}", property)))?;

        if use_default {
            range.value = range.default;
        } else {
            range.value = value;
            range.flags = flags;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FLAGS_AUTO;

    #[test]
    fn test_stale_frames_are_consumed_by_probe() {
        let mut library = MockLibrary::with_devices(&["cam"]);
        library.setup_device(0, 2, 2).unwrap();
        library.push_frames([MockFrame::Stale, MockFrame::Pattern]);

        assert!(!library.is_frame_new(0));
        assert!(library.is_frame_new(0));
        assert_eq!(library.pixels(0).map(<[u8]>::len), Some(12));
        assert!(!library.is_frame_new(0));
    }

    #[test]
    fn test_continuous_frames_change() {
        let mut library = MockLibrary::with_devices(&["cam"]).continuous();
        library.setup_device(0, 4, 4).unwrap();

        assert!(library.is_frame_new(0));
        let first = library.pixels(0).unwrap().to_vec();
        let second = library.pixels(0).unwrap().to_vec();
        assert_ne!(first, second);
    }

    #[test]
    fn test_setup_unknown_device() {
        let mut library = MockLibrary::with_devices(&["cam"]);
        assert_eq!(
            library.setup_device(3, 640, 480),
            Err(BackendError::DeviceNotFound(3))
        );
    }

    #[test]
    fn test_auto_flag_keeps_value() {
        let mut library = MockLibrary::with_devices(&["cam"]);
        library
            .set_video_setting(0, VideoProperty::Gain, 12, FLAGS_MANUAL, false)
            .unwrap();
        library
            .set_video_setting(0, VideoProperty::Gain, 12, FLAGS_AUTO, false)
            .unwrap();

        let gain = library.property(VideoProperty::Gain).unwrap();
        assert_eq!(gain.value, 12);
        assert!(gain.is_auto());
        assert_eq!(library.set_calls(), 2);
    }

    #[test]
    fn test_missing_property() {
        let mut library = MockLibrary::with_devices(&["cam"]).without_property(VideoProperty::Focus);
        assert_eq!(library.get_video_setting(0, VideoProperty::Focus), None);
        assert!(matches!(
            library.set_video_setting(0, VideoProperty::Focus, 1, FLAGS_MANUAL, false),
            Err(BackendError::NotSupported(_))
        ));
        assert_eq!(library.get_calls(), 1);
    }
}
