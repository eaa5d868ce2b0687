// SPDX-License-Identifier: GPL-3.0-only

//! [`CameraEngine`] implementation over a [`CaptureLibrary`]
//!
//! The adapter owns the session state, the single frame buffer and the
//! lost-frame counter. Device access goes through the library; settings
//! persistence goes through a [`SettingsStore`].

use super::format_converters::{FrameRegion, convert_frame};
use super::library::CaptureLibrary;
use super::settings::CameraSetting;
use super::types::{DeviceDescriptor, MediaSubtype, PropertyRange, SessionState};
use super::CameraEngine;
use crate::config::{CameraConfig, SettingsStore};
use crate::constants::{
    COLOR_BYTES_PER_PIXEL, DEFAULT_FPS, DEFAULT_FRAME_TIMEOUT, DEFAULT_HEIGHT, DEFAULT_WIDTH,
    FLAGS_AUTO, FLAGS_MANUAL, GRAY_BYTES_PER_PIXEL, POLL_TICK, SOURCE_BYTES_PER_PIXEL,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Camera engine backed by a capture library
pub struct CaptureCamera<L: CaptureLibrary> {
    library: L,
    store: Box<dyn SettingsStore>,
    config: CameraConfig,
    camera_id: usize,
    camera_name: String,
    state: SessionState,
    width: u32,
    height: u32,
    fps: u32,
    bytes_per_pixel: usize,
    /// Crop window, `None` when full frames are delivered
    region: Option<FrameRegion>,
    frame_buffer: Vec<u8>,
    /// Bytes of `frame_buffer` holding the current frame
    frame_len: usize,
    lost_frames: u32,
    timeout: u32,
    poll_tick: Duration,
}

impl<L: CaptureLibrary> std::fmt::Debug for CaptureCamera<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureCamera")
            .field("camera_id", &self.camera_id)
            .field("camera_name", &self.camera_name)
            .field("state", &self.state)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("lost_frames", &self.lost_frames)
            .finish_non_exhaustive()
    }
}

impl<L: CaptureLibrary> CaptureCamera<L> {
    pub fn new(library: L, store: impl SettingsStore + 'static) -> Self {
        Self {
            library,
            store: Box::new(store),
            config: CameraConfig::default(),
            camera_id: 0,
            camera_name: String::new(),
            state: SessionState::Closed,
            width: 0,
            height: 0,
            fps: 0,
            bytes_per_pixel: COLOR_BYTES_PER_PIXEL,
            region: None,
            frame_buffer: Vec::new(),
            frame_len: 0,
            lost_frames: 0,
            timeout: DEFAULT_FRAME_TIMEOUT,
            poll_tick: POLL_TICK,
        }
    }

    /// Missed polls tolerated before the device counts as disconnected
    pub fn with_frame_timeout(mut self, polls: u32) -> Self {
        self.timeout = polls;
        self
    }

    pub fn with_poll_tick(mut self, tick: Duration) -> Self {
        self.poll_tick = tick;
        self
    }

    pub fn library(&self) -> &L {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut L {
        &mut self.library
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn camera_id(&self) -> usize {
        self.camera_id
    }

    pub fn camera_name(&self) -> &str {
        &self.camera_name
    }

    /// Negotiated frame width
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Negotiated frame height
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// 3 for colour frames, 1 for grayscale
    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    /// Size of the delivered frames, the crop window when cropping
    pub fn frame_size(&self) -> (u32, u32) {
        match self.region {
            Some(region) => (region.width, region.height),
            None => (self.width, self.height),
        }
    }

    pub fn frame_region(&self) -> Option<FrameRegion> {
        self.region
    }

    /// Capacity of the frame buffer in bytes
    pub fn buffer_capacity(&self) -> usize {
        self.frame_buffer.len()
    }

    pub fn lost_frames(&self) -> u32 {
        self.lost_frames
    }

    /// Replace the configuration with the stored one
    pub fn read_settings(&mut self) {
        match self.store.load() {
            Ok(config) => self.config = config,
            Err(e) => warn!(error = %e, "Failed to read camera settings, keeping current"),
        }
    }

    /// Write the configuration to the store
    pub fn save_settings(&mut self) {
        if let Err(e) = self.store.save(&self.config) {
            warn!(error = %e, "Failed to save camera settings");
        }
    }

    /// Select a device by index, clamped into the available range
    ///
    /// The selected index is written back to the configuration. Returns
    /// `false` when no device is available.
    pub fn select_device(&mut self, requested: i32) -> bool {
        let devices = self.library.device_list();
        if devices.is_empty() {
            warn!("No camera found");
            return false;
        }
        info!(count = devices.len(), "Cameras found");

        let last = i32::try_from(devices.len() - 1).unwrap_or(i32::MAX);
        let index = requested.clamp(0, last);
        if index != requested {
            debug!(requested, selected = index, "Clamped camera index");
        }
        self.config.device = index;

        self.camera_id = index as usize;
        self.camera_name = devices[self.camera_id].clone();
        info!(index, name = %self.camera_name, "Selected camera");
        true
    }

    /// Compute crop window and output pixel size from the configuration
    fn setup_frame(&mut self) {
        self.bytes_per_pixel = if self.config.color {
            COLOR_BYTES_PER_PIXEL
        } else {
            GRAY_BYTES_PER_PIXEL
        };
        self.region = self
            .config
            .frame
            .then(|| FrameRegion::resolve(self.width, self.height, &self.config));
        // Set by the converter once a frame arrives
        self.frame_len = 0;
    }

    fn count_lost_frame(&mut self) {
        if self.lost_frames > self.timeout {
            warn!(
                device = self.camera_id,
                lost_frames = self.lost_frames,
                "Camera stopped delivering frames, treating it as disconnected"
            );
            self.state = SessionState::Disconnected;
        }
        self.lost_frames = self.lost_frames.saturating_add(1);
    }

    fn query(&self, setting: CameraSetting) -> Option<PropertyRange> {
        let range = self
            .library
            .get_video_setting(self.camera_id, setting.property());
        if range.is_none() {
            debug!(%setting, device = self.camera_id, "Control not exposed by device");
        }
        range
    }

    fn query_field(&self, mode: i32, field: impl Fn(&PropertyRange) -> i32) -> i32 {
        CameraSetting::from_mode(mode)
            .and_then(|setting| self.query(setting))
            .map_or(0, |range| field(&range))
    }

    fn write(&mut self, setting: CameraSetting, value: i32, flags: i32, use_default: bool) {
        if let Err(e) = self.library.set_video_setting(
            self.camera_id,
            setting.property(),
            value,
            flags,
            use_default,
        ) {
            warn!(%setting, value, flags, use_default, error = %e, "Failed to write camera control");
        }
    }
}

impl<L: CaptureLibrary> CameraEngine for CaptureCamera<L> {
    fn list_devices(&self) -> Vec<DeviceDescriptor> {
        let devices: Vec<DeviceDescriptor> = self
            .library
            .device_list()
            .into_iter()
            .enumerate()
            .map(|(index, name)| DeviceDescriptor { index, name })
            .collect();

        if devices.is_empty() {
            warn!("No camera found");
        } else {
            info!(count = devices.len(), "Cameras found");
            for device in &devices {
                info!(index = device.index, name = %device.name, "Camera");
            }
        }

        devices
    }

    fn find_camera(&mut self) -> bool {
        self.read_settings();
        self.select_device(self.config.device)
    }

    fn init_camera(&mut self) -> bool {
        if matches!(
            self.state,
            SessionState::Running | SessionState::Disconnected
        ) {
            warn!(state = %self.state, "Camera cannot be initialised in this state");
            return false;
        }

        if self.config.cam_width <= 0 {
            self.config.cam_width = DEFAULT_WIDTH;
        }
        if self.config.cam_height <= 0 {
            self.config.cam_height = DEFAULT_HEIGHT;
        }
        if self.config.cam_fps <= 0 {
            self.config.cam_fps = DEFAULT_FPS;
        }

        let id = self.camera_id;
        self.library
            .set_ideal_framerate(id, self.config.cam_fps as u32);
        if self.config.compress {
            self.library.set_requested_media_subtype(MediaSubtype::Mjpeg);
        }

        if let Err(e) = self.library.setup_device(
            id,
            self.config.cam_width as u32,
            self.config.cam_height as u32,
        ) {
            warn!(device = id, error = %e, "Failed to set up camera");
            return false;
        }

        self.width = self.library.width(id);
        self.height = self.library.height(id);
        if self.width == 0 || self.height == 0 {
            warn!(device = id, "Camera reported an empty frame size");
            self.library.stop_device(id);
            return false;
        }
        self.fps = self.config.cam_fps as u32;
        self.config.cam_width = self.width as i32;
        self.config.cam_height = self.height as i32;
        self.state = SessionState::Open;

        self.apply_camera_settings();
        self.setup_frame();

        // Sized for the full frame whether or not cropping is enabled
        self.frame_buffer =
            vec![0; self.width as usize * self.height as usize * self.bytes_per_pixel];
        self.lost_frames = 0;

        info!(
            device = id,
            width = self.width,
            height = self.height,
            fps = self.fps,
            color = self.config.color,
            crop = self.region.is_some(),
            "Camera initialised"
        );
        true
    }

    fn start_camera(&mut self) -> bool {
        match self.state {
            SessionState::Open | SessionState::Running => {
                self.state = SessionState::Running;
                true
            }
            state => {
                debug!(%state, "Camera cannot start in this state");
                false
            }
        }
    }

    fn poll_frame(&mut self) -> bool {
        if self.state != SessionState::Running {
            return false;
        }

        let id = self.camera_id;
        if self.library.is_frame_new(id) {
            let expected = self.width as usize * self.height as usize * SOURCE_BYTES_PER_PIXEL;
            match self.library.pixels(id) {
                Some(src) if src.len() >= expected => {
                    self.frame_len = convert_frame(
                        self.width,
                        self.height,
                        self.region.as_ref(),
                        self.config.color,
                        src,
                        &mut self.frame_buffer,
                    );
                    self.lost_frames = 0;
                    return true;
                }
                Some(src) => {
                    debug!(got = src.len(), expected, "Discarding short frame");
                }
                None => {
                    debug!(device = id, "Capture library returned no pixels");
                }
            }
        }

        self.count_lost_frame();
        false
    }

    fn frame_buffer(&self) -> &[u8] {
        &self.frame_buffer[..self.frame_len.min(self.frame_buffer.len())]
    }

    fn poll_tick(&self) -> Duration {
        self.poll_tick
    }

    fn stop_camera(&mut self) -> bool {
        if self.state != SessionState::Running {
            return false;
        }
        self.state = SessionState::Open;
        true
    }

    fn close_camera(&mut self) -> bool {
        if self.state == SessionState::Disconnected {
            debug!(device = self.camera_id, "Camera already gone, skipping teardown");
            return true;
        }

        // Runs from Closed too, e.g. after a failed init
        self.update_settings();
        self.save_settings();
        self.library.stop_device(self.camera_id);
        self.state = SessionState::Closed;
        info!(device = self.camera_id, "Camera closed");
        true
    }

    fn still_running(&self) -> bool {
        self.state == SessionState::Running
    }

    fn show_settings_dialog(&mut self, lock: bool) -> bool {
        if self.state == SessionState::Running {
            self.library.show_settings_window(self.camera_id);
        }
        lock
    }

    fn has_camera_setting(&self, mode: i32) -> bool {
        CameraSetting::from_mode(mode).is_some()
    }

    fn has_camera_setting_auto(&self, _mode: i32) -> bool {
        true
    }

    fn set_camera_setting_auto(&mut self, mode: i32, enabled: bool) -> bool {
        let Some(setting) = CameraSetting::from_mode(mode) else {
            return false;
        };

        let value = self.query(setting).map_or(0, |range| range.value);
        let flags = if enabled { FLAGS_AUTO } else { FLAGS_MANUAL };
        self.write(setting, value, flags, false);
        true
    }

    fn get_camera_setting_auto(&self, mode: i32) -> bool {
        CameraSetting::from_mode(mode)
            .and_then(|setting| self.query(setting))
            .is_some_and(|range| range.is_auto())
    }

    fn set_camera_setting(&mut self, mode: i32, value: i32) -> bool {
        let Some(setting) = CameraSetting::from_mode(mode) else {
            debug!(mode, "Unsupported camera setting");
            return false;
        };

        if self.get_camera_setting(mode) == value {
            return true;
        }

        self.write(setting, value, FLAGS_MANUAL, false);
        true
    }

    fn get_camera_setting(&self, mode: i32) -> i32 {
        self.query_field(mode, |range| range.value)
    }

    fn get_min_camera_setting(&self, mode: i32) -> i32 {
        self.query_field(mode, |range| range.min)
    }

    fn get_max_camera_setting(&self, mode: i32) -> i32 {
        self.query_field(mode, |range| range.max)
    }

    fn get_camera_setting_step(&self, mode: i32) -> i32 {
        self.query_field(mode, |range| range.step)
    }

    fn get_default_camera_setting(&self, mode: i32) -> i32 {
        self.query_field(mode, |range| range.default)
    }

    fn set_default_camera_setting(&mut self, mode: i32) -> bool {
        let Some(setting) = CameraSetting::from_mode(mode) else {
            return false;
        };
        self.write(setting, 0, 0, true);
        true
    }

    fn config(&self) -> &CameraConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut CameraConfig {
        &mut self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::mock::{MockFrame, MockLibrary};
    use crate::backends::camera::types::VideoProperty;
    use crate::config::{MemorySettingsStore, SettingValue};
    use crate::constants::modes;

    fn camera_with(
        library: MockLibrary,
        config: CameraConfig,
    ) -> (CaptureCamera<MockLibrary>, MemorySettingsStore) {
        let store = MemorySettingsStore::new(config);
        let camera = CaptureCamera::new(library, store.clone()).with_poll_tick(Duration::ZERO);
        (camera, store)
    }

    fn running_camera(timeout: u32) -> CaptureCamera<MockLibrary> {
        let (camera, _) = camera_with(MockLibrary::with_devices(&["cam"]), CameraConfig::default());
        let mut camera = camera.with_frame_timeout(timeout);
        assert!(camera.find_camera());
        assert!(camera.init_camera());
        assert!(camera.start_camera());
        camera
    }

    #[test]
    fn test_find_camera_clamps_index() {
        for (requested, expected) in [(-5, 0), (0, 0), (1, 1), (2, 2), (3, 2), (99, 2)] {
            let config = CameraConfig {
                device: requested,
                ..Default::default()
            };
            let (mut camera, _) =
                camera_with(MockLibrary::with_devices(&["a", "b", "c"]), config);
            assert!(camera.find_camera());
            assert_eq!(camera.camera_id(), expected as usize, "requested {}", requested);
            assert_eq!(camera.config().device, expected);
        }
    }

    #[test]
    fn test_find_camera_records_name() {
        let config = CameraConfig {
            device: 1,
            ..Default::default()
        };
        let (mut camera, _) = camera_with(MockLibrary::with_devices(&["front", "rear"]), config);
        assert!(camera.find_camera());
        assert_eq!(camera.camera_name(), "rear");
    }

    #[test]
    fn test_find_camera_without_devices() {
        let (mut camera, _) = camera_with(MockLibrary::with_devices(&[]), CameraConfig::default());
        assert!(!camera.find_camera());
        assert!(camera.list_devices().is_empty());
    }

    #[test]
    fn test_init_defaults_only_unset_fields() {
        let config = CameraConfig {
            cam_width: 320,
            cam_height: -1,
            cam_fps: 0,
            ..Default::default()
        };
        let (mut camera, _) = camera_with(MockLibrary::with_devices(&["cam"]), config);
        assert!(camera.find_camera());
        assert!(camera.init_camera());

        assert_eq!(camera.config().cam_width, 320);
        assert_eq!(camera.config().cam_height, DEFAULT_HEIGHT);
        assert_eq!(camera.config().cam_fps, DEFAULT_FPS);
        assert_eq!(camera.library().requested_framerate(), Some(30));
    }

    #[test]
    fn test_init_records_negotiated_size() {
        let library = MockLibrary::with_devices(&["cam"]).negotiating(800, 600);
        let (mut camera, _) = camera_with(library, CameraConfig::default());
        assert!(camera.find_camera());
        assert!(camera.init_camera());

        assert_eq!((camera.width(), camera.height()), (800, 600));
        assert_eq!(camera.config().cam_width, 800);
        assert_eq!(camera.config().cam_height, 600);
        assert_eq!(camera.buffer_capacity(), 800 * 600 * 3);
    }

    #[test]
    fn test_init_requests_mjpeg_when_compressed() {
        let config = CameraConfig {
            compress: true,
            ..Default::default()
        };
        let (mut camera, _) = camera_with(MockLibrary::with_devices(&["cam"]), config);
        assert!(camera.find_camera());
        assert!(camera.init_camera());
        assert_eq!(
            camera.library().requested_subtype(),
            Some(MediaSubtype::Mjpeg)
        );
    }

    #[test]
    fn test_init_failure_allocates_nothing() {
        let library = MockLibrary::with_devices(&["cam"]).failing_setup();
        let (mut camera, _) = camera_with(library, CameraConfig::default());
        assert!(camera.find_camera());
        assert!(!camera.init_camera());
        assert_eq!(camera.buffer_capacity(), 0);
        assert_eq!(camera.state(), SessionState::Closed);
        assert!(!camera.start_camera());
    }

    #[test]
    fn test_init_rejects_empty_frame_size() {
        let library = MockLibrary::with_devices(&["cam"]).negotiating(0, 480);
        let (mut camera, _) = camera_with(library, CameraConfig::default());
        assert!(camera.find_camera());
        assert!(!camera.init_camera());
        assert_eq!(camera.library().stop_calls(), 1);
        assert_eq!(camera.state(), SessionState::Closed);
    }

    #[test]
    fn test_crop_keeps_full_buffer_size() {
        let config = CameraConfig {
            frame: true,
            frame_width: Some(320),
            frame_height: Some(240),
            ..Default::default()
        };
        let (mut camera, _) = camera_with(MockLibrary::with_devices(&["cam"]), config);
        assert!(camera.find_camera());
        assert!(camera.init_camera());
        assert!(camera.start_camera());

        assert_eq!(camera.buffer_capacity(), 640 * 480 * 3);
        assert_eq!(camera.frame_size(), (320, 240));
        camera.library_mut().push_frame(MockFrame::Pattern);
        let frame = camera.get_frame().expect("frame");
        assert_eq!(frame.len(), 320 * 240 * 3);
    }

    #[test]
    fn test_grayscale_frames_use_one_byte() {
        let config = CameraConfig {
            color: false,
            ..Default::default()
        };
        let (mut camera, _) = camera_with(MockLibrary::with_devices(&["cam"]), config);
        assert!(camera.find_camera());
        assert!(camera.init_camera());
        assert!(camera.start_camera());
        assert_eq!(camera.bytes_per_pixel(), 1);

        camera.library_mut().push_frame(MockFrame::Pattern);
        assert_eq!(camera.get_frame().map(<[u8]>::len), Some(640 * 480));
    }

    #[test]
    fn test_frame_view_sized_by_converter() {
        let config = CameraConfig {
            color: false,
            frame: true,
            frame_width: Some(100),
            frame_height: Some(50),
            ..Default::default()
        };
        let (mut camera, _) = camera_with(MockLibrary::with_devices(&["cam"]), config);
        assert!(camera.find_camera());
        assert!(camera.init_camera());
        assert!(camera.start_camera());
        assert!(camera.frame_buffer().is_empty());

        camera.library_mut().push_frame(MockFrame::Pattern);
        assert!(camera.poll_frame());
        assert_eq!(camera.frame_buffer().len(), 100 * 50);
    }

    #[test]
    fn test_frame_delivery_resets_lost_frames() {
        let mut camera = running_camera(10);
        camera
            .library_mut()
            .push_frames([MockFrame::Stale, MockFrame::Null, MockFrame::Pattern]);

        assert!(camera.get_frame().is_none());
        assert!(camera.get_frame().is_none());
        assert_eq!(camera.lost_frames(), 2);
        assert!(camera.get_frame().is_some());
        assert_eq!(camera.lost_frames(), 0);
    }

    #[test]
    fn test_short_frame_counts_as_lost() {
        let mut camera = running_camera(10);
        camera
            .library_mut()
            .push_frame(MockFrame::Pixels(vec![0; 12]));
        assert!(camera.get_frame().is_none());
        assert_eq!(camera.lost_frames(), 1);
    }

    #[test]
    fn test_timeout_boundary() {
        let timeout = 5;
        let mut camera = running_camera(timeout);
        // timeout + 1 misses are tolerated
        for _ in 0..=timeout {
            assert!(camera.get_frame().is_none());
            assert!(camera.still_running());
        }
        assert!(camera.get_frame().is_none());
        assert!(!camera.still_running());
        assert_eq!(camera.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_null_frames_disconnect_like_stale_frames() {
        let timeout = 3;
        let mut camera = running_camera(timeout);
        camera
            .library_mut()
            .push_frames(std::iter::repeat_n(MockFrame::Null, 5));
        for _ in 0..5 {
            assert!(camera.get_frame().is_none());
        }
        assert_eq!(camera.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_disconnected_is_terminal() {
        let mut camera = running_camera(0);
        camera.get_frame();
        camera.get_frame();
        assert_eq!(camera.state(), SessionState::Disconnected);

        camera.library_mut().push_frame(MockFrame::Pattern);
        assert!(camera.get_frame().is_none());
        assert!(!camera.start_camera());
        assert!(!camera.stop_camera());
    }

    #[test]
    fn test_stop_and_reset() {
        let mut camera = running_camera(10);
        assert!(camera.reset_camera());
        assert!(camera.still_running());
        assert!(camera.stop_camera());
        assert!(!camera.stop_camera());
        assert!(!camera.reset_camera());
        assert!(camera.start_camera());
    }

    #[test]
    fn test_frames_only_while_running() {
        let mut camera = running_camera(10);
        assert!(camera.stop_camera());
        camera.library_mut().push_frame(MockFrame::Pattern);
        assert!(camera.get_frame().is_none());
        assert_eq!(camera.lost_frames(), 0);
    }

    #[test]
    fn test_close_persists_and_stops_device() {
        let (mut camera, store) =
            camera_with(MockLibrary::with_devices(&["cam"]), CameraConfig::default());
        assert!(camera.find_camera());
        assert!(camera.init_camera());
        assert!(camera.set_camera_setting(modes::GAIN, 42));
        assert!(camera.set_camera_setting_auto(modes::EXPOSURE, true));

        assert!(camera.close_camera());
        assert_eq!(camera.library().stop_calls(), 1);
        assert_eq!(store.saves(), 1);

        let saved = store.config();
        assert_eq!(saved.cam_width, 640);
        assert_eq!(saved.controls.gain, Some(SettingValue::Value(42)));
        assert_eq!(saved.controls.exposure, Some(SettingValue::Auto));
    }

    #[test]
    fn test_close_after_failed_init_saves_selection() {
        let config = CameraConfig {
            device: 7,
            ..Default::default()
        };
        let library = MockLibrary::with_devices(&["a", "b"]).failing_setup();
        let (mut camera, store) = camera_with(library, config);
        assert!(camera.find_camera());
        assert!(!camera.init_camera());

        assert!(camera.close_camera());
        assert_eq!(store.saves(), 1);
        assert_eq!(store.config().device, 1);
        assert_eq!(camera.library().stop_calls(), 1);
        assert_eq!(camera.state(), SessionState::Closed);
    }

    #[test]
    fn test_close_after_disconnect_skips_device() {
        let (camera, store) =
            camera_with(MockLibrary::with_devices(&["cam"]), CameraConfig::default());
        let mut camera = camera.with_frame_timeout(0);
        assert!(camera.find_camera());
        assert!(camera.init_camera());
        assert!(camera.start_camera());
        camera.get_frame();
        camera.get_frame();
        assert_eq!(camera.state(), SessionState::Disconnected);

        let set_calls = camera.library().set_calls();
        assert!(camera.close_camera());
        assert_eq!(camera.library().stop_calls(), 0);
        assert_eq!(camera.library().set_calls(), set_calls);
        assert_eq!(store.saves(), 0);
    }

    #[test]
    fn test_settings_dialog_echoes_lock() {
        let (mut camera, _) =
            camera_with(MockLibrary::with_devices(&["cam"]), CameraConfig::default());
        assert!(camera.find_camera());
        assert!(camera.init_camera());

        assert!(camera.show_settings_dialog(true));
        assert_eq!(camera.library().settings_window_calls(), 0);

        assert!(camera.start_camera());
        assert!(!camera.show_settings_dialog(false));
        assert!(camera.show_settings_dialog(true));
        assert_eq!(camera.library().settings_window_calls(), 2);
    }

    #[test]
    fn test_has_camera_setting() {
        let camera = running_camera(10);
        for setting in CameraSetting::ALL {
            assert!(camera.has_camera_setting(setting.mode()));
        }
        for mode in [modes::CONTRAST, modes::SATURATION, -1, 0, i32::MIN, i32::MAX] {
            assert!(!camera.has_camera_setting(mode));
            assert!(camera.has_camera_setting_auto(mode));
        }
    }

    #[test]
    fn test_set_camera_setting_writes_once() {
        let mut camera = running_camera(10);
        let before = camera.library().set_calls();

        assert!(camera.set_camera_setting(modes::BRIGHTNESS, 200));
        assert!(camera.set_camera_setting(modes::BRIGHTNESS, 200));

        assert_eq!(camera.library().set_calls(), before + 1);
        assert_eq!(camera.get_camera_setting(modes::BRIGHTNESS), 200);
        assert!(!camera.get_camera_setting_auto(modes::BRIGHTNESS));
    }

    #[test]
    fn test_unsupported_mode_has_no_effect() {
        let mut camera = running_camera(10);
        let before = camera.library().set_calls();

        assert!(!camera.set_camera_setting(modes::CONTRAST, 5));
        assert!(!camera.set_camera_setting_auto(modes::CONTRAST, true));
        assert!(!camera.set_default_camera_setting(modes::CONTRAST));
        assert!(!camera.get_camera_setting_auto(modes::CONTRAST));
        assert_eq!(camera.get_camera_setting(modes::CONTRAST), 0);
        assert_eq!(camera.get_max_camera_setting(-7), 0);
        assert_eq!(camera.library().set_calls(), before);
    }

    #[test]
    fn test_range_queries() {
        let library = MockLibrary::with_devices(&["cam"]).with_property(
            VideoProperty::Gamma,
            PropertyRange {
                min: 72,
                max: 500,
                step: 4,
                value: 100,
                flags: FLAGS_MANUAL,
                default: 120,
            },
        );
        let (mut camera, _) = camera_with(library, CameraConfig::default());
        assert!(camera.find_camera());

        assert_eq!(camera.get_min_camera_setting(modes::GAMMA), 72);
        assert_eq!(camera.get_max_camera_setting(modes::GAMMA), 500);
        assert_eq!(camera.get_camera_setting_step(modes::GAMMA), 4);
        assert_eq!(camera.get_camera_setting(modes::GAMMA), 100);
        assert_eq!(camera.get_default_camera_setting(modes::GAMMA), 120);

        assert!(camera.set_default_camera_setting(modes::GAMMA));
        assert_eq!(camera.get_camera_setting(modes::GAMMA), 120);
    }

    #[test]
    fn test_auto_toggle_keeps_value() {
        let mut camera = running_camera(10);
        assert!(camera.set_camera_setting(modes::FOCUS, 30));
        assert!(camera.set_camera_setting_auto(modes::FOCUS, true));
        assert!(camera.get_camera_setting_auto(modes::FOCUS));
        assert_eq!(camera.get_camera_setting(modes::FOCUS), 30);

        assert!(camera.set_camera_setting_auto(modes::FOCUS, false));
        assert!(!camera.get_camera_setting_auto(modes::FOCUS));
    }

    #[test]
    fn test_auto_query_reads_without_writing() {
        // White balance, backlight and hue are read like every other control
        let mut camera = running_camera(10);
        for mode in [modes::WHITE, modes::BACKLIGHT, modes::COLOR_HUE] {
            assert!(camera.set_camera_setting_auto(mode, true));
        }
        let writes = camera.library().set_calls();

        for mode in [modes::WHITE, modes::BACKLIGHT, modes::COLOR_HUE] {
            assert!(camera.get_camera_setting_auto(mode));
        }
        assert_eq!(camera.library().set_calls(), writes);
    }

    #[test]
    fn test_init_applies_persisted_controls() {
        let mut config = CameraConfig::default();
        config.controls.gain = Some(SettingValue::Value(10));
        config.controls.focus = Some(SettingValue::Auto);
        config.controls.gamma = Some(SettingValue::Default);

        let library = MockLibrary::with_devices(&["cam"]).with_property(
            VideoProperty::Gamma,
            PropertyRange {
                min: 0,
                max: 300,
                step: 1,
                value: 5,
                flags: FLAGS_MANUAL,
                default: 220,
            },
        );
        let (mut camera, _) = camera_with(library, config);
        assert!(camera.find_camera());
        assert!(camera.init_camera());

        assert_eq!(camera.get_camera_setting(modes::GAIN), 10);
        assert!(camera.get_camera_setting_auto(modes::FOCUS));
        assert_eq!(camera.get_camera_setting(modes::GAMMA), 220);
    }
}
