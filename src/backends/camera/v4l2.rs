// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 capture library
//!
//! Each set-up device is captured on its own thread through a
//! memory-mapped V4L2 stream. The thread converts YUYV or MJPEG frames to
//! bottom-up BGR24 and publishes the latest one; the engine picks it up
//! with [`CaptureLibrary::pixels`]. Controls go through
//! [`ControlHandle`] on a separate file descriptor.

use super::format_converters::{rgb_to_bgr_bottom_up, yuyv_to_bgr_bottom_up};
use super::frame_loop::{CaptureThread, LoopAction};
use super::library::CaptureLibrary;
use super::types::{BackendError, BackendResult, MediaSubtype, PropertyRange, VideoProperty};
use super::v4l2_controls::ControlHandle;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::video::capture::Parameters;
use v4l::{Format, FourCC};

/// Buffers queued in the memory-mapped stream
const BUFFER_COUNT: u32 = 4;

/// Consecutive dequeue failures after which capture gives up
const MAX_STREAM_ERRORS: u32 = 100;

/// Longest a dequeue may wait before the loop rechecks its stop flag
const DEQUEUE_TIMEOUT: Duration = Duration::from_millis(200);

/// External control panel opened by `show_settings_window`
const SETTINGS_TOOL: &str = "qv4l2";

const FOURCC_YUYV: &[u8; 4] = b"YUYV";
const FOURCC_MJPG: &[u8; 4] = b"MJPG";

/// A video capture node found during enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct V4lDevice {
    pub path: PathBuf,
    pub name: String,
}

/// Format the driver settled on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NegotiatedFormat {
    width: u32,
    height: u32,
    fourcc: FourCC,
}

/// Latest converted frame shared with the capture thread
#[derive(Debug, Default)]
struct LatestFrame {
    data: Vec<u8>,
    fresh: bool,
}

/// State owned by the capture thread
struct V4lCapture {
    stream: MmapStream<'static>,
    format: NegotiatedFormat,
    latest: Arc<Mutex<LatestFrame>>,
    scratch: Vec<u8>,
    errors: u32,
}

impl V4lCapture {
    fn open(
        path: &Path,
        width: u32,
        height: u32,
        fourcc: FourCC,
        fps: Option<u32>,
        latest: Arc<Mutex<LatestFrame>>,
    ) -> Result<(Self, NegotiatedFormat), String> {
        let dev = Device::with_path(path).map_err(|e| format!("Failed to open device: {}", e))?;

        let actual = dev
            .set_format(&Format::new(width, height, fourcc))
            .map_err(|e| format!("Failed to set format: {}", e))?;
        if actual.fourcc != FourCC::new(FOURCC_YUYV) && actual.fourcc != FourCC::new(FOURCC_MJPG)
        {
            return Err(format!("Unsupported pixel format {}", actual.fourcc));
        }

        if let Some(fps) = fps {
            match dev.set_params(&Parameters::with_fps(fps)) {
                Ok(params) => debug!(requested = fps, interval = ?params.interval, "Frame rate set"),
                Err(e) => warn!(fps, error = %e, "Failed to set frame rate"),
            }
        }

        let mut stream = MmapStream::with_buffers(&dev, Type::VideoCapture, BUFFER_COUNT)
            .map_err(|e| format!("Failed to create stream: {}", e))?;
        stream.set_timeout(DEQUEUE_TIMEOUT);

        let format = NegotiatedFormat {
            width: actual.width,
            height: actual.height,
            fourcc: actual.fourcc,
        };
        info!(
            path = %path.display(),
            width = format.width,
            height = format.height,
            fourcc = %format.fourcc,
            "V4L2 capture configured"
        );

        let capture = Self {
            stream,
            format,
            latest,
            scratch: Vec::new(),
            errors: 0,
        };
        Ok((capture, format))
    }

    fn step(&mut self) -> LoopAction {
        let (buf, meta) = match self.stream.next() {
            Ok(frame) => frame,
            // Stalled device: the adapter's lost-frame count decides when it is gone
            Err(e) if is_dequeue_timeout(&e) => return LoopAction::Continue,
            Err(e) => {
                self.errors += 1;
                if self.errors >= MAX_STREAM_ERRORS {
                    warn!(error = %e, errors = self.errors, "V4L2 stream failed, stopping capture");
                    return LoopAction::Stop;
                }
                debug!(error = %e, "Failed to dequeue frame");
                return LoopAction::Continue;
            }
        };
        self.errors = 0;

        let used = match meta.bytesused as usize {
            0 => buf.len(),
            n => n.min(buf.len()),
        };
        if let Err(e) = convert_to_bgr(&self.format, &buf[..used], &mut self.scratch) {
            debug!(error = %e, "Dropping undecodable frame");
            return LoopAction::Continue;
        }

        if let Ok(mut latest) = self.latest.lock() {
            std::mem::swap(&mut latest.data, &mut self.scratch);
            latest.fresh = true;
        }
        LoopAction::Continue
    }
}

fn is_dequeue_timeout(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::TimedOut
}

/// Convert one device frame into bottom-up BGR24
fn convert_to_bgr(format: &NegotiatedFormat, data: &[u8], out: &mut Vec<u8>) -> Result<(), String> {
    let (width, height) = (format.width, format.height);

    if format.fourcc == FourCC::new(FOURCC_YUYV) {
        let expected = width as usize * height as usize * 2;
        if data.len() < expected {
            return Err(format!("short YUYV frame: {} < {}", data.len(), expected));
        }
        yuyv_to_bgr_bottom_up(data, width, height, out);
        Ok(())
    } else if format.fourcc == FourCC::new(FOURCC_MJPG) {
        let rgb = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
            .map_err(|e| e.to_string())?
            .to_rgb8();
        if rgb.dimensions() != (width, height) {
            return Err(format!(
                "decoded {}x{}, expected {}x{}",
                rgb.width(),
                rgb.height(),
                width,
                height
            ));
        }
        rgb_to_bgr_bottom_up(rgb.as_raw(), width, height, out);
        Ok(())
    } else {
        Err(format!("unsupported format {}", format.fourcc))
    }
}

/// The device currently being captured
struct ActiveDevice {
    index: usize,
    format: NegotiatedFormat,
    latest: Arc<Mutex<LatestFrame>>,
    controls: Option<ControlHandle>,
    pixels: Vec<u8>,
    _thread: CaptureThread,
}

/// Capture library over V4L2 video capture nodes
pub struct V4lLibrary {
    devices: Vec<V4lDevice>,
    ideal_fps: Option<u32>,
    subtype: Option<MediaSubtype>,
    active: Option<ActiveDevice>,
}

impl V4lLibrary {
    /// Enumerate the video capture devices present now
    pub fn new() -> Self {
        Self::with_devices(enumerate_devices())
    }

    fn with_devices(devices: Vec<V4lDevice>) -> Self {
        Self {
            devices,
            ideal_fps: None,
            subtype: None,
            active: None,
        }
    }

    pub fn devices(&self) -> &[V4lDevice] {
        &self.devices
    }

    /// Enumerate again, e.g. after a device was plugged in
    pub fn refresh(&mut self) {
        self.devices = enumerate_devices();
    }

    fn device(&self, index: usize) -> BackendResult<&V4lDevice> {
        self.devices
            .get(index)
            .ok_or(BackendError::DeviceNotFound(index))
    }

    fn active(&self, device: usize) -> Option<&ActiveDevice> {
        self.active.as_ref().filter(|active| active.index == device)
    }

    /// Run `f` on the control handle of the active device, or open one
    fn with_controls<T>(
        &self,
        device: usize,
        f: impl FnOnce(&ControlHandle) -> T,
    ) -> BackendResult<T> {
        if let Some(handle) = self.active(device).and_then(|active| active.controls.as_ref()) {
            return Ok(f(handle));
        }
        let handle = ControlHandle::open(&self.device(device)?.path)?;
        Ok(f(&handle))
    }
}

impl Default for V4lLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Video capture nodes in index order
///
/// Metadata nodes (UVC cameras expose one next to each video node) are
/// skipped since they list no capture formats.
pub fn enumerate_devices() -> Vec<V4lDevice> {
    let mut nodes = v4l::context::enum_devices();
    nodes.sort_by_key(|node| node.index());

    nodes
        .into_iter()
        .filter_map(|node| {
            let path = node.path().to_path_buf();
            let dev = Device::with_path(&path).ok()?;
            let caps = dev.query_caps().ok()?;

            if !caps
                .capabilities
                .contains(v4l::capability::Flags::VIDEO_CAPTURE)
            {
                return None;
            }
            if dev.enum_formats().map(|f| f.is_empty()).unwrap_or(true) {
                debug!(path = %path.display(), "Skipping node without capture formats");
                return None;
            }

            let name = node.name().unwrap_or(caps.card);
            debug!(path = %path.display(), name = %name, driver = %caps.driver, "Found V4L2 camera");
            Some(V4lDevice { path, name })
        })
        .collect()
}

impl CaptureLibrary for V4lLibrary {
    fn device_list(&self) -> Vec<String> {
        self.devices.iter().map(|device| device.name.clone()).collect()
    }

    fn set_ideal_framerate(&mut self, _device: usize, fps: u32) {
        self.ideal_fps = Some(fps);
    }

    fn set_requested_media_subtype(&mut self, subtype: MediaSubtype) {
        self.subtype = Some(subtype);
    }

    fn setup_device(&mut self, device: usize, width: u32, height: u32) -> BackendResult<()> {
        // Release any previous device before opening the next one
        self.active = None;

        let path = self.device(device)?.path.clone();
        let fourcc = match self.subtype {
            Some(MediaSubtype::Mjpeg) => FourCC::new(FOURCC_MJPG),
            None => FourCC::new(FOURCC_YUYV),
        };
        let fps = self.ideal_fps;

        let latest = Arc::new(Mutex::new(LatestFrame::default()));
        let thread_latest = Arc::clone(&latest);
        let thread_path = path.clone();

        let (thread, format) = CaptureThread::spawn(
            &format!("v4l2-capture-{}", device),
            move || V4lCapture::open(&thread_path, width, height, fourcc, fps, thread_latest),
            V4lCapture::step,
        )
        .map_err(BackendError::InitializationFailed)?;

        let controls = match ControlHandle::open(&path) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Camera controls unavailable");
                None
            }
        };

        self.active = Some(ActiveDevice {
            index: device,
            format,
            latest,
            controls,
            pixels: Vec::new(),
            _thread: thread,
        });
        Ok(())
    }

    fn width(&self, device: usize) -> u32 {
        self.active(device).map_or(0, |active| active.format.width)
    }

    fn height(&self, device: usize) -> u32 {
        self.active(device).map_or(0, |active| active.format.height)
    }

    fn is_frame_new(&self, device: usize) -> bool {
        self.active(device)
            .and_then(|active| active.latest.lock().ok().map(|latest| latest.fresh))
            .unwrap_or(false)
    }

    fn pixels(&mut self, device: usize) -> Option<&[u8]> {
        let active = self.active.as_mut().filter(|active| active.index == device)?;

        if let Ok(mut latest) = active.latest.lock()
            && latest.fresh
        {
            std::mem::swap(&mut latest.data, &mut active.pixels);
            latest.fresh = false;
        }

        if active.pixels.is_empty() {
            None
        } else {
            Some(active.pixels.as_slice())
        }
    }

    fn stop_device(&mut self, device: usize) {
        if self.active(device).is_some() {
            self.active = None;
            info!(device, "V4L2 capture stopped");
        }
    }

    fn show_settings_window(&mut self, device: usize) {
        let Ok(entry) = self.device(device) else {
            return;
        };

        match Command::new(SETTINGS_TOOL).arg("-d").arg(&entry.path).spawn() {
            Ok(child) => debug!(pid = child.id(), tool = SETTINGS_TOOL, "Opened camera settings"),
            Err(e) => warn!(tool = SETTINGS_TOOL, error = %e, "Failed to open camera settings"),
        }
    }

    fn get_video_setting(&self, device: usize, property: VideoProperty) -> Option<PropertyRange> {
        self.with_controls(device, |handle| handle.read_property(property))
            .ok()
            .flatten()
    }

    fn set_video_setting(
        &mut self,
        device: usize,
        property: VideoProperty,
        value: i32,
        flags: i32,
        use_default: bool,
    ) -> BackendResult<()> {
        self.with_controls(device, |handle| {
            handle.write_property(property, value, flags, use_default)
        })?
    }
}
