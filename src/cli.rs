// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Probing a camera's format and controls
//! - Taking snapshots
//! - Changing and persisting a control
//! - Watching the frame rate until interrupted

use camera_engine::backends::camera::format_converters::bgr_to_rgb;
use camera_engine::backends::camera::stream::next_frame;
use camera_engine::backends::camera::{CameraEngine, CameraSetting, CaptureCamera, CaptureLibrary};
use camera_engine::config::{JsonSettingsStore, MemorySettingsStore};
use camera_engine::errors::{AppError, AppResult};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Default folder name for saving snapshots
const DEFAULT_SAVE_FOLDER: &str = "Camera";

/// Options shared by every command that opens a camera
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Settings file, the per-user default when unset
    pub config: Option<PathBuf>,
    /// Device index overriding the stored one
    pub camera: Option<i32>,
    /// Missed polls before the camera counts as disconnected
    pub timeout: Option<u32>,
}

/// Select the camera without opening it
fn build_camera<L: CaptureLibrary>(
    library: L,
    options: &EngineOptions,
) -> AppResult<CaptureCamera<L>> {
    let store = match &options.config {
        Some(path) => JsonSettingsStore::new(path),
        None => JsonSettingsStore::at_default_location()?,
    };

    let mut camera = CaptureCamera::new(library, store);
    if let Some(timeout) = options.timeout {
        camera = camera.with_frame_timeout(timeout);
    }

    if !camera.find_camera() {
        return Err(AppError::NoCameraFound);
    }
    if let Some(index) = options.camera {
        camera.select_device(index);
    }
    Ok(camera)
}

/// Select and open the camera
fn open_camera<L: CaptureLibrary>(
    library: L,
    options: &EngineOptions,
) -> AppResult<CaptureCamera<L>> {
    let mut camera = build_camera(library, options)?;
    if !camera.init_camera() {
        return Err(AppError::OpenFailed {
            device: camera.config().device,
        });
    }
    println!("Using camera: {}", camera.camera_name());
    Ok(camera)
}

/// List all available cameras
pub fn list_cameras<L: CaptureLibrary>(library: L) -> Result<(), Box<dyn std::error::Error>> {
    let camera = CaptureCamera::new(library, MemorySettingsStore::default());
    let devices = camera.list_devices();

    if devices.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for device in &devices {
        println!("  [{}] {}", device.index, device.name);
    }

    Ok(())
}

/// Print the negotiated format and every control of a camera
pub fn probe<L: CaptureLibrary>(
    library: L,
    options: &EngineOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut camera = open_camera(library, options)?;

    println!(
        "Format: {}x{} @ {} fps",
        camera.width(),
        camera.height(),
        camera.fps()
    );
    println!();
    println!(
        "  {:<10} {:>7} {:>7} {:>7} {:>5} {:>7}  mode",
        "control", "value", "min", "max", "step", "default"
    );

    for setting in CameraSetting::ALL {
        let mode = setting.mode();
        let (min, max) = (
            camera.get_min_camera_setting(mode),
            camera.get_max_camera_setting(mode),
        );
        if min == max {
            println!("  {:<10} not available", setting.name());
            continue;
        }

        let auto = if camera.get_camera_setting_auto(mode) {
            "auto"
        } else {
            "manual"
        };
        println!(
            "  {:<10} {:>7} {:>7} {:>7} {:>5} {:>7}  {}",
            setting.name(),
            camera.get_camera_setting(mode),
            min,
            max,
            camera.get_camera_setting_step(mode),
            camera.get_default_camera_setting(mode),
            auto
        );
    }

    camera.close_camera();
    Ok(())
}

/// Capture one frame and save it as PNG
///
/// `skip` frames are dropped first so the sensor can settle its exposure.
pub fn snapshot<L: CaptureLibrary>(
    library: L,
    options: &EngineOptions,
    output: Option<PathBuf>,
    skip: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut camera = open_camera(library, options)?;
    camera.start_camera();

    println!("Capturing...");
    let rt = tokio::runtime::Runtime::new()?;
    let frame = rt.block_on(async {
        for _ in 0..skip {
            if next_frame(&mut camera).await.is_none() {
                return None;
            }
        }
        next_frame(&mut camera).await.map(<[u8]>::to_vec)
    });

    let (width, height) = camera.frame_size();
    let bytes_per_pixel = camera.bytes_per_pixel();
    camera.close_camera();

    let frame = frame.ok_or(AppError::NoFrame)?;

    let path = match output {
        Some(path) => path,
        None => {
            let dir = get_default_snapshot_dir();
            std::fs::create_dir_all(&dir)?;
            dir.join(snapshot_file_name())
        }
    };
    save_frame(&frame, width, height, bytes_per_pixel, &path)?;

    println!("Snapshot saved: {}", path.display());
    Ok(())
}

/// Write a top-down BGR or grayscale frame as an image file
pub fn save_frame(
    frame: &[u8],
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
    path: &Path,
) -> AppResult<()> {
    let mismatch = || AppError::Snapshot(format!("frame does not match {}x{}", width, height));

    if bytes_per_pixel == 1 {
        image::GrayImage::from_raw(width, height, frame.to_vec())
            .ok_or_else(mismatch)?
            .save(path)?;
    } else {
        image::RgbImage::from_raw(width, height, bgr_to_rgb(frame))
            .ok_or_else(mismatch)?
            .save(path)?;
    }
    Ok(())
}

/// Change one control and keep it for the next session
///
/// `value` is a number, `auto`, `manual` or `default`.
pub fn set_control<L: CaptureLibrary>(
    library: L,
    options: &EngineOptions,
    name: &str,
    value: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let setting =
        CameraSetting::from_name(name).ok_or_else(|| AppError::UnknownMode(name.to_string()))?;
    let mode = setting.mode();

    let mut camera = open_camera(library, options)?;
    match value.trim().to_ascii_lowercase().as_str() {
        "auto" => camera.set_camera_setting_auto(mode, true),
        "manual" => camera.set_camera_setting_auto(mode, false),
        "default" => camera.set_default_camera_setting(mode),
        number => camera.set_camera_setting(mode, number.parse()?),
    };

    let auto = if camera.get_camera_setting_auto(mode) {
        " (auto)"
    } else {
        ""
    };
    println!("{} = {}{}", setting, camera.get_camera_setting(mode), auto);

    camera.close_camera();
    Ok(())
}

/// Stream frames and report the frame rate until Ctrl+C or `duration`
pub fn watch<L: CaptureLibrary>(
    library: L,
    options: &EngineOptions,
    duration: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut camera = open_camera(library, options)?;
    let (width, height) = camera.frame_size();

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    println!("Watching {}x{} frames (press Ctrl+C to stop)", width, height);
    camera.start_camera();

    let start = Instant::now();
    let limit = duration.map(Duration::from_secs);
    let mut window_start = Instant::now();
    let mut window_frames = 0u32;
    let mut total_frames = 0u64;

    loop {
        if stop_flag.load(Ordering::SeqCst) || limit.is_some_and(|limit| start.elapsed() >= limit)
        {
            break;
        }

        if camera.get_frame().is_some() {
            window_frames += 1;
            total_frames += 1;
        } else if !camera.still_running() {
            println!();
            println!("Camera disconnected");
            break;
        }

        let elapsed = window_start.elapsed();
        if elapsed >= Duration::from_secs(1) {
            print!(
                "\rFrames: {}  fps: {:.1}",
                total_frames,
                window_frames as f64 / elapsed.as_secs_f64()
            );
            std::io::Write::flush(&mut std::io::stdout())?;
            window_start = Instant::now();
            window_frames = 0;
        }
    }
    println!();

    camera.stop_camera();
    camera.close_camera();
    println!("Received {} frames", total_frames);
    Ok(())
}

/// Get default snapshot directory
fn get_default_snapshot_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(DEFAULT_SAVE_FOLDER)
}

fn snapshot_file_name() -> String {
    format!("snapshot_{}.png", Local::now().format("%Y%m%d_%H%M%S"))
}
