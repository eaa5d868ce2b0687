// SPDX-License-Identifier: MPL-2.0

//! Camera Engine - a uniform camera contract over V4L2 capture devices
//!
//! This library exposes cameras through the [`CameraEngine`] contract:
//! device selection, session lifecycle, frame polling with disconnect
//! detection, control access by numeric mode, and settings persistence.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Camera engine contract, adapter and capture libraries
//! - [`config`]: Persisted camera configuration and settings stores
//! - [`constants`]: Defaults, control flags and mode selectors
//! - [`errors`]: Error types
//!
//! # Example
//!
//! ```no_run
//! use camera_engine::{CameraEngine, CaptureCamera, JsonSettingsStore, V4lLibrary};
//!
//! let store = JsonSettingsStore::at_default_location().unwrap();
//! let mut camera = CaptureCamera::new(V4lLibrary::new(), store);
//! if camera.find_camera() && camera.init_camera() && camera.start_camera() {
//!     if let Some(frame) = camera.get_frame() {
//!         println!("{} bytes", frame.len());
//!     }
//!     camera.close_camera();
//! }
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used types
pub use backends::camera::v4l2::V4lLibrary;
pub use backends::camera::{CameraEngine, CameraSetting, CaptureCamera, CaptureLibrary};
pub use config::{CameraConfig, JsonSettingsStore, MemorySettingsStore, SettingValue, SettingsStore};
pub use errors::{AppError, AppResult};
