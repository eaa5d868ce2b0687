// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera capture
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              CLI / Application              │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │               Backend Layer                 │
//! │  ┌──────────────────────────────────────┐   │
//! │  │   Camera (CameraEngine adapter)      │   │
//! │  └──────────────────┬───────────────────┘   │
//! │          ┌──────────┴──────────┐            │
//! │  ┌───────┴──────┐      ┌───────┴──────┐     │
//! │  │ V4L2 library │      │ Mock library │     │
//! │  └──────────────┘      └──────────────┘     │
//! └─────────────────────────────────────────────┘
//! ```

pub mod camera;
