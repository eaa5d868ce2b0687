// SPDX-License-Identifier: GPL-3.0-only

//! Async frame polling
//!
//! [`next_frame`] waits on the tokio timer between polls instead of
//! blocking the thread, so an engine can be driven from async code.

use super::CameraEngine;

/// Wait for the next frame
///
/// Polls once per tick and yields `None` as soon as the engine is no longer
/// running, including after a disconnect.
pub async fn next_frame<E: CameraEngine + ?Sized>(engine: &mut E) -> Option<&[u8]> {
    loop {
        if !engine.still_running() {
            return None;
        }
        if engine.poll_frame() {
            break;
        }
        tokio::time::sleep(engine.poll_tick()).await;
    }
    Some(engine.frame_buffer())
}
