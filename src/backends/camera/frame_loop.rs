// SPDX-License-Identifier: GPL-3.0-only
//! Background capture thread
//!
//! A capture thread opens its device itself, reports the outcome of that
//! setup back to the spawning thread, and then runs its step closure until
//! the step asks to stop or the owner stops the thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Action returned by the step closure to control the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    Continue,
    Stop,
}

/// Handle to a running capture thread
///
/// Dropping the handle stops the thread and waits for it.
pub struct CaptureThread {
    handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl CaptureThread {
    /// Spawn a capture thread and wait for its setup to finish
    ///
    /// `init` runs on the new thread and returns the loop state together
    /// with a report for the caller, typically the negotiated format. If
    /// `init` fails the thread exits and the error is returned here.
    pub fn spawn<S, R, I, F>(name: &str, init: I, mut step: F) -> Result<(Self, R), String>
    where
        S: 'static,
        R: Send + 'static,
        I: FnOnce() -> Result<(S, R), String> + Send + 'static,
        F: FnMut(&mut S) -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop_signal);
        let thread_name = name.to_string();
        let (report_tx, report_rx) = mpsc::channel();

        info!(name, "Starting capture thread");

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut state = match init() {
                    Ok((state, report)) => {
                        // The spawner may have given up waiting
                        let _ = report_tx.send(Ok(report));
                        state
                    }
                    Err(e) => {
                        warn!(name = %thread_name, error = %e, "Capture setup failed");
                        let _ = report_tx.send(Err(e));
                        return;
                    }
                };

                while !thread_stop.load(Ordering::SeqCst) {
                    if step(&mut state) == LoopAction::Stop {
                        debug!(name = %thread_name, "Capture loop requested stop");
                        break;
                    }
                }

                info!(name = %thread_name, "Capture thread exiting");
            })
            .map_err(|e| format!("Failed to spawn capture thread: {}", e))?;

        let mut thread = Self {
            handle: Some(handle),
            stop_signal,
            name: name.to_string(),
        };

        match report_rx.recv() {
            Ok(Ok(report)) => Ok((thread, report)),
            Ok(Err(e)) => {
                thread.join();
                Err(e)
            }
            Err(_) => {
                thread.join();
                Err(format!("Capture thread {} exited during setup", name))
            }
        }
    }

    /// Whether the thread is still capturing
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the loop to stop and wait for the thread
    pub fn stop(&mut self) {
        debug!(name = %self.name, "Stopping capture thread");
        self.stop_signal.store(true, Ordering::SeqCst);
        self.join();
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.join()
        {
            warn!(name = %self.name, "Capture thread panicked: {:?}", e);
        }
    }
}

impl Drop for CaptureThread {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    #[test]
    fn test_report_from_init() {
        let (mut thread, report) = CaptureThread::spawn(
            "test-report",
            || Ok(((), (640u32, 480u32))),
            |_| LoopAction::Stop,
        )
        .unwrap();

        assert_eq!(report, (640, 480));
        thread.stop();
        assert!(!thread.is_running());
    }

    #[test]
    fn test_step_runs_until_stop() {
        let counter = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&counter);

        let (mut thread, ()) = CaptureThread::spawn(
            "test-steps",
            || Ok((0u32, ())),
            move |count| {
                *count += 1;
                seen.store(*count, Ordering::SeqCst);
                if *count >= 10 {
                    LoopAction::Stop
                } else {
                    LoopAction::Continue
                }
            },
        )
        .unwrap();

        thread.join();
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_init_failure_is_returned() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran_in_step = Arc::clone(&ran);

        let result = CaptureThread::spawn(
            "test-fail",
            || Err::<((), ()), _>("no such device".to_string()),
            move |_| {
                ran_in_step.store(true, Ordering::SeqCst);
                LoopAction::Stop
            },
        );

        assert_eq!(result.err().as_deref(), Some("no such device"));
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_stop_waits_at_most_one_blocking_step() {
        let (mut thread, ()) = CaptureThread::spawn(
            "test-blocking",
            || Ok(((), ())),
            |_| {
                // Stands in for a dequeue that runs into its timeout
                thread::sleep(Duration::from_millis(50));
                LoopAction::Continue
            },
        )
        .unwrap();

        let started = std::time::Instant::now();
        thread.stop();
        assert!(!thread.is_running());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_drop_stops_thread() {
        let (thread, ()) = CaptureThread::spawn(
            "test-drop",
            || Ok(((), ())),
            |_| {
                thread::sleep(Duration::from_millis(5));
                LoopAction::Continue
            },
        )
        .unwrap();

        assert!(thread.is_running());
        drop(thread);
    }
}
