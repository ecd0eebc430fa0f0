// SPDX-License-Identifier: GPL-3.0-only
//! Background capture loop
//!
//! The capture thread owns the camera exclusively. It reads raw frames,
//! converts them to RGB and publishes them through a single-slot channel:
//! a newer frame replaces an undelivered older one, the producer never
//! blocks, and nothing queues up if the UI falls behind.
//!
//! ```text
//!  capture thread                       UI thread
//!  ┌──────────────┐   watch (depth 1)   ┌──────────────┐
//!  │ FrameSource  │ ──────────────────▶ │ FrameReceiver│
//!  │ read+convert │    latest wins      │   latest()   │
//!  └──────────────┘                     └──────────────┘
//! ```

use super::FrameSource;
use super::format_converters;
use super::types::Frame;
use crate::constants::capture;
use crate::errors::CameraError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, trace, warn};

/// Frames between periodic trace logs
const FRAME_LOG_INTERVAL: u64 = 300;

/// Backoff applied after failed frame reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay after the first failure
    pub initial_backoff: Duration,
    /// Delay ceiling; the backoff doubles up to this
    pub max_backoff: Duration,
    /// Warn every this many consecutive failures
    pub log_interval: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: capture::INITIAL_BACKOFF,
            max_backoff: capture::MAX_BACKOFF,
            log_interval: capture::FAILURE_LOG_INTERVAL,
        }
    }
}

impl RetryPolicy {
    /// Delay before the next read after `failures` consecutive failures (>= 1)
    pub fn backoff(&self, failures: u32) -> Duration {
        let doublings = failures.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << doublings)
            .min(self.max_backoff)
    }
}

/// Receiving end of the frame slot, held by the display
pub struct FrameReceiver {
    rx: watch::Receiver<Option<Frame>>,
}

impl FrameReceiver {
    /// The newest frame not yet seen, if any. Never blocks.
    ///
    /// Returns None once the capture loop has stopped.
    pub fn latest(&mut self) -> Option<Frame> {
        match self.rx.has_changed() {
            Ok(true) => self.rx.borrow_and_update().clone(),
            _ => None,
        }
    }

    /// True once the capture loop is gone
    pub fn is_closed(&self) -> bool {
        self.rx.has_changed().is_err()
    }
}

/// Controller for the capture thread
///
/// Dropping the controller stops the loop and waits for the device to be
/// released.
pub struct CaptureLoop {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl CaptureLoop {
    /// Open a frame source on a new capture thread and start streaming
    ///
    /// `open` runs on the capture thread so the device never crosses threads.
    /// This call waits for it: if opening fails the error is returned here and
    /// no thread is left running.
    pub fn start<S, F>(
        name: &str,
        open: F,
        policy: RetryPolicy,
    ) -> Result<(Self, FrameReceiver), CameraError>
    where
        S: FrameSource + 'static,
        F: FnOnce() -> Result<S, CameraError> + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let name_clone = name.to_string();
        let (frame_tx, frame_rx) = watch::channel(None);
        let (init_tx, init_rx) = oneshot::channel();

        info!(name = %name, "Starting capture loop");

        let thread_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                debug!(name = %name_clone, "Capture thread started, opening device...");

                let mut source = match open() {
                    Ok(source) => {
                        let _ = init_tx.send(Ok(()));
                        source
                    }
                    Err(e) => {
                        warn!(name = %name_clone, error = %e, "Failed to open camera");
                        let _ = init_tx.send(Err(e));
                        return;
                    }
                };

                run_loop(&name_clone, &mut source, &frame_tx, &stop_signal_clone, policy);

                source.release();
                info!(name = %name_clone, "Capture thread exiting, device released");
            })
            .map_err(|e| {
                CameraError::DeviceUnavailable(format!("failed to spawn capture thread: {}", e))
            })?;

        let mut controller = Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        };

        match init_rx.blocking_recv() {
            Ok(Ok(())) => Ok((controller, FrameReceiver { rx: frame_rx })),
            Ok(Err(e)) => {
                controller.join();
                Err(e)
            }
            Err(_) => {
                controller.join();
                Err(CameraError::DeviceUnavailable(
                    "capture thread exited during initialization".to_string(),
                ))
            }
        }
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to stop without waiting
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting capture loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
        // Cut a backoff sleep short
        if let Some(handle) = &self.thread_handle {
            handle.thread().unpark();
        }
    }

    /// Stop the loop and wait until the device has been released
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            debug!(name = %self.name, "Waiting for capture thread to finish");
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Capture thread panicked: {:?}", e);
            }
        }
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "CaptureLoop dropped, stopping loop");
            self.stop();
        }
    }
}

fn run_loop<S: FrameSource>(
    name: &str,
    source: &mut S,
    sender: &watch::Sender<Option<Frame>>,
    stop_signal: &AtomicBool,
    policy: RetryPolicy,
) {
    let mut failures: u32 = 0;
    let mut delivered: u64 = 0;

    while !stop_signal.load(Ordering::SeqCst) {
        let result = source
            .read_frame()
            .and_then(|raw| format_converters::to_rgb(&raw));

        match result {
            Ok(frame) => {
                failures = 0;
                if sender.send(Some(frame)).is_err() {
                    debug!(name = %name, "Frame receiver dropped, stopping");
                    break;
                }
                delivered += 1;
                if delivered % FRAME_LOG_INTERVAL == 0 {
                    trace!(name = %name, delivered, "Capture loop alive");
                }
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                if failures % policy.log_interval.max(1) == 0 {
                    warn!(name = %name, failures, error = %e, "Camera keeps failing to deliver frames");
                } else {
                    debug!(name = %name, error = %e, "Skipping frame");
                }
                thread::park_timeout(policy.backoff(failures));
            }
        }
    }
}
