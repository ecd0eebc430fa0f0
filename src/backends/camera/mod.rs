// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │   UI Layer (App)    │
//! └──────────┬──────────┘
//!            │ FrameReceiver
//!            ▼
//! ┌─────────────────────┐
//! │     CaptureLoop     │  ← Owns the device, retries, cancellation
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  FrameSource Trait  │  ← Common interface
//! └──────────┬──────────┘
//!            │
//!            ▼
//!        ┌──────┐
//!        │ V4L2 │  ← Concrete implementation
//!        └──────┘
//! ```

pub mod format_converters;
pub mod frame_loop;
pub mod types;
pub mod v4l2;

pub use frame_loop::{CaptureLoop, FrameReceiver, RetryPolicy};
pub use types::*;

use crate::config::Settings;
use crate::errors::CameraError;

/// A device that produces raw frames
///
/// Implementations are created and used on the capture thread only.
pub trait FrameSource {
    /// Read the next frame
    ///
    /// May block until the device delivers a frame. A failed read that may
    /// succeed on retry returns `CameraError::TransientReadFailure`.
    fn read_frame(&mut self) -> Result<RawFrame, CameraError>;

    /// Stop streaming and release the device
    ///
    /// Called once, on the capture thread, before the loop exits.
    fn release(&mut self) {}
}

/// Open the camera named in `settings` and start streaming frames
pub fn start_capture(settings: &Settings) -> Result<(CaptureLoop, FrameReceiver), CameraError> {
    let device = settings.device.clone();
    CaptureLoop::start(
        "camera-capture",
        move || v4l2::V4l2Camera::open(&device),
        settings.retry,
    )
}
