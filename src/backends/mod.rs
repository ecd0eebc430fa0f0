// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera capture
//!
//! The backend layer hides how frames are obtained from hardware. The rest of
//! the application only sees [`camera::Frame`]s arriving through a
//! [`camera::FrameReceiver`].
//!
//! # Modules
//!
//! - [`camera`]: Device enumeration, V4L2 capture and the background capture loop

pub mod camera;
