// SPDX-License-Identifier: MPL-2.0

//! Day After Day - take a picture every day and line it up with yesterday's
//!
//! This library provides the core functionality for the Day After Day
//! application: continuous webcam capture, collision-free snapshot saving,
//! the snapshot history and the ghosted overlay of the previous picture.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Terminal user interface
//! - [`backends`]: Camera backend and capture loop
//! - [`pipelines`]: Snapshot writing and overlay composition
//! - [`config`]: Runtime settings and persisted preferences
//! - [`storage`]: Snapshot directory listing and thumbnails
//!
//! # Example
//!
//! ```no_run
//! use dayafterday::config::Settings;
//! use dayafterday::pipelines::photo::SnapshotWriter;
//!
//! let settings = Settings::default();
//! let (_capture, mut frames) = dayafterday::backends::camera::start_capture(&settings)?;
//! let writer = SnapshotWriter::from_settings(&settings);
//! let record = writer.save(frames.latest().as_ref())?;
//! println!("{}", record.path.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use app::{AppState, PreviewState};
pub use backends::camera::{CaptureLoop, Frame, FrameReceiver, FrameSource};
pub use config::{Config, ConfigStore, Opacity, Settings};
pub use errors::{AppError, AppResult, CameraError, PhotoError};
pub use storage::SnapshotRecord;
