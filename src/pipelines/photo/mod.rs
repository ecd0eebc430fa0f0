// SPDX-License-Identifier: GPL-3.0-only

//! Photo pipeline
//!
//! ```text
//! Current Frame ──▶ claim free name ──▶ PNG encode ──▶ SnapshotRecord
//! ```
//!
//! Saving runs once per shutter press. The caller prepends the returned
//! record to the history instead of re-scanning the directory.

pub mod naming;
pub mod writer;

pub use naming::SnapshotName;
pub use writer::SnapshotWriter;
