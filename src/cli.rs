// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Taking a single snapshot
//! - Printing the snapshot history

use dayafterday::backends::camera::{self, Frame, v4l2::enumerate_cameras};
use dayafterday::config::Settings;
use dayafterday::constants::photo;
use dayafterday::pipelines::photo::SnapshotWriter;
use dayafterday::storage;
use std::time::Instant;

/// List all available cameras
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let cameras = enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for camera in &cameras {
        println!("  [{}] {} ({})", camera.index, camera.card, camera.path.display());
        println!("      Driver: {}", camera.driver);
        if !camera.formats.is_empty() {
            println!("      Formats: {}", camera.formats.join(", "));
        }
        println!();
    }

    Ok(())
}

/// Take one snapshot into the snapshot directory
pub fn take_photo(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    println!("Using camera: {}", settings.device);

    let (mut capture, mut frames) = camera::start_capture(settings)?;

    // Wait for frames to stabilize (camera warm-up)
    println!("Capturing...");
    let start = Instant::now();
    let mut frame: Option<Frame> = None;

    while start.elapsed() < photo::TIMEOUT {
        match frames.latest() {
            Some(f) => {
                frame = Some(f);
                // After warmup period, use the next good frame
                if start.elapsed() > photo::WARMUP {
                    break;
                }
            }
            None if frames.is_closed() => break,
            None => std::thread::sleep(dayafterday::constants::ui::POLL_INTERVAL),
        }
    }

    capture.stop();

    let writer = SnapshotWriter::from_settings(settings);
    let record = writer.save(frame.as_ref())?;

    println!("Photo saved: {}", record.path.display());
    Ok(())
}

/// Print the snapshot history, newest first
pub fn print_history(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let records = storage::list_snapshots(&settings.snapshot_dir)?;

    if records.is_empty() {
        println!("No pictures in {}", settings.snapshot_dir.display());
        return Ok(());
    }

    println!("{} pictures in {}:", records.len(), settings.snapshot_dir.display());
    for record in &records {
        match record.timestamp {
            Some(timestamp) => println!("  {}  {}", timestamp, record.file_name()),
            None => println!("  {:19}  {}", "", record.file_name()),
        }
    }

    Ok(())
}
