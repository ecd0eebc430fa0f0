// SPDX-License-Identifier: GPL-3.0-only

//! Snapshot writer
//!
//! Persists the current frame as a PNG under a collision-free name. A name
//! is claimed by creating the file exclusively, so an existing picture is
//! never overwritten even if another program writes into the directory.

use super::naming::SnapshotName;
use crate::backends::camera::Frame;
use crate::config::Settings;
use crate::errors::PhotoError;
use crate::storage::SnapshotRecord;
use chrono::NaiveDateTime;
use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Writes snapshots into one directory
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
    search_limit: u32,
}

impl SnapshotWriter {
    /// `search_limit` bounds how many increments are tried per timestamp
    pub fn new(dir: impl Into<PathBuf>, search_limit: u32) -> Self {
        Self {
            dir: dir.into(),
            search_limit: search_limit.max(1),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.snapshot_dir.clone(), settings.name_search_limit)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save `frame` stamped with the current local time
    pub fn save(&self, frame: Option<&Frame>) -> Result<SnapshotRecord, PhotoError> {
        self.save_at(frame, chrono::Local::now().naive_local())
    }

    /// Save `frame` stamped with `timestamp`
    ///
    /// # Errors
    /// * `NoFrameAvailable` - no frame has been captured yet; nothing is written
    /// * `NameSpaceExhausted` - every increment up to the search limit is taken
    /// * `WriteFailed` - the directory or file could not be written; no
    ///   partial file is left behind
    pub fn save_at(
        &self,
        frame: Option<&Frame>,
        timestamp: NaiveDateTime,
    ) -> Result<SnapshotRecord, PhotoError> {
        let Some(frame) = frame else {
            info!("No frame available to capture");
            return Err(PhotoError::NoFrameAvailable);
        };

        std::fs::create_dir_all(&self.dir)?;

        let (path, file) = self.claim_name(timestamp)?;
        debug!(path = %path.display(), width = frame.width, height = frame.height, "Encoding snapshot");

        if let Err(e) = encode_png(file, frame) {
            warn!(path = %path.display(), error = %e, "Snapshot write failed, removing partial file");
            if let Err(remove_err) = std::fs::remove_file(&path) {
                warn!(error = %remove_err, "Failed to remove partial snapshot");
            }
            return Err(e);
        }

        info!(path = %path.display(), "Snapshot saved");
        Ok(SnapshotRecord::from_path(path))
    }

    /// Find the first free increment for `timestamp` and create its file
    fn claim_name(&self, timestamp: NaiveDateTime) -> Result<(PathBuf, File), PhotoError> {
        let mut name = SnapshotName::new(timestamp, 1);

        for _ in 0..self.search_limit {
            let path = self.dir.join(name.file_name());
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "Name taken, trying next increment");
                    name = name.next();
                }
                Err(e) => return Err(PhotoError::WriteFailed(format!("{}: {}", path.display(), e))),
            }
        }

        warn!(attempts = self.search_limit, "Snapshot name search exhausted");
        Err(PhotoError::NameSpaceExhausted {
            attempts: self.search_limit,
        })
    }
}

fn encode_png(file: File, frame: &Frame) -> Result<(), PhotoError> {
    let mut writer = BufWriter::new(file);
    PngEncoder::new(&mut writer).write_image(
        frame.data(),
        frame.width,
        frame.height,
        image::ExtendedColorType::Rgb8,
    )?;
    writer.flush()?;
    Ok(())
}
