// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for the snapshot directory
//!
//! The snapshot directory is flat and has no index: the directory listing is
//! the history.

use crate::constants::SUPPORTED_EXTENSIONS;
use crate::errors::{AppError, AppResult};
use crate::pipelines::photo::SnapshotName;
use chrono::NaiveDateTime;
use image::RgbImage;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A picture in the snapshot directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRecord {
    /// Absolute path of the image file
    pub path: PathBuf,
    /// Time embedded in the file name (None for foreign images)
    pub timestamp: Option<NaiveDateTime>,
    /// Disambiguator embedded in the file name (None for foreign images)
    pub increment: Option<u32>,
}

impl SnapshotRecord {
    /// Build a record from a path, reading timestamp and increment from the name
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let parsed = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(SnapshotName::parse);

        Self {
            timestamp: parsed.map(|name| name.timestamp),
            increment: parsed.map(|name| name.increment),
            path,
        }
    }

    pub fn file_name(&self) -> Cow<'_, str> {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default()
    }
}

/// True if the path has one of the supported image extensions
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// List the pictures in `dir`, newest first
///
/// Only regular files with a supported image extension are returned.
/// Entries are ordered by file name, descending; with the fixed-width
/// timestamp naming this is newest first. A missing directory is created.
pub fn list_snapshots(dir: &Path) -> AppResult<Vec<SnapshotRecord>> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::Storage(format!("{}: {}", dir.display(), e)))?;

    let mut records: Vec<SnapshotRecord> = std::fs::read_dir(dir)
        .map_err(|e| AppError::Storage(format!("{}: {}", dir.display(), e)))?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_supported_image(path))
        .map(SnapshotRecord::from_path)
        .collect();

    records.sort_by(|a, b| b.path.file_name().cmp(&a.path.file_name()));

    debug!(dir = %dir.display(), count = records.len(), "Scanned snapshot directory");
    Ok(records)
}

/// Decode an image file to RGB
pub fn load_image(path: &Path) -> AppResult<RgbImage> {
    let image = image::open(path)
        .map_err(|e| AppError::Storage(format!("{}: {}", path.display(), e)))?;
    Ok(image.to_rgb8())
}

/// Scale an image down to `width`, keeping its aspect ratio
///
/// Images already narrower than `width` are returned as they are.
pub fn thumbnail_of(image: &RgbImage, width: u32) -> RgbImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 || w <= width {
        return image.clone();
    }
    let height = ((h as u64 * width as u64) / w as u64).max(1) as u32;
    image::imageops::thumbnail(image, width, height)
}

/// Decode an image file and scale it to `width`
pub fn load_thumbnail(path: &Path, width: u32) -> AppResult<RgbImage> {
    load_image(path).map(|image| thumbnail_of(&image, width))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_image(Path::new("a.png")));
        assert!(is_supported_image(Path::new("a.JPG")));
        assert!(is_supported_image(Path::new("a.jpeg")));
        assert!(is_supported_image(Path::new("a.gif")));
        assert!(is_supported_image(Path::new("a.bmp")));
        assert!(!is_supported_image(Path::new("DayAfterDay.ini")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("png")));
    }

    #[test]
    fn test_record_parses_name() {
        let record = SnapshotRecord::from_path("/x/DayAfterDay-2024-01-01-120000-3.png");
        assert_eq!(record.increment, Some(3));
        assert_eq!(
            record.timestamp.map(|t| t.to_string()),
            Some("2024-01-01 12:00:00".to_string())
        );
    }

    #[test]
    fn test_record_foreign_name() {
        let record = SnapshotRecord::from_path("/x/holiday.jpg");
        assert_eq!(record.timestamp, None);
        assert_eq!(record.increment, None);
        assert_eq!(record.file_name(), "holiday.jpg");
    }

    #[test]
    fn test_thumbnail_keeps_aspect() {
        let image = RgbImage::new(400, 300);
        let thumb = thumbnail_of(&image, 200);
        assert_eq!(thumb.dimensions(), (200, 150));
    }
}
