// SPDX-License-Identifier: MPL-2.0

//! Error types for Day After Day

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Camera-related errors
    Camera(CameraError),
    /// Snapshot errors
    Photo(PhotoError),
    /// Configuration file missing or corrupt (callers fall back to defaults)
    ConfigUnreadable(String),
    /// Configuration file could not be written
    ConfigWrite(String),
    /// Storage/filesystem errors (directory scans, thumbnails)
    Storage(String),
}

/// Camera-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// The camera could not be opened; preview is disabled
    DeviceUnavailable(String),
    /// A single frame could not be read; the capture loop retries
    TransientReadFailure(String),
    /// The device only offers pixel formats we cannot convert; preview is
    /// disabled as for `DeviceUnavailable`
    UnsupportedFormat(String),
}

/// Snapshot errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoError {
    /// Shutter pressed before the first frame arrived
    NoFrameAvailable,
    /// No free file name within the search bound
    NameSpaceExhausted { attempts: u32 },
    /// I/O or encoding error while writing the snapshot
    WriteFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Photo(e) => write!(f, "Photo error: {}", e),
            AppError::ConfigUnreadable(msg) => write!(f, "Configuration unreadable: {}", msg),
            AppError::ConfigWrite(msg) => write!(f, "Failed to write configuration: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::DeviceUnavailable(msg) => write!(f, "Camera unavailable: {}", msg),
            CameraError::TransientReadFailure(msg) => write!(f, "Frame read failed: {}", msg),
            CameraError::UnsupportedFormat(fourcc) => {
                write!(f, "Unsupported pixel format: {}", fourcc)
            }
        }
    }
}

impl fmt::Display for PhotoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoError::NoFrameAvailable => write!(f, "No frame available for capture"),
            PhotoError::NameSpaceExhausted { attempts } => {
                write!(f, "No free file name after {} attempts", attempts)
            }
            PhotoError::WriteFailed(msg) => write!(f, "Save failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for PhotoError {}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<PhotoError> for AppError {
    fn from(err: PhotoError) -> Self {
        AppError::Photo(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for PhotoError {
    fn from(err: std::io::Error) -> Self {
        PhotoError::WriteFailed(err.to_string())
    }
}

impl From<image::ImageError> for PhotoError {
    fn from(err: image::ImageError) -> Self {
        PhotoError::WriteFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_display() {
        let err: AppError = PhotoError::NameSpaceExhausted { attempts: 3 }.into();
        assert_eq!(
            err.to_string(),
            "Photo error: No free file name after 3 attempts"
        );
    }

    #[test]
    fn test_io_error_becomes_write_failed() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = PhotoError::from(io);
        assert!(matches!(err, PhotoError::WriteFailed(ref msg) if msg.contains("denied")));
    }
}
