// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use image::RgbImage;
use std::path::PathBuf;
use std::sync::Arc;

/// Pixel layout of a frame as delivered by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 24-bit R G B
    RGB24,
    /// 24-bit B G R (OpenCV/most webcam native order)
    BGR24,
    /// 32-bit R G B A
    RGBA,
    /// 32-bit B G R A
    BGRA,
    /// Packed 4:2:2, Y0 U Y1 V
    YUYV,
    /// Packed 4:2:2, U Y0 V Y1
    UYVY,
    /// 8-bit grayscale
    Gray8,
    /// Motion JPEG, one compressed image per frame
    MJPEG,
}

impl PixelFormat {
    /// Formats in the order the V4L2 backend tries them
    pub const PREFERENCE: [PixelFormat; 8] = [
        PixelFormat::MJPEG,
        PixelFormat::YUYV,
        PixelFormat::RGB24,
        PixelFormat::BGR24,
        PixelFormat::UYVY,
        PixelFormat::RGBA,
        PixelFormat::BGRA,
        PixelFormat::Gray8,
    ];

    /// V4L2 FourCC code for this format
    pub fn fourcc(&self) -> &'static [u8; 4] {
        match self {
            Self::RGB24 => b"RGB3",
            Self::BGR24 => b"BGR3",
            Self::RGBA => b"AB24",
            Self::BGRA => b"AR24",
            Self::YUYV => b"YUYV",
            Self::UYVY => b"UYVY",
            Self::Gray8 => b"GREY",
            Self::MJPEG => b"MJPG",
        }
    }

    /// Parse a V4L2 FourCC code
    pub fn from_fourcc(fourcc: &[u8; 4]) -> Option<Self> {
        match fourcc {
            b"RGB3" => Some(Self::RGB24),
            b"BGR3" => Some(Self::BGR24),
            b"AB24" | b"RA24" => Some(Self::RGBA),
            b"AR24" | b"BA24" => Some(Self::BGRA),
            b"YUYV" | b"YUY2" => Some(Self::YUYV),
            b"UYVY" => Some(Self::UYVY),
            b"GREY" | b"Y800" => Some(Self::Gray8),
            b"MJPG" | b"JPEG" => Some(Self::MJPEG),
            _ => None,
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.fourcc()))
    }
}

/// A frame exactly as read from the device, before color conversion
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    /// Bytes per row including padding (ignored for MJPEG)
    pub stride: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

/// A camera frame in RGB order, ready for display and saving
///
/// Pixel data is shared, so cloning a frame to hand it to another thread
/// does not copy the image.
#[derive(Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    data: Arc<[u8]>,
}

impl Frame {
    /// Wrap tightly packed RGB24 data; None if the buffer size does not match
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 || data.len() != (width * height * 3) as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            data: Arc::from(data),
        })
    }

    pub fn from_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: Arc::from(image.into_raw()),
        }
    }

    /// Tightly packed RGB24 bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Copy into an owned image buffer
    pub fn to_image(&self) -> RgbImage {
        // The buffer length is checked when the frame is built
        RgbImage::from_raw(self.width, self.height, self.data.to_vec())
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// A V4L2 capture device found during enumeration
#[derive(Debug, Clone)]
pub struct CameraInfo {
    /// Position in the enumeration order (what `--device <index>` refers to)
    pub index: usize,
    /// Device node, e.g. /dev/video0
    pub path: PathBuf,
    /// V4L2 card name
    pub card: String,
    /// V4L2 driver name
    pub driver: String,
    /// FourCC codes the device offers for video capture
    pub formats: Vec<String>,
}
