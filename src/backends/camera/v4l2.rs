// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera source
//!
//! Opens a `/dev/video*` capture node, negotiates the first pixel format
//! we know how to convert (see [`PixelFormat::PREFERENCE`]) and streams
//! frames through memory-mapped buffers.

use super::FrameSource;
use super::types::{CameraInfo, PixelFormat, RawFrame};
use crate::config::DeviceSelector;
use crate::constants::capture;
use crate::errors::CameraError;
use std::path::PathBuf;
use tracing::{debug, info};
use v4l::buffer::Type;
use v4l::capability::Flags;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

/// An open V4L2 capture device
pub struct V4l2Camera {
    // Declared before `_device` so the stream is torn down first
    stream: Option<MmapStream<'static>>,
    _device: Device,
    path: PathBuf,
    width: u32,
    height: u32,
    stride: u32,
    format: PixelFormat,
}

impl V4l2Camera {
    /// Open the selected device and start streaming
    pub fn open(selector: &DeviceSelector) -> Result<Self, CameraError> {
        let path = resolve_device_path(selector)?;
        info!(path = %path.display(), "Opening camera");

        let mut device = Device::with_path(&path).map_err(|e| {
            CameraError::DeviceUnavailable(format!("{}: {}", path.display(), e))
        })?;

        let offered: Vec<FourCC> = device
            .enum_formats()
            .map_err(|e| CameraError::DeviceUnavailable(format!("{}: {}", path.display(), e)))?
            .into_iter()
            .map(|desc| desc.fourcc)
            .collect();

        let pixel_format = PixelFormat::PREFERENCE
            .into_iter()
            .find(|pf| offered.contains(&FourCC::new(pf.fourcc())))
            .ok_or_else(|| {
                CameraError::UnsupportedFormat(
                    offered
                        .iter()
                        .map(|f| f.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                )
            })?;

        let requested = Format::new(
            capture::PREFERRED_WIDTH,
            capture::PREFERRED_HEIGHT,
            FourCC::new(pixel_format.fourcc()),
        );
        let actual = device.set_format(&requested).map_err(|e| {
            CameraError::DeviceUnavailable(format!("failed to set format: {}", e))
        })?;

        // The driver may substitute another format
        let format = PixelFormat::from_fourcc(&actual.fourcc.repr)
            .ok_or_else(|| CameraError::UnsupportedFormat(actual.fourcc.to_string()))?;

        info!(
            width = actual.width,
            height = actual.height,
            format = %format,
            "Camera format configured"
        );

        let mut stream =
            MmapStream::with_buffers(&mut device, Type::VideoCapture, capture::V4L2_BUFFER_COUNT)
                .map_err(|e| {
                    CameraError::DeviceUnavailable(format!("failed to create stream: {}", e))
                })?;
        stream.set_timeout(capture::READ_TIMEOUT);

        Ok(Self {
            stream: Some(stream),
            _device: device,
            path,
            width: actual.width,
            height: actual.height,
            stride: actual.stride,
            format,
        })
    }
}

impl FrameSource for V4l2Camera {
    fn read_frame(&mut self) -> Result<RawFrame, CameraError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| CameraError::DeviceUnavailable("stream released".to_string()))?;

        let (buf, meta) = stream
            .next()
            .map_err(|e| CameraError::TransientReadFailure(e.to_string()))?;

        let used = (meta.bytesused as usize).min(buf.len());
        if used == 0 {
            return Err(CameraError::TransientReadFailure("empty buffer".to_string()));
        }

        Ok(RawFrame {
            width: self.width,
            height: self.height,
            stride: self.stride,
            format: self.format,
            data: buf[..used].to_vec(),
        })
    }

    fn release(&mut self) {
        if self.stream.take().is_some() {
            debug!(path = %self.path.display(), "Camera stream stopped");
        }
    }
}

/// Map a device selector to a device node
fn resolve_device_path(selector: &DeviceSelector) -> Result<PathBuf, CameraError> {
    match selector {
        DeviceSelector::Path(path) => Ok(path.clone()),
        DeviceSelector::Index(index) => {
            let cameras = enumerate_cameras();
            if cameras.is_empty() {
                return Err(CameraError::DeviceUnavailable("no camera found".to_string()));
            }
            cameras
                .into_iter()
                .nth(*index)
                .map(|camera| camera.path)
                .ok_or_else(|| {
                    CameraError::DeviceUnavailable(format!("no camera at index {}", index))
                })
        }
    }
}

/// List video capture devices, ordered by device node number
///
/// Metadata-only nodes (which UVC cameras expose alongside the capture
/// node) are skipped because they offer no capture formats.
pub fn enumerate_cameras() -> Vec<CameraInfo> {
    let mut nodes: Vec<(u32, PathBuf)> = std::fs::read_dir("/dev")
        .into_iter()
        .flatten()
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name();
            let number = name.to_str()?.strip_prefix("video")?.parse::<u32>().ok()?;
            Some((number, entry.path()))
        })
        .collect();
    nodes.sort_by_key(|(number, _)| *number);

    let mut cameras = Vec::new();
    for (_, path) in nodes {
        let Ok(device) = Device::with_path(&path) else {
            continue;
        };
        let Ok(caps) = device.query_caps() else {
            continue;
        };
        if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
            continue;
        }

        let formats: Vec<String> = device
            .enum_formats()
            .unwrap_or_default()
            .into_iter()
            .map(|desc| desc.fourcc.to_string())
            .collect();
        if formats.is_empty() {
            debug!(path = %path.display(), "Skipping node without capture formats");
            continue;
        }

        cameras.push(CameraInfo {
            index: cameras.len(),
            path,
            card: caps.card,
            driver: caps.driver,
            formats,
        });
    }

    cameras
}
