// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion to RGB
//!
//! Every frame leaving the capture loop is tightly packed RGB24. Devices hand
//! us whatever they negotiated; this module normalizes it.

use super::types::{Frame, PixelFormat, RawFrame};
use crate::errors::CameraError;

/// Convert a raw device frame into an RGB frame
pub fn to_rgb(raw: &RawFrame) -> Result<Frame, CameraError> {
    let rgb = match raw.format {
        PixelFormat::MJPEG => return decode_mjpeg(&raw.data),
        PixelFormat::RGB24 => repack_rows(raw, 3, |px, out| out.extend_from_slice(px))?,
        PixelFormat::BGR24 => repack_rows(raw, 3, |px, out| {
            out.extend_from_slice(&[px[2], px[1], px[0]])
        })?,
        PixelFormat::RGBA => repack_rows(raw, 4, |px, out| out.extend_from_slice(&px[..3]))?,
        PixelFormat::BGRA => repack_rows(raw, 4, |px, out| {
            out.extend_from_slice(&[px[2], px[1], px[0]])
        })?,
        PixelFormat::Gray8 => repack_rows(raw, 1, |px, out| {
            out.extend_from_slice(&[px[0], px[0], px[0]])
        })?,
        PixelFormat::YUYV => repack_pairs(raw, |chunk| (chunk[0], chunk[2], chunk[1], chunk[3]))?,
        PixelFormat::UYVY => repack_pairs(raw, |chunk| (chunk[1], chunk[3], chunk[0], chunk[2]))?,
    };

    Frame::from_rgb(raw.width, raw.height, rgb).ok_or_else(|| {
        CameraError::TransientReadFailure(format!(
            "converted {} frame has unexpected size",
            raw.format
        ))
    })
}

/// Decode a Motion JPEG frame
pub fn decode_mjpeg(data: &[u8]) -> Result<Frame, CameraError> {
    let decoded = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
        .map_err(|e| CameraError::TransientReadFailure(format!("MJPEG decode failed: {}", e)))?;
    Ok(Frame::from_image(decoded.to_rgb8()))
}

/// Check that `raw.data` holds `height` rows of at least `row_bytes` at `raw.stride`
fn row_stride(raw: &RawFrame, row_bytes: usize) -> Result<usize, CameraError> {
    let stride = (raw.stride as usize).max(row_bytes);
    let needed = stride * (raw.height as usize - 1) + row_bytes;
    if raw.width == 0 || raw.height == 0 || raw.data.len() < needed {
        return Err(CameraError::TransientReadFailure(format!(
            "short {} frame: {} bytes, expected {}",
            raw.format,
            raw.data.len(),
            needed
        )));
    }
    Ok(stride)
}

/// Walk pixels row by row, honoring the stride
fn repack_rows<F>(raw: &RawFrame, bpp: usize, mut convert: F) -> Result<Vec<u8>, CameraError>
where
    F: FnMut(&[u8], &mut Vec<u8>),
{
    if raw.height == 0 {
        return Err(CameraError::TransientReadFailure("empty frame".to_string()));
    }
    let row_bytes = raw.width as usize * bpp;
    let stride = row_stride(raw, row_bytes)?;
    let mut out = Vec::with_capacity(raw.width as usize * raw.height as usize * 3);

    for row in raw.data.chunks(stride).take(raw.height as usize) {
        for px in row[..row_bytes].chunks_exact(bpp) {
            convert(px, &mut out);
        }
    }
    Ok(out)
}

/// Packed 4:2:2 formats: each 4-byte group encodes two pixels sharing chroma.
/// `split` returns (y0, y1, u, v) for one group.
fn repack_pairs<F>(raw: &RawFrame, split: F) -> Result<Vec<u8>, CameraError>
where
    F: Fn(&[u8]) -> (u8, u8, u8, u8),
{
    if raw.height == 0 {
        return Err(CameraError::TransientReadFailure("empty frame".to_string()));
    }
    let width = raw.width as usize;
    let row_bytes = width.div_ceil(2) * 4;
    let stride = row_stride(raw, row_bytes)?;
    let mut out = Vec::with_capacity(width * raw.height as usize * 3);

    for row in raw.data.chunks(stride).take(raw.height as usize) {
        let mut written = 0;
        for chunk in row[..row_bytes].chunks_exact(4) {
            let (y0, y1, u, v) = split(chunk);
            for y in [y0, y1] {
                // Odd widths: the last group carries one padding pixel
                if written == width {
                    break;
                }
                out.extend_from_slice(&yuv_to_rgb(y, u, v));
                written += 1;
            }
        }
    }
    Ok(out)
}

/// Convert YUV (BT.601) to RGB
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    [r, g, b]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(format: PixelFormat, width: u32, height: u32, stride: u32, data: Vec<u8>) -> RawFrame {
        RawFrame {
            width,
            height,
            stride,
            format,
            data,
        }
    }

    #[test]
    fn test_bgr_is_swapped() {
        let frame = to_rgb(&raw(PixelFormat::BGR24, 1, 1, 3, vec![10, 20, 30])).unwrap();
        assert_eq!(frame.data(), &[30, 20, 10]);
    }

    #[test]
    fn test_stride_padding_is_dropped() {
        // 1x2 RGB with 2 bytes of row padding
        let data = vec![1, 2, 3, 0, 0, 4, 5, 6, 0, 0];
        let frame = to_rgb(&raw(PixelFormat::RGB24, 1, 2, 5, data)).unwrap();
        assert_eq!(frame.data(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_bgra_drops_alpha() {
        let frame = to_rgb(&raw(PixelFormat::BGRA, 1, 1, 4, vec![1, 2, 3, 255])).unwrap();
        assert_eq!(frame.data(), &[3, 2, 1]);
    }

    #[test]
    fn test_yuyv_gray() {
        // Neutral chroma gives gray pixels equal to luma
        let frame = to_rgb(&raw(PixelFormat::YUYV, 2, 1, 4, vec![100, 128, 200, 128])).unwrap();
        assert_eq!(frame.data(), &[100, 100, 100, 200, 200, 200]);
    }

    #[test]
    fn test_uyvy_gray() {
        let frame = to_rgb(&raw(PixelFormat::UYVY, 2, 1, 4, vec![128, 50, 128, 60])).unwrap();
        assert_eq!(frame.data(), &[50, 50, 50, 60, 60, 60]);
    }

    #[test]
    fn test_short_buffer_is_transient() {
        let err = to_rgb(&raw(PixelFormat::RGB24, 2, 2, 6, vec![0; 5])).unwrap_err();
        assert!(matches!(err, CameraError::TransientReadFailure(_)));
    }

    #[test]
    fn test_corrupt_mjpeg_is_transient() {
        let err = to_rgb(&raw(PixelFormat::MJPEG, 2, 2, 0, vec![0xFF, 0xD8, 0x00])).unwrap_err();
        assert!(matches!(err, CameraError::TransientReadFailure(_)));
    }

    #[test]
    fn test_mjpeg_decodes() {
        let mut jpeg = Vec::new();
        image::RgbImage::from_pixel(4, 2, image::Rgb([200, 10, 10]))
            .write_to(&mut std::io::Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .unwrap();

        let frame = to_rgb(&raw(PixelFormat::MJPEG, 4, 2, 0, jpeg)).unwrap();
        assert_eq!((frame.width, frame.height), (4, 2));
        assert!(frame.data()[0] > 150);
    }
}
