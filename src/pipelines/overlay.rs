// SPDX-License-Identifier: GPL-3.0-only

//! Overlay compositor
//!
//! Draws the previous snapshot over the live frame so a new picture can be
//! lined up with yesterday's. The reference is scaled to fit the live frame
//! (aspect preserved, centered) and blended with `alpha = opacity / 100`.
//! Outside the scaled reference the live frame shows through unchanged.

use crate::backends::camera::Frame;
use crate::config::Opacity;
use crate::constants::opacity;
use image::RgbImage;
use image::imageops::{self, FilterType};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Largest size with the aspect ratio of `src` that fits inside `bounds`
pub fn fit_within(src: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (sw, sh) = src;
    let (bw, bh) = bounds;
    if sw == 0 || sh == 0 || bw == 0 || bh == 0 {
        return (0, 0);
    }

    // Compare sw/sh with bw/bh without floating point
    if sw as u64 * bh as u64 >= sh as u64 * bw as u64 {
        let h = ((sh as u64 * bw as u64) / sw as u64).max(1) as u32;
        (bw, h)
    } else {
        let w = ((sw as u64 * bh as u64) / sh as u64).max(1) as u32;
        (w, bh)
    }
}

/// Blend a single channel
fn blend(live: u8, reference: u8, percent: u32) -> u8 {
    let max = opacity::MAX as u32;
    ((live as u32 * (max - percent) + reference as u32 * percent + max / 2) / max) as u8
}

/// Blend an already scaled reference into `out`, centered
fn blend_centered(out: &mut RgbImage, scaled: &RgbImage, opacity: Opacity) {
    let percent = opacity.percent() as u32;
    let (ow, oh) = out.dimensions();
    let (rw, rh) = scaled.dimensions();
    let x0 = ow.saturating_sub(rw) / 2;
    let y0 = oh.saturating_sub(rh) / 2;

    for (x, y, reference) in scaled.enumerate_pixels() {
        let (ox, oy) = (x0 + x, y0 + y);
        if ox >= ow || oy >= oh {
            continue;
        }
        let live = out.get_pixel_mut(ox, oy);
        for c in 0..3 {
            live.0[c] = blend(live.0[c], reference.0[c], percent);
        }
    }
}

fn scale_to_fit(reference: &RgbImage, bounds: (u32, u32)) -> RgbImage {
    let (w, h) = fit_within(reference.dimensions(), bounds);
    if (w, h) == reference.dimensions() {
        return reference.clone();
    }
    imageops::resize(reference, w, h, FilterType::Triangle)
}

/// Compose the live frame with an optional reference picture
///
/// With no reference, or at opacity 0, the result equals the live frame.
/// At opacity 100 the reference replaces the live frame inside the region it
/// covers.
pub fn compose(live: &Frame, reference: Option<&RgbImage>, opacity: Opacity) -> RgbImage {
    let mut out = live.to_image();
    let Some(reference) = reference else {
        return out;
    };
    if opacity == Opacity::TRANSPARENT {
        return out;
    }

    let scaled = scale_to_fit(reference, (live.width, live.height));
    blend_centered(&mut out, &scaled, opacity);
    out
}

/// Holds the reference picture and its scaled copy between paints
///
/// Scaling runs once per reference and frame size rather than on every
/// frame.
#[derive(Debug, Default)]
pub struct OverlayCompositor {
    reference: Option<(PathBuf, RgbImage)>,
    scaled: Option<RgbImage>,
}

impl OverlayCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the reference picture
    pub fn set_reference(&mut self, path: impl Into<PathBuf>, image: RgbImage) {
        let path = path.into();
        debug!(path = %path.display(), "Overlay reference changed");
        self.reference = Some((path, image));
        self.scaled = None;
    }

    pub fn clear_reference(&mut self) {
        self.reference = None;
        self.scaled = None;
    }

    pub fn reference_path(&self) -> Option<&Path> {
        self.reference.as_ref().map(|(path, _)| path.as_path())
    }

    /// Same result as [`compose`], reusing the cached scaled reference
    pub fn compose(&mut self, live: &Frame, opacity: Opacity) -> RgbImage {
        let mut out = live.to_image();
        let Some((_, reference)) = &self.reference else {
            return out;
        };
        if opacity == Opacity::TRANSPARENT {
            return out;
        }

        let bounds = (live.width, live.height);
        let expected = fit_within(reference.dimensions(), bounds);
        let stale = self
            .scaled
            .as_ref()
            .is_none_or(|scaled| scaled.dimensions() != expected);
        if stale {
            self.scaled = Some(scale_to_fit(reference, bounds));
        }

        if let Some(scaled) = &self.scaled {
            blend_centered(&mut out, scaled, opacity);
        }
        out
    }
}
