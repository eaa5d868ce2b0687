// SPDX-License-Identifier: GPL-3.0-only
//! Pixel conversion for captured frames
//!
//! Capture libraries deliver packed BGR24 frames stored bottom-up. The
//! engine turns them into top-down frames, optionally cropped to a
//! [`FrameRegion`] and optionally reduced to 8-bit grayscale. The four
//! `flip*` functions cover every combination; [`convert_frame`] picks one.
//!
//! The second half of the module holds the helpers capture libraries use to
//! produce the bottom-up BGR24 layout from what their devices emit.

use crate::config::CameraConfig;
use crate::constants::SOURCE_BYTES_PER_PIXEL;

/// Window of the captured image delivered when cropping is enabled
///
/// Coordinates are top-down image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRegion {
    pub xoff: u32,
    pub yoff: u32,
    pub width: u32,
    pub height: u32,
}

impl FrameRegion {
    /// Region covering the whole image
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            xoff: 0,
            yoff: 0,
            width,
            height,
        }
    }

    /// Crop window requested by `config` inside a `width × height` image
    ///
    /// Extents that are unset, zero or larger than the image use the full
    /// extent; unset offsets centre the window; offsets are pulled back so
    /// the window stays inside the image. Without `config.frame` the whole
    /// image is returned.
    pub fn resolve(width: u32, height: u32, config: &CameraConfig) -> Self {
        if !config.frame {
            return Self::full(width, height);
        }

        let extent = |requested: Option<u32>, limit: u32| match requested {
            Some(v) if v > 0 && v <= limit => v,
            _ => limit,
        };
        let frame_width = extent(config.frame_width, width);
        let frame_height = extent(config.frame_height, height);

        let offset = |requested: Option<u32>, size: u32, limit: u32| {
            let max = limit - size;
            requested.map_or(max / 2, |v| v.min(max))
        };

        Self {
            xoff: offset(config.frame_xoff, frame_width, width),
            yoff: offset(config.frame_yoff, frame_height, height),
            width: frame_width,
            height: frame_height,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Integer BT.601 luma of a BGR pixel
#[inline]
fn luma(b: u8, g: u8, r: u8) -> u8 {
    ((r as u32 * 77 + g as u32 * 151 + b as u32 * 28) >> 8) as u8
}

/// Copy a bottom-up frame into `dest` top-down
pub fn flip(width: u32, height: u32, src: &[u8], dest: &mut [u8]) {
    let row_len = width as usize * SOURCE_BYTES_PER_PIXEL;
    let height = height as usize;

    for (y, dest_row) in dest.chunks_exact_mut(row_len).take(height).enumerate() {
        let src_start = (height - 1 - y) * row_len;
        dest_row.copy_from_slice(&src[src_start..src_start + row_len]);
    }
}

/// Copy the `region` window of a bottom-up frame into `dest` top-down
pub fn flip_crop(width: u32, height: u32, region: &FrameRegion, src: &[u8], dest: &mut [u8]) {
    let bpp = SOURCE_BYTES_PER_PIXEL;
    let src_row_len = width as usize * bpp;
    let dest_row_len = region.width as usize * bpp;
    let x_start = region.xoff as usize * bpp;

    for (y, dest_row) in dest
        .chunks_exact_mut(dest_row_len)
        .take(region.height as usize)
        .enumerate()
    {
        let image_row = region.yoff as usize + y;
        let src_start = (height as usize - 1 - image_row) * src_row_len + x_start;
        dest_row.copy_from_slice(&src[src_start..src_start + dest_row_len]);
    }
}

/// Grayscale copy of a bottom-up frame into `dest` top-down
pub fn flip_rgb2gray(width: u32, height: u32, src: &[u8], dest: &mut [u8]) {
    let w = width as usize;
    let height = height as usize;
    let src_row_len = w * SOURCE_BYTES_PER_PIXEL;

    for (y, dest_row) in dest.chunks_exact_mut(w).take(height).enumerate() {
        let src_start = (height - 1 - y) * src_row_len;
        let src_row = &src[src_start..src_start + src_row_len];
        for (gray, px) in dest_row.iter_mut().zip(src_row.chunks_exact(3)) {
            *gray = luma(px[0], px[1], px[2]);
        }
    }
}

/// Grayscale copy of the `region` window of a bottom-up frame
pub fn flip_crop_rgb2gray(
    width: u32,
    height: u32,
    region: &FrameRegion,
    src: &[u8],
    dest: &mut [u8],
) {
    let bpp = SOURCE_BYTES_PER_PIXEL;
    let src_row_len = width as usize * bpp;
    let dest_row_len = region.width as usize;
    let x_start = region.xoff as usize * bpp;

    for (y, dest_row) in dest
        .chunks_exact_mut(dest_row_len)
        .take(region.height as usize)
        .enumerate()
    {
        let image_row = region.yoff as usize + y;
        let src_start = (height as usize - 1 - image_row) * src_row_len + x_start;
        let src_row = &src[src_start..src_start + dest_row_len * bpp];
        for (gray, px) in dest_row.iter_mut().zip(src_row.chunks_exact(3)) {
            *gray = luma(px[0], px[1], px[2]);
        }
    }
}

/// Convert one captured frame into `dest`, returning the bytes written
///
/// `region` selects the cropping paths, `color == false` the grayscale
/// paths.
pub fn convert_frame(
    width: u32,
    height: u32,
    region: Option<&FrameRegion>,
    color: bool,
    src: &[u8],
    dest: &mut [u8],
) -> usize {
    match (region, color) {
        (Some(region), true) => {
            flip_crop(width, height, region, src, dest);
            region.pixel_count() * SOURCE_BYTES_PER_PIXEL
        }
        (Some(region), false) => {
            flip_crop_rgb2gray(width, height, region, src, dest);
            region.pixel_count()
        }
        (None, true) => {
            flip(width, height, src, dest);
            width as usize * height as usize * SOURCE_BYTES_PER_PIXEL
        }
        (None, false) => {
            flip_rgb2gray(width, height, src, dest);
            width as usize * height as usize
        }
    }
}

// ===== Device format helpers =====

/// Convert YUYV (YUV 4:2:2) into bottom-up BGR24
///
/// YUYV format: Y0 U Y1 V - each 4-byte group encodes 2 pixels.
/// Uses BT.601 coefficients. `out` is resized to `width * height * 3`.
pub fn yuyv_to_bgr_bottom_up(data: &[u8], width: u32, height: u32, out: &mut Vec<u8>) {
    let w = width as usize;
    let h = height as usize;
    out.resize(w * h * 3, 0);

    let src_row_len = w * 2;
    let dest_row_len = w * 3;

    for y in 0..h {
        let src_start = y * src_row_len;
        let Some(src_row) = data.get(src_start..src_start + src_row_len) else {
            break;
        };
        let dest_start = (h - 1 - y) * dest_row_len;
        let dest_row = &mut out[dest_start..dest_start + dest_row_len];

        for (chunk, dest_px) in src_row.chunks_exact(4).zip(dest_row.chunks_exact_mut(6)) {
            let y0 = chunk[0] as f32;
            let u = chunk[1] as f32 - 128.0;
            let y1 = chunk[2] as f32;
            let v = chunk[3] as f32 - 128.0;

            for (i, luma) in [y0, y1].into_iter().enumerate() {
                let r = (luma + 1.402 * v).clamp(0.0, 255.0) as u8;
                let g = (luma - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
                let b = (luma + 1.772 * u).clamp(0.0, 255.0) as u8;
                dest_px[i * 3] = b;
                dest_px[i * 3 + 1] = g;
                dest_px[i * 3 + 2] = r;
            }
        }
    }
}

/// Convert top-down RGB24 (e.g. a decoded JPEG) into bottom-up BGR24
pub fn rgb_to_bgr_bottom_up(rgb: &[u8], width: u32, height: u32, out: &mut Vec<u8>) {
    let row_len = width as usize * 3;
    let h = height as usize;
    out.resize(row_len * h, 0);
    if row_len == 0 {
        return;
    }

    for (y, src_row) in rgb.chunks_exact(row_len).take(h).enumerate() {
        let dest_start = (h - 1 - y) * row_len;
        let dest_row = &mut out[dest_start..dest_start + row_len];
        for (d, s) in dest_row.chunks_exact_mut(3).zip(src_row.chunks_exact(3)) {
            d[0] = s[2];
            d[1] = s[1];
            d[2] = s[0];
        }
    }
}

/// Swap BGR24 to RGB24, e.g. before handing a frame to an image encoder
pub fn bgr_to_rgb(bgr: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(bgr.len());
    for chunk in bgr.chunks_exact(3) {
        rgb.push(chunk[2]);
        rgb.push(chunk[1]);
        rgb.push(chunk[0]);
    }
    rgb
}
