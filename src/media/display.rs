// SPDX-License-Identifier: GPL-3.0-only

//! Decode adapter for 2D display
//!
//! Produces a [`PixelBuffer`] from any decodable image:
//! - color images are converted to sRGB and reordered to the display layout
//! - single-channel images are colorized with a colormap or kept as gray
//! - non-square pixels are corrected, then an optional target size is
//!   applied keeping the aspect ratio
//!
//! 8-bit sources produce 8-bit containers, everything else 16-bit ones.

use super::decoders::{self, ColorSpace, DecodeConfig, DecodedImage};
use super::formats::conversions::{linear_to_srgb, quantize_u8, quantize_u16};
use super::formats::{PixelBuffer, PixelData, PixelFormat};
use crate::constants::ATTR_CAMERA_CENTER;
use crate::depth::{ColormapKind, ImageRole, RoleMarkers};
use crate::errors::DecodeError;
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma, Rgba};
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info};

type GrayF32 = ImageBuffer<Luma<f32>, Vec<f32>>;
type RgbaF32 = ImageBuffer<Rgba<f32>, Vec<f32>>;

/// Caller-controlled display options
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayOptions {
    /// Colorize single-channel images instead of showing them as gray
    pub colormap_grayscale: bool,
    pub colormap: ColormapKind,
    /// Use this role instead of detecting it from name and metadata
    pub role_override: Option<ImageRole>,
    pub markers: RoleMarkers,
    /// Fit the result into this size, keeping the aspect ratio
    pub scaled_size: Option<(u32, u32)>,
    pub decode: DecodeConfig,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            colormap_grayscale: true,
            colormap: ColormapKind::default(),
            role_override: None,
            markers: RoleMarkers::default(),
            scaled_size: None,
            decode: DecodeConfig::default(),
        }
    }
}

/// Float image in display channel layout
enum Working {
    Gray(GrayF32),
    /// Color, with `has_alpha` false for opaque sources
    Color { image: RgbaF32, has_alpha: bool },
}

impl Working {
    fn dimensions(&self) -> (u32, u32) {
        match self {
            Working::Gray(img) => img.dimensions(),
            Working::Color { image, .. } => image.dimensions(),
        }
    }

    fn resize(self, width: u32, height: u32) -> Self {
        if self.dimensions() == (width, height) {
            return self;
        }
        match self {
            Working::Gray(img) => {
                Working::Gray(imageops::resize(&img, width, height, FilterType::Triangle))
            }
            Working::Color { image, has_alpha } => Working::Color {
                image: imageops::resize(&image, width, height, FilterType::Triangle),
                has_alpha,
            },
        }
    }
}

/// Decode a file and prepare it for display
pub fn decode_for_display(path: &Path, options: &DisplayOptions) -> Result<PixelBuffer, DecodeError> {
    let image = decoders::open(path, &options.decode)?;
    let role = options.role_override.unwrap_or_else(|| {
        options
            .markers
            .classify(path, image.metadata.contains(ATTR_CAMERA_CENTER))
    });
    debug!(path = %path.display(), %role, "Image role");

    let buffer = render_for_display(&image, role, options).map_err(|e| match e {
        DecodeError::UnsupportedChannelCount { channels, .. } => {
            DecodeError::UnsupportedChannelCount {
                path: path.display().to_string(),
                channels,
            }
        }
        other => other,
    })?;

    info!(
        path = %path.display(),
        width = buffer.width,
        height = buffer.height,
        format = %buffer.format,
        "Image ready for display"
    );

    Ok(buffer)
}

/// Convert a decoded image to a display buffer
pub fn render_for_display(
    image: &DecodedImage,
    role: ImageRole,
    options: &DisplayOptions,
) -> Result<PixelBuffer, DecodeError> {
    if image.width == 0 || image.height == 0 {
        return Err(DecodeError::InvalidSize {
            width: image.width,
            height: image.height,
        });
    }

    let working = match image.channels {
        1 if options.colormap_grayscale => Working::Color {
            image: colorize(image, role, options.colormap)?,
            has_alpha: false,
        },
        1 => Working::Gray(to_gray(image)?),
        3 | 4 => Working::Color {
            image: to_display_rgba(image)?,
            has_alpha: image.channels == 4,
        },
        channels => {
            return Err(DecodeError::UnsupportedChannelCount {
                path: String::new(),
                channels,
            });
        }
    };

    let working = correct_pixel_aspect(working, image.pixel_aspect);
    let working = match options.scaled_size {
        Some(target) => {
            let (w, h) = fit_within(working.dimensions(), target);
            working.resize(w, h)
        }
        None => working,
    };

    quantize(working, image.sample_depth.is_high_precision())
}

/// Colorize the first channel
///
/// Depth and confidence maps are normalized by their global range; plain
/// images are mapped raw. Only confidence maps use the clamping jet variant.
fn colorize(
    image: &DecodedImage,
    role: ImageRole,
    colormap: ColormapKind,
) -> Result<RgbaF32, DecodeError> {
    let stats = role.uses_global_stats().then(|| image.global_stats());
    let clamp = role.clamps();
    let width = image.width as usize;

    let mut data = vec![0.0f32; image.pixel_count() * 4];
    data.par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let value = image.sample(x as u32, y as u32);
                let value = match &stats {
                    Some(stats) => stats.normalize(0, value),
                    None => value,
                };
                let color = colormap.color(value, clamp);
                px.copy_from_slice(&[color.r(), color.g(), color.b(), 1.0]);
            }
        });

    rgba_buffer(image.width, image.height, data)
}

fn to_gray(image: &DecodedImage) -> Result<GrayF32, DecodeError> {
    ImageBuffer::from_raw(image.width, image.height, image.pixels.clone())
        .ok_or_else(|| DecodeError::InvalidPixelData("gray buffer size mismatch".to_string()))
}

/// RGB(A) in sRGB with an alpha channel, opaque when the source has none
fn to_display_rgba(image: &DecodedImage) -> Result<RgbaF32, DecodeError> {
    let convert = image.color_space != ColorSpace::Srgb;
    let mut data = Vec::with_capacity(image.pixel_count() * 4);

    for px in image.pixels.chunks_exact(image.channels) {
        for &v in &px[..3] {
            data.push(if convert { linear_to_srgb(v) } else { v });
        }
        data.push(if image.channels == 4 { px[3] } else { 1.0 });
    }

    rgba_buffer(image.width, image.height, data)
}

fn rgba_buffer(width: u32, height: u32, data: Vec<f32>) -> Result<RgbaF32, DecodeError> {
    ImageBuffer::from_raw(width, height, data)
        .ok_or_else(|| DecodeError::InvalidPixelData("color buffer size mismatch".to_string()))
}

/// Stretch the width so pixels become square
fn correct_pixel_aspect(working: Working, pixel_aspect: f32) -> Working {
    if !pixel_aspect.is_finite() || pixel_aspect <= 0.0 || pixel_aspect == 1.0 {
        return working;
    }
    let (w, h) = working.dimensions();
    let corrected = ((w as f32 * pixel_aspect).round() as u32).max(1);
    debug!(pixel_aspect, from = w, to = corrected, "Correcting pixel aspect ratio");
    working.resize(corrected, h)
}

/// Largest size with the source aspect ratio fitting inside `target`
///
/// A zero target dimension leaves the size unchanged.
pub fn fit_within(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (sw, sh) = (source.0 as u64, source.1 as u64);
    let (tw, th) = (target.0 as u64, target.1 as u64);
    if sw == 0 || sh == 0 || tw == 0 || th == 0 {
        return source;
    }
    let width_at_target_height = th * sw / sh;
    let (w, h) = if width_at_target_height <= tw {
        (width_at_target_height, th)
    } else {
        (tw, tw * sh / sw)
    };
    (w.max(1) as u32, h.max(1) as u32)
}

/// Write the final container; 8-bit color is stored B, G, R, A
fn quantize(working: Working, high_precision: bool) -> Result<PixelBuffer, DecodeError> {
    let (width, height) = working.dimensions();
    let (channels, samples) = match working {
        Working::Gray(img) => (1, img.into_raw()),
        Working::Color { image, has_alpha } => (if has_alpha { 4 } else { 3 }, image.into_raw()),
    };
    let format = PixelFormat::for_channels(channels, high_precision).ok_or_else(|| {
        DecodeError::InvalidPixelData(format!("no display format for {} channels", channels))
    })?;
    let color = format.channels() == 4;

    let data = if format.is_16bit() {
        let mut data: Vec<u16> = samples.into_iter().map(quantize_u16).collect();
        if color && !format.has_alpha() {
            data.chunks_exact_mut(4).for_each(|px| px[3] = u16::MAX);
        }
        PixelData::U16(data)
    } else {
        let mut data: Vec<u8> = samples.into_iter().map(quantize_u8).collect();
        if color {
            for px in data.chunks_exact_mut(4) {
                px.swap(0, 2);
                if !format.has_alpha() {
                    px[3] = u8::MAX;
                }
            }
        }
        PixelData::U8(data)
    };

    Ok(PixelBuffer {
        width,
        height,
        format,
        data,
    })
}
