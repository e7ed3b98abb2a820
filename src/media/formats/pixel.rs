// SPDX-License-Identifier: GPL-3.0-only

//! Display pixel formats and buffers

use crate::errors::DecodeError;
use image::{DynamicImage, ImageBuffer, Luma, Rgba};
use std::fmt;

/// Container formats produced for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    // ===== 8-bit =====
    /// 32-bit ARGB, stored B, G, R, A in memory
    Argb32,
    /// 32-bit RGB, stored B, G, R, 0xFF in memory
    Rgb32,
    /// 8-bit grayscale
    Grayscale8,

    // ===== 16-bit =====
    /// 16-bit per channel R, G, B, A
    Rgba64,
    /// 16-bit per channel R, G, B, 0xFFFF
    Rgbx64,
    /// 16-bit grayscale
    Grayscale16,
}

impl PixelFormat {
    /// Format for a display channel count and precision
    ///
    /// `channels` is 1 (gray), 3 (opaque color) or 4 (color with alpha).
    pub fn for_channels(channels: usize, high_precision: bool) -> Option<Self> {
        match (channels, high_precision) {
            (1, false) => Some(Self::Grayscale8),
            (3, false) => Some(Self::Rgb32),
            (4, false) => Some(Self::Argb32),
            (1, true) => Some(Self::Grayscale16),
            (3, true) => Some(Self::Rgbx64),
            (4, true) => Some(Self::Rgba64),
            _ => None,
        }
    }

    /// Stored channels per pixel, padding included
    pub fn channels(&self) -> usize {
        match self {
            Self::Grayscale8 | Self::Grayscale16 => 1,
            _ => 4,
        }
    }

    pub fn is_16bit(&self) -> bool {
        matches!(self, Self::Rgba64 | Self::Rgbx64 | Self::Grayscale16)
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, Self::Argb32 | Self::Rgba64)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Argb32 => "ARGB32",
            Self::Rgb32 => "RGB32",
            Self::Grayscale8 => "Grayscale8",
            Self::Rgba64 => "RGBA64",
            Self::Rgbx64 => "RGBX64",
            Self::Grayscale16 => "Grayscale16",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Samples of a display buffer
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    U8(Vec<u8>),
    U16(Vec<u16>),
}

impl PixelData {
    pub fn len(&self) -> usize {
        match self {
            PixelData::U8(v) => v.len(),
            PixelData::U16(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Display-ready image in one of the [`PixelFormat`] layouts
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: PixelData,
}

impl PixelBuffer {
    /// Convert to an `image` buffer in RGBA (or gray) channel order
    pub fn to_dynamic_image(&self) -> Result<DynamicImage, DecodeError> {
        let invalid = || {
            DecodeError::InvalidPixelData(format!(
                "{} buffer of {} samples does not match {}x{}",
                self.format,
                self.data.len(),
                self.width,
                self.height
            ))
        };
        let (w, h) = (self.width, self.height);

        match (&self.data, self.format) {
            (PixelData::U8(data), PixelFormat::Grayscale8) => {
                ImageBuffer::<Luma<u8>, _>::from_raw(w, h, data.clone())
                    .map(DynamicImage::ImageLuma8)
                    .ok_or_else(invalid)
            }
            (PixelData::U8(data), PixelFormat::Argb32 | PixelFormat::Rgb32) => {
                let mut rgba = data.clone();
                for px in rgba.chunks_exact_mut(4) {
                    px.swap(0, 2);
                }
                ImageBuffer::<Rgba<u8>, _>::from_raw(w, h, rgba)
                    .map(DynamicImage::ImageRgba8)
                    .ok_or_else(invalid)
            }
            (PixelData::U16(data), PixelFormat::Grayscale16) => {
                ImageBuffer::<Luma<u16>, _>::from_raw(w, h, data.clone())
                    .map(DynamicImage::ImageLuma16)
                    .ok_or_else(invalid)
            }
            (PixelData::U16(data), PixelFormat::Rgba64 | PixelFormat::Rgbx64) => {
                ImageBuffer::<Rgba<u16>, _>::from_raw(w, h, data.clone())
                    .map(DynamicImage::ImageRgba16)
                    .ok_or_else(invalid)
            }
            _ => Err(invalid()),
        }
    }
}
