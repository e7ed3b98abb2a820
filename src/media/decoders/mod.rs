// SPDX-License-Identifier: GPL-3.0-only

//! Image decoding
//!
//! Everything downstream works on [`DecodedImage`]: interleaved float pixels,
//! dimensions, channel count and named metadata attributes. OpenEXR files are
//! read with the `exr` crate so that arbitrary channel layouts and custom
//! header attributes (camera metadata of depth maps) survive; every other
//! format goes through the `image` crate.

mod exr_reader;
mod raster;

use crate::errors::DecodeError;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Precision of the samples stored in the source file
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SampleDepth {
    U8,
    U16,
    F16,
    F32,
}

impl SampleDepth {
    /// Whether the source needs more than 8 bits per channel
    pub fn is_high_precision(&self) -> bool {
        !matches!(self, SampleDepth::U8)
    }
}

/// Color space the pixel values are expressed in
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ColorSpace {
    #[default]
    Srgb,
    Linear,
}

/// Fixed decoder configuration
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DecodeConfig {
    /// Apply EXIF orientation while decoding
    pub apply_orientation: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            apply_orientation: true,
        }
    }
}

/// Typed metadata attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Doubles(Vec<f64>),
    Floats(Vec<f32>),
    Int(i64),
    Text(String),
}

impl AttributeValue {
    /// Numeric values widened to f64
    pub fn as_doubles(&self) -> Option<Vec<f64>> {
        match self {
            AttributeValue::Doubles(v) => Some(v.clone()),
            AttributeValue::Floats(v) => Some(v.iter().map(|&f| f as f64).collect()),
            AttributeValue::Int(i) => Some(vec![*i as f64]),
            AttributeValue::Text(_) => None,
        }
    }
}

/// Named metadata attributes of an image
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    attributes: BTreeMap<String, AttributeValue>,
}

impl Metadata {
    pub fn insert(&mut self, name: impl Into<String>, value: AttributeValue) {
        self.attributes.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn doubles(&self, name: &str) -> Option<Vec<f64>> {
        self.get(name).and_then(AttributeValue::as_doubles)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Per-channel min/max over finite samples
#[derive(Debug, Clone, PartialEq)]
pub struct PixelStats {
    pub min: Vec<f32>,
    pub max: Vec<f32>,
}

impl PixelStats {
    /// Map `value` into [0, 1] using the channel range
    ///
    /// A constant channel (max == min) maps everything to 1.0.
    pub fn normalize(&self, channel: usize, value: f32) -> f32 {
        let range = self.max[channel] - self.min[channel];
        if range != 0.0 {
            (value - self.min[channel]) / range
        } else {
            1.0
        }
    }
}

/// Fully decoded image held in memory
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub channels: usize,
    /// Interleaved samples, normalized to [0, 1] for integer sources
    pub pixels: Vec<f32>,
    pub sample_depth: SampleDepth,
    pub color_space: ColorSpace,
    /// Width / height of one pixel
    pub pixel_aspect: f32,
    pub metadata: Metadata,
}

impl DecodedImage {
    /// Build an image from interleaved samples
    pub fn new(
        width: u32,
        height: u32,
        channels: usize,
        pixels: Vec<f32>,
        sample_depth: SampleDepth,
    ) -> Result<Self, DecodeError> {
        let expected = width as usize * height as usize * channels;
        if channels == 0 || pixels.len() != expected {
            return Err(DecodeError::InvalidPixelData(format!(
                "{}x{}x{} image needs {} samples, got {}",
                width,
                height,
                channels,
                expected,
                pixels.len()
            )));
        }
        let color_space = match sample_depth {
            SampleDepth::F16 | SampleDepth::F32 => ColorSpace::Linear,
            SampleDepth::U8 | SampleDepth::U16 => ColorSpace::Srgb,
        };
        Ok(Self {
            width,
            height,
            channels,
            pixels,
            sample_depth,
            color_space,
            pixel_aspect: 1.0,
            metadata: Metadata::default(),
        })
    }

    /// Single-channel float image, the usual depth-map layout
    pub fn from_luma_f32(width: u32, height: u32, pixels: Vec<f32>) -> Result<Self, DecodeError> {
        Self::new(width, height, 1, pixels, SampleDepth::F32)
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.metadata.insert(name, value);
        self
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// All channels of one pixel
    pub fn pixel(&self, x: u32, y: u32) -> &[f32] {
        let start = (y as usize * self.width as usize + x as usize) * self.channels;
        &self.pixels[start..start + self.channels]
    }

    /// First channel of one pixel
    pub fn sample(&self, x: u32, y: u32) -> f32 {
        self.pixels[(y as usize * self.width as usize + x as usize) * self.channels]
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.metadata.get(name)
    }

    pub fn same_size(&self, other: &DecodedImage) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Per-channel min/max, ignoring NaN and infinities
    ///
    /// A channel without any finite sample reports min = max = 0.
    pub fn global_stats(&self) -> PixelStats {
        let mut min = vec![f32::INFINITY; self.channels];
        let mut max = vec![f32::NEG_INFINITY; self.channels];

        for pixel in self.pixels.chunks_exact(self.channels) {
            for (c, &v) in pixel.iter().enumerate() {
                if v.is_finite() {
                    min[c] = min[c].min(v);
                    max[c] = max[c].max(v);
                }
            }
        }

        for c in 0..self.channels {
            if min[c] > max[c] {
                min[c] = 0.0;
                max[c] = 0.0;
            }
        }

        PixelStats { min, max }
    }
}

fn is_exr(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("exr"))
        .unwrap_or(false)
}

/// Decode an image file
pub fn open(path: &Path, config: &DecodeConfig) -> Result<DecodedImage, DecodeError> {
    debug!(path = %path.display(), "Decoding image");

    let image = if is_exr(path) {
        exr_reader::read_exr(path)?
    } else {
        raster::read_raster(path, config)?
    };

    info!(
        path = %path.display(),
        width = image.width,
        height = image.height,
        channels = image.channels,
        attributes = image.metadata.len(),
        "Image decoded"
    );

    Ok(image)
}

/// Read only the image dimensions
pub fn image_dimensions(path: &Path) -> Result<(u32, u32), DecodeError> {
    if is_exr(path) {
        exr_reader::exr_dimensions(path)
    } else {
        image::image_dimensions(path).map_err(|e| DecodeError::OpenFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}
