// SPDX-License-Identifier: GPL-3.0-only

//! Raster formats decoded through the `image` crate

use super::{DecodeConfig, DecodedImage, SampleDepth};
use crate::errors::DecodeError;
use image::{DynamicImage, ImageDecoder, ImageReader};
use std::path::Path;
use tracing::debug;

pub(super) fn read_raster(path: &Path, config: &DecodeConfig) -> Result<DecodedImage, DecodeError> {
    let open_failed = |reason: String| DecodeError::OpenFailed {
        path: path.display().to_string(),
        reason,
    };

    let reader = ImageReader::open(path)
        .map_err(|e| open_failed(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| open_failed(e.to_string()))?;
    let mut decoder = reader.into_decoder().map_err(|e| open_failed(e.to_string()))?;
    let orientation = decoder
        .orientation()
        .map_err(|e| open_failed(e.to_string()))?;
    let mut img = DynamicImage::from_decoder(decoder).map_err(|e| open_failed(e.to_string()))?;

    if config.apply_orientation {
        debug!(?orientation, "Applying image orientation");
        img.apply_orientation(orientation);
    }

    from_dynamic(img)
}

/// Convert an `image` crate buffer to normalized float samples
pub(super) fn from_dynamic(img: DynamicImage) -> Result<DecodedImage, DecodeError> {
    let sample_depth = match &img {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_) => SampleDepth::U8,
        DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_) => SampleDepth::U16,
        _ => SampleDepth::F32,
    };

    let (width, height) = (img.width(), img.height());
    let channels = img.color().channel_count() as usize;
    let pixels = match channels {
        1 => img.to_luma32f().into_raw(),
        2 => img.to_luma_alpha32f().into_raw(),
        3 => img.to_rgb32f().into_raw(),
        _ => img.to_rgba32f().into_raw(),
    };

    DecodedImage::new(width, height, channels.min(4), pixels, sample_depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::decoders::ColorSpace;
    use image::{GrayImage, ImageBuffer, Luma, RgbImage};

    #[test]
    fn test_from_gray8() {
        let img = GrayImage::from_raw(2, 1, vec![0, 255]).unwrap();
        let decoded = from_dynamic(DynamicImage::ImageLuma8(img)).unwrap();
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.sample_depth, SampleDepth::U8);
        assert_eq!(decoded.pixels, vec![0.0, 1.0]);
        assert_eq!(decoded.color_space, ColorSpace::Srgb);
    }

    #[test]
    fn test_from_gray16() {
        let img: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_raw(1, 1, vec![65535]).unwrap();
        let decoded = from_dynamic(DynamicImage::ImageLuma16(img)).unwrap();
        assert_eq!(decoded.sample_depth, SampleDepth::U16);
        assert_eq!(decoded.pixels, vec![1.0]);
    }

    #[test]
    fn test_from_rgb8() {
        let img = RgbImage::from_raw(1, 1, vec![255, 0, 255]).unwrap();
        let decoded = from_dynamic(DynamicImage::ImageRgb8(img)).unwrap();
        assert_eq!(decoded.channels, 3);
        assert_eq!(decoded.pixel(0, 0), &[1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_read_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        GrayImage::from_raw(3, 2, vec![0, 51, 102, 153, 204, 255])
            .unwrap()
            .save(&path)
            .unwrap();

        let decoded = read_raster(&path, &DecodeConfig::default()).unwrap();
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert!((decoded.sample(1, 0) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_missing_file_fails() {
        let err = read_raster(Path::new("/nonexistent/image.png"), &DecodeConfig::default());
        assert!(matches!(err, Err(DecodeError::OpenFailed { .. })));
    }
}
