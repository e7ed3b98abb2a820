// SPDX-License-Identifier: GPL-3.0-only

//! OpenEXR decoding
//!
//! Reads the first valid layer with all of its channels and header
//! attributes. Double-precision vector and matrix attributes (`v2d`, `v3d`,
//! `m33d`, `m44d`) are not interpreted by `exr` and arrive as raw bytes;
//! they are decoded here as little-endian f64 values.

use super::{AttributeValue, DecodedImage, Metadata, SampleDepth};
use crate::errors::DecodeError;
use exr::image::{AnyChannel, FlatSamples};
use exr::meta::attribute::{AttributeValue as ExrAttribute, Text};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Custom attribute kinds holding little-endian doubles
const DOUBLE_KINDS: [&str; 4] = ["v2d", "v3d", "m33d", "m44d"];

pub(super) fn read_exr(path: &Path) -> Result<DecodedImage, DecodeError> {
    // Reader builder traits
    use exr::prelude::*;

    let open_failed = |reason: String| DecodeError::OpenFailed {
        path: path.display().to_string(),
        reason,
    };

    let image = read()
        .no_deep_data()
        .largest_resolution_level()
        .all_channels()
        .first_valid_layer()
        .all_attributes()
        .from_file(path)
        .map_err(|e| open_failed(e.to_string()))?;

    let layer = &image.layer_data;
    let width = layer.size.0;
    let height = layer.size.1;

    let channels = ordered_channels(&layer.channel_data.list);
    let pixel_count = width * height;

    let mut sample_depth = SampleDepth::F32;
    let mut pixels = vec![0.0f32; pixel_count * channels.len()];
    for (c, channel) in channels.iter().enumerate() {
        let samples: Vec<f32> = match &channel.sample_data {
            FlatSamples::F16(values) => {
                sample_depth = SampleDepth::F16;
                values.iter().map(|v| v.to_f32()).collect()
            }
            FlatSamples::F32(values) => values.clone(),
            FlatSamples::U32(values) => values.iter().map(|&v| v as f32).collect(),
        };
        if samples.len() != pixel_count {
            return Err(DecodeError::InvalidPixelData(format!(
                "channel {} has {} samples, expected {}",
                channel.name.to_string(),
                samples.len(),
                pixel_count
            )));
        }
        for (i, v) in samples.into_iter().enumerate() {
            pixels[i * channels.len() + c] = v;
        }
    }

    let mut metadata = Metadata::default();
    collect_attributes(&image.attributes.other, &mut metadata);
    collect_attributes(&layer.attributes.other, &mut metadata);

    let mut decoded = DecodedImage::new(
        width as u32,
        height as u32,
        channels.len(),
        pixels,
        sample_depth,
    )?;
    decoded.pixel_aspect = image.attributes.pixel_aspect;
    decoded.metadata = metadata;

    debug!(
        channels = ?channels.iter().map(|c| c.name.to_string()).collect::<Vec<_>>(),
        pixel_aspect = decoded.pixel_aspect,
        "EXR layer read"
    );

    Ok(decoded)
}

pub(super) fn exr_dimensions(path: &Path) -> Result<(u32, u32), DecodeError> {
    let open_failed = |reason: String| DecodeError::OpenFailed {
        path: path.display().to_string(),
        reason,
    };
    let meta = exr::meta::MetaData::read_from_file(path, false)
        .map_err(|e| open_failed(e.to_string()))?;
    let header = meta
        .headers
        .first()
        .ok_or_else(|| open_failed("no layer header".to_string()))?;
    Ok((header.layer_size.0 as u32, header.layer_size.1 as u32))
}

/// Short channel name without a layer prefix ("diffuse.R" -> "R")
fn short_name(name: &Text) -> String {
    let full = name.to_string();
    match full.rsplit_once('.') {
        Some((_, short)) => short.to_string(),
        None => full,
    }
}

/// EXR stores channels alphabetically; put color channels in RGBA order
fn ordered_channels(list: &[AnyChannel<FlatSamples>]) -> Vec<&AnyChannel<FlatSamples>> {
    let find = |wanted: &str| {
        list.iter()
            .find(|c| short_name(&c.name).eq_ignore_ascii_case(wanted))
    };

    if let (Some(r), Some(g), Some(b)) = (find("R"), find("G"), find("B")) {
        let mut ordered = vec![r, g, b];
        if let Some(a) = find("A") {
            ordered.push(a);
        }
        return ordered;
    }

    list.iter().collect()
}

fn collect_attributes(attributes: &HashMap<Text, ExrAttribute>, metadata: &mut Metadata) {
    for (name, value) in attributes {
        let name = name.to_string();
        match convert_attribute(value) {
            Some(converted) => metadata.insert(name, converted),
            None => debug!(attribute = %name, "Skipping unsupported EXR attribute"),
        }
    }
}

fn convert_attribute(value: &ExrAttribute) -> Option<AttributeValue> {
    match value {
        ExrAttribute::F64(v) => Some(AttributeValue::Doubles(vec![*v])),
        ExrAttribute::F32(v) => Some(AttributeValue::Floats(vec![*v])),
        ExrAttribute::I32(v) => Some(AttributeValue::Int(*v as i64)),
        ExrAttribute::Text(text) => Some(AttributeValue::Text(text.to_string())),
        ExrAttribute::Matrix3x3(m) => Some(AttributeValue::Floats(m.to_vec())),
        ExrAttribute::Matrix4x4(m) => Some(AttributeValue::Floats(m.to_vec())),
        ExrAttribute::Custom { kind, bytes } => {
            let kind = kind.to_string();
            if !DOUBLE_KINDS.contains(&kind.as_str()) {
                return None;
            }
            let doubles = decode_doubles(bytes);
            if doubles.is_none() {
                warn!(kind = %kind, len = bytes.len(), "Malformed double attribute");
            }
            doubles.map(AttributeValue::Doubles)
        }
        _ => None,
    }
}

fn decode_doubles(bytes: &[u8]) -> Option<Vec<f64>> {
    if bytes.is_empty() || bytes.len() % 8 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(chunk);
                f64::from_le_bytes(raw)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{ATTR_CAMERA_CENTER, ATTR_INVERSE_CAMERA};
    use crate::depth::{CameraModel, Matrix3x3, Point3d};
    use crate::media::decoders::{self, DecodeConfig};
    use exr::prelude::{AnyChannels, Encoding, Image, Layer, LayerAttributes, WritableImage};

    fn double_attribute(kind: &str, values: &[f64]) -> ExrAttribute {
        ExrAttribute::Custom {
            kind: Text::from(kind),
            bytes: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    fn write_depth_exr(path: &Path) {
        let depths = vec![1.0f32, 2.0, -1.0, 4.0, 5.0, 6.0];
        let channel = AnyChannel::new("Y", FlatSamples::F32(depths));

        let mut attributes = LayerAttributes::named("depth");
        attributes.other.insert(
            Text::from(ATTR_CAMERA_CENTER),
            double_attribute("v3d", &[1.0, 2.0, 3.0]),
        );
        attributes.other.insert(
            Text::from(ATTR_INVERSE_CAMERA),
            double_attribute("m33d", &Matrix3x3::IDENTITY.0),
        );

        let layer = Layer::new(
            (3, 2),
            attributes,
            Encoding::UNCOMPRESSED,
            AnyChannels::sort(vec![channel].into()),
        );
        Image::from_layer(layer).write().to_file(path).unwrap();
    }

    #[test]
    fn test_depth_map_with_camera_attributes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0001_depthMap.exr");
        write_depth_exr(&path);

        let image = decoders::open(&path, &DecodeConfig::default()).unwrap();
        assert_eq!((image.width, image.height, image.channels), (3, 2, 1));
        assert_eq!(image.sample_depth, SampleDepth::F32);
        assert_eq!(image.pixels, vec![1.0, 2.0, -1.0, 4.0, 5.0, 6.0]);
        assert_eq!(image.sample(2, 0), -1.0);

        let camera = CameraModel::from_metadata(&image.metadata);
        assert_eq!(camera.center, Point3d::new(1.0, 2.0, 3.0));
        assert_eq!(camera.inverse_projection, Matrix3x3::IDENTITY);

        assert_eq!(decoders::image_dimensions(&path).unwrap(), (3, 2));
    }

    #[test]
    fn test_decode_doubles() {
        let bytes: Vec<u8> = [1.0f64, -2.5, 3.25]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        assert_eq!(decode_doubles(&bytes), Some(vec![1.0, -2.5, 3.25]));
        assert_eq!(decode_doubles(&bytes[..7]), None);
        assert_eq!(decode_doubles(&[]), None);
    }

    #[test]
    fn test_missing_exr_fails() {
        let err = read_exr(Path::new("/nonexistent/depth.exr"));
        assert!(matches!(err, Err(DecodeError::OpenFailed { .. })));
    }
}
