// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for depth map operations
//!
//! This module provides command-line functionality for:
//! - Converting images for display (colorized depth maps)
//! - Reconstructing and exporting depth map meshes
//! - Inspecting image headers and metadata

use depthview::config::Config;
use depthview::constants::ATTR_CAMERA_CENTER;
use depthview::depth::{ColormapKind, DisplayMode};
use depthview::media::decoders::{self, DecodeConfig};
use depthview::media::display::decode_for_display;
use depthview::pipelines::scene::export_scene;
use depthview::scene::{DepthMapEntity, Status};
use std::path::{Path, PathBuf};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Parse `WxH`
pub fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{}'", s))?;
    let w: u32 = w.trim().parse().map_err(|_| format!("invalid width in '{}'", s))?;
    let h: u32 = h.trim().parse().map_err(|_| format!("invalid height in '{}'", s))?;
    if w == 0 || h == 0 {
        return Err(format!("size must be positive, got '{}'", s));
    }
    Ok((w, h))
}

/// Decode an image for display and save it as PNG
pub fn decode(
    config: &Config,
    input: &Path,
    output: Option<PathBuf>,
    colormap: Option<ColormapKind>,
    no_colormap: bool,
    size: Option<(u32, u32)>,
) -> CliResult {
    let mut options = config.display_options();
    if let Some(colormap) = colormap {
        options.colormap = colormap;
    }
    if no_colormap {
        options.colormap_grayscale = false;
    }
    options.scaled_size = size;

    let buffer = decode_for_display(input, &options)?;
    let output = output.unwrap_or_else(|| default_display_path(input));
    buffer.to_dynamic_image()?.save(&output)?;

    println!(
        "Saved {}x{} {} image to {}",
        buffer.width,
        buffer.height,
        buffer.format,
        output.display()
    );
    Ok(())
}

/// Reconstruct a depth map and export mesh and point cloud
pub fn mesh(
    config: &Config,
    input: &Path,
    output_dir: Option<PathBuf>,
    mode: Option<DisplayMode>,
    colormap: Option<ColormapKind>,
) -> CliResult {
    let mut entity = DepthMapEntity::new(colormap.unwrap_or(config.colormap), config.markers());
    entity.set_display_mode(mode.unwrap_or(config.display_mode));
    entity.set_display_color(config.display_color);
    entity.set_point_size(config.point_size);
    entity.set_source(input);

    if entity.status() != Status::Ready {
        return Err(format!("Failed to reconstruct depth map '{}'", input.display()).into());
    }
    let (Some(reconstruction), Some(buffers)) = (entity.reconstruction(), entity.geometry()) else {
        return Err("Reconstruction is not available".into());
    };

    println!(
        "Reconstructed {} points, {} triangles{}",
        reconstruction.cloud.len(),
        reconstruction.triangles.len(),
        if reconstruction.companion_used {
            " (colored by similarity map)"
        } else {
            ""
        }
    );

    let output_dir = output_dir.unwrap_or_else(|| {
        input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(export_scene(&reconstruction.cloud, &buffers, &output_dir))?;

    println!("Scene saved to {}", result.scene_dir.display());
    match &result.mesh_path {
        Some(path) => println!("  Mesh:        {}", path.display()),
        None => println!("  Mesh:        skipped (no triangles)"),
    }
    println!("  Point cloud: {}", result.pointcloud_path.display());
    Ok(())
}

/// Print dimensions, role and metadata of an image
pub fn info(config: &Config, input: &Path) -> CliResult {
    let image = decoders::open(input, &DecodeConfig::default())?;
    let has_camera = image.metadata.contains(ATTR_CAMERA_CENTER);
    let role = config.markers().classify(input, has_camera);

    println!("{}", input.display());
    println!("  Size:         {}x{}", image.width, image.height);
    println!("  Channels:     {}", image.channels);
    println!("  Samples:      {:?}", image.sample_depth);
    println!("  Color space:  {:?}", image.color_space);
    println!("  Pixel aspect: {}", image.pixel_aspect);
    println!("  Role:         {}", role);
    println!("  Camera:       {}", if has_camera { "yes" } else { "no" });

    if !image.metadata.is_empty() {
        println!("  Metadata:");
        for (name, value) in image.metadata.iter() {
            println!("    {}: {:?}", name, value);
        }
    }
    Ok(())
}

/// `<stem>_display.png` next to the input
fn default_display_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    input.with_file_name(format!("{}_display.png", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("640x480"), Ok((640, 480)));
        assert_eq!(parse_size("10X2"), Ok((10, 2)));
        assert!(parse_size("640").is_err());
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("ax10").is_err());
    }

    #[test]
    fn test_default_display_path() {
        assert_eq!(
            default_display_path(Path::new("/data/0001_depthMap.exr")),
            PathBuf::from("/data/0001_depthMap_display.png")
        );
    }
}
