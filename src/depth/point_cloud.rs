// SPDX-License-Identifier: GPL-3.0-only

//! Depth map to point cloud
//!
//! Every pixel whose depth is not the sentinel becomes one point, in
//! row-major scan order. Rows are processed in parallel and merged in order,
//! so the point order and the pixel index table are deterministic.

use super::camera::{CameraModel, Vec3f};
use super::visualization::{ColormapKind, ScalarColor};
use crate::constants::DEPTH_SENTINEL;
use crate::media::decoders::{DecodedImage, PixelStats};
use rayon::prelude::*;
use tracing::{info, warn};

/// Pixel index value for pixels without a point
pub const ABSENT: i64 = -1;

/// One reconstructed point
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ReconstructedPoint {
    /// World-space position
    pub position: Vec3f,
    pub color: ScalarColor,
    /// World-space size of one pixel at this depth
    pub size: f32,
    /// Source pixel (x, y)
    pub pixel: (u32, u32),
}

/// Points of one depth map plus the pixel to point lookup
#[derive(Debug, Clone, Default)]
pub struct PointCloud {
    pub width: u32,
    pub height: u32,
    pub points: Vec<ReconstructedPoint>,
    /// `width * height` entries, point index or [`ABSENT`]
    pub pixel_index: Vec<i64>,
}

impl PointCloud {
    /// Point index at a pixel, if that pixel produced a point
    pub fn index_at(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = self.pixel_index[pixel_offset(x, y, self.width)];
        (index != ABSENT).then_some(index as usize)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Where point colors come from
enum ColorSource<'a> {
    /// Same-sized similarity/confidence map, colorized directly
    Companion(&'a DecodedImage),
    /// Depth normalized by the depth map's own range
    NormalizedDepth(PixelStats),
}

impl ColorSource<'_> {
    fn color(&self, x: u32, y: u32, depth: f32, colormap: ColormapKind) -> ScalarColor {
        match self {
            ColorSource::Companion(image) => colormap.color(image.sample(x, y), true),
            ColorSource::NormalizedDepth(stats) => colormap.color(stats.normalize(0, depth), true),
        }
    }
}

/// Build the point cloud of a depth map
///
/// A companion image is only used when its size matches the depth map
/// exactly; otherwise colors come from the normalized depth.
pub fn build_point_cloud(
    depth: &DecodedImage,
    companion: Option<&DecodedImage>,
    camera: &CameraModel,
    colormap: ColormapKind,
) -> PointCloud {
    let source = match companion {
        Some(image) if image.same_size(depth) => ColorSource::Companion(image),
        Some(image) => {
            warn!(
                depth_size = format!("{}x{}", depth.width, depth.height),
                companion_size = format!("{}x{}", image.width, image.height),
                "Companion map size mismatch, coloring by depth"
            );
            ColorSource::NormalizedDepth(depth.global_stats())
        }
        None => ColorSource::NormalizedDepth(depth.global_stats()),
    };

    let rows: Vec<Vec<ReconstructedPoint>> = (0..depth.height)
        .into_par_iter()
        .map(|y| build_row(depth, y, camera, &source, colormap))
        .collect();

    let mut pixel_index = vec![ABSENT; depth.pixel_count()];
    let mut points = Vec::with_capacity(rows.iter().map(Vec::len).sum());
    for point in rows.into_iter().flatten() {
        let (x, y) = point.pixel;
        pixel_index[pixel_offset(x, y, depth.width)] = points.len() as i64;
        points.push(point);
    }

    info!(
        width = depth.width,
        height = depth.height,
        valid_points = points.len(),
        "Point cloud built"
    );

    PointCloud {
        width: depth.width,
        height: depth.height,
        points,
        pixel_index,
    }
}

fn build_row(
    depth: &DecodedImage,
    y: u32,
    camera: &CameraModel,
    source: &ColorSource<'_>,
    colormap: ColormapKind,
) -> Vec<ReconstructedPoint> {
    let mut row = Vec::new();

    for x in 0..depth.width {
        let value = depth.sample(x, y);
        if value == DEPTH_SENTINEL {
            continue;
        }

        let position = camera.unproject(x as f64, y as f64, value as f64);
        let size = camera.pixel_footprint_size(position, footprint_neighbor(x, y, depth.width));

        row.push(ReconstructedPoint {
            position: position.into(),
            color: source.color(x, y, value, colormap),
            size: size as f32,
            pixel: (x, y),
        });
    }

    row
}

/// Row-major offset of `(x, y)`, computed in `usize`
fn pixel_offset(x: u32, y: u32, width: u32) -> usize {
    y as usize * width as usize + x as usize
}

/// Pixel used to measure the footprint at `(x, y)`
///
/// The right neighbor, or the left one on the last column. A single-column
/// image measures against its own ray, giving a size of zero.
fn footprint_neighbor(x: u32, y: u32, width: u32) -> (f64, f64) {
    let nx = if x + 1 < width {
        x + 1
    } else {
        x.saturating_sub(1)
    };
    (nx as f64, y as f64)
}
