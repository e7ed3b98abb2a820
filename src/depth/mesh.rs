// SPDX-License-Identifier: GPL-3.0-only

//! Surface triangulation and render buffers
//!
//! Each 2x2 pixel quad with corners A=(x,y), B=(x,y+1), C=(x+1,y+1),
//! D=(x+1,y) yields up to two triangles, (A,B,C) and (C,D,A). Triangles
//! spanning a depth discontinuity are long slivers and get rejected by an
//! edge-length ratio test.
//!
//! The triangles buffers are flat and non-indexed: every triangle owns its
//! three vertices so that it can carry its own normal.

use super::camera::Vec3f;
use super::point_cloud::PointCloud;
use super::visualization::ScalarColor;
use crate::constants::MIN_TRIANGLE_EDGE_RATIO;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// How a depth map is rendered
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Points,
    #[default]
    Triangles,
    Unknown,
}

impl DisplayMode {
    /// GPU primitive the caller should configure
    pub fn topology(&self) -> PrimitiveTopology {
        match self {
            DisplayMode::Points => PrimitiveTopology::Points,
            DisplayMode::Triangles | DisplayMode::Unknown => PrimitiveTopology::Triangles,
        }
    }
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayMode::Points => write!(f, "points"),
            DisplayMode::Triangles => write!(f, "triangles"),
            DisplayMode::Unknown => write!(f, "unknown"),
        }
    }
}

impl std::str::FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "points" => Ok(DisplayMode::Points),
            "triangles" => Ok(DisplayMode::Triangles),
            other => Err(format!(
                "unknown display mode '{}' (expected points or triangles)",
                other
            )),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PrimitiveTopology {
    Points,
    Triangles,
}

/// Three indices into the point cloud
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Triangle(pub [usize; 3]);

/// Reject slivers and degenerate triangles
///
/// Accepts iff the shortest edge is more than a fifth of the longest one.
/// Coincident corners (longest edge of zero) and non-finite corners are
/// rejected.
pub fn valid_triangle_ratio(a: Vec3f, b: Vec3f, c: Vec3f) -> bool {
    let distances = [(a - b).length(), (b - c).length(), (c - a).length()];
    if distances.iter().any(|d| !d.is_finite()) {
        return false;
    }
    let mi = distances.iter().copied().fold(f64::INFINITY, f64::min);
    let ma = distances.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if ma == 0.0 {
        return false;
    }
    mi / ma > MIN_TRIANGLE_EDGE_RATIO
}

/// Triangulate a point cloud over its pixel grid
pub fn triangulate(cloud: &PointCloud) -> Vec<Triangle> {
    let quad_rows = cloud.height.saturating_sub(1);

    let rows: Vec<(Vec<Triangle>, usize)> = (0..quad_rows)
        .into_par_iter()
        .map(|y| triangulate_row(cloud, y))
        .collect();

    let rejected: usize = rows.iter().map(|(_, r)| r).sum();
    let triangles: Vec<Triangle> = rows.into_iter().flat_map(|(t, _)| t).collect();

    info!(triangles = triangles.len(), rejected, "Depth map triangulated");

    triangles
}

/// Triangles of one quad row plus the number rejected by the ratio test
fn triangulate_row(cloud: &PointCloud, y: u32) -> (Vec<Triangle>, usize) {
    let mut triangles = Vec::new();
    let mut rejected = 0;

    for x in 0..cloud.width.saturating_sub(1) {
        let a = cloud.index_at(x, y);
        let b = cloud.index_at(x, y + 1);
        let c = cloud.index_at(x + 1, y + 1);
        let d = cloud.index_at(x + 1, y);

        for corners in [[a, b, c], [c, d, a]] {
            let [Some(i), Some(j), Some(k)] = corners else {
                continue;
            };
            let points = &cloud.points;
            if valid_triangle_ratio(points[i].position, points[j].position, points[k].position) {
                triangles.push(Triangle([i, j, k]));
            } else {
                rejected += 1;
            }
        }
    }

    (triangles, rejected)
}

/// Layout of one vertex attribute inside its buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeLayout {
    pub name: &'static str,
    /// f32 components per vertex
    pub components: usize,
    pub byte_offset: usize,
    pub byte_stride: usize,
    pub count: usize,
}

/// Flat vertex arrays handed to a renderer
///
/// Planar layout: one tightly packed f32 buffer per attribute. `normals` is
/// empty in points mode. Normals are raw cross products; normalize before
/// lighting if needed.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBuffers {
    pub topology: PrimitiveTopology,
    pub positions: Vec<Vec3f>,
    pub normals: Vec<Vec3f>,
    pub colors: Vec<ScalarColor>,
    pub sizes: Vec<f32>,
}

impl MeshBuffers {
    /// One vertex per point, in point order
    pub fn from_points(cloud: &PointCloud) -> Self {
        Self {
            topology: PrimitiveTopology::Points,
            positions: cloud.points.iter().map(|p| p.position).collect(),
            normals: Vec::new(),
            colors: cloud.points.iter().map(|p| p.color).collect(),
            sizes: cloud.points.iter().map(|p| p.size).collect(),
        }
    }

    /// Three vertices per triangle, shared corners duplicated
    pub fn from_triangles(cloud: &PointCloud, triangles: &[Triangle]) -> Self {
        let vertex_count = triangles.len() * 3;
        let mut buffers = Self {
            topology: PrimitiveTopology::Triangles,
            positions: Vec::with_capacity(vertex_count),
            normals: Vec::with_capacity(vertex_count),
            colors: Vec::with_capacity(vertex_count),
            sizes: Vec::with_capacity(vertex_count),
        };

        for Triangle(corners) in triangles {
            let [a, b, c] = corners.map(|i| cloud.points[i].position);
            let normal = (b - a).cross(&(c - a));
            for &i in corners {
                let point = &cloud.points[i];
                buffers.positions.push(point.position);
                buffers.normals.push(normal);
                buffers.colors.push(point.color);
                buffers.sizes.push(point.size);
            }
        }

        buffers
    }

    /// Buffers for a display mode; unknown mode renders the surface
    pub fn build(cloud: &PointCloud, triangles: &[Triangle], mode: DisplayMode) -> Self {
        match mode {
            DisplayMode::Points => Self::from_points(cloud),
            DisplayMode::Triangles | DisplayMode::Unknown => Self::from_triangles(cloud, triangles),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Byte layout of every non-empty attribute buffer
    pub fn attribute_layouts(&self) -> Vec<AttributeLayout> {
        let vec3 = std::mem::size_of::<Vec3f>();
        let mut layouts = vec![AttributeLayout {
            name: "position",
            components: 3,
            byte_offset: 0,
            byte_stride: vec3,
            count: self.positions.len(),
        }];
        if !self.normals.is_empty() {
            layouts.push(AttributeLayout {
                name: "normal",
                components: 3,
                byte_offset: 0,
                byte_stride: vec3,
                count: self.normals.len(),
            });
        }
        layouts.push(AttributeLayout {
            name: "color",
            components: 3,
            byte_offset: 0,
            byte_stride: std::mem::size_of::<ScalarColor>(),
            count: self.colors.len(),
        });
        layouts.push(AttributeLayout {
            name: "size",
            components: 1,
            byte_offset: 0,
            byte_stride: std::mem::size_of::<f32>(),
            count: self.sizes.len(),
        });
        layouts
    }

    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    pub fn size_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.sizes)
    }

    /// Axis-aligned bounds of the positions
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        if self.positions.is_empty() {
            return None;
        }
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        for p in &self.positions {
            for i in 0..3 {
                min[i] = min[i].min(p.0[i]);
                max[i] = max[i].max(p.0[i]);
            }
        }
        Some((min, max))
    }
}
