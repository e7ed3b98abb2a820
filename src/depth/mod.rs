// SPDX-License-Identifier: GPL-3.0-only

//! Depth map reconstruction
//!
//! Turns a single-channel depth image and its camera into a colored point
//! cloud and a triangulated surface:
//!
//! ```text
//! DecodedImage ──► build_point_cloud ──► triangulate ──► MeshBuffers
//!        │               ▲                                   ▲
//!        └─ CameraModel ─┘      colormap (visualization) ────┘
//! ```

pub mod camera;
pub mod classify;
pub mod mesh;
pub mod point_cloud;
pub mod visualization;

pub use camera::{CameraModel, Matrix3x3, Point3d, Vec3f, pixel_footprint_size, unproject};
pub use classify::{ImageRole, RoleMarkers, classify};
pub use mesh::{
    AttributeLayout, DisplayMode, MeshBuffers, PrimitiveTopology, Triangle, triangulate,
    valid_triangle_ratio,
};
pub use point_cloud::{ABSENT, PointCloud, ReconstructedPoint, build_point_cloud};
pub use visualization::{ColormapKind, ScalarColor, color_from_scalar};
