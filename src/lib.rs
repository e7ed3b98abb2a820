// SPDX-License-Identifier: MPL-2.0

//! depthview - depth map viewing and reconstruction
//!
//! This library decodes images for 2D display and turns photogrammetry depth
//! maps into colored point clouds and triangle meshes.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`depth`]: Colormaps, unprojection, point clouds and triangulation
//! - [`media`]: Image decoding, display conversion and the image I/O handler
//! - [`scene`]: Depth map entity driving reconstruction from a source path
//! - [`pipelines`]: Mesh and point cloud export
//! - [`config`]: User configuration handling

pub mod config;
pub mod constants;
pub mod depth;
pub mod errors;
pub mod media;
pub mod pipelines;
pub mod scene;

// Re-export commonly used types
pub use config::Config;
pub use depth::{ColormapKind, DisplayMode, ImageRole};
pub use errors::{AppError, AppResult, DecodeError, ExportError};
pub use scene::{DepthMapEntity, Status};
