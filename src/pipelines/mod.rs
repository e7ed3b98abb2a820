// SPDX-License-Identifier: MPL-2.0

//! Export pipelines
//!
//! Heavy file writing runs in blocking tasks so async callers stay
//! responsive.
//!
//! # Modules
//!
//! - [`scene`]: Mesh (GLB) and point cloud (LAS) export of a reconstruction

pub mod scene;
