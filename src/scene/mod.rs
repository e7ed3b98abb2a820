// SPDX-License-Identifier: GPL-3.0-only

//! Scene-graph side of depth maps

pub mod entity;

pub use entity::{DepthMapEntity, EntityEvent, Material, Reconstruction, Status};
