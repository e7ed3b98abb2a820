// SPDX-License-Identifier: GPL-3.0-only

//! Scene export pipeline
//!
//! Saves a reconstructed depth map into a timestamped scene directory:
//! - Mesh as rendered, in the current display mode (GLB format), skipped
//!   when the mesh has no vertices
//! - Point cloud with display colors (LAS format)

mod gltf_export;
mod las_export;

pub use gltf_export::{export_mesh_glb, mesh_file_name, write_mesh_glb};
pub use las_export::{export_point_cloud_las, point_cloud_file_name, write_point_cloud_las};

use crate::depth::{MeshBuffers, PointCloud};
use crate::errors::ExportError;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Files written by [`export_scene`]
#[derive(Debug, Clone)]
pub struct SceneExportResult {
    pub scene_dir: PathBuf,
    /// `None` when every triangle was filtered out
    pub mesh_path: Option<PathBuf>,
    pub pointcloud_path: PathBuf,
}

/// Export mesh and point cloud into `output_dir/scene_YYYYmmdd_HHMMSS`
pub async fn export_scene(
    cloud: &PointCloud,
    buffers: &MeshBuffers,
    output_dir: &Path,
) -> Result<SceneExportResult, ExportError> {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let scene_dir = output_dir.join(format!("scene_{}", timestamp));
    tokio::fs::create_dir_all(&scene_dir)
        .await
        .map_err(|e| ExportError::WriteFailed(format!("scene directory: {}", e)))?;

    info!(scene_dir = %scene_dir.display(), "Exporting scene");

    let mesh_path = if buffers.is_empty() {
        warn!(topology = ?buffers.topology, "Mesh is empty, skipping GLB export");
        None
    } else {
        Some(mesh_file_name(&scene_dir))
    };
    let pointcloud_path = point_cloud_file_name(&scene_dir);

    let mesh_export = async {
        match &mesh_path {
            Some(path) => export_mesh_glb(buffers, path).await,
            None => Ok(()),
        }
    };
    let (mesh, points) = tokio::join!(mesh_export, export_point_cloud_las(cloud, &pointcloud_path));
    mesh?;
    points?;

    Ok(SceneExportResult {
        scene_dir,
        mesh_path,
        pointcloud_path,
    })
}
