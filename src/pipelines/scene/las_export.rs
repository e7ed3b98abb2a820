// SPDX-License-Identifier: GPL-3.0-only

//! LAS point cloud export
//!
//! Writes the reconstructed points with their display colors as an
//! uncompressed LAS 1.4 file.

use crate::depth::PointCloud;
use crate::errors::ExportError;
use crate::media::formats::conversions::quantize_u16;
use las::{Builder, Color, Point, Writer};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 1 mm precision
const COORDINATE_SCALE: f64 = 0.001;

/// Export point cloud as LAS file with color
pub async fn export_point_cloud_las(cloud: &PointCloud, output_path: &Path) -> Result<(), ExportError> {
    let cloud = cloud.clone();
    let output_path = output_path.to_path_buf();

    tokio::task::spawn_blocking(move || write_point_cloud_las(&cloud, &output_path))
        .await
        .map_err(|e| ExportError::TaskFailed(e.to_string()))?
}

pub fn write_point_cloud_las(cloud: &PointCloud, output_path: &Path) -> Result<(), ExportError> {
    if cloud.is_empty() {
        return Err(ExportError::Empty("point cloud"));
    }

    info!(
        point_count = cloud.len(),
        path = %output_path.display(),
        "Exporting point cloud"
    );

    let center = bounds_center(cloud);

    let mut builder = Builder::from((1, 4));
    builder.point_format.has_color = true;
    builder.point_format.is_compressed = false;
    builder.transforms = las::Vector {
        x: las::Transform {
            scale: COORDINATE_SCALE,
            offset: center[0],
        },
        y: las::Transform {
            scale: COORDINATE_SCALE,
            offset: center[1],
        },
        z: las::Transform {
            scale: COORDINATE_SCALE,
            offset: center[2],
        },
    };

    let header = builder
        .into_header()
        .map_err(|e| ExportError::EncodingFailed(format!("LAS header: {}", e)))?;

    let mut writer = Writer::from_path(output_path, header)
        .map_err(|e| ExportError::WriteFailed(format!("{}: {}", output_path.display(), e)))?;

    for p in &cloud.points {
        let mut point = Point::default();
        point.x = p.position.x() as f64;
        point.y = p.position.y() as f64;
        point.z = p.position.z() as f64;
        point.color = Some(Color::new(
            quantize_u16(p.color.r()),
            quantize_u16(p.color.g()),
            quantize_u16(p.color.b()),
        ));

        writer
            .write_point(point)
            .map_err(|e| ExportError::WriteFailed(format!("point: {}", e)))?;
    }

    writer
        .close()
        .map_err(|e| ExportError::WriteFailed(format!("close: {}", e)))?;

    debug!(path = %output_path.display(), "LAS export complete");
    Ok(())
}

fn bounds_center(cloud: &PointCloud) -> [f64; 3] {
    let mut center = [0.0; 3];
    for (axis, c) in center.iter_mut().enumerate() {
        let (min, max) = cloud
            .points
            .iter()
            .map(|p| p.position.0[axis] as f64)
            .fold((f64::MAX, f64::MIN), |(min, max), v| (min.min(v), max.max(v)));
        *c = (min + max) / 2.0;
    }
    center
}

/// Default LAS file name inside a scene directory
pub fn point_cloud_file_name(scene_dir: &Path) -> PathBuf {
    scene_dir.join("pointcloud.las")
}
