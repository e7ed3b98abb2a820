// SPDX-License-Identifier: MPL-2.0

//! End-to-end tests: depth map to mesh buffers to exported files

use depthview::constants::{ATTR_CAMERA_CENTER, ATTR_INVERSE_CAMERA};
use depthview::depth::{DisplayMode, PrimitiveTopology};
use depthview::media::decoders::{AttributeValue, DecodedImage};
use depthview::pipelines::scene::export_scene;
use depthview::scene::{DepthMapEntity, Material, Status};

const IDENTITY: [f64; 9] = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

fn depth_map(width: u32, height: u32, depths: Vec<f32>) -> DecodedImage {
    DecodedImage::from_luma_f32(width, height, depths)
        .unwrap()
        .with_attribute(ATTR_CAMERA_CENTER, AttributeValue::Doubles(vec![0.0, 0.0, 0.0]))
        .with_attribute(ATTR_INVERSE_CAMERA, AttributeValue::Doubles(IDENTITY.to_vec()))
}

#[test]
fn test_constant_depth_map_triangulates_fully() {
    let mut entity = DepthMapEntity::default();
    entity.set_decoded("constant_depthMap.exr", &depth_map(4, 3, vec![2.0; 12]), None);
    assert_eq!(entity.status(), Status::Ready);

    let reconstruction = entity.reconstruction().unwrap();
    assert_eq!(reconstruction.cloud.len(), 12);
    // Two triangles per quad
    assert_eq!(reconstruction.triangles.len(), 2 * 3 * 2);

    let buffers = entity.geometry().unwrap();
    assert_eq!(buffers.topology, PrimitiveTopology::Triangles);
    assert_eq!(buffers.vertex_count(), 12 * 3);
    assert_eq!(entity.material(), Some(Material::Diffuse));
}

#[test]
fn test_points_mode_geometry() {
    let mut entity = DepthMapEntity::default();
    entity.set_display_mode(DisplayMode::Points);
    let mut depths = vec![1.0; 4];
    depths[3] = -1.0;
    entity.set_decoded("sparse_depthMap.exr", &depth_map(2, 2, depths), None);

    let buffers = entity.geometry().unwrap();
    assert_eq!(buffers.topology, PrimitiveTopology::Points);
    assert_eq!(buffers.vertex_count(), 3);
    assert!(buffers.normals.is_empty());
    assert!(matches!(
        entity.material(),
        Some(Material::PointCloud { enabled: true, .. })
    ));
}

#[tokio::test]
async fn test_export_scene_writes_mesh_and_point_cloud() {
    let mut entity = DepthMapEntity::default();
    entity.set_decoded("scene_depthMap.exr", &depth_map(3, 3, vec![1.5; 9]), None);
    let reconstruction = entity.reconstruction().unwrap().clone();
    let buffers = entity.geometry().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let result = export_scene(&reconstruction.cloud, &buffers, dir.path())
        .await
        .unwrap();

    assert!(result.scene_dir.starts_with(dir.path()));
    assert!(
        result
            .scene_dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("scene_")
    );

    let glb = std::fs::read(result.mesh_path.as_ref().unwrap()).unwrap();
    assert_eq!(&glb[0..4], b"glTF");

    let reader = las::Reader::from_path(&result.pointcloud_path).unwrap();
    assert_eq!(reader.header().number_of_points(), 9);
}

#[tokio::test]
async fn test_export_scene_without_triangles_keeps_point_cloud() {
    // Alternating valid and sentinel pixels leave no quad with three corners
    let mut entity = DepthMapEntity::default();
    let depths = vec![1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
    entity.set_decoded("checker_depthMap.exr", &depth_map(3, 2, depths), None);
    let reconstruction = entity.reconstruction().unwrap().clone();
    let buffers = entity.geometry().unwrap();
    assert_eq!(buffers.topology, PrimitiveTopology::Triangles);
    assert!(buffers.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let result = export_scene(&reconstruction.cloud, &buffers, dir.path())
        .await
        .unwrap();

    assert!(result.mesh_path.is_none());
    assert!(!result.scene_dir.join("mesh.glb").exists());
    let reader = las::Reader::from_path(&result.pointcloud_path).unwrap();
    assert_eq!(reader.header().number_of_points(), 3);
}

#[test]
fn test_depth_map_without_camera_is_error() {
    let mut entity = DepthMapEntity::default();
    let image = DecodedImage::from_luma_f32(2, 2, vec![1.0; 4]).unwrap();
    entity.set_decoded("no_camera_depthMap.exr", &image, None);
    assert_eq!(entity.status(), Status::Error);
    assert!(entity.geometry().is_none());
}
