// SPDX-License-Identifier: GPL-3.0-only

//! GLB mesh export
//!
//! Writes [`MeshBuffers`] as binary glTF without an index buffer, exactly as
//! the renderer receives them. Per-vertex colors go to `COLOR_0`, point
//! sizes to the application attribute `_SIZE`. Normals are normalized on
//! export since glTF requires unit normals.

use crate::depth::{MeshBuffers, PrimitiveTopology, Vec3f};
use crate::errors::ExportError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// glTF primitive modes
const MODE_POINTS: u32 = 0;
const MODE_TRIANGLES: u32 = 4;

const COMPONENT_FLOAT: u32 = 5126;
const TARGET_ARRAY_BUFFER: u32 = 34962;

/// Export mesh buffers as a GLB file
pub async fn export_mesh_glb(buffers: &MeshBuffers, output_path: &Path) -> Result<(), ExportError> {
    let buffers = buffers.clone();
    let output_path = output_path.to_path_buf();

    tokio::task::spawn_blocking(move || write_mesh_glb(&buffers, &output_path))
        .await
        .map_err(|e| ExportError::TaskFailed(e.to_string()))?
}

pub fn write_mesh_glb(buffers: &MeshBuffers, output_path: &Path) -> Result<(), ExportError> {
    let Some((min_pos, max_pos)) = buffers.bounds() else {
        return Err(ExportError::Empty("mesh vertices"));
    };

    info!(
        vertex_count = buffers.vertex_count(),
        topology = ?buffers.topology,
        path = %output_path.display(),
        "Exporting mesh"
    );

    let glb = build_glb(buffers, min_pos, max_pos)?;
    std::fs::write(output_path, glb)
        .map_err(|e| ExportError::WriteFailed(format!("{}: {}", output_path.display(), e)))?;

    debug!(path = %output_path.display(), "GLB export complete");
    Ok(())
}

/// Unit normals; degenerate ones stay zero
fn unit_normals(normals: &[Vec3f]) -> Vec<Vec3f> {
    normals
        .iter()
        .map(|n| {
            let len = n.length() as f32;
            if len == 0.0 {
                Vec3f::default()
            } else {
                Vec3f([n.x() / len, n.y() / len, n.z() / len])
            }
        })
        .collect()
}

/// One attribute stored in the binary chunk
struct Section {
    name: &'static str,
    accessor_type: &'static str,
    stride: usize,
    count: usize,
    bytes: Vec<u8>,
}

fn build_glb(buffers: &MeshBuffers, min_pos: [f32; 3], max_pos: [f32; 3]) -> Result<Vec<u8>, ExportError> {
    let count = buffers.vertex_count();
    let mut sections = vec![Section {
        name: "POSITION",
        accessor_type: "VEC3",
        stride: 12,
        count,
        bytes: buffers.position_bytes().to_vec(),
    }];
    if !buffers.normals.is_empty() {
        let normals = unit_normals(&buffers.normals);
        sections.push(Section {
            name: "NORMAL",
            accessor_type: "VEC3",
            stride: 12,
            count,
            bytes: bytemuck::cast_slice(&normals).to_vec(),
        });
    }
    sections.push(Section {
        name: "COLOR_0",
        accessor_type: "VEC3",
        stride: 12,
        count,
        bytes: buffers.color_bytes().to_vec(),
    });
    sections.push(Section {
        name: "_SIZE",
        accessor_type: "SCALAR",
        stride: 4,
        count,
        bytes: buffers.size_bytes().to_vec(),
    });

    let mut attributes = serde_json::Map::new();
    let mut accessors = Vec::new();
    let mut buffer_views = Vec::new();
    let mut offset = 0usize;

    for (i, section) in sections.iter().enumerate() {
        attributes.insert(section.name.to_string(), serde_json::json!(i));
        let mut accessor = serde_json::json!({
            "bufferView": i,
            "byteOffset": 0,
            "componentType": COMPONENT_FLOAT,
            "count": section.count,
            "type": section.accessor_type
        });
        if section.name == "POSITION" {
            accessor["min"] = serde_json::json!(min_pos);
            accessor["max"] = serde_json::json!(max_pos);
        }
        accessors.push(accessor);
        buffer_views.push(serde_json::json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": section.bytes.len(),
            "byteStride": section.stride,
            "target": TARGET_ARRAY_BUFFER
        }));
        offset += section.bytes.len();
    }

    // f32 sections keep 4-byte alignment
    let buffer_len = offset;

    let mode = match buffers.topology {
        PrimitiveTopology::Points => MODE_POINTS,
        PrimitiveTopology::Triangles => MODE_TRIANGLES,
    };

    let gltf_json = serde_json::json!({
        "asset": {
            "generator": "depthview",
            "version": "2.0"
        },
        "scene": 0,
        "scenes": [{
            "nodes": [0]
        }],
        "nodes": [{
            "mesh": 0
        }],
        "meshes": [{
            "primitives": [{
                "attributes": attributes,
                "material": 0,
                "mode": mode
            }]
        }],
        "materials": [{
            "pbrMetallicRoughness": {
                "baseColorFactor": [1.0, 1.0, 1.0, 1.0],
                "metallicFactor": 0.0,
                "roughnessFactor": 1.0
            },
            "doubleSided": true
        }],
        "accessors": accessors,
        "bufferViews": buffer_views,
        "buffers": [{
            "byteLength": buffer_len
        }]
    });

    let json_string = serde_json::to_string(&gltf_json)
        .map_err(|e| ExportError::EncodingFailed(format!("glTF JSON: {}", e)))?;
    let json_bytes = json_string.as_bytes();

    // Pad JSON to 4-byte alignment
    let json_padding = (4 - (json_bytes.len() % 4)) % 4;
    let padded_json_len = json_bytes.len() + json_padding;

    let total_length = 12 + 8 + padded_json_len + 8 + buffer_len;
    let mut glb_data: Vec<u8> = Vec::with_capacity(total_length);

    // Header
    glb_data.extend_from_slice(b"glTF");
    glb_data.extend_from_slice(&2u32.to_le_bytes());
    glb_data.extend_from_slice(&(total_length as u32).to_le_bytes());

    // JSON chunk
    glb_data.extend_from_slice(&(padded_json_len as u32).to_le_bytes());
    glb_data.extend_from_slice(&0x4E4F534Au32.to_le_bytes());
    glb_data.extend_from_slice(json_bytes);
    glb_data.extend(std::iter::repeat_n(0x20u8, json_padding));

    // Binary chunk
    glb_data.extend_from_slice(&(buffer_len as u32).to_le_bytes());
    glb_data.extend_from_slice(&0x004E4942u32.to_le_bytes());
    for section in &sections {
        glb_data.extend_from_slice(&section.bytes);
    }

    Ok(glb_data)
}

/// Default GLB file name inside a scene directory
pub fn mesh_file_name(scene_dir: &Path) -> PathBuf {
    scene_dir.join("mesh.glb")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::ScalarColor;

    fn triangle_buffers() -> MeshBuffers {
        MeshBuffers {
            topology: PrimitiveTopology::Triangles,
            positions: vec![
                Vec3f::new(0.0, 0.0, 1.0),
                Vec3f::new(0.0, 1.0, 1.0),
                Vec3f::new(1.0, 1.0, 1.0),
            ],
            normals: vec![Vec3f::new(0.0, 0.0, -2.0); 3],
            colors: vec![ScalarColor::new(1.0, 0.0, 0.0); 3],
            sizes: vec![0.1; 3],
        }
    }

    fn json_chunk(glb: &[u8]) -> serde_json::Value {
        let len = u32::from_le_bytes([glb[12], glb[13], glb[14], glb[15]]) as usize;
        serde_json::from_slice(&glb[20..20 + len]).unwrap()
    }

    #[test]
    fn test_glb_layout() {
        let buffers = triangle_buffers();
        let (min, max) = buffers.bounds().unwrap();
        let glb = build_glb(&buffers, min, max).unwrap();

        assert_eq!(&glb[0..4], b"glTF");
        assert_eq!(u32::from_le_bytes([glb[8], glb[9], glb[10], glb[11]]) as usize, glb.len());
        assert_eq!(glb.len() % 4, 0);

        let json = json_chunk(&glb);
        let primitive = &json["meshes"][0]["primitives"][0];
        assert_eq!(primitive["mode"], 4);
        assert!(primitive.get("indices").is_none());
        for name in ["POSITION", "NORMAL", "COLOR_0", "_SIZE"] {
            assert!(primitive["attributes"].get(name).is_some(), "{}", name);
        }
        assert_eq!(json["accessors"][0]["count"], 3);
        assert_eq!(json["buffers"][0]["byteLength"], 3 * (12 + 12 + 12 + 4));
    }

    #[test]
    fn test_points_have_no_normals() {
        let mut buffers = triangle_buffers();
        buffers.topology = PrimitiveTopology::Points;
        buffers.normals.clear();
        let (min, max) = buffers.bounds().unwrap();
        let json = json_chunk(&build_glb(&buffers, min, max).unwrap());
        let primitive = &json["meshes"][0]["primitives"][0];
        assert_eq!(primitive["mode"], 0);
        assert!(primitive["attributes"].get("NORMAL").is_none());
    }

    #[test]
    fn test_normals_exported_as_unit() {
        let normals = unit_normals(&[Vec3f::new(0.0, 0.0, -2.0), Vec3f::default()]);
        assert_eq!(normals, vec![Vec3f::new(0.0, 0.0, -1.0), Vec3f::default()]);
    }

    #[test]
    fn test_empty_mesh_fails() {
        let mut buffers = triangle_buffers();
        buffers.positions.clear();
        let dir = tempfile::tempdir().unwrap();
        let err = write_mesh_glb(&buffers, &dir.path().join("mesh.glb"));
        assert!(matches!(err, Err(ExportError::Empty(_))));
    }

    #[tokio::test]
    async fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = mesh_file_name(dir.path());
        export_mesh_glb(&triangle_buffers(), &path).await.unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[0..4], b"glTF");
    }
}
