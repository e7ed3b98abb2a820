// SPDX-License-Identifier: GPL-3.0-only

//! Depth map scene entity
//!
//! Holds one depth map source, its reconstruction and the render state a
//! scene graph needs to draw it (material, primitive topology, vertex
//! buffers). Setters return the change notifications they caused.

use crate::constants::{ATTR_CAMERA_CENTER, DEFAULT_POINT_SIZE};
use crate::depth::{
    CameraModel, ColormapKind, DisplayMode, MeshBuffers, PointCloud, PrimitiveTopology,
    RoleMarkers, Triangle, build_point_cloud, triangulate,
};
use crate::media::decoders::{self, DecodeConfig, DecodedImage};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Load state of the entity
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    None,
    Loading,
    Ready,
    Error,
}

/// Material the renderer should attach
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Material {
    /// Screen-space sized points; disabled when the size is not positive
    PointCloud { point_size: f32, enabled: bool },
    PerVertexColor,
    /// White diffuse surface, no specular
    Diffuse,
}

/// Change notifications
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntityEvent {
    SourceChanged,
    StatusChanged(Status),
    DisplayModeChanged,
    DisplayColorChanged,
    PointSizeChanged,
}

/// Reconstruction of the current source
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub camera: CameraModel,
    pub cloud: PointCloud,
    pub triangles: Vec<Triangle>,
    /// Whether a same-sized similarity map colored the points
    pub companion_used: bool,
}

#[derive(Debug, Clone)]
pub struct DepthMapEntity {
    source: Option<PathBuf>,
    status: Status,
    display_mode: DisplayMode,
    display_color: bool,
    point_size: f32,
    colormap: ColormapKind,
    markers: RoleMarkers,
    decode: DecodeConfig,
    reconstruction: Option<Reconstruction>,
}

impl Default for DepthMapEntity {
    fn default() -> Self {
        Self {
            source: None,
            status: Status::None,
            display_mode: DisplayMode::Unknown,
            display_color: true,
            point_size: DEFAULT_POINT_SIZE,
            colormap: ColormapKind::default(),
            markers: RoleMarkers::default(),
            decode: DecodeConfig::default(),
            reconstruction: None,
        }
    }
}

impl DepthMapEntity {
    pub fn new(colormap: ColormapKind, markers: RoleMarkers) -> Self {
        Self {
            colormap,
            markers,
            ..Default::default()
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    pub fn display_color(&self) -> bool {
        self.display_color
    }

    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    pub fn reconstruction(&self) -> Option<&Reconstruction> {
        self.reconstruction.as_ref()
    }

    /// Load a new depth map; setting the current source again does nothing
    pub fn set_source(&mut self, path: impl Into<PathBuf>) -> Vec<EntityEvent> {
        let path = path.into();
        if self.source.as_ref() == Some(&path) {
            return Vec::new();
        }
        self.source = Some(path);

        let before = self.status;
        self.load();

        let mut events = Vec::new();
        if self.status != before {
            events.push(EntityEvent::StatusChanged(self.status));
        }
        events.push(EntityEvent::SourceChanged);
        events
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) -> Vec<EntityEvent> {
        if self.display_mode == mode {
            return Vec::new();
        }
        self.display_mode = mode;
        vec![EntityEvent::DisplayModeChanged]
    }

    pub fn set_display_color(&mut self, value: bool) -> Vec<EntityEvent> {
        if self.display_color == value {
            return Vec::new();
        }
        self.display_color = value;
        vec![EntityEvent::DisplayColorChanged]
    }

    pub fn set_point_size(&mut self, value: f32) -> Vec<EntityEvent> {
        if self.point_size == value {
            return Vec::new();
        }
        self.point_size = value;
        vec![EntityEvent::PointSizeChanged]
    }

    /// Material for the current mode, once loaded
    pub fn material(&self) -> Option<Material> {
        if self.status != Status::Ready {
            return None;
        }
        let material = match self.display_mode {
            DisplayMode::Points => Material::PointCloud {
                point_size: self.point_size,
                enabled: self.point_size > 0.0,
            },
            DisplayMode::Triangles if self.display_color => Material::PerVertexColor,
            DisplayMode::Triangles | DisplayMode::Unknown => Material::Diffuse,
        };
        Some(material)
    }

    pub fn topology(&self) -> Option<PrimitiveTopology> {
        (self.status == Status::Ready).then(|| self.display_mode.topology())
    }

    /// Vertex buffers for the current mode, once loaded
    pub fn geometry(&self) -> Option<MeshBuffers> {
        if self.status != Status::Ready {
            return None;
        }
        let reconstruction = self.reconstruction.as_ref()?;
        Some(MeshBuffers::build(
            &reconstruction.cloud,
            &reconstruction.triangles,
            self.display_mode,
        ))
    }

    /// Use an image decoded elsewhere as the source
    ///
    /// `source` names the image; the companion map is taken as given instead
    /// of being looked up next to the file.
    pub fn set_decoded(
        &mut self,
        source: impl Into<PathBuf>,
        depth: &DecodedImage,
        companion: Option<&DecodedImage>,
    ) -> Vec<EntityEvent> {
        self.source = Some(source.into());
        let before = self.status;
        self.status = Status::Loading;
        let reconstruction = self.reconstruct_decoded(depth, companion);
        self.finish_load(reconstruction);

        let mut events = Vec::new();
        if self.status != before {
            events.push(EntityEvent::StatusChanged(self.status));
        }
        events.push(EntityEvent::SourceChanged);
        events
    }

    fn load(&mut self) {
        self.status = Status::Loading;
        self.reconstruction = None;

        let Some(path) = self.source.clone() else {
            self.status = Status::Error;
            return;
        };
        info!(path = %path.display(), "Loading depth map");

        let reconstruction = self.reconstruct(&path);
        self.finish_load(reconstruction);
    }

    fn finish_load(&mut self, reconstruction: Option<Reconstruction>) {
        self.status = if reconstruction.is_some() {
            Status::Ready
        } else {
            Status::Error
        };
        self.reconstruction = reconstruction;
    }

    fn reconstruct(&self, path: &Path) -> Option<Reconstruction> {
        let depth = match decoders::open(path, &self.decode) {
            Ok(image) => image,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to open depth map");
                return None;
            }
        };
        let companion = self.load_companion(path);
        self.reconstruct_decoded(&depth, companion.as_ref())
    }

    fn reconstruct_decoded(
        &self,
        depth: &DecodedImage,
        companion: Option<&DecodedImage>,
    ) -> Option<Reconstruction> {
        if !depth.metadata.contains(ATTR_CAMERA_CENTER) {
            warn!("Not a depth map: missing {}", ATTR_CAMERA_CENTER);
            return None;
        }

        debug!(width = depth.width, height = depth.height, "Depth map size");
        let camera = CameraModel::from_metadata(&depth.metadata);
        let companion_used = companion.is_some_and(|c| c.same_size(depth));

        let cloud = build_point_cloud(depth, companion, &camera, self.colormap);
        let triangles = triangulate(&cloud);

        Some(Reconstruction {
            camera,
            cloud,
            triangles,
            companion_used,
        })
    }

    fn load_companion(&self, depth_path: &Path) -> Option<DecodedImage> {
        let path = self.markers.companion_path(depth_path)?;
        if !path.is_file() {
            debug!(path = %path.display(), "No similarity map");
            return None;
        }
        match decoders::open(&path, &self.decode) {
            Ok(image) => {
                info!(path = %path.display(), "Loaded similarity map");
                Some(image)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable similarity map");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ATTR_INVERSE_CAMERA;
    use crate::depth::Matrix3x3;
    use crate::media::decoders::AttributeValue;

    #[test]
    fn test_defaults() {
        let entity = DepthMapEntity::default();
        assert_eq!(entity.status(), Status::None);
        assert_eq!(entity.display_mode(), DisplayMode::Unknown);
        assert!(entity.display_color());
        assert_eq!(entity.point_size(), DEFAULT_POINT_SIZE);
        assert!(entity.material().is_none());
        assert!(entity.geometry().is_none());
    }

    #[test]
    fn test_missing_file_is_error() {
        let mut entity = DepthMapEntity::default();
        let events = entity.set_source("/nonexistent/0001_depthMap.exr");
        assert_eq!(
            events,
            vec![
                EntityEvent::StatusChanged(Status::Error),
                EntityEvent::SourceChanged
            ]
        );
        assert_eq!(entity.status(), Status::Error);
        assert!(entity.topology().is_none());

        // Same source again is a no-op
        assert!(entity.set_source("/nonexistent/0001_depthMap.exr").is_empty());
    }

    fn depth_map(depths: Vec<f32>, side: u32) -> DecodedImage {
        DecodedImage::from_luma_f32(side, side, depths)
            .unwrap()
            .with_attribute(ATTR_CAMERA_CENTER, AttributeValue::Doubles(vec![0.0; 3]))
            .with_attribute(
                ATTR_INVERSE_CAMERA,
                AttributeValue::Doubles(Matrix3x3::IDENTITY.0.to_vec()),
            )
    }

    #[test]
    fn test_decoded_depth_map_is_ready() {
        let mut depths = vec![1.0; 9];
        depths[4] = -1.0;
        let depth = depth_map(depths, 3);

        let mut entity = DepthMapEntity::default();
        let events = entity.set_decoded("memory_depthMap", &depth, None);
        assert_eq!(
            events,
            vec![
                EntityEvent::StatusChanged(Status::Ready),
                EntityEvent::SourceChanged
            ]
        );

        let reconstruction = entity.reconstruction().unwrap();
        assert_eq!(reconstruction.cloud.len(), 8);
        assert_eq!(reconstruction.triangles.len(), 2);
        assert!(!reconstruction.companion_used);

        // Unknown mode draws the diffuse surface
        assert_eq!(entity.material(), Some(Material::Diffuse));
        assert_eq!(entity.topology(), Some(PrimitiveTopology::Triangles));
        assert_eq!(entity.geometry().unwrap().vertex_count(), 6);

        entity.set_display_mode(DisplayMode::Triangles);
        assert_eq!(entity.material(), Some(Material::PerVertexColor));
        entity.set_display_color(false);
        assert_eq!(entity.material(), Some(Material::Diffuse));

        entity.set_display_mode(DisplayMode::Points);
        assert_eq!(entity.topology(), Some(PrimitiveTopology::Points));
        assert_eq!(entity.geometry().unwrap().vertex_count(), 8);
        entity.set_point_size(0.0);
        assert_eq!(
            entity.material(),
            Some(Material::PointCloud {
                point_size: 0.0,
                enabled: false
            })
        );
    }

    #[test]
    fn test_companion_map_colors_points() {
        let depth = depth_map(vec![1.0; 4], 2);
        let sim = DecodedImage::from_luma_f32(2, 2, vec![0.0, 0.25, 0.5, 1.0]).unwrap();

        let mut entity = DepthMapEntity::default();
        entity.set_decoded("a_depthMap", &depth, Some(&sim));
        let reconstruction = entity.reconstruction().unwrap();
        assert!(reconstruction.companion_used);
        assert_eq!(
            reconstruction.cloud.points[1].color,
            ColormapKind::Jet.color(0.25, true)
        );
    }

    #[test]
    fn test_image_without_camera_is_error() {
        let plain = DecodedImage::from_luma_f32(2, 2, vec![1.0; 4]).unwrap();
        let mut entity = DepthMapEntity::default();
        entity.set_decoded("plain", &plain, None);
        assert_eq!(entity.status(), Status::Error);
        assert!(entity.geometry().is_none());
    }

    #[test]
    fn test_png_without_metadata_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0001_depthMap.png");
        image::GrayImage::from_raw(2, 2, vec![10; 4])
            .unwrap()
            .save(&path)
            .unwrap();

        let mut entity = DepthMapEntity::default();
        entity.set_source(&path);
        assert_eq!(entity.status(), Status::Error);
    }

    #[test]
    fn test_setters_notify_on_change_only() {
        let mut entity = DepthMapEntity::default();
        assert_eq!(
            entity.set_display_mode(DisplayMode::Points),
            vec![EntityEvent::DisplayModeChanged]
        );
        assert!(entity.set_display_mode(DisplayMode::Points).is_empty());
        assert_eq!(
            entity.set_display_color(false),
            vec![EntityEvent::DisplayColorChanged]
        );
        assert!(entity.set_display_color(false).is_empty());
        assert_eq!(entity.set_point_size(2.0), vec![EntityEvent::PointSizeChanged]);
        assert!(entity.set_point_size(2.0).is_empty());
    }
}
