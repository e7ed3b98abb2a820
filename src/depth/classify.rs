// SPDX-License-Identifier: GPL-3.0-only

//! Image role detection
//!
//! Depth maps and confidence maps are recognized by a marker in their file
//! name; depth maps are also recognized by their camera metadata. The role
//! selects how single-channel images are normalized and colorized.

use crate::constants::{COMPANION_MAP_MARKER, CONFIDENCE_MAP_MARKER, DEPTH_MAP_MARKER};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What a single-channel image holds
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageRole {
    #[default]
    Plain,
    DepthMap,
    ConfidenceMap,
}

impl ImageRole {
    /// Whether values are normalized by the image's global range
    pub fn uses_global_stats(&self) -> bool {
        !matches!(self, ImageRole::Plain)
    }

    /// Jet variant: confidence maps clamp, others saturate to black/white
    pub fn clamps(&self) -> bool {
        matches!(self, ImageRole::ConfidenceMap)
    }
}

impl std::fmt::Display for ImageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageRole::Plain => write!(f, "plain"),
            ImageRole::DepthMap => write!(f, "depth map"),
            ImageRole::ConfidenceMap => write!(f, "confidence map"),
        }
    }
}

/// File name markers identifying image roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMarkers {
    pub depth_map: String,
    pub confidence_map: String,
    /// Replaces `depth_map` to find the similarity map of a depth map
    pub companion: String,
}

impl Default for RoleMarkers {
    fn default() -> Self {
        Self {
            depth_map: DEPTH_MAP_MARKER.to_string(),
            confidence_map: CONFIDENCE_MAP_MARKER.to_string(),
            companion: COMPANION_MAP_MARKER.to_string(),
        }
    }
}

impl RoleMarkers {
    pub fn classify(&self, path: &Path, has_camera_metadata: bool) -> ImageRole {
        let path = path.to_string_lossy();
        if has_camera_metadata || contains_marker(&path, &self.depth_map) {
            ImageRole::DepthMap
        } else if contains_marker(&path, &self.confidence_map) {
            ImageRole::ConfidenceMap
        } else {
            ImageRole::Plain
        }
    }

    /// Path of the similarity map stored next to a depth map
    ///
    /// Only the file name is rewritten. Returns `None` when the file name does
    /// not carry the depth map marker.
    pub fn companion_path(&self, depth_path: &Path) -> Option<PathBuf> {
        let name = depth_path.file_name()?.to_string_lossy();
        if !contains_marker(&name, &self.depth_map) {
            return None;
        }
        let companion = name.replace(&self.depth_map, &self.companion);
        Some(depth_path.with_file_name(companion))
    }
}

fn contains_marker(haystack: &str, marker: &str) -> bool {
    !marker.is_empty() && haystack.contains(marker)
}

/// Classify with the default markers
pub fn classify(path: &Path, has_camera_metadata: bool) -> ImageRole {
    RoleMarkers::default().classify(path, has_camera_metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_name() {
        assert_eq!(
            classify(Path::new("/data/12345_depthMap.exr"), false),
            ImageRole::DepthMap
        );
        assert_eq!(
            classify(Path::new("/data/12345_nmodMap.png"), false),
            ImageRole::ConfidenceMap
        );
        assert_eq!(classify(Path::new("/data/photo.jpg"), false), ImageRole::Plain);
    }

    #[test]
    fn test_metadata_wins() {
        assert_eq!(
            classify(Path::new("/data/12345_nmodMap.exr"), true),
            ImageRole::DepthMap
        );
        assert_eq!(classify(Path::new("plain.exr"), true), ImageRole::DepthMap);
    }

    #[test]
    fn test_marker_is_case_sensitive() {
        assert_eq!(classify(Path::new("DEPTHMAP.exr"), false), ImageRole::Plain);
    }

    #[test]
    fn test_custom_markers() {
        let markers = RoleMarkers {
            depth_map: "_depth".into(),
            confidence_map: "_conf".into(),
            companion: "_sim".into(),
        };
        assert_eq!(markers.classify(Path::new("a_depth.exr"), false), ImageRole::DepthMap);
        assert_eq!(markers.classify(Path::new("a_conf.exr"), false), ImageRole::ConfidenceMap);
        assert_eq!(markers.classify(Path::new("a_depthMap.exr"), false), ImageRole::DepthMap);
        assert_eq!(markers.classify(Path::new("a.exr"), false), ImageRole::Plain);
    }

    #[test]
    fn test_companion_path() {
        let markers = RoleMarkers::default();
        assert_eq!(
            markers.companion_path(Path::new("/depthMaps/0001_depthMap.exr")),
            Some(PathBuf::from("/depthMaps/0001_simMap.exr"))
        );
        assert_eq!(markers.companion_path(Path::new("/data/photo.exr")), None);
    }

    #[test]
    fn test_role_strategy() {
        assert!(ImageRole::DepthMap.uses_global_stats());
        assert!(!ImageRole::DepthMap.clamps());
        assert!(ImageRole::ConfidenceMap.clamps());
        assert!(!ImageRole::Plain.uses_global_stats());
    }
}
