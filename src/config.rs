// SPDX-License-Identifier: GPL-3.0-only

//! Persistent user configuration
//!
//! Stored as JSON under the platform config directory. A missing file yields
//! the defaults; a file that exists but cannot be parsed is an error.

use crate::constants::{
    COMPANION_MAP_MARKER, CONFIDENCE_MAP_MARKER, CONFIG_DIR_NAME, CONFIG_FILE_NAME,
    DEFAULT_POINT_SIZE, DEPTH_MAP_MARKER,
};
use crate::depth::{ColormapKind, DisplayMode, RoleMarkers};
use crate::errors::{AppError, AppResult};
use crate::media::display::DisplayOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Colormap for single-channel images and depth map points
    pub colormap: ColormapKind,
    /// Colorize single-channel images in 2D display
    pub colormap_grayscale: bool,
    /// How depth maps are drawn in 3D
    pub display_mode: DisplayMode,
    /// Per-vertex colors on triangle meshes
    pub display_color: bool,
    pub point_size: f32,
    pub depth_map_marker: String,
    pub confidence_map_marker: String,
    /// Replaces the depth map marker to find the similarity map
    pub companion_marker: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            colormap: ColormapKind::default(),
            colormap_grayscale: true,
            display_mode: DisplayMode::default(),
            display_color: true,
            point_size: DEFAULT_POINT_SIZE,
            depth_map_marker: DEPTH_MAP_MARKER.to_string(),
            confidence_map_marker: CONFIDENCE_MAP_MARKER.to_string(),
            companion_marker: COMPANION_MAP_MARKER.to_string(),
        }
    }
}

impl Config {
    /// Default location, `None` when the platform has no config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location
    pub fn load() -> AppResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save to the default location
    pub fn save(&self) -> AppResult<()> {
        let path = Self::default_path()
            .ok_or_else(|| AppError::Config("No config directory available".to_string()))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    pub fn markers(&self) -> RoleMarkers {
        RoleMarkers {
            depth_map: self.depth_map_marker.clone(),
            confidence_map: self.confidence_map_marker.clone(),
            companion: self.companion_marker.clone(),
        }
    }

    /// Display adapter options derived from this config
    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            colormap_grayscale: self.colormap_grayscale,
            colormap: self.colormap,
            markers: self.markers(),
            ..DisplayOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"colormap": "viridis"}"#).unwrap();
        assert_eq!(config.colormap, ColormapKind::Viridis);
        assert!(config.colormap_grayscale);
        assert_eq!(config.point_size, DEFAULT_POINT_SIZE);
    }

    #[test]
    fn test_display_options() {
        let config = Config {
            colormap_grayscale: false,
            depth_map_marker: "_depth".to_string(),
            ..Config::default()
        };
        let options = config.display_options();
        assert!(!options.colormap_grayscale);
        assert_eq!(options.markers.depth_map, "_depth");
        assert_eq!(options.scaled_size, None);
    }
}
