// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Depth value marking "no measurement" at a pixel
///
/// Compared with exact float equality: this is a written sentinel, not a threshold.
pub const DEPTH_SENTINEL: f32 = -1.0;

/// Metadata attribute holding the camera center (3 doubles)
pub const ATTR_CAMERA_CENTER: &str = "AliceVision:CArr";

/// Metadata attribute holding the inverse camera matrix (3x3 doubles, row-major)
pub const ATTR_INVERSE_CAMERA: &str = "AliceVision:iCamArr";

/// Filename marker of depth maps
pub const DEPTH_MAP_MARKER: &str = "depthMap";

/// Filename marker of normalized-modulation (confidence) maps
pub const CONFIDENCE_MAP_MARKER: &str = "nmodMap";

/// Filename marker of similarity maps stored next to depth maps
pub const COMPANION_MAP_MARKER: &str = "simMap";

/// Triangles whose shortest/longest edge ratio is at or below this are slivers
pub const MIN_TRIANGLE_EDGE_RATIO: f64 = 1.0 / 5.0;

/// Default world-space point size for the point-cloud material
pub const DEFAULT_POINT_SIZE: f32 = 0.5;

/// Name reported by the image handler
pub const HANDLER_NAME: &str = "depthview";

/// Config directory name under the platform config dir
pub const CONFIG_DIR_NAME: &str = "depthview";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.json";
