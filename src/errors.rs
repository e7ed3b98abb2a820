// SPDX-License-Identifier: MPL-2.0

//! Error types for depthview
//!
//! Only whole-image failures are errors. Per-pixel and per-triangle anomalies
//! (sentinel depths, degenerate statistics, sliver triangles, NaN scalars) are
//! absorbed where they happen and never surface here.

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Image decoding errors
    Decode(DecodeError),
    /// Scene export errors
    Export(ExportError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Errors raised while decoding an image
#[derive(Debug, Clone)]
pub enum DecodeError {
    /// The file could not be found or opened
    OpenFailed { path: String, reason: String },
    /// The source is not a seekable file
    NotAFile,
    /// Channel count outside {1, 3, 4}
    UnsupportedChannelCount { path: String, channels: usize },
    /// The decoder produced pixel data inconsistent with its header
    InvalidPixelData(String),
    /// Image without pixels
    InvalidSize { width: u32, height: u32 },
}

/// Errors raised while exporting a scene
#[derive(Debug, Clone)]
pub enum ExportError {
    /// Nothing to export
    Empty(&'static str),
    /// Encoding the output failed
    EncodingFailed(String),
    /// Writing the output failed
    WriteFailed(String),
    /// Background task failed to complete
    TaskFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Decode(e) => write!(f, "Decode error: {}", e),
            AppError::Export(e) => write!(f, "Export error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::OpenFailed { path, reason } => {
                write!(f, "Can't find/open image file '{}': {}", path, reason)
            }
            DecodeError::NotAFile => write!(f, "Source is not a file"),
            DecodeError::UnsupportedChannelCount { path, channels } => {
                write!(f, "Unsupported channel count {} in '{}'", channels, path)
            }
            DecodeError::InvalidPixelData(msg) => write!(f, "Invalid pixel data: {}", msg),
            DecodeError::InvalidSize { width, height } => {
                write!(f, "Invalid image size {}x{}", width, height)
            }
        }
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Empty(what) => write!(f, "No {} to export", what),
            ExportError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            ExportError::WriteFailed(msg) => write!(f, "Write failed: {}", msg),
            ExportError::TaskFailed(msg) => write!(f, "Task join error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for DecodeError {}
impl std::error::Error for ExportError {}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        AppError::Decode(err)
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        AppError::Export(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::WriteFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_converts_to_app_error() {
        let err: AppError = DecodeError::NotAFile.into();
        assert!(matches!(err, AppError::Decode(DecodeError::NotAFile)));
        assert_eq!(err.to_string(), "Decode error: Source is not a file");
    }

    #[test]
    fn test_channel_count_message() {
        let err = DecodeError::UnsupportedChannelCount {
            path: "a.png".into(),
            channels: 2,
        };
        assert_eq!(err.to_string(), "Unsupported channel count 2 in 'a.png'");
    }
}
