// SPDX-License-Identifier: GPL-3.0-only

//! Image I/O plugin surface
//!
//! [`ImageIoPlugin`] answers "can this source be read" for a host image
//! framework and creates [`ImageIoHandler`]s, which read one source into a
//! display [`PixelBuffer`] through the decode adapter. Only file sources are
//! readable; the caller states the source kind explicitly.

use super::decoders;
use super::display::{DisplayOptions, decode_for_display};
use super::formats::PixelBuffer;
use crate::constants::HANDLER_NAME;
use crate::errors::DecodeError;
use image::ImageFormat;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Kind of device a source comes from
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// Seekable file on disk
    File,
    /// Anything else (sockets, in-memory buffers, embedded resources)
    Stream,
}

/// A source handed over by the host framework
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub kind: SourceKind,
    pub path: PathBuf,
}

impl ImageSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: SourceKind::File,
            path: path.into(),
        }
    }

    pub fn stream(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: SourceKind::Stream,
            path: path.into(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub can_read: bool,
}

/// Options a handler can be queried or configured with
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ImageOption {
    /// Full image size, read from the header only
    Size,
    /// Target size of the read result
    ScaledSize,
    /// Orientation is applied while reading
    TransformedByDefault,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Size(u32, u32),
    Bool(bool),
}

/// Extensions readable by the decoders, lowercase and sorted
pub fn supported_extensions() -> Vec<String> {
    let mut extensions: BTreeSet<String> = ImageFormat::all()
        .filter(|format| format.reading_enabled())
        .flat_map(|format| format.extensions_str().iter())
        .map(|ext| ext.to_ascii_lowercase())
        .collect();
    extensions.insert("exr".to_string());
    extensions.into_iter().collect()
}

/// Entry point registered with the host framework
#[derive(Debug, Clone)]
pub struct ImageIoPlugin {
    extensions: Vec<String>,
    /// Formats left to the host's native readers
    blacklist: Vec<String>,
    options: DisplayOptions,
}

impl ImageIoPlugin {
    pub fn new(options: DisplayOptions) -> Self {
        let extensions = supported_extensions();
        info!(count = extensions.len(), "Image plugin initialized");
        debug!(extensions = %extensions.join(", "), "Supported extensions");
        Self {
            extensions,
            blacklist: Vec::new(),
            options,
        }
    }

    /// Leave these formats to the host
    pub fn with_blacklist<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist = formats.into_iter().map(Into::into).collect();
        self
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// What this plugin can do with `source` declared as `format`
    ///
    /// Non-file sources, empty paths and embedded resource paths (leading
    /// `:`) are never readable.
    pub fn capabilities(&self, source: &ImageSource, format: &str) -> Capabilities {
        if source.kind != SourceKind::File {
            return Capabilities::default();
        }
        let path = source.path.to_string_lossy();
        if path.is_empty() || path.starts_with(':') {
            return Capabilities::default();
        }
        if self.blacklist.iter().any(|b| b.eq_ignore_ascii_case(format)) {
            debug!(format, "Format left to the host");
            return Capabilities::default();
        }

        let can_read = self.extensions.iter().any(|e| e.eq_ignore_ascii_case(format));
        debug!(format, can_read, "Capabilities");
        Capabilities { can_read }
    }

    pub fn create(&self, source: ImageSource) -> ImageIoHandler {
        ImageIoHandler::new(source, self.options.clone())
    }
}

/// Reads one source
#[derive(Debug, Clone)]
pub struct ImageIoHandler {
    source: ImageSource,
    options: DisplayOptions,
}

impl ImageIoHandler {
    pub fn new(source: ImageSource, options: DisplayOptions) -> Self {
        Self { source, options }
    }

    pub fn name(&self) -> &'static str {
        HANDLER_NAME
    }

    pub fn can_read(&self) -> bool {
        Self::can_read_source(self.source.kind)
    }

    /// Only files can be read
    pub fn can_read_source(kind: SourceKind) -> bool {
        kind == SourceKind::File
    }

    pub fn supports_option(&self, option: ImageOption) -> bool {
        matches!(
            option,
            ImageOption::Size | ImageOption::ScaledSize | ImageOption::TransformedByDefault
        )
    }

    pub fn option(&self, option: ImageOption) -> Option<OptionValue> {
        match option {
            ImageOption::Size => self.size().ok().map(|(w, h)| OptionValue::Size(w, h)),
            ImageOption::ScaledSize => self
                .options
                .scaled_size
                .map(|(w, h)| OptionValue::Size(w, h)),
            ImageOption::TransformedByDefault => {
                Some(OptionValue::Bool(self.options.decode.apply_orientation))
            }
        }
    }

    /// Returns whether the option was accepted
    pub fn set_option(&mut self, option: ImageOption, value: OptionValue) -> bool {
        match (option, value) {
            (ImageOption::ScaledSize, OptionValue::Size(w, h)) => {
                self.options.scaled_size = (w > 0 && h > 0).then_some((w, h));
                true
            }
            _ => {
                debug!(?option, "Ignoring unsupported option");
                false
            }
        }
    }

    /// Full image size from the file header
    pub fn size(&self) -> Result<(u32, u32), DecodeError> {
        self.file_path()
            .and_then(decoders::image_dimensions)
    }

    pub fn read(&self) -> Result<PixelBuffer, DecodeError> {
        let path = self.file_path()?;
        info!(path = %path.display(), "Read image");
        decode_for_display(path, &self.options).inspect_err(|e| {
            warn!(path = %path.display(), error = %e, "Failed to read image");
        })
    }

    fn file_path(&self) -> Result<&Path, DecodeError> {
        if !self.can_read() {
            warn!("Read image failed (not a file)");
            return Err(DecodeError::NotAFile);
        }
        Ok(&self.source.path)
    }
}
