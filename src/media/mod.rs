// SPDX-License-Identifier: MPL-2.0

//! Image decoding and display conversion
//!
//! # Modules
//!
//! - [`decoders`]: Reading files into float images with their metadata
//! - [`display`]: Colorizing, color conversion and resizing for 2D display
//! - [`formats`]: Display pixel containers and sample quantization
//! - [`handler`]: Image I/O plugin and per-source handler

pub mod decoders;
pub mod display;
pub mod formats;
pub mod handler;

// Re-export commonly used types
pub use decoders::{DecodeConfig, DecodedImage};
pub use display::{DisplayOptions, decode_for_display, render_for_display};
pub use formats::{PixelBuffer, PixelFormat};
pub use handler::{ImageIoHandler, ImageIoPlugin, ImageSource};
