// SPDX-License-Identifier: MPL-2.0

//! Display pixel formats and sample conversions

pub mod conversions;
pub mod pixel;

pub use pixel::{PixelBuffer, PixelData, PixelFormat};
