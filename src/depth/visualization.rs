// SPDX-License-Identifier: GPL-3.0-only

//! Scalar to color mapping
//!
//! The jet map is a fixed 64-entry piecewise-linear ramp (blue, cyan, green,
//! yellow, red). Two variants exist:
//! - non-clamping: values <= 0 are black and values >= 1 are white
//! - clamping: values are clamped into [0, 1] before lookup
//!
//! NaN always maps to magenta so invalid inputs stay visible.
//! The perceptual maps (plasma, viridis, magma, inferno) are key-color
//! interpolations and always clamp.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const JET_R: [f32; 64] = [
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0625, 0.1250, 0.1875, 0.2500, 0.3125, 0.3750, 0.4375, 0.5000,
    0.5625, 0.6250, 0.6875, 0.7500, 0.8125, 0.8750, 0.9375, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000,
    1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000,
    0.9375, 0.8750, 0.8125, 0.7500, 0.6875, 0.6250, 0.5625, 0.5000,
];

const JET_G: [f32; 64] = [
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0625, 0.1250, 0.1875, 0.2500, 0.3125, 0.3750, 0.4375,
    0.5000, 0.5625, 0.6250, 0.6875, 0.7500, 0.8125, 0.8750, 0.9375, 1.0000, 1.0000, 1.0000, 1.0000,
    1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000,
    1.0000, 0.9375, 0.8750, 0.8125, 0.7500, 0.6875, 0.6250, 0.5625, 0.5000, 0.4375, 0.3750, 0.3125,
    0.2500, 0.1875, 0.1250, 0.0625, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

const JET_B: [f32; 64] = [
    0.5625, 0.6250, 0.6875, 0.7500, 0.8125, 0.8750, 0.9375, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000,
    1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000,
    0.9375, 0.8750, 0.8125, 0.7500, 0.6875, 0.6250, 0.5625, 0.5000, 0.4375, 0.3750, 0.3125, 0.2500,
    0.1875, 0.1250, 0.0625, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

/// Highest index whose successor is still inside the jet tables
const JET_LAST_SEGMENT: usize = JET_R.len() - 2;

/// RGB color with float channels, nominally in [0, 1]
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ScalarColor(pub [f32; 3]);

impl ScalarColor {
    pub const BLACK: ScalarColor = ScalarColor([0.0, 0.0, 0.0]);
    pub const WHITE: ScalarColor = ScalarColor([1.0, 1.0, 1.0]);
    /// Marker for NaN inputs
    pub const INVALID: ScalarColor = ScalarColor([1.0, 0.0, 1.0]);

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self([r, g, b])
    }

    pub fn r(&self) -> f32 {
        self.0[0]
    }

    pub fn g(&self) -> f32 {
        self.0[1]
    }

    pub fn b(&self) -> f32 {
        self.0[2]
    }
}

/// Map a scalar to a jet color
///
/// With `clamp == false`, values <= 0 give black and values >= 1 give white.
/// With `clamp == true`, values are clamped into [0, 1] first.
/// NaN gives magenta in both modes.
pub fn color_from_scalar(value: f32, clamp: bool) -> ScalarColor {
    if value.is_nan() {
        return ScalarColor::INVALID;
    }

    let value = if clamp {
        value.clamp(0.0, 1.0)
    } else if value <= 0.0 {
        return ScalarColor::BLACK;
    } else if value >= 1.0 {
        return ScalarColor::WHITE;
    } else {
        value
    };

    jet_lookup(value)
}

/// Interpolate the jet tables at `value * 63`, `value` in [0, 1]
fn jet_lookup(value: f32) -> ScalarColor {
    let idx_f = value * (JET_R.len() - 1) as f32;
    // value == 1.0 lands exactly on the last entry
    let i = (idx_f.floor() as usize).min(JET_LAST_SEGMENT);
    let frac = idx_f - i as f32;
    let lerp = |table: &[f32; 64]| table[i] * (1.0 - frac) + table[i + 1] * frac;

    ScalarColor([lerp(&JET_R), lerp(&JET_G), lerp(&JET_B)])
}

// Key colors for the perceptual maps, sampled from the matplotlib definitions

const PLASMA_KEYS: &[(f32, [u8; 3])] = &[
    (0.00, [13, 8, 135]),
    (0.25, [126, 3, 168]),
    (0.50, [204, 71, 120]),
    (0.75, [248, 149, 64]),
    (1.00, [240, 249, 33]),
];

const VIRIDIS_KEYS: &[(f32, [u8; 3])] = &[
    (0.00, [68, 1, 84]),
    (0.25, [59, 82, 139]),
    (0.50, [33, 145, 140]),
    (0.75, [94, 201, 98]),
    (1.00, [253, 231, 37]),
];

const MAGMA_KEYS: &[(f32, [u8; 3])] = &[
    (0.00, [0, 0, 4]),
    (0.25, [81, 18, 124]),
    (0.50, [183, 55, 121]),
    (0.75, [252, 137, 97]),
    (1.00, [252, 253, 191]),
];

const INFERNO_KEYS: &[(f32, [u8; 3])] = &[
    (0.00, [0, 0, 4]),
    (0.20, [40, 11, 84]),
    (0.40, [101, 21, 110]),
    (0.60, [182, 55, 84]),
    (0.80, [243, 132, 48]),
    (1.00, [252, 255, 164]),
];

fn interpolate_keys(keys: &[(f32, [u8; 3])], value: f32) -> ScalarColor {
    let v = value.clamp(0.0, 1.0);

    let lower = keys.iter().rposition(|&(t, _)| t <= v).unwrap_or(0);
    let upper = (lower + 1).min(keys.len() - 1);

    let (t0, c0) = keys[lower];
    if lower == upper {
        return ScalarColor(c0.map(|c| c as f32 / 255.0));
    }
    let (t1, c1) = keys[upper];
    let t = (v - t0) / (t1 - t0);

    let channel = |k: usize| (c0[k] as f32 + t * (c1[k] as f32 - c0[k] as f32)) / 255.0;
    ScalarColor([channel(0), channel(1), channel(2)])
}

/// Colormaps usable for single-channel images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColormapKind {
    /// 64-entry jet ramp
    #[default]
    Jet,
    Plasma,
    Viridis,
    Magma,
    Inferno,
}

impl ColormapKind {
    pub const ALL: [ColormapKind; 5] = [
        ColormapKind::Jet,
        ColormapKind::Plasma,
        ColormapKind::Viridis,
        ColormapKind::Magma,
        ColormapKind::Inferno,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ColormapKind::Jet => "jet",
            ColormapKind::Plasma => "plasma",
            ColormapKind::Viridis => "viridis",
            ColormapKind::Magma => "magma",
            ColormapKind::Inferno => "inferno",
        }
    }

    /// Map a scalar to a color
    ///
    /// `clamp` only selects the jet variant; the perceptual maps always clamp.
    pub fn color(&self, value: f32, clamp: bool) -> ScalarColor {
        if value.is_nan() {
            return ScalarColor::INVALID;
        }
        match self {
            ColormapKind::Jet => color_from_scalar(value, clamp),
            ColormapKind::Plasma => interpolate_keys(PLASMA_KEYS, value),
            ColormapKind::Viridis => interpolate_keys(VIRIDIS_KEYS, value),
            ColormapKind::Magma => interpolate_keys(MAGMA_KEYS, value),
            ColormapKind::Inferno => interpolate_keys(INFERNO_KEYS, value),
        }
    }
}

impl fmt::Display for ColormapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColormapKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColormapKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let known: Vec<&str> = ColormapKind::ALL.iter().map(|k| k.name()).collect();
                format!("unknown colormap '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::formats::conversions::quantize_u8;

    fn assert_close(a: ScalarColor, b: ScalarColor) {
        for k in 0..3 {
            assert!((a.0[k] - b.0[k]).abs() < 1e-5, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn test_nan_is_magenta() {
        assert_eq!(color_from_scalar(f32::NAN, false), ScalarColor::INVALID);
        assert_eq!(color_from_scalar(f32::NAN, true), ScalarColor::INVALID);
        assert_eq!(ColormapKind::Viridis.color(f32::NAN, true), ScalarColor::INVALID);
    }

    #[test]
    fn test_non_clamping_bounds() {
        assert_eq!(color_from_scalar(-5.0, false), ScalarColor::BLACK);
        assert_eq!(color_from_scalar(0.0, false), ScalarColor::BLACK);
        assert_eq!(color_from_scalar(5.0, false), ScalarColor::WHITE);
        assert_eq!(color_from_scalar(1.0, false), ScalarColor::WHITE);
    }

    #[test]
    fn test_clamping_bounds() {
        assert_eq!(color_from_scalar(-5.0, true), color_from_scalar(0.0, true));
        assert_eq!(color_from_scalar(0.0, true), ScalarColor::new(0.0, 0.0, 0.5625));
        // Upper bound sits on the last table entry instead of reading past it
        assert_eq!(color_from_scalar(5.0, true), ScalarColor::new(0.5, 0.0, 0.0));
        assert_eq!(color_from_scalar(1.0, true), ScalarColor::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn test_interpolates_table() {
        for step in 1..100 {
            let v = step as f32 / 100.0;
            let idx_f = v * 63.0;
            let i = idx_f.floor() as usize;
            let frac = idx_f - i as f32;
            let expected = ScalarColor([
                JET_R[i] * (1.0 - frac) + JET_R[i + 1] * frac,
                JET_G[i] * (1.0 - frac) + JET_G[i + 1] * frac,
                JET_B[i] * (1.0 - frac) + JET_B[i + 1] * frac,
            ]);
            let color = color_from_scalar(v, false);
            assert_close(color, expected);
            assert!(color.0.iter().all(|c| (0.0..=1.0).contains(c)));
        }
    }

    #[test]
    fn test_exact_entry() {
        // 24/63 is exactly entry 24
        let color = color_from_scalar(24.0 / 63.0, false);
        assert_close(color, ScalarColor::new(0.0625, 1.0, 0.9375));
    }

    #[test]
    fn test_repeatable() {
        for v in [-1.0, 0.1, 0.5, 0.99, 2.0] {
            assert_eq!(color_from_scalar(v, false), color_from_scalar(v, false));
            assert_eq!(color_from_scalar(v, true), color_from_scalar(v, true));
        }
    }

    fn rgb8(color: ScalarColor) -> [u8; 3] {
        color.0.map(quantize_u8)
    }

    #[test]
    fn test_perceptual_maps_hit_keys() {
        assert_eq!(rgb8(ColormapKind::Viridis.color(0.0, false)), [68, 1, 84]);
        assert_eq!(rgb8(ColormapKind::Plasma.color(1.0, false)), [240, 249, 33]);
        assert_eq!(rgb8(ColormapKind::Magma.color(-3.0, false)), [0, 0, 4]);
        assert_eq!(rgb8(ColormapKind::Inferno.color(0.4, false)), [101, 21, 110]);
    }

    #[test]
    fn test_parse_colormap_kind() {
        assert_eq!("JET".parse::<ColormapKind>(), Ok(ColormapKind::Jet));
        assert_eq!(" viridis ".parse::<ColormapKind>(), Ok(ColormapKind::Viridis));
        assert!("spectrum".parse::<ColormapKind>().is_err());
    }
}
