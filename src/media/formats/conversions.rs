// SPDX-License-Identifier: MPL-2.0

//! Sample conversions between float working values and display containers

/// sRGB transfer function (IEC 61966-2-1) for one linear channel value
pub fn linear_to_srgb(v: f32) -> f32 {
    if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

/// Clamp to [0, 1], scale to 255 and round
pub fn quantize_u8(v: f32) -> u8 {
    (clamp_unit(v) * 255.0).round() as u8
}

/// Clamp to [0, 1], scale to 65535 and round
pub fn quantize_u16(v: f32) -> u16 {
    (clamp_unit(v) * 65535.0).round() as u16
}

/// NaN becomes 0
fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srgb_curve() {
        assert_eq!(linear_to_srgb(0.0), 0.0);
        assert!((linear_to_srgb(1.0) - 1.0).abs() < 1e-6);
        assert!((linear_to_srgb(0.002) - 0.02584).abs() < 1e-5);
        // Mid gray
        assert!((linear_to_srgb(0.2140) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_quantize() {
        assert_eq!(quantize_u8(-0.5), 0);
        assert_eq!(quantize_u8(0.5), 128);
        assert_eq!(quantize_u8(2.0), 255);
        assert_eq!(quantize_u8(f32::NAN), 0);
        assert_eq!(quantize_u16(1.0), 65535);
        assert_eq!(quantize_u16(0.0), 0);
        assert_eq!(quantize_u16(f32::INFINITY), 65535);
    }
}
