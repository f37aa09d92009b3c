//! Angle normalization and 16-bit quantization.
//!
//! The quantization here is the compact-angle wire encoding used by state
//! updates and inputs.

use std::f32::consts::TAU;

/// Number of discrete compact-angle steps in a full circle.
pub const ANGLE_STEPS: u32 = 1 << 16;

/// Width of one compact-angle step in radians (≈ 0.0000959).
pub const ANGLE_STEP: f32 = TAU / ANGLE_STEPS as f32;

/// Normalize any radian value into `[0, 2π)`.
///
/// Non-finite input normalizes to `0.0`.
pub fn normalize_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let a = angle.rem_euclid(TAU);
    // rem_euclid can round up to TAU for tiny negative inputs
    if a >= TAU { 0.0 } else { a }
}

/// Quantize an angle to 16 bits after normalizing it.
pub fn quantize_angle(angle: f32) -> u16 {
    let scaled = (normalize_angle(angle) / TAU * ANGLE_STEPS as f32).round() as u32;
    (scaled % ANGLE_STEPS) as u16
}

/// Inverse of [`quantize_angle`]; always in `[0, 2π)`.
pub fn dequantize_angle(quantized: u16) -> f32 {
    f32::from(quantized) * ANGLE_STEP
}

/// Shortest absolute distance between two angles, accounting for wraparound.
pub fn angle_distance(a: f32, b: f32) -> f32 {
    let d = (normalize_angle(a) - normalize_angle(b)).abs();
    d.min(TAU - d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_wraps_into_range() {
        assert_eq!(normalize_angle(0.0), 0.0);
        assert!((normalize_angle(-PI / 2.0) - 1.5 * PI).abs() < 1e-6);
        assert!((normalize_angle(5.0 * TAU + 1.0) - 1.0).abs() < 1e-4);
        assert_eq!(normalize_angle(TAU), 0.0);
        assert_eq!(normalize_angle(f32::NAN), 0.0);
        assert_eq!(normalize_angle(f32::INFINITY), 0.0);

        let tiny = normalize_angle(-1e-9);
        assert!((0.0..TAU).contains(&tiny));
    }

    #[test]
    fn test_quantize_error_bounded_by_one_step() {
        let mut angle = -20.0_f32;
        while angle < 20.0 {
            let back = dequantize_angle(quantize_angle(angle));
            let err = angle_distance(back, angle);
            assert!(
                err <= ANGLE_STEP,
                "angle {angle}: error {err} exceeds step {ANGLE_STEP}"
            );
            angle += 0.0137;
        }
    }

    #[test]
    fn test_quantize_wraps_near_full_circle() {
        // Just below 2π rounds to step 65536, which wraps to 0
        assert_eq!(quantize_angle(TAU - ANGLE_STEP * 0.25), 0);
        assert_eq!(quantize_angle(PI), 32768);
    }

    #[test]
    fn test_quantize_is_idempotent() {
        for q in [0u16, 1, 255, 32768, 65535] {
            assert_eq!(quantize_angle(dequantize_angle(q)), q);
        }
    }
}
