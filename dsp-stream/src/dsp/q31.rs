//! Q31 (1.31 fixed point) conversions.

use super::intrinsics::saturate32;

/// One Q31 quantization step, `2^-31`.
pub const Q31_STEP: f64 = 1.0 / 2_147_483_648.0;

const Q31_SCALE: f64 = 2_147_483_648.0;

/// Convert a float to Q31, rounding to nearest and saturating.
///
/// `1.0` saturates to `i32::MAX`; `-1.0` maps exactly to `i32::MIN`.
#[inline]
pub fn float_to_q31(value: f32) -> i32 {
    f64_to_q31(value as f64)
}

/// Double-precision variant of [`float_to_q31`], used for tables.
#[inline]
pub fn f64_to_q31(value: f64) -> i32 {
    let scaled = value * Q31_SCALE;
    let rounded = if scaled >= 0.0 { scaled + 0.5 } else { scaled - 0.5 };
    // float-to-int `as` saturates and truncates toward zero
    saturate32(rounded as i64)
}

/// Convert a Q31 value to a float in `[-1, 1)`.
#[inline]
pub fn q31_to_float(value: i32) -> f32 {
    (value as f64 * Q31_STEP) as f32
}

/// Convert a whole block of floats to Q31.
pub fn float_block_to_q31(src: &[f32], dst: &mut [i32]) {
    debug_assert_eq!(src.len(), dst.len());
    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        *d = float_to_q31(s);
    }
}

/// Convert a whole block of Q31 values to floats.
pub fn q31_block_to_float(src: &[i32], dst: &mut [f32]) {
    debug_assert_eq!(src.len(), dst.len());
    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        *d = q31_to_float(s);
    }
}
