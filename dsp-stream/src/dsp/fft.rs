//! Fixed-point real-input FFT, complex magnitude and peak search.
//!
//! [`RealFft`] is an in-place radix-2 decimation-in-time transform. Every
//! butterfly stage halves its result, so the output is the DFT scaled by
//! `1/N` and never overflows for Q31 input. The output is the full complex
//! spectrum, `[re0, im0, re1, im1, ...]`, `2·N` words long.

use core::f64::consts::PI;

use super::intrinsics::{
    mul_32x32_rshift32_rounded, multiply_accumulate_32x32_rshift32_rounded,
    multiply_subtract_32x32_rshift32_rounded,
};
use super::q31::f64_to_q31;

/// Q31 FFT of `N` real samples. `N` must be a power of two, at least 2.
pub struct RealFft<const N: usize> {
    /// `cos(2πk/N)`, `sin(2πk/N)` pairs for `k` in `0..N/2`.
    twiddles: [i32; N],
}

impl<const N: usize> RealFft<N> {
    const SIZE_OK: () = assert!(N >= 2 && N.is_power_of_two());

    /// Build the twiddle table.
    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::SIZE_OK;
        let mut twiddles = [0i32; N];
        for (k, pair) in twiddles.chunks_exact_mut(2).enumerate() {
            let angle = 2.0 * PI * k as f64 / N as f64;
            pair[0] = f64_to_q31(libm::cos(angle));
            pair[1] = f64_to_q31(libm::sin(angle));
        }
        RealFft { twiddles }
    }

    /// Forward transform of `input` into `output` (`2·N` interleaved words).
    ///
    /// # Panics
    ///
    /// Panics if `output` is shorter than `2·N`.
    pub fn forward(&self, input: &[i32; N], output: &mut [i32]) {
        let out = &mut output[..2 * N];
        let bits = N.trailing_zeros();

        for (i, &x) in input.iter().enumerate() {
            let j = i.reverse_bits() >> (usize::BITS - bits);
            out[2 * j] = x;
            out[2 * j + 1] = 0;
        }

        let mut len = 2;
        while len <= N {
            let half = len / 2;
            let stride = N / len;
            for start in (0..N).step_by(len) {
                for k in 0..half {
                    let c = self.twiddles[2 * k * stride];
                    let s = self.twiddles[2 * k * stride + 1];
                    let a = 2 * (start + k);
                    let b = 2 * (start + k + half);
                    let (ar, ai) = (out[a], out[a + 1]);
                    let (br, bi) = (out[b], out[b + 1]);

                    // (b · e^{-jθ}) / 2
                    let tr = multiply_accumulate_32x32_rshift32_rounded(
                        mul_32x32_rshift32_rounded(br, c),
                        bi,
                        s,
                    );
                    let ti = multiply_subtract_32x32_rshift32_rounded(
                        mul_32x32_rshift32_rounded(bi, c),
                        br,
                        s,
                    );

                    out[a] = (ar >> 1).saturating_add(tr);
                    out[a + 1] = (ai >> 1).saturating_add(ti);
                    out[b] = (ar >> 1).saturating_sub(tr);
                    out[b + 1] = (ai >> 1).saturating_sub(ti);
                }
            }
            len *= 2;
        }
    }
}

impl<const N: usize> Default for RealFft<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Magnitude of each complex bin in `spectrum`, written to `magnitude`.
///
/// Results are Q31, saturated at `i32::MAX`. Converts
/// `min(spectrum.len() / 2, magnitude.len())` bins.
pub fn complex_magnitude(spectrum: &[i32], magnitude: &mut [i32]) {
    for (bin, m) in spectrum.chunks_exact(2).zip(magnitude.iter_mut()) {
        let re = bin[0] as f64;
        let im = bin[1] as f64;
        let mag = libm::sqrt(re * re + im * im);
        *m = if mag >= i32::MAX as f64 {
            i32::MAX
        } else {
            mag as i32
        };
    }
}

/// Largest value and the index of its first occurrence.
pub fn max_with_index(values: &[i32]) -> Option<(i32, usize)> {
    let mut best: Option<(i32, usize)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((max, _)) if v <= max => {}
            _ => best = Some((v, i)),
        }
    }
    best
}
