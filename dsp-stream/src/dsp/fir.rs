//! Low-pass filter design and block FIR filtering in Q31.
//!
//! [`design_low_pass`] produces a windowless (rectangular) sinc, which is
//! symmetric and therefore linear phase. [`FirFilter`] runs a direct-form
//! FIR over whole blocks, carrying the last `TAPS - 1` input samples from
//! one block into the next.
//!
//! ## Single writer
//!
//! `process()` takes `&mut self`: the sliding history belongs to one caller
//! (the streaming task) and is only touched during a filter call.

use core::f32::consts::PI;

use crate::constants::{DSP_SAMPLES_PER_BLOCK, FIR_STATE_LEN, NUM_TAPS};
use crate::error::Error;

use super::intrinsics::saturate32;
use super::q31::float_block_to_q31;

/// Fill `taps` with a low-pass sinc for `cutoff_hz` at `sample_rate_hz`.
///
/// With `c = (len - 1) / 2` and `fn = 2·fc/fs`, the centre tap is `fn` and
/// `taps[c ± k] = sin(π·k·fn) / (k·π)`. Every tap magnitude is at most 1.
///
/// The tap count must be odd and `fn` must lie strictly inside (0, 1). On
/// error `taps` is left untouched.
pub fn design_low_pass(taps: &mut [f32], cutoff_hz: f32, sample_rate_hz: u32) -> Result<(), Error> {
    if taps.is_empty() {
        return Err(Error::EmptyFilter);
    }
    if taps.len() % 2 == 0 {
        return Err(Error::EvenTapCount(taps.len()));
    }
    let normalized = 2.0 * cutoff_hz / sample_rate_hz as f32;
    if !(normalized > 0.0 && normalized < 1.0) {
        return Err(Error::CutoffOutOfRange);
    }

    let centre = (taps.len() - 1) / 2;
    taps[centre] = normalized;
    for k in 1..=centre {
        let kpi = k as f32 * PI;
        let tap = libm::sinf(kpi * normalized) / kpi;
        taps[centre + k] = tap;
        taps[centre - k] = tap;
    }
    Ok(())
}

/// Block FIR filter with Q31 coefficients.
///
/// `STATE` must equal `TAPS + DSP_SAMPLES_PER_BLOCK - 1`; this is checked at
/// compile time when the filter is constructed.
pub struct FirFilter<const TAPS: usize, const STATE: usize> {
    coeffs: [i32; TAPS],
    state: [i32; STATE],
}

/// The demodulation filter used by the processing pipeline.
pub type LowPassFilter = FirFilter<NUM_TAPS, FIR_STATE_LEN>;

impl<const TAPS: usize, const STATE: usize> FirFilter<TAPS, STATE> {
    const LAYOUT_OK: () = assert!(TAPS > 0 && STATE + 1 == TAPS + DSP_SAMPLES_PER_BLOCK);

    /// Create a filter from Q31 coefficients with zeroed history.
    pub fn new(coeffs: [i32; TAPS]) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::LAYOUT_OK;
        FirFilter {
            coeffs,
            state: [0; STATE],
        }
    }

    /// Design a low-pass filter and convert its taps to Q31.
    pub fn low_pass(cutoff_hz: f32, sample_rate_hz: u32) -> Result<Self, Error> {
        let mut taps = [0f32; TAPS];
        design_low_pass(&mut taps, cutoff_hz, sample_rate_hz)?;
        let mut coeffs = [0i32; TAPS];
        float_block_to_q31(&taps, &mut coeffs);
        Ok(Self::new(coeffs))
    }

    pub fn coefficients(&self) -> &[i32; TAPS] {
        &self.coeffs
    }

    /// Length of the sliding-history state, `TAPS + block - 1`.
    pub const fn state_len(&self) -> usize {
        STATE
    }

    /// Forget the input history.
    pub fn reset(&mut self) {
        self.state.fill(0);
    }

    /// Filter one block.
    ///
    /// `y[n] = Σ h[k]·x[n-k]`, accumulated at 64 bits with saturation, then
    /// shifted back to Q31 and saturated.
    pub fn process(
        &mut self,
        input: &[i32; DSP_SAMPLES_PER_BLOCK],
        output: &mut [i32; DSP_SAMPLES_PER_BLOCK],
    ) {
        let history = TAPS - 1;
        self.state[history..].copy_from_slice(input);

        for (n, out) in output.iter_mut().enumerate() {
            let window = &self.state[n..n + TAPS];
            let mut acc: i64 = 0;
            // window[TAPS - 1] is x[n]
            for (&h, &x) in self.coeffs.iter().zip(window.iter().rev()) {
                acc = acc.saturating_add(h as i64 * x as i64);
            }
            *out = saturate32(acc >> 31);
        }

        self.state.copy_within(DSP_SAMPLES_PER_BLOCK.., 0);
    }
}
