//! Synthetic test signals standing in for a live input.
//!
//! A low-level tone is buried under a carrier two ways: additively (the
//! "noisy" signal, recovered by low-pass filtering) and multiplicatively
//! (the "modulated" signal, demodulated by the same filter). All sequences
//! are scaled by 1/8 so they stay well inside Q31 range for any choice of
//! frequencies.

use core::f32::consts::PI;

use crate::block::SampleBlock;
use crate::constants::DSP_SAMPLES_PER_BLOCK;

use super::q31::float_block_to_q31;

type FloatBlock = [f32; DSP_SAMPLES_PER_BLOCK];

/// One block of each synthetic signal, in floating point.
#[derive(Clone)]
pub struct TestSignals {
    /// `cos(2π·i·f1/fs) / 8`
    pub tone: FloatBlock,
    /// `cos(2π·i·f2/fs)`
    pub carrier: FloatBlock,
    /// `tone · carrier²`
    pub modulated: FloatBlock,
    /// `tone + carrier / 8`
    pub noisy: FloatBlock,
}

impl TestSignals {
    /// Generate one block of each signal for tone `tone_hz` and carrier
    /// `carrier_hz` at `sample_rate_hz`.
    pub fn generate(tone_hz: f32, carrier_hz: f32, sample_rate_hz: u32) -> Self {
        let fs = sample_rate_hz as f32;
        let mut signals = TestSignals {
            tone: [0.0; DSP_SAMPLES_PER_BLOCK],
            carrier: [0.0; DSP_SAMPLES_PER_BLOCK],
            modulated: [0.0; DSP_SAMPLES_PER_BLOCK],
            noisy: [0.0; DSP_SAMPLES_PER_BLOCK],
        };

        for i in 0..DSP_SAMPLES_PER_BLOCK {
            let n = i as f32;
            let tone = libm::cosf(2.0 * PI * n * tone_hz / fs) / 8.0;
            let carrier = libm::cosf(2.0 * PI * n * carrier_hz / fs);
            signals.tone[i] = tone;
            signals.carrier[i] = carrier;
            signals.modulated[i] = tone * carrier * carrier;
            signals.noisy[i] = tone + carrier / 8.0;
        }
        signals
    }

    /// The tone as a Q31 block (the synthetic input).
    pub fn tone_q31(&self) -> SampleBlock {
        to_q31_block(&self.tone)
    }

    pub fn noisy_q31(&self) -> SampleBlock {
        to_q31_block(&self.noisy)
    }

    pub fn modulated_q31(&self) -> SampleBlock {
        to_q31_block(&self.modulated)
    }
}

/// Saturating round-to-nearest conversion of a whole float block.
pub fn to_q31_block(samples: &FloatBlock) -> SampleBlock {
    let mut block = SampleBlock::ZERO;
    float_block_to_q31(samples, &mut block.samples);
    block
}
