//! Block-processing state machine.
//!
//! The [`Processor`] starts in [`ProcessingState::Startup`]. The first call
//! to [`process()`](Processor::process) runs the whole analysis once:
//!
//! 1. FIR-filter the noisy block → left-channel output
//! 2. FIR-filter the modulated block → demodulated block
//! 3. FFT of the demodulated block → complex spectrum (2·N words)
//! 4. Complex magnitude → magnitude spectrum
//! 5. Peak magnitude and bin over the non-negative frequencies
//! 6. Bin → Hz as `bin · fs / N`
//!
//! and moves to [`ProcessingState::Complete`], after which `process()` does
//! nothing and the stored results are reused unchanged.

use crate::block::SampleBlock;
use crate::config::DspConfig;
use crate::constants::DSP_SAMPLES_PER_BLOCK;
use crate::dsp::{complex_magnitude, max_with_index, LowPassFilter, RealFft, TestSignals};
use crate::error::Error;

const N: usize = DSP_SAMPLES_PER_BLOCK;

/// Processing progress. The only transition is `Startup` → `Complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingState {
    Startup,
    Complete,
}

/// Strongest spectral component found by the analysis.
///
/// Only bins `0..=N/2` are searched, so a mirror bin above `N/2` that ties
/// or rounds higher is never reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peak {
    /// Q31 magnitude of the bin.
    pub magnitude: i32,
    pub bin: usize,
    pub freq_hz: u32,
}

/// Everything the pipeline generates and computes.
///
/// Filled in by [`Processor::new`] and the first `process()` call, then
/// read-only.
#[derive(Clone)]
pub struct SignalRecord {
    /// Floating-point tone, carrier, modulated and noisy signals.
    pub signals: TestSignals,
    /// Q31 tone: the synthetic input block.
    pub input: SampleBlock,
    pub noisy_q: SampleBlock,
    pub modulated_q: SampleBlock,
    /// Low-pass filtered noisy signal (left output).
    pub filtered_audio: SampleBlock,
    /// Low-pass filtered modulated signal.
    pub demodulated: SampleBlock,
    /// `[re, im]` pairs, DFT scaled by `1/N`.
    pub spectrum: [i32; 2 * N],
    pub magnitude: [i32; N],
    pub peak: Option<Peak>,
}

impl SignalRecord {
    fn new(signals: TestSignals) -> Self {
        SignalRecord {
            input: signals.tone_q31(),
            noisy_q: signals.noisy_q31(),
            modulated_q: signals.modulated_q31(),
            signals,
            filtered_audio: SampleBlock::ZERO,
            demodulated: SampleBlock::ZERO,
            spectrum: [0; 2 * N],
            magnitude: [0; N],
            peak: None,
        }
    }
}

/// One-shot filter-and-analyse state machine.
pub struct Processor {
    state: ProcessingState,
    record: SignalRecord,
    filter: LowPassFilter,
    fft: RealFft<N>,
    sample_rate_hz: u32,
}

impl Processor {
    /// Generate the test signals and design the low-pass filter.
    pub fn new(config: &DspConfig) -> Result<Self, Error> {
        let filter = LowPassFilter::low_pass(config.cutoff_hz, config.sample_rate_hz)?;
        let signals = TestSignals::generate(config.tone_hz, config.carrier_hz, config.sample_rate_hz);
        Ok(Processor {
            state: ProcessingState::Startup,
            record: SignalRecord::new(signals),
            filter,
            fft: RealFft::new(),
            sample_rate_hz: config.sample_rate_hz,
        })
    }

    /// Run one step of the state machine and return the resulting state.
    pub fn process(&mut self) -> ProcessingState {
        if self.state == ProcessingState::Startup {
            self.analyse();
            self.state = ProcessingState::Complete;
            if let Some(peak) = self.record.peak {
                log::debug!(
                    "analysis complete: peak bin {} magnitude {} ({} Hz)",
                    peak.bin,
                    peak.magnitude,
                    peak.freq_hz
                );
            }
        }
        self.state
    }

    fn analyse(&mut self) {
        let rec = &mut self.record;

        self.filter
            .process(&rec.noisy_q.samples, &mut rec.filtered_audio.samples);
        self.filter
            .process(&rec.modulated_q.samples, &mut rec.demodulated.samples);

        self.fft.forward(&rec.demodulated.samples, &mut rec.spectrum);
        complex_magnitude(&rec.spectrum, &mut rec.magnitude);

        // bins above N/2 mirror the ones below for real input
        rec.peak = max_with_index(&rec.magnitude[..=N / 2]).map(|(magnitude, bin)| Peak {
            magnitude,
            bin,
            freq_hz: (bin as u64 * self.sample_rate_hz as u64 / N as u64) as u32,
        });
    }

    pub fn state(&self) -> ProcessingState {
        self.state
    }

    pub fn record(&self) -> &SignalRecord {
        &self.record
    }

    /// Detected peak, once the analysis has run.
    pub fn peak(&self) -> Option<Peak> {
        self.record.peak
    }

    /// Left output block: the filtered noisy signal.
    pub fn filtered_audio(&self) -> &SampleBlock {
        &self.record.filtered_audio
    }

    /// The synthetic input block (Q31 tone).
    pub fn input(&self) -> &SampleBlock {
        &self.record.input
    }

    /// Width of one FFT bin in Hz.
    pub fn bin_width_hz(&self) -> f32 {
        self.sample_rate_hz as f32 / N as f32
    }
}
