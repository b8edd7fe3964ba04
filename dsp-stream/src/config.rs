//! Sample-rate / word-size tables and pipeline configuration.
//!
//! Rates and sizes are selected by small numeric codes that index fixed
//! tables. Codes are checked at the boundary: an out-of-range code is turned
//! into an [`Error`] before it can reach the codec or the parameter record.

use crate::constants::SAMPLE_RATE_HZ;
use crate::error::Error;

/// Supported sample rates in Hz, indexed by rate code.
pub const SAMPLE_RATE_TABLE: [u32; 11] = [
    48_000, 32_000, 24_000, 19_200, 16_000, 13_700, 12_000, 10_700, 9_600, 8_700, 8_000,
];

/// Supported sample word sizes in bits, indexed by size code.
pub const SAMPLE_SIZE_TABLE: [u8; 4] = [16, 20, 24, 32];

/// Checked index into [`SAMPLE_RATE_TABLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRateCode(u8);

impl SampleRateCode {
    /// 48 kHz.
    pub const RATE_48K: Self = SampleRateCode(0);

    /// Raw table index, as programmed into the codec.
    pub const fn code(self) -> u8 {
        self.0
    }

    /// Sample rate in Hz.
    pub const fn hz(self) -> u32 {
        SAMPLE_RATE_TABLE[self.0 as usize]
    }
}

impl TryFrom<u8> for SampleRateCode {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Error> {
        if (code as usize) < SAMPLE_RATE_TABLE.len() {
            Ok(SampleRateCode(code))
        } else {
            Err(Error::UnsupportedSampleRate(code))
        }
    }
}

/// Checked index into [`SAMPLE_SIZE_TABLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSizeCode(u8);

impl SampleSizeCode {
    /// 16-bit words.
    pub const BITS_16: Self = SampleSizeCode(0);
    /// 32-bit words.
    pub const BITS_32: Self = SampleSizeCode(3);

    /// Raw table index.
    pub const fn code(self) -> u8 {
        self.0
    }

    /// Word size in bits.
    pub const fn bits(self) -> u8 {
        SAMPLE_SIZE_TABLE[self.0 as usize]
    }
}

impl TryFrom<u8> for SampleSizeCode {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Error> {
        if (code as usize) < SAMPLE_SIZE_TABLE.len() {
            Ok(SampleSizeCode(code))
        } else {
            Err(Error::UnsupportedSampleSize(code))
        }
    }
}

/// Current sample rate and word size, as last applied to the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DspParams {
    /// Sample rate in Hz.
    pub sample_rate_hz: u32,
    /// Sample word size in bits.
    pub sample_size_bits: u8,
}

/// How long a wait may block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeout {
    /// Block until the event arrives.
    #[default]
    Forever,
    /// Give up after this many microseconds.
    Micros(u32),
}

impl From<u32> for Timeout {
    /// `0` means wait forever, any other value is a limit in microseconds.
    fn from(us: u32) -> Self {
        match us {
            0 => Timeout::Forever,
            us => Timeout::Micros(us),
        }
    }
}

/// What the right output channel carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitorSource {
    /// The unfiltered synthetic tone block.
    #[default]
    Synthetic,
    /// The live right input slot with the same index.
    LineIn,
}

/// Signal, filter and task settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DspConfig {
    /// Reference tone frequency (f1), Hz.
    pub tone_hz: f32,
    /// Carrier frequency (f2), Hz.
    pub carrier_hz: f32,
    /// Low-pass cutoff, Hz.
    pub cutoff_hz: f32,
    /// Rate the synthetic signals and the filter are designed for, Hz.
    pub sample_rate_hz: u32,
    /// Block-wait timeout used by the streaming task.
    pub block_timeout: Timeout,
    /// Right output channel source.
    pub monitor: MonitorSource,
}

impl Default for DspConfig {
    fn default() -> Self {
        DspConfig {
            tone_hz: 3_750.0,
            carrier_hz: 18_750.0,
            cutoff_hz: 4_000.0,
            sample_rate_hz: SAMPLE_RATE_HZ,
            block_timeout: Timeout::Forever,
            monitor: MonitorSource::Synthetic,
        }
    }
}
