/// Number of Q31 samples per block (one transfer, one processing unit).
pub const DSP_SAMPLES_PER_BLOCK: usize = 128;

/// Slots per double buffer (ping and pong).
pub const DSP_NUM_BLOCKS: usize = 2;

/// Number of input channels (left, right).
pub const DSP_NUM_IN_CHANNELS: usize = 2;

/// Number of output channels (left, right).
pub const DSP_NUM_OUT_CHANNELS: usize = 2;

/// Slot whose completion closes a full double-buffer cycle.
pub const LAST_SLOT: u8 = (DSP_NUM_BLOCKS - 1) as u8;

/// Tap count of the demodulation low-pass filter. Must be odd.
pub const NUM_TAPS: usize = 31;

/// Length of the FIR sliding-history state.
pub const FIR_STATE_LEN: usize = NUM_TAPS + DSP_SAMPLES_PER_BLOCK - 1;

/// Rate the synthetic test signals are generated at, in Hz.
pub const SAMPLE_RATE_HZ: u32 = 48_000;
