//! Error types.
//!
//! [`Error`] covers everything the pipeline itself can reject. Faults raised
//! by the codec/transport collaborators are wrapped in [`ControlError`] so
//! their bus error type reaches the caller untouched.

use thiserror::Error;

/// Pipeline error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// A bounded wait expired before the event arrived.
    #[error("timed out waiting for the next block")]
    Timeout,

    /// Sample-rate code outside the rate table.
    #[error("unsupported sample rate code {0}")]
    UnsupportedSampleRate(u8),

    /// Sample-size code outside the word-size table.
    #[error("unsupported sample size code {0}")]
    UnsupportedSampleSize(u8),

    /// Linear-phase low-pass design needs an odd tap count.
    #[error("tap count {0} is even, expected an odd count")]
    EvenTapCount(usize),

    /// Zero taps requested.
    #[error("filter has no taps")]
    EmptyFilter,

    /// Normalized cutoff `2 * fc / fs` is not strictly inside (0, 1).
    #[error("cutoff frequency must lie strictly between 0 and fs/2")]
    CutoffOutOfRange,

    /// Raw buffer identifier does not name one of the four buffers.
    #[error("unknown buffer id {0}")]
    UnknownBuffer(u8),

    /// Slot index is neither 0 nor 1.
    #[error("slot index {0} out of range")]
    InvalidSlot(u8),

    /// The slot is owned by the other side of the double buffer.
    #[error("slot {slot} is busy")]
    SlotBusy {
        /// Contended slot index.
        slot: u8,
    },
}

/// Error from a controller operation that touches external collaborators.
#[derive(Debug, Error)]
pub enum ControlError<E> {
    /// The codec or serial transport reported a failure.
    #[error("codec error: {0:?}")]
    Codec(E),

    /// The request was rejected before reaching the hardware.
    #[error(transparent)]
    Dsp(#[from] Error),
}
