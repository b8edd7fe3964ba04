//! Block transfer plumbing between the serial-audio DMA and the task.
//!
//! ## Components
//!
//! | Item | Context | Description |
//! |------|---------|-------------|
//! | [`DmaTransfer`] | interrupt | Ping/pong bookkeeping, slot handoff, overrun count |
//! | [`CompletionSignal`] | both | Capacity-1 mailbox of completed slot indices |
//! | [`SignalSource`] | task | [`BlockSource`] pending on a `CompletionSignal` |
//! | [`StopControl`] | both | Stop request flag + fully-stopped event |
//!
//! ## Utilities
//!
//! - [`interleave`]: Stereo frame interleave/deinterleave for Q31 words
//! - [`signal`]: Lock-free handoff primitives with bounded waits

pub mod interleave;
pub mod signal;
pub mod transfer;

pub use signal::{CompletionSignal, Event, StopControl};
pub use transfer::{BlockSource, BlockTransferControl, DmaTransfer, SignalSource, FRAME_WORDS};

#[cfg(test)]
mod integration_tests;
