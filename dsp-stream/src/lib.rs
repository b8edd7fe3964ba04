//! # dsp-stream
//!
//! A `no_std`, zero-allocation block-streaming audio pipeline. A serial-audio
//! DMA fills and drains double-buffered Q31 sample blocks while a streaming
//! task filters a synthetic signal and runs a one-shot spectral analysis,
//! all within one block period.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Memory | [`block`] | Double-buffered sample blocks with per-slot ownership |
//! | I/O | [`io`] | Transfer-complete handling, completion signal, stop handshake |
//! | DSP | [`dsp`] | Q31 conversion, test signals, FIR low-pass, FFT |
//! | Processing | [`processing`] | One-shot filter-and-analyse state machine |
//! | Task | [`task`] | Streaming loop between completions and output slots |
//! | Control | [`control`] | Codec/transport traits, rate/size config, start/stop |
//!
//! ## Data flow
//!
//! ```text
//!   DMA ISR ──exchange()──► input slot K      output slot K ──► DMA ISR
//!      │                                            ▲
//!      └─on_complete()─► CompletionSignal ─► StreamingTask::step()
//!                                                   │
//!                                        Processor::process() (once)
//! ```
//!
//! ## Quick start
//!
//! ```ignore
//! use dsp_stream::prelude::*;
//!
//! static POOL: BufferPool = BufferPool::new();
//! static SIGNAL: CompletionSignal = CompletionSignal::new();
//! static STOP: StopControl = StopControl::new();
//! static DMA: DmaTransfer<'static> = DmaTransfer::new(&POOL, &SIGNAL);
//!
//! let config = DspConfig::default();
//! let mut dsp = Dsp::new(codec, transport, &DMA, &STOP, &POOL);
//! let processor = dsp.init(&config)?;
//! dsp.request_start()?;
//!
//! // task context:
//! let mut task = StreamingTask::new(&POOL, &STOP, processor, &config);
//! task.run(&mut SignalSource::for_transfer(&DMA, delay));
//! ```
//!
//! ## Audio parameters
//!
//! - **Block size:** 128 samples ([`constants::DSP_SAMPLES_PER_BLOCK`])
//! - **Slots:** 2 per buffer ([`constants::DSP_NUM_BLOCKS`])
//! - **Sample format:** Q31 (`i32`, 1.31 fixed point)
//! - **Sample rates:** 11 table entries from 8 kHz to 48 kHz ([`config::SAMPLE_RATE_TABLE`])

#![no_std]

pub mod block;
pub mod config;
pub mod constants;
pub mod control;
pub mod dsp;
pub mod error;
pub mod io;
pub mod processing;
pub mod task;

pub use error::{ControlError, Error};

/// Commonly used types.
pub mod prelude {
    pub use crate::block::{BufferId, BufferPool, Channel, DoubleBuffer, SampleBlock};
    pub use crate::config::{DspConfig, DspParams, MonitorSource, Timeout};
    pub use crate::control::{CodecControl, Dsp, SerialTransport};
    pub use crate::error::{ControlError, Error};
    pub use crate::io::{
        BlockSource, BlockTransferControl, CompletionSignal, DmaTransfer, SignalSource, StopControl,
    };
    pub use crate::processing::{ProcessingState, Processor};
    pub use crate::task::{Step, StreamingTask};
}
