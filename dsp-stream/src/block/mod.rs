//! Sample blocks, double buffers and the buffer pool.
//!
//! Each of the four logical buffers (left/right × in/out) is a
//! [`DoubleBuffer`]: two [`SampleBlock`] slots whose ownership alternates
//! between the transfer mechanism and the streaming task. Ownership is
//! claimed with a compare-and-swap on a per-slot state byte and released
//! when the returned [`SlotMut`] guard drops, so a slot can never be held
//! by both sides at once.

mod double_buffer;
mod pool;

pub use double_buffer::{DoubleBuffer, SlotMut, SlotOwner};
pub use pool::BufferPool;

use crate::constants::DSP_SAMPLES_PER_BLOCK;
use crate::error::Error;

/// One block of Q31 samples: the unit of transfer and of processing.
#[repr(C, align(4))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleBlock {
    pub samples: [i32; DSP_SAMPLES_PER_BLOCK],
}

impl SampleBlock {
    /// A block of silence.
    pub const ZERO: SampleBlock = SampleBlock {
        samples: [0; DSP_SAMPLES_PER_BLOCK],
    };
}

impl Default for SampleBlock {
    fn default() -> Self {
        SampleBlock::ZERO
    }
}

/// Logical audio channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Left = 0,
    Right = 1,
}

/// Identifies one of the four double buffers in a [`BufferPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BufferId {
    LeftIn = 0,
    RightIn = 1,
    LeftOut = 2,
    RightOut = 3,
}

impl BufferId {
    /// All buffer ids, inputs first.
    pub const ALL: [BufferId; 4] = [
        BufferId::LeftIn,
        BufferId::RightIn,
        BufferId::LeftOut,
        BufferId::RightOut,
    ];

    /// Channel this buffer carries.
    pub const fn channel(self) -> Channel {
        match self {
            BufferId::LeftIn | BufferId::LeftOut => Channel::Left,
            BufferId::RightIn | BufferId::RightOut => Channel::Right,
        }
    }

    /// `true` for the two input buffers.
    pub const fn is_input(self) -> bool {
        matches!(self, BufferId::LeftIn | BufferId::RightIn)
    }
}

impl TryFrom<u8> for BufferId {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self, Error> {
        match raw {
            0 => Ok(BufferId::LeftIn),
            1 => Ok(BufferId::RightIn),
            2 => Ok(BufferId::LeftOut),
            3 => Ok(BufferId::RightOut),
            other => Err(Error::UnknownBuffer(other)),
        }
    }
}
