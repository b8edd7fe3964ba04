use core::ptr;

use crate::constants::{DSP_NUM_IN_CHANNELS, DSP_NUM_OUT_CHANNELS};

use super::{BufferId, Channel, DoubleBuffer, SampleBlock};

/// The four double buffers shared between the transfer mechanism and the
/// streaming task.
///
/// Built once at startup (usually as a `static`) and borrowed by both sides
/// for the life of the program.
pub struct BufferPool {
    input: [DoubleBuffer; DSP_NUM_IN_CHANNELS],
    output: [DoubleBuffer; DSP_NUM_OUT_CHANNELS],
}

impl BufferPool {
    /// Create a pool with every slot silent and free.
    pub const fn new() -> Self {
        BufferPool {
            input: [const { DoubleBuffer::new() }; DSP_NUM_IN_CHANNELS],
            output: [const { DoubleBuffer::new() }; DSP_NUM_OUT_CHANNELS],
        }
    }

    /// Input double buffer for `channel`.
    pub fn input(&self, channel: Channel) -> &DoubleBuffer {
        &self.input[channel as usize]
    }

    /// Output double buffer for `channel`.
    pub fn output(&self, channel: Channel) -> &DoubleBuffer {
        &self.output[channel as usize]
    }

    /// Double buffer named by `id`.
    pub fn buffer(&self, id: BufferId) -> &DoubleBuffer {
        if id.is_input() {
            self.input(id.channel())
        } else {
            self.output(id.channel())
        }
    }

    /// Look up a double buffer by raw identifier. Unknown ids give `None`.
    pub fn get(&self, raw_id: u8) -> Option<&DoubleBuffer> {
        BufferId::try_from(raw_id).ok().map(|id| self.buffer(id))
    }

    /// Base address of slot 0 of the buffer named by `raw_id`, for handing
    /// to DMA hardware. Unknown ids give a null pointer.
    pub fn base_ptr(&self, raw_id: u8) -> *const SampleBlock {
        match self.get(raw_id) {
            Some(buffer) => buffer.base_ptr(),
            None => ptr::null(),
        }
    }

    /// All four buffers, inputs first.
    pub fn iter(&self) -> impl Iterator<Item = &DoubleBuffer> {
        self.input.iter().chain(self.output.iter())
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        BufferPool::new()
    }
}
