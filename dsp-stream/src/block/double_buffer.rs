use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicU8, Ordering};

use crate::constants::DSP_NUM_BLOCKS;
use crate::error::Error;

use super::SampleBlock;

/// Who currently holds a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SlotOwner {
    /// Nobody; either side may claim it.
    Free = 0,
    /// The transfer mechanism is filling or draining it.
    Transfer = 1,
    /// The streaming task is reading or writing it.
    Task = 2,
}

impl SlotOwner {
    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => SlotOwner::Transfer,
            2 => SlotOwner::Task,
            _ => SlotOwner::Free,
        }
    }
}

/// Two sample blocks ("ping" and "pong") with per-slot ownership.
///
/// The task side claims a slot with [`claim()`](Self::claim) and gets an
/// exclusive [`SlotMut`] guard. The transfer side holds its slot for a whole
/// block period, so it claims and releases explicitly; only one interrupt
/// context may act as the transfer side.
pub struct DoubleBuffer {
    slots: [UnsafeCell<SampleBlock>; DSP_NUM_BLOCKS],
    owners: [AtomicU8; DSP_NUM_BLOCKS],
}

// SAFETY: a slot's data is only reachable by the side that won the CAS on
// its owner byte, and the owner byte is only cleared by that same side.
unsafe impl Sync for DoubleBuffer {}

impl DoubleBuffer {
    /// Create a double buffer with both slots silent and free.
    pub const fn new() -> Self {
        DoubleBuffer {
            slots: [const { UnsafeCell::new(SampleBlock::ZERO) }; DSP_NUM_BLOCKS],
            owners: [const { AtomicU8::new(SlotOwner::Free as u8) }; DSP_NUM_BLOCKS],
        }
    }

    fn index(slot: u8) -> Result<usize, Error> {
        if (slot as usize) < DSP_NUM_BLOCKS {
            Ok(slot as usize)
        } else {
            Err(Error::InvalidSlot(slot))
        }
    }

    fn transition(&self, slot: u8, from: SlotOwner, to: SlotOwner) -> Result<usize, Error> {
        let idx = Self::index(slot)?;
        self.owners[idx]
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| idx)
            .map_err(|_| Error::SlotBusy { slot })
    }

    /// Current owner of `slot`.
    pub fn owner(&self, slot: u8) -> Result<SlotOwner, Error> {
        let idx = Self::index(slot)?;
        Ok(SlotOwner::from_raw(self.owners[idx].load(Ordering::Acquire)))
    }

    /// Claim `slot` for the task side.
    ///
    /// Fails with [`Error::SlotBusy`] if the slot is not free, which on the
    /// task side means the transfer mechanism has already wrapped around to
    /// it: a missed deadline.
    pub fn claim(&self, slot: u8) -> Result<SlotMut<'_>, Error> {
        self.transition(slot, SlotOwner::Free, SlotOwner::Task)?;
        Ok(SlotMut { buffer: self, slot })
    }

    /// Address of slot 0; slot 1 follows it contiguously.
    pub fn base_ptr(&self) -> *const SampleBlock {
        self.slots[0].get() as *const SampleBlock
    }

    /// Copy the contents of `slot` out, claiming it for the duration.
    pub fn snapshot(&self, slot: u8) -> Result<SampleBlock, Error> {
        self.claim(slot).map(|guard| *guard)
    }

    /// Hand `slot` to the transfer side.
    pub(crate) fn claim_for_transfer(&self, slot: u8) -> Result<(), Error> {
        self.transition(slot, SlotOwner::Free, SlotOwner::Transfer).map(|_| ())
    }

    /// Give `slot` back from the transfer side. No-op if it does not hold it.
    pub(crate) fn release_from_transfer(&self, slot: u8) {
        let _ = self.transition(slot, SlotOwner::Transfer, SlotOwner::Free);
    }

    /// Run `f` on the transfer-owned `slot`.
    ///
    /// Returns `None` if the transfer side does not currently hold the slot.
    pub(crate) fn with_transfer_slot<R>(
        &self,
        slot: u8,
        f: impl FnOnce(&mut SampleBlock) -> R,
    ) -> Option<R> {
        match self.owner(slot) {
            Ok(SlotOwner::Transfer) => {
                // SAFETY: the slot is held by the transfer side and there is a
                // single transfer context, so this is the only live reference.
                let block = unsafe { &mut *self.slots[slot as usize].get() };
                Some(f(block))
            }
            _ => None,
        }
    }
}

impl Default for DoubleBuffer {
    fn default() -> Self {
        DoubleBuffer::new()
    }
}

/// Exclusive task-side handle to one slot of a [`DoubleBuffer`].
///
/// Dropping the guard frees the slot.
pub struct SlotMut<'a> {
    buffer: &'a DoubleBuffer,
    slot: u8,
}


impl Deref for SlotMut<'_> {
    type Target = SampleBlock;

    fn deref(&self) -> &SampleBlock {
        // SAFETY: the guard exists only while the owner byte reads `Task`.
        unsafe { &*self.buffer.slots[self.slot as usize].get() }
    }
}

impl DerefMut for SlotMut<'_> {
    fn deref_mut(&mut self) -> &mut SampleBlock {
        // SAFETY: as above; the guard is unique for this slot.
        unsafe { &mut *self.buffer.slots[self.slot as usize].get() }
    }
}

impl Drop for SlotMut<'_> {
    fn drop(&mut self) {
        self.buffer.owners[self.slot as usize].store(SlotOwner::Free as u8, Ordering::Release);
    }
}
