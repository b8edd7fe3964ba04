//! Software side of the interrupt-driven block transfer mechanism.
//!
//! [`DmaTransfer`] keeps the ping/pong bookkeeping that the DMA completion
//! interrupt performs: which slot the hardware is working on, handing slots
//! over in the [`BufferPool`], and posting the completed index to the
//! [`CompletionSignal`] the streaming task waits on.
//!
//! ## Slot cycle
//!
//! ```text
//!   transfer:  [slot 0][slot 1][slot 0][slot 1] ...
//!   task:              [  0   ][  1   ][  0   ] ...
//!                      ^ completion of slot 0 posted here
//! ```
//!
//! The task has one block period to finish with slot K before the transfer
//! wraps back to it. A wrap onto a slot the task still holds is counted as
//! an overrun.
//!
//! ## Usage
//!
//! ```ignore
//! static POOL: BufferPool = BufferPool::new();
//! static SIGNAL: CompletionSignal = CompletionSignal::new();
//! static DMA: DmaTransfer<'static> = DmaTransfer::new(&POOL, &SIGNAL);
//!
//! // DMA completion ISR:
//! DMA.exchange(&RX_FRAMES, &mut TX_FRAMES);
//! DMA.on_complete();
//! ```

use core::ptr;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use embedded_hal::delay::DelayNs;

use crate::block::{BufferPool, Channel, DoubleBuffer, SampleBlock};
use crate::config::Timeout;
use crate::constants::{DSP_NUM_BLOCKS, DSP_SAMPLES_PER_BLOCK, LAST_SLOT};
use crate::error::Error;

use super::interleave::{deinterleave, interleave_lr};
use super::signal::CompletionSignal;

/// Serial-audio words per block: one word per channel per frame.
pub const FRAME_WORDS: usize = DSP_SAMPLES_PER_BLOCK * 2;

/// Operations of a block transfer mechanism.
pub trait BlockTransferControl {
    /// Point the mechanism at the input and output buffer areas (slot 0 of
    /// the first input and first output double buffer) and return it to
    /// the stopped state with every slot free.
    fn initialize(&self, input_base: *const SampleBlock, output_base: *const SampleBlock);

    /// Begin (or resume) alternating transfers from slot 0.
    fn start(&self);

    /// Finish the current double-buffer cycle, then stop.
    fn stop_after_current_cycle(&self);
}

/// Source of completed-slot notifications for the streaming task.
pub trait BlockSource {
    /// Block until the next slot completes, returning its index.
    ///
    /// Returns [`Error::Timeout`] if `timeout` expires first.
    fn wait_for_next_block(&mut self, timeout: Timeout) -> Result<u8, Error>;

    /// Deadline misses observed by the producer so far.
    fn overruns(&self) -> u32 {
        0
    }
}

/// [`BlockSource`] that pends on a [`CompletionSignal`], sleeping between
/// polls with `D`.
pub struct SignalSource<'a, D> {
    signal: &'a CompletionSignal,
    transfer: Option<&'a DmaTransfer<'a>>,
    delay: D,
}

impl<'a, D: DelayNs> SignalSource<'a, D> {
    pub fn new(signal: &'a CompletionSignal, delay: D) -> Self {
        SignalSource {
            signal,
            transfer: None,
            delay,
        }
    }

    /// Wait on the completion signal of `transfer` and report its overruns.
    pub fn for_transfer(transfer: &'a DmaTransfer<'a>, delay: D) -> Self {
        SignalSource {
            signal: transfer.signal,
            transfer: Some(transfer),
            delay,
        }
    }
}

impl<D: DelayNs> BlockSource for SignalSource<'_, D> {
    fn wait_for_next_block(&mut self, timeout: Timeout) -> Result<u8, Error> {
        self.signal.pend(timeout, &mut self.delay)
    }

    fn overruns(&self) -> u32 {
        match self.transfer {
            Some(transfer) => transfer.overruns(),
            None => self.signal.missed(),
        }
    }
}

/// Ping/pong state of the transfer mechanism.
///
/// All methods take `&self` and are lock-free; [`on_complete()`](Self::on_complete)
/// and [`exchange()`](Self::exchange) must only be called from the single
/// transfer interrupt context.
pub struct DmaTransfer<'a> {
    pool: &'a BufferPool,
    signal: &'a CompletionSignal,
    /// Slot the hardware is currently filling/draining.
    active: AtomicU8,
    running: AtomicBool,
    stop_pending: AtomicBool,
    overruns: AtomicU32,
}

impl<'a> DmaTransfer<'a> {
    /// Bind the transfer mechanism to its buffers and completion signal.
    pub const fn new(pool: &'a BufferPool, signal: &'a CompletionSignal) -> Self {
        DmaTransfer {
            pool,
            signal,
            active: AtomicU8::new(0),
            running: AtomicBool::new(false),
            stop_pending: AtomicBool::new(false),
            overruns: AtomicU32::new(0),
        }
    }

    /// Stop transfers and hand every slot back.
    ///
    /// The bases must be those of the bound pool; the pool is fixed at
    /// construction.
    pub fn initialize(&self, input_base: *const SampleBlock, output_base: *const SampleBlock) {
        debug_assert!(ptr::eq(input_base, self.pool.input(Channel::Left).base_ptr()));
        debug_assert!(ptr::eq(output_base, self.pool.output(Channel::Left).base_ptr()));

        self.running.store(false, Ordering::Release);
        self.stop_pending.store(false, Ordering::Release);
        for slot in 0..DSP_NUM_BLOCKS as u8 {
            self.release_all(slot);
        }
        self.active.store(0, Ordering::Release);
        self.signal.clear();
        log::debug!("transfer initialized");
    }

    /// Begin transfers into slot 0. Cancels a pending stop if already running.
    pub fn start(&self) {
        self.stop_pending.store(false, Ordering::Release);
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        self.signal.clear();
        self.active.store(0, Ordering::Release);
        self.claim_all(0);
    }

    /// Stop after the next completion of the last slot.
    pub fn stop_after_current_cycle(&self) {
        if self.running.load(Ordering::Acquire) {
            self.stop_pending.store(true, Ordering::Release);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Slot currently owned by the transfer side.
    pub fn active_slot(&self) -> u8 {
        self.active.load(Ordering::Acquire)
    }

    /// Deadline misses seen so far: wraps onto a slot the task still held,
    /// plus completions posted before the previous one was consumed.
    pub fn overruns(&self) -> u32 {
        self.overruns.load(Ordering::Relaxed) + self.signal.missed()
    }

    fn buffers(&self) -> impl Iterator<Item = &DoubleBuffer> {
        self.pool.iter()
    }

    fn claim_all(&self, slot: u8) {
        for buffer in self.buffers() {
            if buffer.claim_for_transfer(slot).is_err() {
                self.overruns.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn release_all(&self, slot: u8) {
        for buffer in self.buffers() {
            buffer.release_from_transfer(slot);
        }
    }

    /// Transfer-complete interrupt handler.
    ///
    /// Hands the finished slot to the task, moves the hardware to the other
    /// slot and posts the finished index. Returns the finished index, or
    /// `None` if transfers are stopped.
    pub fn on_complete(&self) -> Option<u8> {
        if !self.running.load(Ordering::Acquire) {
            return None;
        }
        let completed = self.active.load(Ordering::Acquire);
        let next = (completed + 1) % DSP_NUM_BLOCKS as u8;

        self.release_all(completed);
        if completed == LAST_SLOT && self.stop_pending.swap(false, Ordering::AcqRel) {
            self.running.store(false, Ordering::Release);
        } else {
            self.claim_all(next);
            self.active.store(next, Ordering::Release);
        }

        self.signal.post(completed);
        Some(completed)
    }

    /// Move one block of interleaved codec frames through the active slot:
    /// `rx` is split into the left/right input slots, and the left/right
    /// output slots are interleaved into `tx`.
    ///
    /// Output the transfer side does not hold is sent as silence. Returns
    /// `true` if both directions used transfer-owned slots.
    pub fn exchange(&self, rx: &[i32; FRAME_WORDS], tx: &mut [i32; FRAME_WORDS]) -> bool {
        let slot = self.active_slot();
        let pool = self.pool;

        let captured = pool
            .input(Channel::Left)
            .with_transfer_slot(slot, |left| {
                pool.input(Channel::Right).with_transfer_slot(slot, |right| {
                    deinterleave(rx, &mut left.samples, &mut right.samples);
                })
            })
            .flatten()
            .is_some();

        let played = pool
            .output(Channel::Left)
            .with_transfer_slot(slot, |left| {
                pool.output(Channel::Right).with_transfer_slot(slot, |right| {
                    interleave_lr(tx, &left.samples, &right.samples);
                })
            })
            .flatten()
            .is_some();
        if !played {
            tx.fill(0);
        }

        captured && played
    }
}

impl BlockTransferControl for DmaTransfer<'_> {
    fn initialize(&self, input_base: *const SampleBlock, output_base: *const SampleBlock) {
        DmaTransfer::initialize(self, input_base, output_base);
    }

    fn start(&self) {
        DmaTransfer::start(self);
    }

    fn stop_after_current_cycle(&self) {
        DmaTransfer::stop_after_current_cycle(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BufferId, SlotOwner};

    #[test]
    fn idle_until_started() {
        let pool = BufferPool::new();
        let signal = CompletionSignal::new();
        let dma = DmaTransfer::new(&pool, &signal);

        assert!(!dma.is_running());
        assert_eq!(dma.on_complete(), None);
        assert_eq!(signal.try_take(), None);
        for buffer in pool.iter() {
            assert_eq!(buffer.owner(0), Ok(SlotOwner::Free));
        }
    }

    #[test]
    fn start_claims_slot_zero_everywhere() {
        let pool = BufferPool::new();
        let signal = CompletionSignal::new();
        let dma = DmaTransfer::new(&pool, &signal);
        dma.start();

        for buffer in pool.iter() {
            assert_eq!(buffer.owner(0), Ok(SlotOwner::Transfer));
            assert_eq!(buffer.owner(1), Ok(SlotOwner::Free));
        }
    }

    #[test]
    fn completions_alternate_slots() {
        let pool = BufferPool::new();
        let signal = CompletionSignal::new();
        let dma = DmaTransfer::new(&pool, &signal);
        dma.start();

        let mut previous = None;
        for i in 0..16u8 {
            let slot = dma.on_complete().unwrap();
            assert_eq!(slot, i % 2);
            assert_ne!(Some(slot), previous);
            assert_eq!(signal.try_take(), Some(slot));
            // finished slot is free for the task, the other belongs to the hardware
            assert_eq!(pool.buffer(BufferId::LeftOut).owner(slot), Ok(SlotOwner::Free));
            assert_eq!(
                pool.buffer(BufferId::LeftOut).owner(slot ^ 1),
                Ok(SlotOwner::Transfer)
            );
            previous = Some(slot);
        }
        assert_eq!(dma.overruns(), 0);
    }

    #[test]
    fn stop_waits_for_last_slot() {
        let pool = BufferPool::new();
        let signal = CompletionSignal::new();
        let dma = DmaTransfer::new(&pool, &signal);
        dma.start();

        assert_eq!(dma.on_complete(), Some(0));
        dma.stop_after_current_cycle();
        assert!(dma.is_running());
        assert_eq!(dma.on_complete(), Some(1));
        assert!(!dma.is_running());
        assert_eq!(dma.on_complete(), None);

        for buffer in pool.iter() {
            assert_eq!(buffer.owner(0), Ok(SlotOwner::Free));
            assert_eq!(buffer.owner(1), Ok(SlotOwner::Free));
        }
    }

    #[test]
    fn stop_requested_on_slot_zero_runs_through_slot_one() {
        let pool = BufferPool::new();
        let signal = CompletionSignal::new();
        let dma = DmaTransfer::new(&pool, &signal);
        dma.start();

        // hardware is on slot 0 when the stop arrives
        dma.stop_after_current_cycle();
        assert_eq!(dma.on_complete(), Some(0));
        assert!(dma.is_running());
        assert_eq!(dma.on_complete(), Some(1));
        assert!(!dma.is_running());
    }

    #[test]
    fn initialize_stops_and_frees_every_slot() {
        let pool = BufferPool::new();
        let signal = CompletionSignal::new();
        let dma = DmaTransfer::new(&pool, &signal);
        dma.start();
        dma.on_complete();
        assert_eq!(signal.try_take(), Some(0));
        dma.on_complete();

        dma.initialize(
            pool.buffer(BufferId::LeftIn).base_ptr(),
            pool.buffer(BufferId::LeftOut).base_ptr(),
        );
        assert!(!dma.is_running());
        assert_eq!(dma.active_slot(), 0);
        assert_eq!(signal.try_take(), None);
        assert_eq!(dma.on_complete(), None);
        for buffer in pool.iter() {
            assert_eq!(buffer.owner(0), Ok(SlotOwner::Free));
            assert_eq!(buffer.owner(1), Ok(SlotOwner::Free));
        }

        dma.start();
        assert_eq!(dma.on_complete(), Some(0));
    }

    #[test]
    fn restart_after_stop_begins_at_slot_zero() {
        let pool = BufferPool::new();
        let signal = CompletionSignal::new();
        let dma = DmaTransfer::new(&pool, &signal);
        dma.start();
        dma.on_complete();
        dma.stop_after_current_cycle();
        dma.on_complete();
        let _ = signal.try_take();

        dma.start();
        assert_eq!(dma.active_slot(), 0);
        assert_eq!(dma.on_complete(), Some(0));
    }

    #[test]
    fn wrap_onto_held_slot_counts_overrun() {
        let pool = BufferPool::new();
        let signal = CompletionSignal::new();
        let dma = DmaTransfer::new(&pool, &signal);
        dma.start();

        assert_eq!(dma.on_complete(), Some(0));
        let _ = signal.try_take();
        // task grabs slot 0 and is too slow to give it back
        let held = pool.buffer(BufferId::LeftOut).claim(0).unwrap();
        assert_eq!(dma.on_complete(), Some(1));
        assert_eq!(dma.overruns(), 1);
        drop(held);
    }

    #[test]
    fn unconsumed_completion_counts_overrun() {
        let pool = BufferPool::new();
        let signal = CompletionSignal::new();
        let dma = DmaTransfer::new(&pool, &signal);
        dma.start();

        dma.on_complete();
        dma.on_complete();
        assert_eq!(dma.overruns(), 1);
        assert_eq!(signal.try_take(), Some(1));
    }

    #[test]
    fn exchange_moves_frames_through_active_slot() {
        let pool = BufferPool::new();
        let signal = CompletionSignal::new();
        let dma = DmaTransfer::new(&pool, &signal);
        dma.start();

        let rx: [i32; FRAME_WORDS] = core::array::from_fn(|i| {
            let frame = (i / 2) as i32;
            if i % 2 == 0 { frame } else { -frame }
        });
        let mut tx = [7i32; FRAME_WORDS];
        assert!(dma.exchange(&rx, &mut tx));
        // output slot 0 is still silent
        assert!(tx.iter().all(|&w| w == 0));

        dma.on_complete();
        let left = pool.buffer(BufferId::LeftIn).snapshot(0).unwrap();
        let right = pool.buffer(BufferId::RightIn).snapshot(0).unwrap();
        for i in 0..DSP_SAMPLES_PER_BLOCK {
            assert_eq!(left.samples[i], i as i32);
            assert_eq!(right.samples[i], -(i as i32));
        }
    }

    #[test]
    fn exchange_plays_task_output_next_cycle() {
        let pool = BufferPool::new();
        let signal = CompletionSignal::new();
        let dma = DmaTransfer::new(&pool, &signal);
        dma.start();
        dma.on_complete(); // slot 0 to the task

        {
            let mut l = pool.buffer(BufferId::LeftOut).claim(0).unwrap();
            let mut r = pool.buffer(BufferId::RightOut).claim(0).unwrap();
            l.samples.fill(11);
            r.samples.fill(-11);
        }
        dma.on_complete(); // hardware back on slot 0

        let rx = [0i32; FRAME_WORDS];
        let mut tx = [0i32; FRAME_WORDS];
        assert!(dma.exchange(&rx, &mut tx));
        for frame in tx.chunks_exact(2) {
            assert_eq!(frame, [11, -11]);
        }
    }

    #[test]
    fn exchange_when_stopped_sends_silence() {
        let pool = BufferPool::new();
        let signal = CompletionSignal::new();
        let dma = DmaTransfer::new(&pool, &signal);

        let rx = [1i32; FRAME_WORDS];
        let mut tx = [1i32; FRAME_WORDS];
        assert!(!dma.exchange(&rx, &mut tx));
        assert!(tx.iter().all(|&w| w == 0));
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    #[test]
    fn signal_source_reports_transfer_overruns() {
        let pool = BufferPool::new();
        let signal = CompletionSignal::new();
        let dma = DmaTransfer::new(&pool, &signal);
        let mut source = SignalSource::for_transfer(&dma, NoDelay);
        dma.start();

        assert_eq!(source.wait_for_next_block(Timeout::Micros(20)), Err(Error::Timeout));
        dma.on_complete();
        assert_eq!(source.wait_for_next_block(Timeout::Forever), Ok(0));
        assert_eq!(source.overruns(), 0);

        let held = pool.buffer(BufferId::RightOut).claim(0).unwrap();
        dma.on_complete();
        dma.on_complete();
        // one wrap onto the held slot, one completion never consumed
        assert_eq!(source.overruns(), 2);
        drop(held);
    }
}
