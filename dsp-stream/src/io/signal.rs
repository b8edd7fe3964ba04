//! Lock-free handoff primitives between interrupt context and the task.
//!
//! The interrupt side only ever calls non-blocking `post()` methods. The
//! task side waits with `pend()`, polling the primitive and sleeping through
//! an [`embedded_hal::delay::DelayNs`] between polls until the event arrives
//! or the [`Timeout`] runs out.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use embedded_hal::delay::DelayNs;

use crate::config::Timeout;
use crate::error::Error;

/// Sleep between polls of a pending wait, in microseconds.
pub const POLL_INTERVAL_US: u32 = 10;

const EMPTY: u8 = u8::MAX;

/// Poll `ready` until it yields a value or `timeout` expires.
fn wait_for<T, D: DelayNs>(
    timeout: Timeout,
    delay: &mut D,
    mut ready: impl FnMut() -> Option<T>,
) -> Result<T, Error> {
    let mut waited_us: u32 = 0;
    loop {
        if let Some(value) = ready() {
            return Ok(value);
        }
        if let Timeout::Micros(limit) = timeout {
            if waited_us >= limit {
                return Err(Error::Timeout);
            }
        }
        delay.delay_us(POLL_INTERVAL_US);
        waited_us = waited_us.saturating_add(POLL_INTERVAL_US);
    }
}

/// Single-slot mailbox carrying the index of the last completed block.
///
/// Capacity is one: the alternation of slots means only the newest
/// completion matters. Posting over an unconsumed index replaces it and
/// counts a missed handoff.
pub struct CompletionSignal {
    slot: AtomicU8,
    missed: AtomicU32,
}

impl CompletionSignal {
    pub const fn new() -> Self {
        CompletionSignal {
            slot: AtomicU8::new(EMPTY),
            missed: AtomicU32::new(0),
        }
    }

    /// Publish a completed slot index (interrupt side).
    pub fn post(&self, slot: u8) {
        if self.slot.swap(slot, Ordering::AcqRel) != EMPTY {
            self.missed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Take the pending index, if any, without waiting.
    pub fn try_take(&self) -> Option<u8> {
        match self.slot.swap(EMPTY, Ordering::AcqRel) {
            EMPTY => None,
            slot => Some(slot),
        }
    }

    /// Wait for the next completed slot index.
    pub fn pend<D: DelayNs>(&self, timeout: Timeout, delay: &mut D) -> Result<u8, Error> {
        wait_for(timeout, delay, || self.try_take())
    }

    /// Number of indices overwritten before the task consumed them.
    pub fn missed(&self) -> u32 {
        self.missed.load(Ordering::Relaxed)
    }

    /// Drop any pending index.
    pub fn clear(&self) {
        self.slot.store(EMPTY, Ordering::Release);
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        CompletionSignal::new()
    }
}

/// Binary semaphore: posted once, consumed once.
pub struct Event {
    set: AtomicBool,
}

impl Event {
    pub const fn new() -> Self {
        Event {
            set: AtomicBool::new(false),
        }
    }

    pub fn post(&self) {
        self.set.store(true, Ordering::Release);
    }

    /// Consume the event if it is set.
    pub fn try_take(&self) -> bool {
        self.set.swap(false, Ordering::AcqRel)
    }

    pub fn is_set(&self) -> bool {
        self.set.load(Ordering::Acquire)
    }

    /// Wait for the event and consume it.
    pub fn pend<D: DelayNs>(&self, timeout: Timeout, delay: &mut D) -> Result<(), Error> {
        wait_for(timeout, delay, || self.try_take().then_some(()))
    }

    pub fn clear(&self) {
        self.set.store(false, Ordering::Release);
    }
}

impl Default for Event {
    fn default() -> Self {
        Event::new()
    }
}

/// Cooperative stop handshake between the controller and the task.
///
/// The controller arms the request; the task confirms it at the next full
/// double-buffer boundary by posting the fully-stopped event, once per
/// request.
pub struct StopControl {
    requested: AtomicBool,
    confirmed: AtomicBool,
    fully_stopped: Event,
}

impl StopControl {
    pub const fn new() -> Self {
        StopControl {
            requested: AtomicBool::new(false),
            confirmed: AtomicBool::new(false),
            fully_stopped: Event::new(),
        }
    }

    /// Arm a stop request.
    pub fn request(&self) {
        self.confirmed.store(false, Ordering::Release);
        self.requested.store(true, Ordering::Release);
    }

    /// Disarm any stop request and forget a pending confirmation.
    pub fn reset(&self) {
        self.requested.store(false, Ordering::Release);
        self.confirmed.store(false, Ordering::Release);
        self.fully_stopped.clear();
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Post the fully-stopped event if a stop is armed and not yet
    /// confirmed. Returns `true` when this call posted it.
    pub fn confirm(&self) -> bool {
        if !self.is_requested() || self.confirmed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.fully_stopped.post();
        true
    }

    /// The event posted on confirmation.
    pub fn fully_stopped(&self) -> &Event {
        &self.fully_stopped
    }
}

impl Default for StopControl {
    fn default() -> Self {
        StopControl::new()
    }
}
