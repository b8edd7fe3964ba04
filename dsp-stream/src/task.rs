//! The streaming task: the control loop between block completions and the
//! output buffers.
//!
//! Each iteration waits for a completed slot index, runs the
//! [`Processor`], writes the left output (filtered audio) and the right
//! output (monitor channel) into that slot, and confirms a pending stop once
//! a full double-buffer cycle has finished.
//!
//! ```ignore
//! let mut task = StreamingTask::new(&POOL, &STOP, processor, &config);
//! let mut source = SignalSource::for_transfer(&DMA, delay);
//! task.run(&mut source);
//! ```

use crate::block::{BufferPool, Channel};
use crate::config::{DspConfig, MonitorSource, Timeout};
use crate::constants::LAST_SLOT;
use crate::error::Error;
use crate::io::{BlockSource, StopControl};
use crate::processing::Processor;

/// Outcome of one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Slot `slot` was processed; `stopped` is set when this iteration
    /// posted the fully-stopped event.
    Processed { slot: u8, stopped: bool },
    /// The wait expired with no completion.
    TimedOut,
}

/// Consumer side of the double-buffer handoff.
pub struct StreamingTask<'a> {
    pool: &'a BufferPool,
    stop: &'a StopControl,
    processor: Processor,
    monitor: MonitorSource,
    timeout: Timeout,
}

impl<'a> StreamingTask<'a> {
    pub fn new(
        pool: &'a BufferPool,
        stop: &'a StopControl,
        processor: Processor,
        config: &DspConfig,
    ) -> Self {
        StreamingTask {
            pool,
            stop,
            processor,
            monitor: config.monitor,
            timeout: config.block_timeout,
        }
    }

    pub fn processor(&self) -> &Processor {
        &self.processor
    }

    pub fn monitor(&self) -> MonitorSource {
        self.monitor
    }

    pub fn set_monitor(&mut self, monitor: MonitorSource) {
        self.monitor = monitor;
    }

    /// Run one iteration of the loop.
    ///
    /// A timeout is reported as [`Step::TimedOut`], not as an error. An
    /// output slot that is not free yields [`Error::SlotBusy`]; the stop
    /// handshake is still honoured for that slot.
    pub fn step<S: BlockSource>(&mut self, source: &mut S) -> Result<Step, Error> {
        let slot = match source.wait_for_next_block(self.timeout) {
            Ok(slot) => slot,
            Err(Error::Timeout) => return Ok(Step::TimedOut),
            Err(e) => return Err(e),
        };

        self.processor.process();
        let written = self.write_outputs(slot);
        let stopped = slot == LAST_SLOT && self.stop.confirm();
        written?;

        Ok(Step::Processed { slot, stopped })
    }

    fn write_outputs(&self, slot: u8) -> Result<(), Error> {
        let mut left = self.pool.output(Channel::Left).claim(slot)?;
        let mut right = self.pool.output(Channel::Right).claim(slot)?;

        let monitor = match self.monitor {
            MonitorSource::Synthetic => *self.processor.input(),
            MonitorSource::LineIn => self.pool.input(Channel::Right).snapshot(slot)?,
        };

        *left = *self.processor.filtered_audio();
        *right = monitor;
        Ok(())
    }

    /// Run the loop forever.
    pub fn run<S: BlockSource>(&mut self, source: &mut S) -> ! {
        let mut reported_overruns = 0;
        loop {
            match self.step(source) {
                Ok(Step::TimedOut) => log::trace!("no block within {:?}", self.timeout),
                Ok(Step::Processed { stopped: true, .. }) => log::info!("stream fully stopped"),
                Ok(Step::Processed { .. }) => {}
                Err(e) => log::warn!("block dropped: {}", e),
            }

            let overruns = source.overruns();
            if overruns > reported_overruns {
                log::warn!(
                    "{} new transfer overrun(s), {} total",
                    overruns - reported_overruns,
                    overruns
                );
                reported_overruns = overruns;
            }
        }
    }
}
