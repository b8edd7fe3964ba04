//! Pipeline controller and the traits of its hardware collaborators.
//!
//! [`Dsp`] owns the codec and serial-transport drivers, caches the active
//! [`DspParams`], and drives the block transfer mechanism through
//! [`BlockTransferControl`]. Configuration codes are checked against the
//! fixed tables in [`config`](crate::config) before anything reaches the
//! hardware; a rejected call changes nothing.
//!
//! # Example
//!
//! ```ignore
//! let mut dsp = Dsp::new(codec, transport, &DMA, &STOP, &POOL);
//! let processor = dsp.init(&DspConfig::default())?;
//! dsp.request_start()?;
//! // ...
//! dsp.request_stop();
//! dsp.stop_full_pend(Timeout::Forever, &mut delay)?;
//! ```

use embedded_hal::delay::DelayNs;

use crate::block::{BufferPool, Channel, DoubleBuffer, SampleBlock};
use crate::config::{DspConfig, DspParams, SampleRateCode, SampleSizeCode, Timeout};
use crate::error::{ControlError, Error};
use crate::io::{BlockTransferControl, StopControl};
use crate::processing::Processor;

/// Audio codec driver operations used by the pipeline.
pub trait CodecControl {
    /// Error type for control operations (typically the bus error).
    type Error;

    /// Reset the codec and bring it to a known state.
    fn initialize(&mut self) -> Result<(), Self::Error>;

    fn set_sample_rate(&mut self, rate: SampleRateCode) -> Result<(), Self::Error>;

    fn set_sample_size(&mut self, size: SampleSizeCode) -> Result<(), Self::Error>;

    /// Power up the converters.
    fn enable(&mut self) -> Result<(), Self::Error>;

    /// Power down the converters.
    fn disable(&mut self) -> Result<(), Self::Error>;

    /// Select a register page.
    fn select_page(&mut self, page: u8) -> Result<(), Self::Error>;

    /// Load the default routing and gain configuration.
    fn apply_default_config(&mut self) -> Result<(), Self::Error>;

    /// Turn the headphone output on.
    fn enable_output(&mut self) -> Result<(), Self::Error>;
}

/// Serial audio transport (word clock, frame sync, data lines).
///
/// These are register writes on the local peripheral and cannot fail.
pub trait SerialTransport {
    /// Configure the transport for `size`-bit words.
    fn init(&mut self, size: SampleSizeCode);

    fn set_word_size(&mut self, size: SampleSizeCode);

    fn enable_rx(&mut self);

    fn enable_tx(&mut self);
}

/// The pipeline controller.
pub struct Dsp<'a, C, T, X> {
    codec: C,
    transport: T,
    transfer: &'a X,
    stop: &'a StopControl,
    pool: &'a BufferPool,
    params: DspParams,
}

impl<'a, C, T, X> Dsp<'a, C, T, X>
where
    C: CodecControl,
    T: SerialTransport,
    X: BlockTransferControl,
{
    pub fn new(
        codec: C,
        transport: T,
        transfer: &'a X,
        stop: &'a StopControl,
        pool: &'a BufferPool,
    ) -> Self {
        Dsp {
            codec,
            transport,
            transfer,
            stop,
            pool,
            params: DspParams::default(),
        }
    }

    /// Generate the test signals and design the filter, then bring up the
    /// codec and transport at 48 kHz / 32-bit, initialize the transfer
    /// mechanism on the pool and enable the transport.
    ///
    /// A rejected `config` fails before any collaborator is touched.
    /// Returns the [`Processor`] to hand to the streaming task.
    pub fn init(&mut self, config: &DspConfig) -> Result<Processor, ControlError<C::Error>> {
        let processor = Processor::new(config)?;

        self.codec.initialize().map_err(ControlError::Codec)?;
        self.transport.init(SampleSizeCode::BITS_32);
        self.set_sample_rate(SampleRateCode::RATE_48K.code())?;
        self.set_sample_size(SampleSizeCode::BITS_32.code())?;
        self.transfer.initialize(
            self.pool.input(Channel::Left).base_ptr(),
            self.pool.output(Channel::Left).base_ptr(),
        );
        self.transport.enable_rx();
        self.transport.enable_tx();

        log::info!(
            "dsp initialized: {} Hz, {}-bit, cutoff {} Hz",
            self.params.sample_rate_hz,
            self.params.sample_size_bits,
            config.cutoff_hz
        );
        Ok(processor)
    }

    /// Set the sample rate from its table code.
    pub fn set_sample_rate(&mut self, code: u8) -> Result<(), ControlError<C::Error>> {
        let rate = SampleRateCode::try_from(code)?;
        self.codec.set_sample_rate(rate).map_err(ControlError::Codec)?;
        self.params.sample_rate_hz = rate.hz();
        log::debug!("sample rate {} Hz", rate.hz());
        Ok(())
    }

    /// Set the sample word size from its table code, on both the codec and
    /// the transport.
    pub fn set_sample_size(&mut self, code: u8) -> Result<(), ControlError<C::Error>> {
        let size = SampleSizeCode::try_from(code)?;
        self.codec.set_sample_size(size).map_err(ControlError::Codec)?;
        self.transport.set_word_size(size);
        self.params.sample_size_bits = size.bits();
        log::debug!("sample size {} bits", size.bits());
        Ok(())
    }

    /// Current sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.params.sample_rate_hz
    }

    /// Current sample word size in bits.
    pub fn sample_size(&self) -> u8 {
        self.params.sample_size_bits
    }

    pub fn params(&self) -> DspParams {
        self.params
    }

    /// Clear any stop request, start block transfers and switch the codec
    /// output on.
    ///
    /// If the codec rejects any step, a stop is requested so transfers wind
    /// down at the end of the current cycle.
    pub fn request_start(&mut self) -> Result<(), ControlError<C::Error>> {
        self.stop.reset();
        self.transfer.start();
        if let Err(e) = self.configure_output() {
            log::warn!("codec start failed, stopping transfers");
            self.request_stop();
            return Err(ControlError::Codec(e));
        }
        log::info!("streaming started");
        Ok(())
    }

    fn configure_output(&mut self) -> Result<(), C::Error> {
        self.codec.enable()?;
        self.codec.select_page(0)?;
        self.codec.apply_default_config()?;
        self.codec.enable_output()
    }

    /// Arm the stop request and let transfers run to the end of the
    /// current double-buffer cycle.
    pub fn request_stop(&mut self) {
        self.stop.request();
        self.transfer.stop_after_current_cycle();
        log::info!("stop requested");
    }

    /// Wait until the streaming task confirms a full stop.
    pub fn stop_full_pend<D: DelayNs>(&self, timeout: Timeout, delay: &mut D) -> Result<(), Error> {
        self.stop.fully_stopped().pend(timeout, delay)
    }

    /// Power the codec down.
    pub fn power_down(&mut self) -> Result<(), ControlError<C::Error>> {
        self.codec.disable().map_err(ControlError::Codec)
    }

    /// Double buffer for a raw buffer id, or `None` if the id is unknown.
    pub fn buffer(&self, raw_id: u8) -> Option<&'a DoubleBuffer> {
        self.pool.get(raw_id)
    }

    /// Base address of a double buffer, null for an unknown id.
    pub fn buffer_ptr(&self, raw_id: u8) -> *const SampleBlock {
        self.pool.base_ptr(raw_id)
    }

    /// Give back the drivers.
    pub fn release(self) -> (C, T) {
        (self.codec, self.transport)
    }
}
