//! Full-duplex serial audio transport.
//!
//! Three sequencer lanes generate the bus (master clock, receiver,
//! transmitter) and four DMA channels move blocks between the lanes' FIFOs
//! and the [`AudioBuffers`] arena:
//!
//! ```text
//!  RX FIFO ──► in data ──chain──► in ctrl ──(ring entry)──► in data.write_addr
//!  TX FIFO ◄── out data ──chain──► out ctrl ──(ring entry)──► out data.read_addr
//! ```
//!
//! Only the input data channel raises an interrupt. Both directions run in
//! lock-step off the same bit clock, so when an input block completes the
//! output block with the same index has just been sent and may be refilled.

use crate::clock::{bclk_divider, mclk_divider, FractionalDivider};
use crate::constants::{AUDIO_BUFFER_SIZE, SYSTEM_CLOCK_HZ};
use crate::error::AudioError;

use super::buffers::{AudioBuffers, BufferIndex, Direction};
use super::hw::{
    verify_lockstep, ChannelId, DmaController, Endpoint, LaneId, Pins, SequencerBank,
    SequencerProgram, Transfer,
};
use super::wire::{downscale_block, upscale_block};

/// Per-block user processing, run from the audio interrupt.
///
/// `input` holds interleaved 16-bit-range samples, `output` is filled the
/// same way. `frames` is the number of frames per channel. The input block
/// is already off the bus and may be used as scratch space.
pub trait BlockCallback {
    fn process(&mut self, input: &mut [i32], output: &mut [i32], frames: usize);
}

impl<F> BlockCallback for F
where
    F: FnMut(&mut [i32], &mut [i32], usize),
{
    fn process(&mut self, input: &mut [i32], output: &mut [i32], frames: usize) {
        self(input, output, frames)
    }
}

/// Callback type for a transport started without processing.
pub type NoCallback = fn(&mut [i32], &mut [i32], usize);

/// Start-up parameters of the transport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportConfig {
    pub sample_rate: f32,
    pub pins: Pins,
    pub system_clock_hz: u32,
}

impl TransportConfig {
    pub const fn new(sample_rate: f32, pins: Pins) -> Self {
        TransportConfig {
            sample_rate,
            pins,
            system_clock_hz: SYSTEM_CLOCK_HZ,
        }
    }

    pub const fn with_system_clock(mut self, hz: u32) -> Self {
        self.system_clock_hz = hz;
        self
    }

    pub fn mclk_divider(&self) -> FractionalDivider {
        mclk_divider(self.system_clock_hz as f32, self.sample_rate)
    }

    pub fn bclk_divider(&self) -> FractionalDivider {
        bclk_divider(self.system_clock_hz as f32, self.sample_rate)
    }

    pub fn validate(&self) -> Result<(), AudioError> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(AudioError::InvalidSampleRate);
        }
        self.pins.validate()?;
        for divider in [self.mclk_divider(), self.bclk_divider()] {
            // Zero means the clock is too slow, MAX that the divider saturated.
            if divider.integer == 0 || divider.integer == u16::MAX {
                return Err(AudioError::DividerOutOfRange);
            }
        }
        Ok(())
    }
}

/// Life cycle of one transfer direction. Never goes backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamState {
    /// Not configured.
    Idle,
    /// DMA configured and started, waiting for the clocks.
    Armed,
    /// At least one block completed.
    Streaming,
}

#[derive(Debug, Clone, Copy)]
struct Channels {
    input_data: ChannelId,
    input_control: ChannelId,
    output_data: ChannelId,
    output_control: ChannelId,
}

/// The transport: hardware handles, buffers and the block callback.
///
/// The DMA pointer rings hold absolute addresses, so the buffer arena is
/// borrowed for `'static` and stays put however the transport itself is
/// moved. The firmware places it with a `StaticCell`.
pub struct AudioTransport<S, D, C = NoCallback> {
    config: TransportConfig,
    sequencers: S,
    dma: D,
    callback: Option<C>,
    buffers: &'static mut AudioBuffers,
    channels: Option<Channels>,
    input_state: StreamState,
    output_state: StreamState,
    blocks_completed: u32,
    misrouted: u32,
    last_block: Option<BufferIndex>,
}

impl<S, D, C> AudioTransport<S, D, C>
where
    S: SequencerBank,
    D: DmaController,
    C: BlockCallback,
{
    pub fn new(
        config: TransportConfig,
        sequencers: S,
        dma: D,
        buffers: &'static mut AudioBuffers,
    ) -> Self {
        AudioTransport {
            config,
            sequencers,
            dma,
            callback: None,
            buffers,
            channels: None,
            input_state: StreamState::Idle,
            output_state: StreamState::Idle,
            blocks_completed: 0,
            misrouted: 0,
            last_block: None,
        }
    }

    /// Bring up clocks and DMA and start streaming.
    ///
    /// The first completion interrupt arrives one block period later.
    pub fn start_audio(&mut self, callback: Option<C>) -> Result<(), AudioError> {
        if self.input_state != StreamState::Idle {
            return Err(AudioError::AlreadyStarted);
        }
        self.config.validate()?;
        self.callback = callback;

        let pins = self.config.pins;
        let mclk = self.config.mclk_divider();
        let bclk = self.config.bclk_divider();
        debug!(
            "dividers mclk {=u16}+{=u8}/256 bclk {=u16}+{=u8}/256",
            mclk.integer,
            mclk.fraction,
            bclk.integer,
            bclk.fraction
        );

        let mclk_lane = self.sequencers.install(SequencerProgram::MasterClock, &pins)?;
        self.sequencers.set_clock_divider(mclk_lane, mclk);

        // The receiver polls BCLK for rising edges, so it runs at the
        // master-clock rate: four instructions per bit-clock half period.
        let rx_lane = self.sequencers.install(SequencerProgram::Receiver, &pins)?;
        self.sequencers.set_clock_divider(rx_lane, mclk);

        let tx_lane = self.sequencers.install(SequencerProgram::Transmitter, &pins)?;
        self.sequencers.set_clock_divider(tx_lane, bclk);

        self.dma_init(rx_lane, tx_lane)?;

        self.sequencers.enable_in_sync(&[mclk_lane, rx_lane, tx_lane]);
        info!("audio transport started");
        Ok(())
    }

    /// Claim and chain the four DMA channels, then start both control
    /// channels so the data channels wait on their FIFOs.
    pub fn dma_init(&mut self, receiver: LaneId, transmitter: LaneId) -> Result<(), AudioError> {
        if self.channels.is_some() {
            return Err(AudioError::AlreadyStarted);
        }
        let channels = Channels {
            input_data: self.dma.claim()?,
            input_control: self.dma.claim()?,
            output_data: self.dma.claim()?,
            output_control: self.dma.claim()?,
        };

        let receive = Transfer::receive(receiver, channels.input_control);
        let transmit = Transfer::transmit(transmitter, channels.output_control);
        verify_lockstep(&receive, &transmit)?;

        let input_control = Transfer::control(
            Direction::Input,
            Endpoint::WriteAddressTrigger(channels.input_data),
        );
        let output_control = Transfer::control(
            Direction::Output,
            Endpoint::ReadAddressTrigger(channels.output_data),
        );

        let addresses = self.buffers.link();
        self.dma.configure(channels.input_data, &receive, &addresses);
        self.dma.configure(channels.input_control, &input_control, &addresses);
        self.dma.configure(channels.output_data, &transmit, &addresses);
        self.dma.configure(channels.output_control, &output_control, &addresses);

        self.dma.enable_completion_interrupt(channels.input_data);
        self.dma.start(&[channels.input_control, channels.output_control]);

        self.channels = Some(channels);
        self.input_state = StreamState::Armed;
        self.output_state = StreamState::Armed;
        Ok(())
    }

    /// Body of the DMA completion interrupt.
    ///
    /// Resolves which block just finished, hands the pair to the callback
    /// and clears the interrupt flag. Without a callback the buffers are
    /// left as they are. A read address outside the input ring skips the
    /// callback: no block can be told apart from the one on the bus.
    pub fn on_block_complete(&mut self) {
        let Some(channels) = self.channels else {
            return;
        };

        let read_address = self.dma.read_address(channels.input_control);
        let Some(index) = self.buffers.ring(Direction::Input).index_at(read_address) else {
            error!("input control read address {=u32:#x} outside its ring", read_address);
            self.dma.acknowledge(channels.input_data);
            self.misrouted = self.misrouted.wrapping_add(1);
            return;
        };

        self.input_state = StreamState::Streaming;
        self.output_state = StreamState::Streaming;

        if let Some(callback) = self.callback.as_mut() {
            let (input, output) = self.buffers.pair_mut(index);
            downscale_block(input);
            callback.process(&mut input[..], &mut output[..], AUDIO_BUFFER_SIZE);
            upscale_block(output);
        }

        self.dma.acknowledge(channels.input_data);
        self.blocks_completed = self.blocks_completed.wrapping_add(1);
        self.last_block = Some(index);
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn state(&self, direction: Direction) -> StreamState {
        match direction {
            Direction::Input => self.input_state,
            Direction::Output => self.output_state,
        }
    }

    /// Completion interrupts handled so far (wraps).
    pub fn blocks_completed(&self) -> u32 {
        self.blocks_completed
    }

    /// Interrupts skipped because the ring address could not be resolved.
    pub fn misrouted_blocks(&self) -> u32 {
        self.misrouted
    }

    /// Index of the most recently processed block pair.
    pub fn last_block(&self) -> Option<BufferIndex> {
        self.last_block
    }

    #[cfg(test)]
    pub(crate) fn dma_mut(&mut self) -> &mut D {
        &mut self.dma
    }

    #[cfg(test)]
    pub(crate) fn sequencers(&self) -> &S {
        &self.sequencers
    }

    #[cfg(test)]
    pub(crate) fn block_mut(
        &mut self,
        direction: Direction,
        index: BufferIndex,
    ) -> &mut super::buffers::AudioBlock {
        self.buffers.block_mut(direction, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SAMPLE_RATE;

    const PINS: Pins = Pins { mclk: 6, dout: 2, din: 3, bclk: 4 };

    #[test]
    fn default_config_is_valid() {
        let config = TransportConfig::new(SAMPLE_RATE, PINS);
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.mclk_divider(), FractionalDivider { integer: 7, fraction: 208 });
        assert_eq!(config.bclk_divider(), FractionalDivider { integer: 31, fraction: 64 });
    }

    #[test]
    fn bad_sample_rates_rejected() {
        for rate in [0.0, -44_000.0, f32::NAN, f32::INFINITY] {
            let config = TransportConfig::new(rate, PINS);
            assert_eq!(config.validate(), Err(AudioError::InvalidSampleRate), "{rate}");
        }
    }

    #[test]
    fn slow_system_clock_rejected() {
        let config = TransportConfig::new(SAMPLE_RATE, PINS).with_system_clock(12_000_000);
        assert_eq!(config.validate(), Err(AudioError::DividerOutOfRange));
    }

    #[test]
    fn tiny_sample_rate_rejected() {
        let config = TransportConfig::new(1.0, PINS);
        assert_eq!(config.validate(), Err(AudioError::DividerOutOfRange));
    }

    #[test]
    fn stream_state_orders_forward() {
        assert!(StreamState::Idle < StreamState::Armed);
        assert!(StreamState::Armed < StreamState::Streaming);
    }
}
