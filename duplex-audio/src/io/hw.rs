//! Hardware boundary of the transport.
//!
//! The transport only decides *what* to program; the two traits here are
//! implemented by the firmware over the real PIO and DMA blocks and by
//! software simulations in the test suite.

use crate::clock::FractionalDivider;
use crate::constants::{AUDIO_BUFFER_FRAMES, GPIO_COUNT};
use crate::error::AudioError;

use super::buffers::{BufferAddresses, BufferIndex, Direction, PointerRing};

/// A claimed PIO state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LaneId(pub u8);

/// A claimed DMA channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelId(pub u8);

/// The three sequencer programs the transport runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerProgram {
    /// Square wave on the MCLK pin.
    MasterClock,
    /// Samples DIN on every BCLK rising edge into 32-bit words.
    Receiver,
    /// Drives BCLK/LRCLK and shifts 32-bit words out on DOUT.
    Transmitter,
}

/// GPIO assignment of the serial audio bus.
///
/// LRCLK is always the pin after BCLK (side-set pins are consecutive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pins {
    pub mclk: u8,
    pub dout: u8,
    pub din: u8,
    pub bclk: u8,
}

impl Pins {
    pub const fn lrclk(&self) -> u8 {
        self.bclk + 1
    }

    /// All pins exist and no two signals share one.
    pub fn validate(&self) -> Result<(), AudioError> {
        let all = [self.mclk, self.dout, self.din, self.bclk, self.lrclk()];
        if all.iter().any(|&pin| pin >= GPIO_COUNT) {
            return Err(AudioError::InvalidPins);
        }
        for (i, a) in all.iter().enumerate() {
            if all[i + 1..].contains(a) {
                return Err(AudioError::InvalidPins);
            }
        }
        Ok(())
    }
}

/// One side of a DMA transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Endpoint {
    /// A lane's receive FIFO.
    ReceiveFifo(LaneId),
    /// A lane's transmit FIFO.
    TransmitFifo(LaneId),
    /// A direction's pointer ring.
    Ring(Direction),
    /// One audio block.
    Block(Direction, BufferIndex),
    /// Another channel's write-address register, triggering it on write.
    WriteAddressTrigger(ChannelId),
    /// Another channel's read-address register, triggering it on write.
    ReadAddressTrigger(ChannelId),
}

/// What paces a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pacing {
    /// As fast as the bus allows.
    Unpaced,
    /// One word per receive-FIFO entry.
    ReceiveFifo(LaneId),
    /// One word per free transmit-FIFO slot.
    TransmitFifo(LaneId),
}

/// Address-wrap of the read side, in `log2` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RingWrap(pub u8);

/// Symbolic description of a 32-bit DMA transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transfer {
    pub read: Endpoint,
    pub write: Endpoint,
    pub read_increment: bool,
    pub write_increment: bool,
    pub pacing: Pacing,
    pub chain_to: Option<ChannelId>,
    pub ring: Option<RingWrap>,
    /// Words per transfer.
    pub count: u32,
    /// Suppress the completion interrupt.
    pub quiet: bool,
}

impl Transfer {
    /// Receive data channel: lane RX FIFO → input block, chained to its
    /// control channel. Starts on the first block; the control channel
    /// rewrites the address before every transfer.
    pub fn receive(lane: LaneId, control: ChannelId) -> Self {
        Transfer {
            read: Endpoint::ReceiveFifo(lane),
            write: Endpoint::Block(Direction::Input, BufferIndex::First),
            read_increment: false,
            write_increment: true,
            pacing: Pacing::ReceiveFifo(lane),
            chain_to: Some(control),
            ring: None,
            count: AUDIO_BUFFER_FRAMES as u32,
            quiet: false,
        }
    }

    /// Transmit data channel: output block → lane TX FIFO, chained to its
    /// control channel. Starts on the first block like the receiver.
    pub fn transmit(lane: LaneId, control: ChannelId) -> Self {
        Transfer {
            read: Endpoint::Block(Direction::Output, BufferIndex::First),
            write: Endpoint::TransmitFifo(lane),
            read_increment: true,
            write_increment: false,
            pacing: Pacing::TransmitFifo(lane),
            chain_to: Some(control),
            ring: None,
            count: AUDIO_BUFFER_FRAMES as u32,
            quiet: true,
        }
    }

    /// Control channel: copies one ring entry into `target`, retriggering
    /// the data channel.
    pub fn control(direction: Direction, target: Endpoint) -> Self {
        Transfer {
            read: Endpoint::Ring(direction),
            write: target,
            read_increment: true,
            write_increment: false,
            pacing: Pacing::Unpaced,
            chain_to: None,
            ring: Some(RingWrap(PointerRing::WRAP_BITS)),
            count: 1,
            quiet: true,
        }
    }
}

/// The four sequencers available for the serial bus.
pub trait SequencerBank {
    /// Load a program and claim a lane running it on `pins`.
    fn install(&mut self, program: SequencerProgram, pins: &Pins) -> Result<LaneId, AudioError>;

    fn set_clock_divider(&mut self, lane: LaneId, divider: FractionalDivider);

    /// Start all `lanes` in the same clock cycle.
    fn enable_in_sync(&mut self, lanes: &[LaneId]);
}

/// DMA channels used by the transport.
pub trait DmaController {
    fn claim(&mut self) -> Result<ChannelId, AudioError>;

    /// Program `channel` without starting it. `addresses` resolves the
    /// symbolic ring and block endpoints.
    fn configure(&mut self, channel: ChannelId, transfer: &Transfer, addresses: &BufferAddresses);

    /// Route the channel's completion flag to the audio interrupt.
    fn enable_completion_interrupt(&mut self, channel: ChannelId);

    /// Trigger several channels at once.
    fn start(&mut self, channels: &[ChannelId]);

    /// Current read address of a channel.
    fn read_address(&self, channel: ChannelId) -> u32;

    /// Clear the channel's completion flag.
    fn acknowledge(&mut self, channel: ChannelId);
}

/// The single completion interrupt serves both directions, so both data
/// transfers must move blocks of the same length.
pub fn verify_lockstep(input: &Transfer, output: &Transfer) -> Result<(), AudioError> {
    if input.count != output.count || input.count as usize != AUDIO_BUFFER_FRAMES {
        return Err(AudioError::BlockMismatch);
    }
    Ok(())
}
