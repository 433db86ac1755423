//! RP2040 DMA channels driven through their raw alias registers.
//!
//! The HAL's transfer types own their buffers and cannot express a channel
//! chained to another channel's trigger register, so the transport's
//! four-channel ring is programmed by hand. The HAL `Channels` are still
//! taken so nothing else can claim them.

use core::ptr::{read_volatile, write_volatile};

use duplex_audio::io::buffers::BufferAddresses;
use duplex_audio::io::hw::{Endpoint, Pacing, Transfer};
use duplex_audio::io::{ChannelId, DmaController, LaneId};
use duplex_audio::AudioError;
use rp2040_hal::dma::Channels;

const DMA_BASE: usize = 0x5000_0000;
const CHANNEL_STRIDE: usize = 0x40;
const CHANNEL_COUNT: u8 = 12;

const READ_ADDR: usize = 0x00;
const WRITE_ADDR: usize = 0x04;
const TRANS_COUNT: usize = 0x08;
const AL1_CTRL: usize = 0x10;
const AL2_WRITE_ADDR_TRIG: usize = 0x2c;
const AL3_READ_ADDR_TRIG: usize = 0x3c;

const INTE0: usize = 0x404;
const INTS0: usize = 0x40c;
const MULTI_CHAN_TRIGGER: usize = 0x430;

const CTRL_EN: u32 = 1 << 0;
const CTRL_DATA_SIZE_WORD: u32 = 2 << 2;
const CTRL_INCR_READ: u32 = 1 << 4;
const CTRL_INCR_WRITE: u32 = 1 << 5;
const CTRL_RING_SIZE_SHIFT: u32 = 6;
const CTRL_CHAIN_TO_SHIFT: u32 = 11;
const CTRL_TREQ_SHIFT: u32 = 15;
const CTRL_IRQ_QUIET: u32 = 1 << 21;
const TREQ_UNPACED: u32 = 0x3f;

const PIO0_BASE: usize = 0x5020_0000;
const PIO0_TXF0: usize = PIO0_BASE + 0x10;
const PIO0_RXF0: usize = PIO0_BASE + 0x20;
const DREQ_PIO0_RX0: u32 = 4;

pub struct RpDma {
    _channels: Channels,
    next: u8,
}

impl RpDma {
    pub fn new(channels: Channels) -> Self {
        RpDma { _channels: channels, next: 0 }
    }

    fn register(channel: ChannelId, offset: usize) -> *mut u32 {
        (DMA_BASE + channel.0 as usize * CHANNEL_STRIDE + offset) as *mut u32
    }

    fn shared(offset: usize) -> *mut u32 {
        (DMA_BASE + offset) as *mut u32
    }

    fn address(endpoint: Endpoint, addresses: &BufferAddresses) -> u32 {
        match endpoint {
            Endpoint::ReceiveFifo(LaneId(sm)) => (PIO0_RXF0 + 4 * sm as usize) as u32,
            Endpoint::TransmitFifo(LaneId(sm)) => (PIO0_TXF0 + 4 * sm as usize) as u32,
            Endpoint::Ring(direction) => addresses.ring(direction),
            Endpoint::Block(direction, index) => addresses.block(direction, index),
            Endpoint::WriteAddressTrigger(ch) => Self::register(ch, AL2_WRITE_ADDR_TRIG) as u32,
            Endpoint::ReadAddressTrigger(ch) => Self::register(ch, AL3_READ_ADDR_TRIG) as u32,
        }
    }

    fn control_word(channel: ChannelId, transfer: &Transfer) -> u32 {
        let treq = match transfer.pacing {
            Pacing::Unpaced => TREQ_UNPACED,
            Pacing::TransmitFifo(LaneId(sm)) => sm as u32,
            Pacing::ReceiveFifo(LaneId(sm)) => DREQ_PIO0_RX0 + sm as u32,
        };
        // Chaining to itself disables chaining.
        let chain = transfer.chain_to.unwrap_or(channel).0 as u32;
        let ring = transfer.ring.map_or(0, |wrap| wrap.0 as u32);

        let mut ctrl = CTRL_EN
            | CTRL_DATA_SIZE_WORD
            | (ring << CTRL_RING_SIZE_SHIFT)
            | (chain << CTRL_CHAIN_TO_SHIFT)
            | (treq << CTRL_TREQ_SHIFT);
        if transfer.read_increment {
            ctrl |= CTRL_INCR_READ;
        }
        if transfer.write_increment {
            ctrl |= CTRL_INCR_WRITE;
        }
        if transfer.quiet {
            ctrl |= CTRL_IRQ_QUIET;
        }
        ctrl
    }
}

impl DmaController for RpDma {
    fn claim(&mut self) -> Result<ChannelId, AudioError> {
        if self.next >= CHANNEL_COUNT {
            return Err(AudioError::ChannelUnavailable);
        }
        let channel = ChannelId(self.next);
        self.next += 1;
        Ok(channel)
    }

    fn configure(&mut self, channel: ChannelId, transfer: &Transfer, addresses: &BufferAddresses) {
        let read = Self::address(transfer.read, addresses);
        let write = Self::address(transfer.write, addresses);
        let ctrl = Self::control_word(channel, transfer);
        defmt::trace!("dma ch{=u8} ctrl {=u32:#x}", channel.0, ctrl);
        // SAFETY: the channel was handed out by `claim` and the addresses
        // point at static buffers or peripheral registers.
        unsafe {
            write_volatile(Self::register(channel, READ_ADDR), read);
            write_volatile(Self::register(channel, WRITE_ADDR), write);
            write_volatile(Self::register(channel, TRANS_COUNT), transfer.count);
            // AL1 does not trigger.
            write_volatile(Self::register(channel, AL1_CTRL), ctrl);
        }
    }

    fn enable_completion_interrupt(&mut self, channel: ChannelId) {
        // SAFETY: read-modify-write of the interrupt enable mask; only this
        // driver touches DMA_IRQ_0.
        unsafe {
            let inte = Self::shared(INTE0);
            write_volatile(inte, read_volatile(inte) | 1 << channel.0);
        }
    }

    fn start(&mut self, channels: &[ChannelId]) {
        let mask = channels.iter().fold(0u32, |mask, ch| mask | 1 << ch.0);
        // SAFETY: triggers only channels configured above.
        unsafe { write_volatile(Self::shared(MULTI_CHAN_TRIGGER), mask) };
    }

    fn read_address(&self, channel: ChannelId) -> u32 {
        // SAFETY: plain register read.
        unsafe { read_volatile(Self::register(channel, READ_ADDR)) }
    }

    fn acknowledge(&mut self, channel: ChannelId) {
        // SAFETY: INTS0 is write-one-to-clear.
        unsafe { write_volatile(Self::shared(INTS0), 1 << channel.0) };
    }
}
