//! # duplex-audio
//!
//! Full-duplex stereo audio for RP2040 instruments: a zero-CPU
//! double-buffered I2S transport and a protocol for splitting each block's
//! per-frame work across both cores.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Clocking | [`clock`] | PIO fractional dividers for MCLK and BCLK |
//! | I/O | [`io`] | Sequencer + DMA transport, buffer rings, interrupt slot |
//! | Cores | [`multicore`] | Cross-core messages, secondary worker, audio loop |
//! | Control | [`control`] / [`codec`] | `AudioControl` trait, NAU88C22 driver (feature-gated) |
//! | Time | [`timing`] | Seconds / Hz to samples and block ticks |
//!
//! Hardware access goes through the [`io::SequencerBank`],
//! [`io::DmaController`] and [`multicore::CoreFifo`] traits, so everything
//! in this crate also runs on the host.
//!
//! ## Quick start
//!
//! ```ignore
//! use duplex_audio::io::{AudioBuffers, AudioTransport, Pins, TransportConfig, TransportSlot};
//!
//! static BUFFERS: StaticCell<AudioBuffers> = StaticCell::new();
//! static CELL: StaticCell<MyTransport> = StaticCell::new();
//! static TRANSPORT: TransportSlot<MyTransport> = TransportSlot::new();
//!
//! let config = TransportConfig::new(SAMPLE_RATE, Pins { mclk: 6, dout: 2, din: 3, bclk: 4 });
//! let buffers = BUFFERS.init(AudioBuffers::new());
//! let transport = CELL.init(AudioTransport::new(config, sequencers, dma, buffers));
//! transport.start_audio(Some(callback))?;
//! TRANSPORT.register(transport).ok();
//!
//! #[interrupt]
//! fn DMA_IRQ_0() {
//!     unsafe { TRANSPORT.dispatch(|t| t.on_block_complete()) };
//! }
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `nau88c22` | yes | NAU88C22 codec driver |
//! | `defmt` | no | `defmt` logging and `defmt::Format` on public types |
//!
//! ## Audio parameters
//!
//! - **Block size:** 48 frames ([`constants::AUDIO_BUFFER_SIZE`])
//! - **Sample rate:** 44 kHz ([`constants::SAMPLE_RATE`])
//! - **Sample format:** 16-bit range in `i32`, 32-bit slots on the wire
//! - **System clock:** 176 MHz ([`constants::SYSTEM_CLOCK_HZ`])

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod clock;
pub mod constants;
pub mod control;
pub mod error;
pub mod io;
pub mod multicore;
pub mod timing;

#[cfg(feature = "nau88c22")]
pub mod codec;

pub use error::AudioError;
