//! Serial audio transport.
//!
//! ## Components
//!
//! | Item | Description |
//! |------|-------------|
//! | [`AudioTransport`] | Sequencer + DMA bring-up and the per-block interrupt body |
//! | [`TransportSlot`] | Static registration the interrupt vector dispatches through |
//! | [`AudioBuffers`] | Double-buffer arena and DMA pointer rings |
//! | [`hw`] | `SequencerBank` / `DmaController` traits implemented by the platform |
//! | [`wire`] | 16 ⇄ 32-bit sample conversion at the bus boundary |
//!
//! ## Buffer rotation
//!
//! Each direction owns two 96-word blocks. While the DMA fills (or drains)
//! one, the interrupt hands the other to the block callback:
//!
//! ```text
//! IRQ #   processed   DMA active
//!   1        0            1
//!   2        1            0
//!   3        0            1
//! ```

pub mod buffers;
pub mod hw;
pub mod slot;
pub mod transport;
pub mod wire;

pub use buffers::{AudioBlock, AudioBuffers, BufferIndex, Direction};
pub use hw::{ChannelId, DmaController, LaneId, Pins, SequencerBank, SequencerProgram};
pub use slot::TransportSlot;
pub use transport::{AudioTransport, BlockCallback, NoCallback, StreamState, TransportConfig};

#[cfg(test)]
mod integration_tests;
