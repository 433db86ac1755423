//! Double-buffer arena and DMA pointer rings.
//!
//! ```text
//!            PointerRing (8-byte aligned)         AudioBlocks
//!            ┌────────────┬────────────┐        ┌──────────────┐
//! control ──►│ &block[0]  │ &block[1]  │───────►│ 96 × i32 (0) │
//!  DMA       └────────────┴────────────┘        ├──────────────┤
//!            read address wraps every 8 bytes   │ 96 × i32 (1) │
//!                                               └──────────────┘
//! ```
//!
//! Each time a data transfer finishes, its control channel copies the next
//! ring entry into the data channel's address register and retriggers it, so
//! the hardware ping-pongs between the two blocks without CPU help.
//!
//! This module is the only place where buffer memory is turned into bus
//! addresses. Everything else names a buffer by [`Direction`] and
//! [`BufferIndex`].

use crate::constants::AUDIO_BUFFER_FRAMES;

/// One interleaved stereo block in wire format.
pub type AudioBlock = [i32; AUDIO_BUFFER_FRAMES];

/// Transfer direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Serial-in receiver → memory.
    Input,
    /// Memory → serial-out transmitter.
    Output,
}

/// Which of the two blocks of a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BufferIndex {
    First = 0,
    Second = 1,
}

impl BufferIndex {
    /// The other block of the pair.
    pub const fn other(self) -> Self {
        match self {
            BufferIndex::First => BufferIndex::Second,
            BufferIndex::Second => BufferIndex::First,
        }
    }

    pub const fn as_usize(self) -> usize {
        self as usize
    }
}

/// Two-entry ring of block addresses read by a control channel.
///
/// The DMA ring-wrap feature needs the ring aligned to its own size
/// (2 entries × 4 bytes).
#[repr(C, align(8))]
pub struct PointerRing {
    entries: [u32; 2],
}

impl PointerRing {
    /// `log2` of the ring size in bytes, as programmed into the DMA.
    pub const WRAP_BITS: u8 = 3;

    const fn new() -> Self {
        PointerRing { entries: [0; 2] }
    }

    /// Bus address of the ring itself.
    pub fn address(&self) -> u32 {
        self.entries.as_ptr() as usize as u32
    }

    /// Bus address of one ring entry.
    pub fn entry_address(&self, index: BufferIndex) -> u32 {
        self.address() + (index.as_usize() * core::mem::size_of::<u32>()) as u32
    }

    /// The block addresses currently stored in the ring.
    pub fn entries(&self) -> [u32; 2] {
        self.entries
    }

    /// Resolve a control channel's read address to a block index.
    ///
    /// The control channel has already consumed the entry for the block the
    /// data channel is filling now, so its read address points at the entry
    /// of the block that just completed. `None` if the address is not one
    /// of this ring's entries.
    pub fn index_at(&self, read_address: u32) -> Option<BufferIndex> {
        [BufferIndex::First, BufferIndex::Second]
            .into_iter()
            .find(|&index| self.entry_address(index) == read_address)
    }

    fn link(&mut self, blocks: &[AudioBlock; 2]) {
        for (entry, block) in self.entries.iter_mut().zip(blocks.iter()) {
            *entry = block.as_ptr() as usize as u32;
        }
    }
}

/// Bus addresses of every DMA-visible object in an [`AudioBuffers`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferAddresses {
    input_ring: u32,
    output_ring: u32,
    input: [u32; 2],
    output: [u32; 2],
}

impl BufferAddresses {
    /// Address of a direction's pointer ring.
    pub fn ring(&self, direction: Direction) -> u32 {
        match direction {
            Direction::Input => self.input_ring,
            Direction::Output => self.output_ring,
        }
    }

    /// Address of one block.
    pub fn block(&self, direction: Direction, index: BufferIndex) -> u32 {
        match direction {
            Direction::Input => self.input[index.as_usize()],
            Direction::Output => self.output[index.as_usize()],
        }
    }
}

/// The two blocks per direction plus their pointer rings.
///
/// The rings hold absolute addresses after [`link()`](Self::link), so the
/// transport only accepts an arena borrowed for `'static`.
#[repr(C)]
pub struct AudioBuffers {
    input: [AudioBlock; 2],
    output: [AudioBlock; 2],
    input_ring: PointerRing,
    output_ring: PointerRing,
}

impl AudioBuffers {
    pub const fn new() -> Self {
        AudioBuffers {
            input: [[0; AUDIO_BUFFER_FRAMES]; 2],
            output: [[0; AUDIO_BUFFER_FRAMES]; 2],
            input_ring: PointerRing::new(),
            output_ring: PointerRing::new(),
        }
    }

    /// Fill both pointer rings from the arena's current location and return
    /// the address map for DMA configuration.
    pub fn link(&mut self) -> BufferAddresses {
        self.input_ring.link(&self.input);
        self.output_ring.link(&self.output);
        BufferAddresses {
            input_ring: self.input_ring.address(),
            output_ring: self.output_ring.address(),
            input: self.input_ring.entries(),
            output: self.output_ring.entries(),
        }
    }

    pub fn ring(&self, direction: Direction) -> &PointerRing {
        match direction {
            Direction::Input => &self.input_ring,
            Direction::Output => &self.output_ring,
        }
    }

    pub fn block(&self, direction: Direction, index: BufferIndex) -> &AudioBlock {
        match direction {
            Direction::Input => &self.input[index.as_usize()],
            Direction::Output => &self.output[index.as_usize()],
        }
    }

    pub fn block_mut(&mut self, direction: Direction, index: BufferIndex) -> &mut AudioBlock {
        match direction {
            Direction::Input => &mut self.input[index.as_usize()],
            Direction::Output => &mut self.output[index.as_usize()],
        }
    }

    /// The input and output block with the same index, as handed to the
    /// block callback.
    pub fn pair_mut(&mut self, index: BufferIndex) -> (&mut AudioBlock, &mut AudioBlock) {
        (
            &mut self.input[index.as_usize()],
            &mut self.output[index.as_usize()],
        )
    }
}

impl Default for AudioBuffers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::{align_of, size_of};

    #[test]
    fn other_flips() {
        assert_eq!(BufferIndex::First.other(), BufferIndex::Second);
        assert_eq!(BufferIndex::Second.other(), BufferIndex::First);
        assert_eq!(BufferIndex::Second.other().other(), BufferIndex::Second);
    }

    #[test]
    fn ring_is_aligned_to_its_size() {
        assert_eq!(size_of::<PointerRing>(), 1 << PointerRing::WRAP_BITS);
        assert_eq!(align_of::<PointerRing>(), 1 << PointerRing::WRAP_BITS);
    }

    #[test]
    fn link_points_rings_at_blocks() {
        let mut buffers = AudioBuffers::new();
        let addrs = buffers.link();

        for dir in [Direction::Input, Direction::Output] {
            let ring = buffers.ring(dir);
            assert_eq!(addrs.ring(dir), ring.address());
            assert_eq!(ring.address() % 8, 0);
            for idx in [BufferIndex::First, BufferIndex::Second] {
                let expected = buffers.block(dir, idx).as_ptr() as usize as u32;
                assert_eq!(ring.entries()[idx.as_usize()], expected);
                assert_eq!(addrs.block(dir, idx), expected);
            }
        }
        assert_ne!(
            addrs.block(Direction::Input, BufferIndex::First),
            addrs.block(Direction::Input, BufferIndex::Second)
        );
    }

    #[test]
    fn index_at_resolves_entry_addresses() {
        let mut buffers = AudioBuffers::new();
        buffers.link();
        let ring = buffers.ring(Direction::Input);

        let first = ring.entry_address(BufferIndex::First);
        let second = ring.entry_address(BufferIndex::Second);
        assert_eq!(ring.index_at(first), Some(BufferIndex::First));
        assert_eq!(ring.index_at(second), Some(BufferIndex::Second));
        assert_eq!(ring.entry_address(BufferIndex::Second) - ring.address(), 4);
    }

    #[test]
    fn index_at_rejects_foreign_addresses() {
        let mut buffers = AudioBuffers::new();
        buffers.link();
        let ring = buffers.ring(Direction::Input);
        let base = ring.address();

        assert_eq!(ring.index_at(base.wrapping_add(8)), None);
        assert_eq!(ring.index_at(base.wrapping_sub(4)), None);
        assert_eq!(ring.index_at(base.wrapping_add(2)), None);
        // A block address is not a ring entry.
        assert_eq!(ring.index_at(ring.entries()[0]), None);
    }

    #[test]
    fn pair_mut_matches_indices() {
        let mut buffers = AudioBuffers::new();
        {
            let (input, output) = buffers.pair_mut(BufferIndex::Second);
            input[0] = 7;
            output[0] = 9;
        }
        assert_eq!(buffers.block(Direction::Input, BufferIndex::Second)[0], 7);
        assert_eq!(buffers.block(Direction::Output, BufferIndex::Second)[0], 9);
        assert_eq!(buffers.block(Direction::Input, BufferIndex::First)[0], 0);
    }
}
