//! Fixed audio geometry and clocking of the instrument.
//!
//! Block geometry is a compile-time property: the DMA descriptors, the
//! pointer rings and the cross-core message payloads are all sized from
//! these constants.

/// Frames per channel in one audio block.
pub const AUDIO_BUFFER_SIZE: usize = 48;

/// 32-bit words in one interleaved stereo block (left, right, left, ...).
pub const AUDIO_BUFFER_FRAMES: usize = AUDIO_BUFFER_SIZE * 2;

/// Words moved by the receive DMA per block.
pub const INPUT_BLOCK_WORDS: usize = AUDIO_BUFFER_FRAMES;

/// Words moved by the transmit DMA per block.
pub const OUTPUT_BLOCK_WORDS: usize = AUDIO_BUFFER_FRAMES;

// Only the receive side raises a completion interrupt; the transmit side
// rotates on the same interrupt, which is only correct while both move
// blocks of the same length.
const _: () = assert!(INPUT_BLOCK_WORDS == OUTPUT_BLOCK_WORDS);
const _: () = assert!(AUDIO_BUFFER_SIZE <= i16::MAX as usize);

/// Audio sample rate in Hz.
///
/// Close to 44.1 kHz, chosen so that [`SYSTEM_CLOCK_HZ`] divides it into
/// clean PIO clock dividers.
pub const SAMPLE_RATE: f32 = 44_000.0;

/// System clock the RP2040 is configured to (slightly overclocked).
pub const SYSTEM_CLOCK_HZ: u32 = 176_000_000;

/// Master clock is `MCLK_MULTIPLIER × SAMPLE_RATE`.
pub const MCLK_MULTIPLIER: f32 = 256.0;

/// Bits per sample slot on the serial bus. Samples are processed as 16-bit
/// but travel in 32-bit slots.
pub const WIRE_BIT_DEPTH: f32 = 32.0;

/// Number of user GPIOs on the RP2040 (GPIO0..=GPIO29).
pub const GPIO_COUNT: u8 = 30;

/// Depth of each direction of the SIO inter-core FIFO.
pub const CORE_FIFO_DEPTH: usize = 8;

/// Block callbacks per second.
pub const AUDIO_LOOP_RATE: f32 = SAMPLE_RATE / AUDIO_BUFFER_SIZE as f32;
