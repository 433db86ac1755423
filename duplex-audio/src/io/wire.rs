//! Sample conversion between the processing format and the serial wire.
//!
//! ## Wire format
//!
//! Each interleaved word in a DMA block is one 32-bit I2S slot:
//! - Bits 16–31: the signed 16-bit sample
//! - Bits 0–15: unused (zero on transmit, ignored on receive)
//!
//! Callbacks see the same words after [`downscale_block`]: the sample
//! sign-extended into the full `i32`.

/// Move a 16-bit sample into the high half of a 32-bit slot.
#[inline(always)]
pub const fn upscale_to_32bits(x: i32) -> i32 {
    x << 16
}

/// Recover a 16-bit sample from the high half of a 32-bit slot.
///
/// Arithmetic shift, so the sign survives and the low half is discarded.
#[inline(always)]
pub const fn downscale_to_16bits(x: i32) -> i32 {
    x >> 16
}

/// Convert a received block to 16-bit samples in place.
pub fn downscale_block(block: &mut [i32]) {
    for word in block.iter_mut() {
        *word = downscale_to_16bits(*word);
    }
}

/// Convert a processed block back to the wire format in place.
pub fn upscale_block(block: &mut [i32]) {
    for word in block.iter_mut() {
        *word = upscale_to_32bits(*word);
    }
}
