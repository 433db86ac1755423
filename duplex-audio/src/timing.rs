//! Conversions between wall time and sample / block-callback counts.
//!
//! All conversions truncate toward zero, so `seconds_to_samples(0.5)` at
//! 44 kHz is exactly 22 000.

use crate::constants::{AUDIO_LOOP_RATE, SAMPLE_RATE};

/// Seconds to a number of samples at [`SAMPLE_RATE`].
pub fn seconds_to_samples(seconds: f32) -> usize {
    (seconds * SAMPLE_RATE) as usize
}

/// Seconds to a number of audio-loop ticks (block callbacks).
pub fn seconds_to_loop_ticks(seconds: f32) -> usize {
    (seconds * AUDIO_LOOP_RATE) as usize
}

/// Period of a frequency, expressed in audio-loop ticks.
pub fn hz_to_loop_ticks(hz: f32) -> usize {
    (AUDIO_LOOP_RATE / hz) as usize
}
