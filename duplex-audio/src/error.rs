use core::fmt;

/// Errors raised while bringing up the transport or decoding cross-core
/// traffic.
///
/// Start-up variants are fatal preconditions: the program set and channel
/// count are fixed, so on correct hardware they never occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AudioError {
    /// Sample rate is zero, negative or not finite.
    InvalidSampleRate,
    /// A pin is outside the GPIO range or two signals share a pin.
    InvalidPins,
    /// The system clock is too slow for the requested sample rate
    /// (a clock divider below 1).
    DividerOutOfRange,
    /// No free sequencer lane or instruction memory for a program.
    SequencerUnavailable,
    /// No free DMA channel.
    ChannelUnavailable,
    /// Receive and transmit transfers don't move identical blocks.
    BlockMismatch,
    /// `start_audio` was already called on this transport.
    AlreadyStarted,
    /// A FIFO word carried an unknown message tag.
    UnknownMessage(u32),
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::InvalidSampleRate => f.write_str("invalid sample rate"),
            AudioError::InvalidPins => f.write_str("invalid or overlapping I2S pins"),
            AudioError::DividerOutOfRange => {
                f.write_str("system clock too slow for the sample rate")
            }
            AudioError::SequencerUnavailable => f.write_str("no free PIO state machine"),
            AudioError::ChannelUnavailable => f.write_str("no free DMA channel"),
            AudioError::BlockMismatch => {
                f.write_str("input and output transfers differ in block size")
            }
            AudioError::AlreadyStarted => f.write_str("audio transport already started"),
            AudioError::UnknownMessage(word) => {
                write!(f, "unknown cross-core message word {word:#010x}")
            }
        }
    }
}

impl core::error::Error for AudioError {}
