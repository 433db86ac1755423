//! Cross-core messages and their FIFO word encoding.
//!
//! ```text
//!  31        16 15         0
//! ┌────────────┬────────────┐
//! │    tag     │ payload+2¹⁵│
//! └────────────┴────────────┘
//! ```
//!
//! The offset payload keeps the low half unsigned. Only this module knows
//! the layout; the rest of the crate deals in [`Message`].

use crate::error::AudioError;

const TAG_BEGIN: u32 = 0;
const TAG_SAMPLE_REQUEST: u32 = 1;
const TAG_DONE: u32 = 2;
const PAYLOAD_OFFSET: i32 = 32_768;

/// A message between the two cores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message {
    /// Start of a block: the worker resets its state.
    Begin,
    /// Process frame `n` of the current block.
    SampleRequest(i16),
    /// The worker has handled every request of the block.
    Done,
}

/// Message kind without payload, for [`wait_for`](super::CrossCoreScheduler::wait_for).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageKind {
    Begin,
    SampleRequest,
    Done,
}

impl Message {
    pub const fn kind(&self) -> MessageKind {
        match self {
            Message::Begin => MessageKind::Begin,
            Message::SampleRequest(_) => MessageKind::SampleRequest,
            Message::Done => MessageKind::Done,
        }
    }

    /// Encode for the FIFO.
    pub const fn to_word(self) -> u32 {
        let (tag, payload) = match self {
            Message::Begin => (TAG_BEGIN, 0),
            Message::SampleRequest(n) => (TAG_SAMPLE_REQUEST, n),
            Message::Done => (TAG_DONE, 0),
        };
        (tag << 16) | (payload as i32 + PAYLOAD_OFFSET) as u32
    }

    /// Decode a FIFO word.
    pub fn from_word(word: u32) -> Result<Self, AudioError> {
        let payload = ((word & 0xffff) as i32 - PAYLOAD_OFFSET) as i16;
        match word >> 16 {
            TAG_BEGIN => Ok(Message::Begin),
            TAG_SAMPLE_REQUEST => Ok(Message::SampleRequest(payload)),
            TAG_DONE => Ok(Message::Done),
            _ => Err(AudioError::UnknownMessage(word)),
        }
    }
}
