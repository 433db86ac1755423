//! Two-core block processing.
//!
//! | Item | Core | Role |
//! |------|------|------|
//! | [`AudioLoop`] | primary | Runs inside the block callback, hands frames to the secondary |
//! | [`SecondaryWorker`] | secondary | Serves `SampleRequest`s, answers `Done` per block |
//! | [`CrossCoreScheduler`] | both | Message send/receive over a [`CoreFifo`] |
//! | [`FifoPair`] | both | Software mailbox for hosted targets |

pub mod fifo;
pub mod message;
pub mod orchestrator;
pub mod scheduler;
pub mod spsc;

pub use fifo::{CoreFifo, FifoEnd, FifoPair};
pub use message::{Message, MessageKind};
pub use orchestrator::{AudioLoop, BlockView, Frame, SharedFrames};
pub use scheduler::{CrossCoreScheduler, NoActivityPin, PollOutcome, SampleHandler, SecondaryWorker};
