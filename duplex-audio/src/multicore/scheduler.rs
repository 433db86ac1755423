//! Block-scoped request/acknowledge protocol between the two cores.
//!
//! ```text
//!   primary (audio IRQ)                 secondary (worker loop)
//!   ───────────────────                 ───────────────────────
//!   Begin ─────────────────────────────► counter = 0
//!   work(0); SampleRequest(0) ─────────► handler(0); counter = 1
//!   work(1); SampleRequest(1) ─────────► handler(1); counter = 2
//!   ...                                  ...
//!   wait_for(Done) ◄──────────────────── counter == block_size → Done
//! ```
//!
//! There is no timeout: a worker that never answers stalls the primary,
//! and with it the audio interrupt.

use core::hint::spin_loop;
use core::sync::atomic::{compiler_fence, Ordering};

use embedded_hal::digital::{ErrorType, OutputPin};

use super::fifo::CoreFifo;
use super::message::{Message, MessageKind};
use crate::error::AudioError;

/// Message transport over one core's end of the mailbox.
pub struct CrossCoreScheduler<F> {
    fifo: F,
}

impl<F: CoreFifo> CrossCoreScheduler<F> {
    pub const fn new(fifo: F) -> Self {
        CrossCoreScheduler { fifo }
    }

    /// Send a message, spinning while the outgoing queue is full.
    pub fn send(&mut self, message: Message) {
        let word = message.to_word();
        while !self.fifo.is_write_ready() {
            spin_loop();
        }
        // Block data written before the message must be visible first.
        compiler_fence(Ordering::Release);
        self.fifo.write(word);
    }

    pub fn send_begin(&mut self) {
        self.send(Message::Begin);
    }

    /// Ask the other core to process frame `index` of the current block.
    pub fn request_sample(&mut self, index: usize) {
        debug_assert!(index <= i16::MAX as usize);
        self.send(Message::SampleRequest(index as i16));
    }

    pub fn send_done(&mut self) {
        self.send(Message::Done);
    }

    pub fn has_message(&mut self) -> bool {
        self.fifo.is_read_ready()
    }

    /// Take a message if one is waiting.
    pub fn try_receive(&mut self) -> Option<Result<Message, AudioError>> {
        let word = self.fifo.read()?;
        compiler_fence(Ordering::Acquire);
        Some(Message::from_word(word))
    }

    /// Wait for the next message.
    pub fn receive(&mut self) -> Result<Message, AudioError> {
        loop {
            if let Some(received) = self.try_receive() {
                return received;
            }
            spin_loop();
        }
    }

    /// Wait for a message of `kind`, discarding everything else.
    pub fn wait_for(&mut self, kind: MessageKind) -> Message {
        loop {
            match self.receive() {
                Ok(message) if message.kind() == kind => return message,
                Ok(other) => trace!("discarding {} while waiting", other),
                Err(err) => warn!("discarding bad word: {}", err),
            }
        }
    }

    pub fn into_inner(self) -> F {
        self.fifo
    }
}

/// Per-frame work done on the secondary core.
pub trait SampleHandler {
    fn handle(&mut self, index: usize);
}

impl<F: FnMut(usize)> SampleHandler for F {
    fn handle(&mut self, index: usize) {
        self(index)
    }
}

/// Placeholder for a worker without an activity pin.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoActivityPin;

impl ErrorType for NoActivityPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for NoActivityPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Result of one [`SecondaryWorker::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollOutcome {
    /// Nothing was waiting.
    Idle,
    /// A block started.
    Began,
    /// A request was handled; the block is not complete yet.
    Processed(usize),
    /// The last request of the block was handled and `Done` sent.
    Finished,
    /// A message the worker doesn't act on.
    Ignored,
}

/// The secondary core's side of the protocol.
pub struct SecondaryWorker<F, H, P = NoActivityPin> {
    scheduler: CrossCoreScheduler<F>,
    block_size: usize,
    handler: H,
    processed: usize,
    activity: P,
}

impl<F: CoreFifo, H: SampleHandler> SecondaryWorker<F, H> {
    pub fn new(fifo: F, block_size: usize, handler: H) -> Self {
        SecondaryWorker {
            scheduler: CrossCoreScheduler::new(fifo),
            block_size,
            handler,
            processed: 0,
            activity: NoActivityPin,
        }
    }
}

impl<F: CoreFifo, H: SampleHandler, P: OutputPin> SecondaryWorker<F, H, P> {
    /// Drive `pin` high while a message is being handled, for measuring
    /// the worker's load on a scope.
    pub fn with_activity_pin<Q: OutputPin>(self, pin: Q) -> SecondaryWorker<F, H, Q> {
        SecondaryWorker {
            scheduler: self.scheduler,
            block_size: self.block_size,
            handler: self.handler,
            processed: self.processed,
            activity: pin,
        }
    }

    /// Handle at most one message.
    pub fn poll(&mut self) -> PollOutcome {
        let Some(received) = self.scheduler.try_receive() else {
            return PollOutcome::Idle;
        };

        let _ = self.activity.set_high();
        let outcome = match received {
            Ok(Message::Begin) => {
                self.processed = 0;
                PollOutcome::Began
            }
            Ok(Message::SampleRequest(index)) => {
                match usize::try_from(index) {
                    Ok(index) => self.handler.handle(index),
                    Err(_) => warn!("negative sample request {=i16}", index),
                }
                self.processed += 1;
                if self.processed == self.block_size {
                    self.scheduler.send_done();
                    PollOutcome::Finished
                } else {
                    PollOutcome::Processed(self.processed)
                }
            }
            Ok(Message::Done) => PollOutcome::Ignored,
            Err(err) => {
                warn!("secondary: {}", err);
                PollOutcome::Ignored
            }
        };
        let _ = self.activity.set_low();
        outcome
    }

    /// Serve requests forever.
    pub fn run(&mut self) -> ! {
        loop {
            if self.poll() == PollOutcome::Idle {
                spin_loop();
            }
        }
    }

    /// Requests handled since the last `Begin`.
    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }
}
