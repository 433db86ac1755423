//! Inter-core mailbox abstraction.
//!
//! On the RP2040 each core sees one end of the SIO FIFO: it writes to the
//! other core's queue and reads its own. [`FifoPair`] is the same shape
//! built from two [`WordQueue`]s, for running both protocol ends as threads.

use super::spsc::WordQueue;
use crate::constants::CORE_FIFO_DEPTH;

/// One core's end of the mailbox.
pub trait CoreFifo {
    /// The outgoing queue has room.
    fn is_write_ready(&mut self) -> bool;

    /// Push a word. Like the hardware, a word written to a full queue is
    /// lost, so callers check [`is_write_ready`](Self::is_write_ready).
    fn write(&mut self, word: u32);

    /// A word is waiting.
    fn is_read_ready(&mut self) -> bool;

    /// Pop a word if one is waiting.
    fn read(&mut self) -> Option<u32>;
}

/// Two word queues, one per direction.
pub struct FifoPair<const N: usize = CORE_FIFO_DEPTH> {
    to_secondary: WordQueue<N>,
    to_primary: WordQueue<N>,
}

impl<const N: usize> FifoPair<N> {
    pub const fn new() -> Self {
        FifoPair {
            to_secondary: WordQueue::new(),
            to_primary: WordQueue::new(),
        }
    }

    /// The end used by the core that runs the audio interrupt.
    ///
    /// Each end must be taken once.
    pub fn primary(&self) -> FifoEnd<'_, N> {
        FifoEnd {
            tx: &self.to_secondary,
            rx: &self.to_primary,
        }
    }

    /// The end used by the worker core.
    pub fn secondary(&self) -> FifoEnd<'_, N> {
        FifoEnd {
            tx: &self.to_primary,
            rx: &self.to_secondary,
        }
    }
}

impl<const N: usize> Default for FifoPair<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// One end of a [`FifoPair`].
pub struct FifoEnd<'a, const N: usize> {
    tx: &'a WordQueue<N>,
    rx: &'a WordQueue<N>,
}

impl<const N: usize> CoreFifo for FifoEnd<'_, N> {
    fn is_write_ready(&mut self) -> bool {
        !self.tx.is_full()
    }

    fn write(&mut self, word: u32) {
        if self.tx.push(word).is_err() {
            warn!("core fifo overflow, word {=u32:#x} dropped", word);
        }
    }

    fn is_read_ready(&mut self) -> bool {
        !self.rx.is_empty()
    }

    fn read(&mut self) -> Option<u32> {
        self.rx.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ends_are_crossed() {
        let pair: FifoPair = FifoPair::new();
        let mut primary = pair.primary();
        let mut secondary = pair.secondary();

        assert!(!secondary.is_read_ready());
        primary.write(7);
        assert!(secondary.is_read_ready());
        assert!(!primary.is_read_ready());
        assert_eq!(secondary.read(), Some(7));

        secondary.write(9);
        assert_eq!(primary.read(), Some(9));
        assert_eq!(primary.read(), None);
    }

    #[test]
    fn write_ready_tracks_depth() {
        let pair: FifoPair<2> = FifoPair::new();
        let mut primary = pair.primary();
        primary.write(1);
        assert!(primary.is_write_ready());
        primary.write(2);
        assert!(!primary.is_write_ready());

        // Overflow drops the word, like the hardware.
        primary.write(3);
        let mut secondary = pair.secondary();
        assert_eq!(secondary.read(), Some(1));
        assert_eq!(secondary.read(), Some(2));
        assert_eq!(secondary.read(), None);
    }
}
