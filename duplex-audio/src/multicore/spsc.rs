//! Lock-free single-producer single-consumer queue of 32-bit words.
//!
//! Stands in for one direction of the inter-core mailbox on hosted targets.
//! Unlike a Lamport queue it keeps free-running counters, so all `N` slots
//! are usable, matching the hardware FIFO depth.
//!
//! # Safety Contract
//!
//! - Only ONE context may call [`push()`](WordQueue::push).
//! - Only ONE context may call [`pop()`](WordQueue::pop).

use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

#[allow(clippy::declare_interior_mutable_const)]
const EMPTY_SLOT: AtomicU32 = AtomicU32::new(0);

pub struct WordQueue<const N: usize> {
    slots: [AtomicU32; N],
    /// Words pushed so far (wrapping, producer-owned).
    head: AtomicUsize,
    /// Words popped so far (wrapping, consumer-owned).
    tail: AtomicUsize,
}

impl<const N: usize> WordQueue<N> {
    pub const fn new() -> Self {
        assert!(N >= 1, "word queue needs at least one slot");
        WordQueue {
            slots: [EMPTY_SLOT; N],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Push a word (producer side). Returns it back if the queue is full.
    pub fn push(&self, word: u32) -> Result<(), u32> {
        let head = self.head.load(Ordering::Relaxed);
        if head.wrapping_sub(self.tail.load(Ordering::Acquire)) >= N {
            return Err(word);
        }
        self.slots[head % N].store(word, Ordering::Relaxed);
        // Publishes the slot write.
        self.head.store(head.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    /// Pop a word (consumer side).
    pub fn pop(&self) -> Option<u32> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }
        let word = self.slots[tail % N].load(Ordering::Relaxed);
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        Some(word)
    }

    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        head.wrapping_sub(self.tail.load(Ordering::Acquire))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= N
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for WordQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
