//! Splitting each block's per-frame work between the two cores.
//!
//! The primary publishes the block in a [`BlockView`], then walks the
//! frames: it runs its own share of frame `i` and immediately asks the
//! secondary to run the other share of the same frame. Once the secondary
//! reports `Done`, the block is complete and the view is retired.
//!
//! Both cores hold a mutable [`Frame`] for a while, but never for the same
//! frame at the same time: the primary is finished with frame `i` before
//! it sends `SampleRequest(i)` and never goes back to it.

use core::marker::PhantomData;
use core::ptr;
use core::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

use super::fifo::CoreFifo;
use super::message::MessageKind;
use super::scheduler::{CrossCoreScheduler, SampleHandler};

/// The block currently being processed, shared between the cores.
pub struct BlockView {
    input: AtomicPtr<i32>,
    output: AtomicPtr<i32>,
    frames: AtomicUsize,
}

impl BlockView {
    pub const fn new() -> Self {
        BlockView {
            input: AtomicPtr::new(ptr::null_mut()),
            output: AtomicPtr::new(ptr::null_mut()),
            frames: AtomicUsize::new(0),
        }
    }

    fn publish(&self, input: *const i32, output: *mut i32, frames: usize) {
        self.input.store(input.cast_mut(), Ordering::Relaxed);
        self.output.store(output, Ordering::Relaxed);
        self.frames.store(frames, Ordering::Release);
    }

    fn retire(&self) {
        self.frames.store(0, Ordering::Release);
        self.input.store(ptr::null_mut(), Ordering::Relaxed);
        self.output.store(ptr::null_mut(), Ordering::Relaxed);
    }

    /// Frames in the published block (0 when nothing is published).
    pub fn frames(&self) -> usize {
        self.frames.load(Ordering::Acquire)
    }

    /// Access frame `index` of the published block.
    ///
    /// # Safety
    ///
    /// No other `Frame` for the same index may be alive, and the returned
    /// frame must not outlive the block (it is dropped before `Done` is
    /// sent for it).
    pub unsafe fn frame(&self, index: usize) -> Option<Frame<'_>> {
        if index >= self.frames.load(Ordering::Acquire) {
            return None;
        }
        let input = self.input.load(Ordering::Relaxed);
        let output = self.output.load(Ordering::Relaxed);
        // SAFETY: `publish` stored slices of at least `2 * frames` words.
        // Exclusivity of the output pair is the caller's contract.
        unsafe {
            Some(Frame {
                input: [*input.add(2 * index), *input.add(2 * index + 1)],
                output: output.add(2 * index),
                _block: PhantomData,
            })
        }
    }
}

impl Default for BlockView {
    fn default() -> Self {
        Self::new()
    }
}

/// One stereo frame: the received pair and the pair to transmit.
pub struct Frame<'a> {
    input: [i32; 2],
    output: *mut i32,
    _block: PhantomData<&'a mut [i32; 2]>,
}

impl Frame<'_> {
    pub fn input(&self) -> [i32; 2] {
        self.input
    }

    pub fn left_in(&self) -> i32 {
        self.input[0]
    }

    pub fn right_in(&self) -> i32 {
        self.input[1]
    }

    pub fn output(&self) -> [i32; 2] {
        // SAFETY: `output` points at two words owned by this frame.
        unsafe { [self.output.read(), self.output.add(1).read()] }
    }

    pub fn set_left(&mut self, sample: i32) {
        // SAFETY: see `output`.
        unsafe { self.output.write(sample) }
    }

    pub fn set_right(&mut self, sample: i32) {
        // SAFETY: see `output`.
        unsafe { self.output.add(1).write(sample) }
    }

    pub fn set_output(&mut self, left: i32, right: i32) {
        self.set_left(left);
        self.set_right(right);
    }
}

/// The primary core's block loop.
pub struct AudioLoop<'v, F> {
    scheduler: CrossCoreScheduler<F>,
    view: &'v BlockView,
}

impl<'v, F: CoreFifo> AudioLoop<'v, F> {
    pub const fn new(fifo: F, view: &'v BlockView) -> Self {
        AudioLoop {
            scheduler: CrossCoreScheduler::new(fifo),
            view,
        }
    }

    /// Process one block on both cores.
    ///
    /// `primary` runs on this core for every frame, in order. `frames` is
    /// clamped to what both slices hold and must match the secondary
    /// worker's block size, otherwise `Done` never arrives.
    pub fn process<P>(&mut self, input: &[i32], output: &mut [i32], frames: usize, mut primary: P)
    where
        P: FnMut(usize, &mut Frame<'_>),
    {
        let frames = frames.min(input.len() / 2).min(output.len() / 2);
        if frames == 0 {
            return;
        }

        self.view.publish(input.as_ptr(), output.as_mut_ptr(), frames);
        self.scheduler.send_begin();

        for index in 0..frames {
            // SAFETY: the secondary only touches frames already requested,
            // and this frame is dropped before its request goes out.
            if let Some(mut frame) = unsafe { self.view.frame(index) } {
                primary(index, &mut frame);
            }
            self.scheduler.request_sample(index);
        }

        self.scheduler.wait_for(MessageKind::Done);
        self.view.retire();
    }
}

/// Secondary-core handler that runs `work` on the requested frame.
pub struct SharedFrames<'v, W> {
    view: &'v BlockView,
    work: W,
    skipped: usize,
}

impl<'v, W> SharedFrames<'v, W>
where
    W: FnMut(usize, &mut Frame<'_>),
{
    pub fn new(view: &'v BlockView, work: W) -> Self {
        SharedFrames { view, work, skipped: 0 }
    }

    /// Requests that named no frame of the published block.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<W> SampleHandler for SharedFrames<'_, W>
where
    W: FnMut(usize, &mut Frame<'_>),
{
    fn handle(&mut self, index: usize) {
        // SAFETY: the primary sent this request after dropping its frame
        // and waits for `Done` before retiring the block.
        match unsafe { self.view.frame(index) } {
            Some(mut frame) => (self.work)(index, &mut frame),
            None => {
                self.skipped += 1;
                warn!("request for frame {=usize} outside the block", index);
            }
        }
    }
}
