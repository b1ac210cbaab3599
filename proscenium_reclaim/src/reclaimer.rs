// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::{CollectActions, FrameCounter};

/// Opaque handle to a resource owned by the rendering backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GpuHandle(pub u64);

/// Receives resource-release notifications once a handle is safe to free.
pub trait ReleaseSink {
    /// Frees the backend resource behind `handle`.
    fn release_resource(&mut self, handle: GpuHandle);
}

impl<F: FnMut(GpuHandle)> ReleaseSink for F {
    fn release_resource(&mut self, handle: GpuHandle) {
        self(handle);
    }
}

/// The front/back pair of release lists.
#[derive(Debug, Default)]
struct QueuePair {
    front: Vec<GpuHandle>,
    back: Vec<GpuHandle>,
}

/// Clonable handle for queueing releases from outside the reclaimer.
///
/// Cached resources hold one of these so that dropping the last reference defers
/// the backend free instead of performing it immediately.
#[derive(Clone, Debug)]
pub struct ReclaimSender {
    queues: Rc<RefCell<QueuePair>>,
}

impl ReclaimSender {
    /// Queues `handle` for deferred release.
    pub fn queue_release(&self, handle: GpuHandle) {
        self.queues.borrow_mut().front.push(handle);
    }
}

/// Frame-cadenced, two-queue deferred release scheduler.
///
/// New requests go to the front queue. Every 4th tick the back queue is handed to
/// the [`ReleaseSink`] and the queues swap, so a handle waits at least one full
/// cycle (4 ticks) and at most two cycles before it is freed. This covers a render
/// pipeline that is up to one frame behind the tick that queued the release.
#[derive(Debug)]
pub struct ResourceReclaimer {
    queues: Rc<RefCell<QueuePair>>,
    counter: FrameCounter,
}

impl Default for ResourceReclaimer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceReclaimer {
    /// Creates an empty reclaimer at frame zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queues: Rc::new(RefCell::new(QueuePair::default())),
            counter: FrameCounter::new(),
        }
    }

    /// Returns a handle that queues into this reclaimer.
    #[must_use]
    pub fn sender(&self) -> ReclaimSender {
        ReclaimSender {
            queues: Rc::clone(&self.queues),
        }
    }

    /// Queues `handle` for deferred release.
    pub fn queue_release(&self, handle: GpuHandle) {
        self.queues.borrow_mut().front.push(handle);
    }

    /// The current value of the wrapping frame counter.
    #[must_use]
    pub fn frame(&self) -> u8 {
        self.counter.get()
    }

    /// Number of handles waiting in the front and back queues.
    #[must_use]
    pub fn pending(&self) -> (usize, usize) {
        let q = self.queues.borrow();
        (q.front.len(), q.back.len())
    }

    /// Advances the frame counter and performs the swap if it is due.
    ///
    /// Returns the actions due this tick so the caller can run the sweep.
    pub fn advance(&mut self, sink: &mut dyn ReleaseSink) -> CollectActions {
        let actions = self.counter.advance();
        if actions.swap {
            self.release_back(sink);
            let mut q = self.queues.borrow_mut();
            let QueuePair { front, back } = &mut *q;
            core::mem::swap(front, back);
            log::debug!(
                "reclaim swap at frame {}: {} handles now pending",
                self.counter.get(),
                back.len()
            );
        }
        actions
    }

    /// Releases everything in both queues immediately.
    ///
    /// Used before the rendering context goes away, when no frame can still be in
    /// flight.
    pub fn flush_all(&mut self, sink: &mut dyn ReleaseSink) {
        self.release_back(sink);
        {
            let mut q = self.queues.borrow_mut();
            let QueuePair { front, back } = &mut *q;
            core::mem::swap(front, back);
        }
        self.release_back(sink);
    }

    /// Hands the back queue to `sink`.
    ///
    /// The list is taken out before notifying so the sink may queue new releases.
    fn release_back(&mut self, sink: &mut dyn ReleaseSink) {
        let back = core::mem::take(&mut self.queues.borrow_mut().back);
        if !back.is_empty() {
            log::trace!("releasing {} handles", back.len());
        }
        for handle in back {
            sink.release_resource(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn released_after_one_full_cycle() {
        let mut reclaimer = ResourceReclaimer::new();
        let mut freed = Vec::new();
        reclaimer.queue_release(GpuHandle(7));

        // Frames 1..=3: nothing due.
        for _ in 0..3 {
            reclaimer.advance(&mut |h: GpuHandle| freed.push(h));
        }
        assert!(freed.is_empty());
        assert_eq!(reclaimer.pending(), (1, 0));

        // Frame 4: swap moves the handle to the back queue.
        reclaimer.advance(&mut |h: GpuHandle| freed.push(h));
        assert!(freed.is_empty());
        assert_eq!(reclaimer.pending(), (0, 1));

        for _ in 0..3 {
            reclaimer.advance(&mut |h: GpuHandle| freed.push(h));
        }
        assert!(freed.is_empty());

        // Frame 8: back queue emptied.
        reclaimer.advance(&mut |h: GpuHandle| freed.push(h));
        assert_eq!(freed, vec![GpuHandle(7)]);
        assert_eq!(reclaimer.pending(), (0, 0));
    }

    #[test]
    fn sender_feeds_front_queue() {
        let reclaimer = ResourceReclaimer::new();
        let sender = reclaimer.sender();
        sender.queue_release(GpuHandle(1));
        sender.queue_release(GpuHandle(2));
        assert_eq!(reclaimer.pending(), (2, 0));
    }

    #[test]
    fn flush_all_empties_both_queues() {
        let mut reclaimer = ResourceReclaimer::new();
        reclaimer.queue_release(GpuHandle(1));
        for _ in 0..4 {
            reclaimer.advance(&mut |_: GpuHandle| {});
        }
        reclaimer.queue_release(GpuHandle(2));
        assert_eq!(reclaimer.pending(), (1, 1));

        let mut freed = Vec::new();
        reclaimer.flush_all(&mut |h: GpuHandle| freed.push(h));
        assert_eq!(freed, vec![GpuHandle(1), GpuHandle(2)]);
        assert_eq!(reclaimer.pending(), (0, 0));
    }

    #[test]
    fn sink_may_queue_more_releases() {
        let mut reclaimer = ResourceReclaimer::new();
        let sender = reclaimer.sender();
        reclaimer.queue_release(GpuHandle(1));
        reclaimer.flush_all(&mut |h: GpuHandle| {
            if h == GpuHandle(1) {
                sender.queue_release(GpuHandle(2));
            }
        });
        assert_eq!(reclaimer.pending(), (1, 0));
    }
}
