// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cross-thread input hand-off.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use proscenium_dispatch::RawInput;

/// One unit of queued input.
#[derive(Clone, Debug, PartialEq)]
pub enum InputBatch {
    /// A single record.
    Single(RawInput),
    /// Simultaneous touches, all in the same phase.
    Multitouch(Vec<RawInput>),
}

/// Input pushed by platform threads and drained at the top of a tick.
///
/// Clones share the same queue.
#[derive(Clone, Debug, Default)]
pub struct InputQueue {
    pending: Arc<Mutex<VecDeque<InputBatch>>>,
}

impl InputQueue {
    /// An empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one record.
    pub fn push(&self, input: RawInput) {
        self.pending.lock().push_back(InputBatch::Single(input));
    }

    /// Queues a set of simultaneous touches. Empty sets are dropped.
    pub fn push_multitouch(&self, touches: Vec<RawInput>) {
        if touches.is_empty() {
            return;
        }
        self.pending.lock().push_back(InputBatch::Multitouch(touches));
    }

    /// Takes everything queued so far, oldest first.
    pub fn drain(&self) -> Vec<InputBatch> {
        self.pending.lock().drain(..).collect()
    }

    /// Number of queued batches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// True if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}
