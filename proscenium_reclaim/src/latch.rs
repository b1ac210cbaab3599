// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use core::cell::Cell;

/// Whether a collection is in progress.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CollectState {
    /// No collection is running.
    #[default]
    Idle,
    /// A collection is running; nested attempts are skipped.
    Collecting,
}

/// Guards a collection against running recursively.
///
/// [`try_enter`](Self::try_enter) hands out a [`CollectToken`] while the latch is
/// idle. The token returns the latch to idle when dropped. While a token is alive
/// every further `try_enter` returns `None`, so a release callback that triggers
/// another collection simply skips it.
///
/// The token shares the state cell instead of borrowing the latch, so the owner
/// stays mutably usable while collecting.
#[derive(Debug, Default)]
pub struct CollectLatch {
    state: Rc<Cell<CollectState>>,
}

impl CollectLatch {
    /// Creates an idle latch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> CollectState {
        self.state.get()
    }

    /// Enters the collecting state, or returns `None` if already collecting.
    #[must_use]
    pub fn try_enter(&self) -> Option<CollectToken> {
        match self.state.get() {
            CollectState::Idle => {
                self.state.set(CollectState::Collecting);
                Some(CollectToken {
                    state: Rc::clone(&self.state),
                })
            }
            CollectState::Collecting => {
                log::debug!("skipping nested collection");
                None
            }
        }
    }
}

/// Proof that the owning [`CollectLatch`] is in the collecting state.
#[derive(Debug)]
pub struct CollectToken {
    state: Rc<Cell<CollectState>>,
}

impl Drop for CollectToken {
    fn drop(&mut self) {
        debug_assert_eq!(
            self.state.get(),
            CollectState::Collecting,
            "collect latch released twice"
        );
        self.state.set(CollectState::Idle);
    }
}
