// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Serialization of external entries into the engine.

use std::sync::Arc;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

/// Lock held around every external entry: the tick, resize callbacks, captures.
///
/// Reentrant, so an entry made from inside another (a listener triggering a
/// resize, say) does not deadlock. Clones share the same lock and can be handed
/// to platform callbacks on other threads.
#[derive(Clone, Debug, Default)]
pub struct EntryLock {
    inner: Arc<ReentrantMutex<()>>,
}

/// Proof that the current thread holds the [`EntryLock`].
pub type EntryGuard<'a> = ReentrantMutexGuard<'a, ()>;

impl EntryLock {
    /// A fresh lock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until the lock is held by this thread.
    pub fn enter(&self) -> EntryGuard<'_> {
        self.inner.lock()
    }

    /// Takes the lock if no other thread holds it.
    pub fn try_enter(&self) -> Option<EntryGuard<'_>> {
        self.inner.try_lock()
    }

    /// True if some thread holds the lock.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.inner.is_locked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reentrant_on_one_thread() {
        let lock = EntryLock::new();
        let outer = lock.enter();
        let inner = lock.try_enter();
        assert!(inner.is_some(), "same thread may re-enter");
        drop(inner);
        drop(outer);
        assert!(!lock.is_held());
    }

    #[test]
    fn excludes_other_threads() {
        let lock = EntryLock::new();
        let _held = lock.enter();
        let other = lock.clone();
        let got = std::thread::spawn(move || other.try_enter().is_some())
            .join()
            .unwrap();
        assert!(!got, "another thread must not enter while held");
    }
}
