// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Proscenium Reclaim: deferred release of GPU-owned resources.
//!
//! A render pipeline may still be drawing with a resource one frame after the
//! tick that stopped using it. Freeing the backend object immediately would be a
//! use-after-free on the GPU side, so releases go through a
//! [`ResourceReclaimer`]:
//!
//! - Requests are appended to a *front* queue.
//! - Every 4th tick the *back* queue is emptied into a [`ReleaseSink`] and the
//!   queues swap. A request therefore waits between 4 and 8 ticks.
//! - Every 32nd tick the caller is told to run a full sweep (see
//!   [`CollectActions::sweep`]).
//!
//! The frame counter is eight bits and wraps; both intervals divide 256.
//!
//! [`ResourceCache`] sits on top: it hands out shared [`Cached`] resources by key,
//! keeps weak lookup entries and an owned strong table, tracks memory use, and
//! queues each resource's [`GpuHandle`] on the reclaimer when its last holder
//! drops it.
//!
//! [`CollectLatch`] protects a collection pass from recursive entry.
//!
//! ## Example
//!
//! ```rust
//! use proscenium_reclaim::{GpuHandle, ResourceReclaimer};
//!
//! let mut reclaimer = ResourceReclaimer::new();
//! let mut freed = Vec::new();
//! reclaimer.queue_release(GpuHandle(42));
//! for _ in 0..8 {
//!     reclaimer.advance(&mut |h: GpuHandle| freed.push(h));
//! }
//! assert_eq!(freed, [GpuHandle(42)]);
//! ```
//!
//! This crate is `no_std`.

#![no_std]

extern crate alloc;

mod cache;
mod cadence;
mod latch;
mod reclaimer;

pub use cache::{Cached, KindFilter, RenderResource, ResourceCache, ResourceKind};
pub use cadence::{CollectActions, FrameCounter, SWAP_MASK, SWEEP_MASK};
pub use latch::{CollectLatch, CollectState, CollectToken};
pub use reclaimer::{GpuHandle, ReclaimSender, ReleaseSink, ResourceReclaimer};
