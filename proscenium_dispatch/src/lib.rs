// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Proscenium Dispatch: routes input into a [`Scene`](proscenium_scene::Scene).
//!
//! Raw platform records ([`RawInput`]) arrive in device pixels. The
//! [`EventDispatcher`] converts them to content space through
//! [`ContentMetrics`](proscenium_metrics::ContentMetrics), hands the normalized
//! [`Event`] to the host's global entry, and then, for touches and mouse input,
//! to scene nodes:
//!
//! - A node holding focus for the touch, or the stage's global focus, receives
//!   the event first, followed by its ancestors.
//! - Otherwise the current stage is hit tested into a [`HitSnapshot`] and the
//!   snapshot is walked in post order: front-most and deepest first, containers
//!   after their children.
//!
//! Delivery stops at the first node whose listener reports the event handled.
//! Only nodes declaring the event's [`ListenerMask`](proscenium_scene::ListenerMask)
//! category are asked.
//!
//! ## Example
//!
//! ```rust
//! use kurbo::Rect;
//! use proscenium_dispatch::{Event, EventDispatcher, EventHost, Phase, RawInput};
//! use proscenium_metrics::{ContentConstraints, ContentMetrics};
//! use proscenium_scene::{DisplayNode, Geometry, ListenerMask, NodeId, Scene};
//!
//! struct Host(Vec<NodeId>);
//! impl EventHost for Host {
//!     fn dispatch(&mut self, _: &mut Scene, target: NodeId, _: &Event) -> bool {
//!         self.0.push(target);
//!         true
//!     }
//! }
//!
//! let mut metrics = ContentMetrics::new(ContentConstraints::new(320, 480, 320, 480)).unwrap();
//! metrics.set_optimal_content_size(640, 960).unwrap();
//!
//! let mut scene = Scene::new();
//! let button = scene
//!     .insert(
//!         scene.main_stage(),
//!         DisplayNode::shape(Geometry::Rect(Rect::new(0.0, 0.0, 100.0, 40.0)))
//!             .with_listeners(ListenerMask::TOUCH),
//!     )
//!     .unwrap();
//!
//! // (150, 60) device pixels is (75, 30) in content space at scale 2.
//! let mut host = Host(Vec::new());
//! let mut dispatcher = EventDispatcher::new();
//! let raw = RawInput::touch((150.0, 60.0), Phase::Began, None);
//! assert!(dispatcher.dispatch(&mut scene, &metrics, &mut host, &raw));
//! assert_eq!(host.0, [button]);
//! ```
//!
//! This crate is `no_std`.

#![no_std]

extern crate alloc;

mod dispatcher;
mod event;
mod snapshot;

pub use dispatcher::{EventDispatcher, EventHost, dispatch_snapshot};
pub use event::{Event, InputKind, Modifiers, MouseButtons, Phase, RawInput};
pub use snapshot::{DEFAULT_ALPHA_THRESHOLD, HitSnapshot, HitTester, Probe};
