// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Proscenium Scene: the live tree of display nodes.
//!
//! A [`Scene`] stores nodes in a generational arena addressed by [`NodeId`].
//! Each node is a [`DisplayNode`]: a local transform, [`NodeFlags`], a
//! [`ListenerMask`] and a set of optional capability records:
//!
//! - [`Renderable`]: geometry the renderer draws, plus the backend resources the
//!   node owns.
//! - [`HitTestable`]: participation in hit testing, optionally through a mask.
//! - [`Container`]: an ordered child list, back to front.
//! - [`Maskable`]: a per-pixel alpha mask.
//!
//! Nodes belong to a *stage*. The scene keeps a stack of stages; the top one is
//! current and receives input. Every stage root carries the focus registry for
//! its subtree: one focused node per touch id and one global (keyboard) focus.
//!
//! Removing a node never frees it. It moves to the *orphanage* (or to the
//! *hit-test orphanage* while an in-flight dispatch still refers to it) and is
//! torn down by a later sweep, see [`Scene::collect`]. Teardown hands backend
//! resources to the scene's [`ResourceReclaimer`](proscenium_reclaim::ResourceReclaimer)
//! and host object bindings to a [`SceneSink`].
//!
//! ## Example
//!
//! ```rust
//! use kurbo::{Affine, Point, Rect};
//! use proscenium_scene::{DisplayNode, Geometry, Scene};
//!
//! let mut scene = Scene::new();
//! let stage = scene.main_stage();
//! let group = scene
//!     .insert(stage, DisplayNode::group().with_transform(Affine::translate((10.0, 0.0))))
//!     .unwrap();
//! let leaf = scene
//!     .insert(group, DisplayNode::shape(Geometry::Rect(Rect::new(0.0, 0.0, 5.0, 5.0))))
//!     .unwrap();
//!
//! assert_eq!(scene.stage_bounds(leaf), Some(Rect::new(10.0, 0.0, 15.0, 5.0)));
//! assert_eq!(
//!     scene.world_transform(leaf).unwrap() * Point::ZERO,
//!     Point::new(10.0, 0.0)
//! );
//!
//! assert!(scene.remove(group));
//! assert_eq!(scene.children_of(scene.orphanage()), &[group]);
//! ```
//!
//! This crate is `no_std`.

#![no_std]

extern crate alloc;

mod capability;
mod collect;
mod scene;
mod types;

pub use capability::{
    Container, DisplayNode, Geometry, HitTestable, MaskBitmap, Maskable, Renderable,
};
pub use collect::{CollectReport, SceneSink};
pub use scene::Scene;
pub use types::{ListenerMask, NodeFlags, NodeId, ScriptBinding, TouchId};
