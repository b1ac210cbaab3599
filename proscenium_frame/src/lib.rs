// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Proscenium Frame: the engine's frame loop.
//!
//! This crate composes the other Proscenium crates into a [`FrameController`]:
//!
//! - [`EngineConfig`] is read once at startup from TOML. Invalid content
//!   constraints are fatal and surface as [`ConfigError`].
//! - [`InputQueue`] accepts raw input from any thread; each tick drains it.
//! - [`EntryLock`] serializes every external entry (ticks, resizes, captures).
//! - [`Renderer`] is the backend seam. It receives a [`FrameSetup`] when the
//!   scene needs redrawing and doubles as the release sink for collection.
//! - [`FrameHost`] is the scripting host: it gets a per-frame hook and all
//!   routed events.
//!
//! ## Example
//!
//! ```rust
//! use proscenium_dispatch::EventHost;
//! use proscenium_frame::{EngineConfig, FrameController, FrameHost, FrameSetup, Renderer};
//! use proscenium_reclaim::{GpuHandle, ReleaseSink, RenderResource, ResourceKind};
//! use proscenium_scene::{NodeId, Scene, SceneSink, ScriptBinding};
//!
//! struct Image;
//! impl RenderResource for Image {
//!     fn kind(&self) -> ResourceKind { ResourceKind::Image }
//!     fn byte_size(&self) -> usize { 0 }
//! }
//!
//! struct NullRenderer;
//! impl ReleaseSink for NullRenderer {
//!     fn release_resource(&mut self, _: GpuHandle) {}
//! }
//! impl SceneSink for NullRenderer {
//!     fn release_binding(&mut self, _: ScriptBinding) {}
//! }
//! impl Renderer<Image> for NullRenderer {
//!     fn render(&mut self, _: &FrameSetup, _: &Scene) {}
//! }
//!
//! struct Script;
//! impl EventHost for Script {
//!     fn dispatch(&mut self, _: &mut Scene, _: NodeId, _: &proscenium_dispatch::Event) -> bool {
//!         false
//!     }
//! }
//! impl FrameHost for Script {}
//!
//! let config = EngineConfig::from_toml_str(
//!     r#"
//!     [content]
//!     min_width = 320
//!     max_width = 480
//!     min_height = 480
//!     max_height = 854
//!     "#,
//! )
//! .unwrap();
//! let mut frames = FrameController::<Image>::new(&config, 750, 1334).unwrap();
//! assert_eq!(frames.metrics().scale_factor(), 2);
//!
//! let report = frames.tick(&mut Script, &mut NullRenderer);
//! assert!(report.rendered);
//! assert_eq!(report.frame, 1);
//! ```

mod config;
mod controller;
mod error;
mod guard;
mod input;
mod render;

pub use config::{ContentConfig, DispatchConfig, EngineConfig};
pub use controller::{FrameController, FrameHost, TickReport};
pub use error::ConfigError;
pub use guard::{EntryGuard, EntryLock};
pub use input::{InputBatch, InputQueue};
pub use render::{CaptureRequest, FrameSetup, Mat4, Renderer, content_view, ortho};
