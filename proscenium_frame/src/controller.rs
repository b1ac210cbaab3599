// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame tick.
//!
//! A tick runs four phases in a fixed order, all under the [`EntryLock`]:
//!
//! 1. **Update**: the host's per-frame hook runs.
//! 2. **Dispatch**: input queued since the last tick is normalized and routed.
//! 3. **Render**: if the scene was invalidated, queued resources are preloaded,
//!    pending updates are applied and the renderer draws the current stage.
//! 4. **Collect**: the release cadence advances; orphans are swept on its
//!    schedule.

use std::time::Instant;

use kurbo::Rect;
use proscenium_dispatch::{EventDispatcher, EventHost};
use proscenium_metrics::{ContentMetrics, ContentOrientation, MetricsError};
use proscenium_reclaim::{RenderResource, ResourceCache};
use proscenium_scene::{CollectReport, Scene};

use crate::{
    CaptureRequest, ConfigError, EngineConfig, EntryLock, FrameSetup, InputBatch, InputQueue,
    Renderer,
};

/// Scripting host as seen by the frame loop.
pub trait FrameHost: EventHost {
    /// Runs at the start of every tick, before queued input is dispatched.
    fn enter_frame(&mut self, scene: &mut Scene, frame: u64) {
        let _ = (scene, frame);
    }
}

/// What one call to [`FrameController::tick`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Frame number of this tick; zero if the controller is suspended.
    pub frame: u64,
    /// Input batches drained from the queue.
    pub batches: usize,
    /// Batches some listener handled.
    pub handled: usize,
    /// The renderer drew a frame.
    pub rendered: bool,
    /// Outcome of the collect phase.
    pub collect: CollectReport,
}

/// Owns the scene, metrics, dispatcher and resource cache and drives them one
/// tick at a time.
#[derive(Debug)]
pub struct FrameController<R: RenderResource> {
    lock: EntryLock,
    input: InputQueue,
    metrics: ContentMetrics,
    scene: Scene,
    dispatcher: EventDispatcher,
    cache: ResourceCache<R>,
    frame: u64,
    suspended: bool,
    started: Instant,
    last_render: Instant,
}

impl<R: RenderResource> FrameController<R> {
    /// Builds a controller for a device surface of the given pixel size.
    ///
    /// Fails if the configured constraints cannot fit the device.
    pub fn new(
        config: &EngineConfig,
        device_width: i32,
        device_height: i32,
    ) -> Result<Self, ConfigError> {
        let mut metrics = ContentMetrics::new(config.content.constraints())?;
        metrics.set_offset_tolerance(config.content.offset_tolerance);
        metrics.set_properties(config.content.properties());
        metrics.set_optimal_content_size(device_width, device_height)?;

        let mut dispatcher = EventDispatcher::new();
        dispatcher.set_alpha_threshold(config.dispatch.alpha_threshold);

        let scene = Scene::new();
        let cache = ResourceCache::new(scene.reclaimer().sender());
        let now = Instant::now();
        Ok(Self {
            lock: EntryLock::new(),
            input: InputQueue::new(),
            metrics,
            scene,
            dispatcher,
            cache,
            frame: 0,
            suspended: false,
            started: now,
            last_render: now,
        })
    }

    /// A handle to the entry lock, for platform callbacks that touch engine state.
    #[must_use]
    pub fn entry_lock(&self) -> EntryLock {
        self.lock.clone()
    }

    /// A handle to the input queue; platform threads push into it.
    #[must_use]
    pub fn input_queue(&self) -> InputQueue {
        self.input.clone()
    }

    /// Reacts to a new surface size.
    ///
    /// Returns `Ok(false)` if the size did not change. On error the previous
    /// metrics stay in effect.
    pub fn window_size_changed(
        &mut self,
        device_width: i32,
        device_height: i32,
    ) -> Result<bool, MetricsError> {
        let lock = self.lock.clone();
        let _guard = lock.enter();
        if !self
            .metrics
            .has_device_size_changed(device_width, device_height)
        {
            return Ok(false);
        }
        self.metrics
            .set_optimal_content_size(device_width, device_height)?;
        self.scene.invalidate();
        Ok(true)
    }

    /// Changes the content orientation and schedules a redraw.
    pub fn set_orientation(&mut self, orientation: ContentOrientation) {
        let lock = self.lock.clone();
        let _guard = lock.enter();
        if self.metrics.orientation() != orientation {
            self.metrics.set_orientation(orientation);
            self.scene.invalidate();
        }
    }

    /// Runs one frame: update, dispatch, render, collect.
    ///
    /// A suspended controller does nothing and reports frame zero.
    pub fn tick<H, D>(&mut self, host: &mut H, renderer: &mut D) -> TickReport
    where
        H: FrameHost + ?Sized,
        D: Renderer<R>,
    {
        let lock = self.lock.clone();
        let _guard = lock.enter();
        if self.suspended {
            return TickReport::default();
        }
        self.frame += 1;
        let mut report = TickReport {
            frame: self.frame,
            ..TickReport::default()
        };

        host.enter_frame(&mut self.scene, self.frame);

        for batch in self.input.drain() {
            report.batches += 1;
            let handled = match batch {
                InputBatch::Single(raw) => {
                    self.dispatcher
                        .dispatch(&mut self.scene, &self.metrics, host, &raw)
                }
                InputBatch::Multitouch(touches) => self.dispatcher.dispatch_multitouch(
                    &mut self.scene,
                    &self.metrics,
                    host,
                    &touches,
                ),
            };
            if handled {
                report.handled += 1;
            }
        }

        if !self.scene.is_valid() {
            self.render(renderer);
            report.rendered = true;
        }

        report.collect = self.scene.collect(renderer);
        report
    }

    fn render<D: Renderer<R>>(&mut self, renderer: &mut D) {
        self.cache.preload(|resource| renderer.preload(resource));
        for resource in self.cache.take_updates() {
            renderer.update(&resource);
        }

        let now = Instant::now();
        let setup = FrameSetup::new(
            &self.metrics,
            self.frame,
            now.duration_since(self.started).as_secs_f64(),
            now.duration_since(self.last_render).as_secs_f64(),
        );
        self.last_render = now;
        renderer.render(&setup, &self.scene);

        if !renderer.is_frame_time_dependent() {
            self.scene.mark_valid();
        }
    }

    /// Stops ticking until [`resume`](Self::resume).
    pub fn suspend(&mut self) {
        if !self.suspended {
            log::info!("suspended at frame {}", self.frame);
        }
        self.suspended = true;
    }

    /// Resumes ticking and forces a redraw on the next tick.
    pub fn resume(&mut self) {
        if self.suspended {
            log::info!("resumed at frame {}", self.frame);
            self.scene.invalidate();
        }
        self.suspended = false;
    }

    /// True while suspended.
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Releases every pending resource and unreachable orphan now.
    ///
    /// Call before the rendering context is torn down.
    pub fn force_collect<D: Renderer<R>>(&mut self, renderer: &mut D) -> CollectReport {
        let lock = self.lock.clone();
        let _guard = lock.enter();
        self.scene.force_collect(renderer)
    }

    /// The capture request for `region` (the whole content area for `None`),
    /// or `None` if the region is empty or outside the content.
    #[must_use]
    pub fn capture_request(&self, region: Option<Rect>) -> Option<CaptureRequest> {
        CaptureRequest::new(&self.metrics, region)
    }

    /// Asks the renderer to read back `region`. Returns false if the region is
    /// rejected or the renderer cannot capture.
    pub fn capture<D: Renderer<R>>(&mut self, renderer: &mut D, region: Option<Rect>) -> bool {
        let lock = self.lock.clone();
        let _guard = lock.enter();
        match self.capture_request(region) {
            Some(request) => renderer.capture(&request, &self.scene),
            None => false,
        }
    }

    /// The scene.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The scene, mutably.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Current content metrics.
    #[must_use]
    pub fn metrics(&self) -> &ContentMetrics {
        &self.metrics
    }

    /// The event dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// The resource cache.
    #[must_use]
    pub fn cache(&self) -> &ResourceCache<R> {
        &self.cache
    }

    /// The resource cache, mutably.
    pub fn cache_mut(&mut self) -> &mut ResourceCache<R> {
        &mut self.cache
    }

    /// Number of frames ticked so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}
