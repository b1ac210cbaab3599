// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The renderer interface and the per-frame state handed to it.

use kurbo::Rect;
use proscenium_metrics::{ContentMetrics, ScreenRect};
use proscenium_reclaim::{Cached, RenderResource};
use proscenium_scene::{Scene, SceneSink};

/// Column-major 4x4 matrix.
pub type Mat4 = [f64; 16];

/// Orthographic projection with the same conventions as `glOrtho`.
#[must_use]
pub fn ortho(left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> Mat4 {
    let mut m = [0.0; 16];
    m[0] = 2.0 / (right - left);
    m[5] = 2.0 / (top - bottom);
    m[10] = -2.0 / (far - near);
    m[12] = -(right + left) / (right - left);
    m[13] = -(top + bottom) / (top - bottom);
    m[14] = -(far + near) / (far - near);
    m[15] = 1.0;
    m
}

/// View matrix for a camera at `(0, 0, 0.5)` looking at the origin with `+y` up.
#[must_use]
pub fn content_view() -> Mat4 {
    let mut m = [0.0; 16];
    m[0] = 1.0;
    m[5] = 1.0;
    m[10] = 1.0;
    m[14] = -0.5;
    m[15] = 1.0;
    m
}

/// Everything the renderer needs to draw one frame of the current stage.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSetup {
    /// Frame number, starting at 1.
    pub frame: u64,
    /// Seconds since the controller started.
    pub total_time: f64,
    /// Seconds since the previous rendered frame.
    pub delta_time: f64,
    /// Device pixels covered by content.
    pub viewport: ScreenRect,
    /// View matrix.
    pub view: Mat4,
    /// Projection mapping content space to clip space, `y` pointing down.
    pub projection: Mat4,
    /// Content units per device pixel.
    pub screen_to_content_scale: f64,
}

impl FrameSetup {
    /// Derives the viewport and matrices from `metrics`.
    #[must_use]
    pub fn new(metrics: &ContentMetrics, frame: u64, total_time: f64, delta_time: f64) -> Self {
        Self {
            frame,
            total_time,
            delta_time,
            viewport: metrics.viewport(),
            view: content_view(),
            // Top and bottom swapped so that (0, 0) is the upper-left corner.
            projection: ortho(
                0.0,
                f64::from(metrics.content_width()),
                f64::from(metrics.content_height()),
                0.0,
                0.0,
                1.0,
            ),
            screen_to_content_scale: metrics.screen_to_content_scale(),
        }
    }
}

/// A request to read back part of the rendered content.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureRequest {
    /// Region in content space, already clipped to the content bounds.
    pub content: Rect,
    /// The same region in device pixels.
    pub pixels: ScreenRect,
    /// Projection mapping the region to the whole capture target.
    pub projection: Mat4,
}

impl CaptureRequest {
    /// Builds a request for `region` (the whole content area for `None`).
    ///
    /// Zero-area, inverted or NaN regions, and regions entirely outside the
    /// content, yield `None`.
    #[must_use]
    pub fn new(metrics: &ContentMetrics, region: Option<Rect>) -> Option<Self> {
        let bounds = metrics.screen_content_bounds();
        let content = match region {
            Some(r) => {
                if !(r.width() > 0.0 && r.height() > 0.0) {
                    log::warn!("capture: rejecting empty region {r:?}");
                    return None;
                }
                r.intersect(bounds)
            }
            None => bounds,
        };
        if content.width() <= 0.0 || content.height() <= 0.0 {
            log::warn!("capture: region lies outside the content area");
            return None;
        }
        Some(Self {
            content,
            pixels: metrics.content_to_pixels(content),
            projection: ortho(content.x0, content.x1, content.y0, content.y1, 0.0, 1.0),
        })
    }
}

/// The rendering backend.
///
/// It is also the release sink for collection: resources and host objects torn
/// down by the scene are handed back to it.
pub trait Renderer<R: RenderResource>: SceneSink {
    /// Uploads a resource queued for preloading.
    fn preload(&mut self, resource: &Cached<R>) {
        let _ = resource;
    }

    /// Refreshes the backend copy of a resource marked for update.
    fn update(&mut self, resource: &Cached<R>) {
        let _ = resource;
    }

    /// Draws the current stage.
    fn render(&mut self, setup: &FrameSetup, scene: &Scene);

    /// True if the last frame depends on time (animated shaders and the like) and
    /// must be redrawn even when the scene did not change.
    fn is_frame_time_dependent(&self) -> bool {
        false
    }

    /// Reads back the region described by `request`. Returns false if the
    /// backend cannot capture.
    fn capture(&mut self, request: &CaptureRequest, scene: &Scene) -> bool {
        let _ = (request, scene);
        false
    }
}
