// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Affine, Point, Rect, Vec2};

use crate::{
    Axis, ContentConstraints, ContentOrientation, MetricsError, MetricsProperties, ScreenRect,
};

/// Default tolerance, in screen pixels, before a larger scale factor is allowed
/// to replace the current choice.
///
/// A larger factor only wins when the letterboxing of the current choice exceeds
/// this many pixels (summed over both axes) and the larger factor letterboxes less.
pub const DEFAULT_OFFSET_TOLERANCE: i32 = 4;

/// One evaluated scale factor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Candidate {
    scale: i32,
    content_width: i32,
    content_height: i32,
    x_offset: i32,
    y_offset: i32,
}

impl Candidate {
    fn evaluate(scale: i32, device_width: i32, device_height: i32, c: &ContentConstraints) -> Self {
        let content_width = (device_width / scale).clamp(c.min_width, c.max_width);
        let content_height = (device_height / scale).clamp(c.min_height, c.max_height);
        Self {
            scale,
            content_width,
            content_height,
            x_offset: residual_offset(device_width, content_width, scale),
            y_offset: residual_offset(device_height, content_height, scale),
        }
    }

    fn combined_offset(&self) -> i32 {
        self.x_offset + self.y_offset
    }
}

/// `ceil((device - content * scale) / 2)`, the centering offset on one axis.
fn residual_offset(device: i32, content: i32, scale: i32) -> i32 {
    (device - content * scale + 1).div_euclid(2)
}

/// Device, content and screen dimensions plus the conversions between them.
///
/// Content space is the logical coordinate system an application authors against.
/// Screen space is content space multiplied by an integer scale factor and shifted
/// by centering offsets. Pixel space is screen space with the device's pixel
/// origin convention applied (see [`MetricsProperties`]).
///
/// All conversions are pure functions of the current state. The state changes
/// only through [`set_optimal_content_size`](Self::set_optimal_content_size) and
/// [`set_orientation`](Self::set_orientation).
#[derive(Clone, Debug)]
pub struct ContentMetrics {
    constraints: ContentConstraints,
    device_width: i32,
    device_height: i32,
    content_width: i32,
    content_height: i32,
    scale: i32,
    x_offset: i32,
    y_offset: i32,
    screen_content_bounds: Rect,
    orientation: ContentOrientation,
    properties: MetricsProperties,
    offset_tolerance: i32,
}

impl ContentMetrics {
    /// Creates metrics for the given constraints.
    ///
    /// The constraints are validated here; the device size is unknown until
    /// [`set_optimal_content_size`](Self::set_optimal_content_size) runs, so until
    /// then the content size is the minimum size at scale 1.
    pub fn new(constraints: ContentConstraints) -> Result<Self, MetricsError> {
        constraints.validate()?;
        Ok(Self {
            constraints,
            device_width: constraints.min_width,
            device_height: constraints.min_height,
            content_width: constraints.min_width,
            content_height: constraints.min_height,
            scale: 1,
            x_offset: 0,
            y_offset: 0,
            screen_content_bounds: Rect::new(
                0.0,
                0.0,
                f64::from(constraints.min_width),
                f64::from(constraints.min_height),
            ),
            orientation: ContentOrientation::Upright,
            properties: MetricsProperties::empty(),
            offset_tolerance: DEFAULT_OFFSET_TOLERANCE,
        })
    }

    /// Sets the letterboxing tolerance used when choosing the scale factor.
    ///
    /// Takes effect on the next [`set_optimal_content_size`](Self::set_optimal_content_size).
    pub fn set_offset_tolerance(&mut self, tolerance: i32) {
        self.offset_tolerance = tolerance.max(0);
    }

    /// Returns the letterboxing tolerance.
    #[must_use]
    pub fn offset_tolerance(&self) -> i32 {
        self.offset_tolerance
    }

    /// Sets the pixel-space properties.
    pub fn set_properties(&mut self, properties: MetricsProperties) {
        self.properties = properties;
    }

    /// Returns the pixel-space properties.
    #[must_use]
    pub fn properties(&self) -> MetricsProperties {
        self.properties
    }

    /// Returns the content constraints, in the current orientation.
    #[must_use]
    pub fn constraints(&self) -> ContentConstraints {
        self.constraints
    }

    /// Chooses the integer scale factor and content size for a device surface.
    ///
    /// Every factor `s` from 1 up to `min(device_w / min_w, device_h / min_h)` is
    /// evaluated. The candidate content size is `device / s` clamped to the
    /// constraints, and its letterboxing is `ceil((device - content * s) / 2)` per
    /// axis. Scale 1 is the starting choice; a larger factor replaces it only when
    /// the current combined letterboxing exceeds the
    /// [offset tolerance](Self::set_offset_tolerance) and the larger factor's is
    /// smaller.
    ///
    /// Fails when the constraints do not fit the device at any scale.
    pub fn set_optimal_content_size(
        &mut self,
        device_width: i32,
        device_height: i32,
    ) -> Result<(), MetricsError> {
        if device_width <= 0 || device_height <= 0 {
            return Err(MetricsError::InvalidDeviceSize {
                width: device_width,
                height: device_height,
            });
        }
        let c = self.constraints;
        c.validate()?;
        if c.min_width > device_width {
            return Err(MetricsError::MinExceedsDevice {
                axis: Axis::Horizontal,
                min: c.min_width,
                device: device_width,
            });
        }
        if c.min_height > device_height {
            return Err(MetricsError::MinExceedsDevice {
                axis: Axis::Vertical,
                min: c.min_height,
                device: device_height,
            });
        }

        let max_scale = (device_width / c.min_width).min(device_height / c.min_height);
        let mut best = Candidate::evaluate(1, device_width, device_height, &c);
        for scale in 2..=max_scale {
            let candidate = Candidate::evaluate(scale, device_width, device_height, &c);
            if best.combined_offset() > self.offset_tolerance
                && candidate.combined_offset() < best.combined_offset()
            {
                best = candidate;
            }
        }

        self.device_width = device_width;
        self.device_height = device_height;
        self.content_width = best.content_width;
        self.content_height = best.content_height;
        self.scale = best.scale;
        self.x_offset = best.x_offset;
        self.y_offset = best.y_offset;
        self.rebuild_bounds();
        log::info!(
            "content {}x{} at scale {} on device {}x{} (offsets {}, {})",
            self.content_width,
            self.content_height,
            self.scale,
            device_width,
            device_height,
            self.x_offset,
            self.y_offset
        );
        Ok(())
    }

    /// Returns true if a surface of the given size differs from the current device size.
    #[must_use]
    pub fn has_device_size_changed(&self, device_width: i32, device_height: i32) -> bool {
        self.device_width != device_width || self.device_height != device_height
    }

    /// Changes the content orientation.
    ///
    /// Moving between an upright and a sideways orientation exchanges widths and
    /// heights (device, content and constraints) and re-derives the centering
    /// offsets. The scale factor is never recomputed here.
    pub fn set_orientation(&mut self, orientation: ContentOrientation) {
        if orientation.is_sideways() != self.orientation.is_sideways() {
            core::mem::swap(&mut self.device_width, &mut self.device_height);
            core::mem::swap(&mut self.content_width, &mut self.content_height);
            self.constraints = self.constraints.transposed();
            self.x_offset = residual_offset(self.device_width, self.content_width, self.scale);
            self.y_offset = residual_offset(self.device_height, self.content_height, self.scale);
            self.rebuild_bounds();
        }
        self.orientation = orientation;
    }

    /// Returns the current orientation.
    #[must_use]
    pub fn orientation(&self) -> ContentOrientation {
        self.orientation
    }

    fn rebuild_bounds(&mut self) {
        self.screen_content_bounds = Rect::new(
            0.0,
            0.0,
            f64::from(self.content_width),
            f64::from(self.content_height),
        );
    }

    /// Device surface width in pixels.
    #[must_use]
    pub fn device_width(&self) -> i32 {
        self.device_width
    }

    /// Device surface height in pixels.
    #[must_use]
    pub fn device_height(&self) -> i32 {
        self.device_height
    }

    /// Logical content width.
    #[must_use]
    pub fn content_width(&self) -> i32 {
        self.content_width
    }

    /// Logical content height.
    #[must_use]
    pub fn content_height(&self) -> i32 {
        self.content_height
    }

    /// The integer content-to-screen scale factor.
    #[must_use]
    pub fn scale_factor(&self) -> i32 {
        self.scale
    }

    /// The reciprocal of [`scale_factor`](Self::scale_factor).
    #[must_use]
    pub fn screen_to_content_scale(&self) -> f64 {
        1.0 / f64::from(self.scale)
    }

    /// Horizontal centering offset in screen pixels.
    #[must_use]
    pub fn x_screen_offset(&self) -> i32 {
        self.x_offset
    }

    /// Vertical centering offset in screen pixels.
    #[must_use]
    pub fn y_screen_offset(&self) -> i32 {
        self.y_offset
    }

    /// Content width multiplied by the scale factor.
    #[must_use]
    pub fn scaled_content_width(&self) -> i32 {
        self.content_width * self.scale
    }

    /// Content height multiplied by the scale factor.
    #[must_use]
    pub fn scaled_content_height(&self) -> i32 {
        self.content_height * self.scale
    }

    /// The visible content region: origin at zero, extent equal to the content size.
    #[must_use]
    pub fn screen_content_bounds(&self) -> Rect {
        self.screen_content_bounds
    }

    /// The screen rectangle the content occupies, for the renderer's viewport.
    #[must_use]
    pub fn viewport(&self) -> ScreenRect {
        ScreenRect::new(
            self.x_offset,
            self.y_offset,
            self.scaled_content_width(),
            self.scaled_content_height(),
        )
    }

    /// The affine map from content space to screen space.
    #[must_use]
    pub fn content_to_screen_transform(&self) -> Affine {
        Affine::translate(Vec2::new(
            f64::from(self.x_offset),
            f64::from(self.y_offset),
        )) * Affine::scale(f64::from(self.scale))
    }

    /// Maps a content-space point to screen space without rounding.
    #[must_use]
    pub fn content_to_screen_unrounded(&self, point: Point) -> Point {
        let scale = f64::from(self.scale);
        Point::new(
            point.x * scale + f64::from(self.x_offset),
            point.y * scale + f64::from(self.y_offset),
        )
    }

    /// Maps a content-space point to whole screen pixels.
    ///
    /// Each coordinate is offset by one half and truncated.
    #[must_use]
    pub fn content_to_screen(&self, point: Point) -> (i32, i32) {
        let p = self.content_to_screen_unrounded(point);
        (round_half_up(p.x), round_half_up(p.y))
    }

    /// Maps a content-space rectangle to whole screen pixels.
    ///
    /// The origin is mapped as in [`content_to_screen`](Self::content_to_screen);
    /// the extent is scaled and rounded the same way but not offset.
    #[must_use]
    pub fn content_to_screen_rect(&self, rect: Rect) -> ScreenRect {
        let (x, y) = self.content_to_screen(rect.origin());
        let scale = f64::from(self.scale);
        ScreenRect::new(
            x,
            y,
            round_half_up(rect.width() * scale),
            round_half_up(rect.height() * scale),
        )
    }

    /// Maps a screen-space point back to content space.
    #[must_use]
    pub fn screen_to_content(&self, point: Point) -> Point {
        let inv = self.screen_to_content_scale();
        Point::new(
            (point.x - f64::from(self.x_offset)) * inv,
            (point.y - f64::from(self.y_offset)) * inv,
        )
    }

    /// Maps a content-space rectangle into device pixels.
    ///
    /// With [`MetricsProperties::FLIP_VERTICAL_AXIS`] the result is measured from
    /// the bottom edge of the device.
    #[must_use]
    pub fn content_to_pixels(&self, rect: Rect) -> ScreenRect {
        let mut r = self.content_to_screen_rect(rect);
        if self.properties.contains(MetricsProperties::FLIP_VERTICAL_AXIS) {
            r.y = self.device_height - r.y - r.height;
        }
        r
    }

    /// Maps a raw device pixel position, as reported with input, into content space.
    #[must_use]
    pub fn pixels_to_content(&self, point: Point) -> Point {
        let mut p = point;
        if self.properties.contains(MetricsProperties::FLIP_VERTICAL_AXIS) {
            p.y = f64::from(self.device_height) - p.y;
        }
        self.screen_to_content(p)
    }

    /// Returns a snapshot of the current state for logging or inspection.
    #[must_use]
    pub fn debug_info(&self) -> ContentMetricsDebugInfo {
        ContentMetricsDebugInfo {
            device_size: (self.device_width, self.device_height),
            content_size: (self.content_width, self.content_height),
            scale_factor: self.scale,
            offsets: (self.x_offset, self.y_offset),
            screen_content_bounds: self.screen_content_bounds,
            orientation: self.orientation,
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "screen coordinates are bounded by the device size, which fits in i32"
)]
fn round_half_up(v: f64) -> i32 {
    (v + 0.5) as i32
}

/// Snapshot of [`ContentMetrics`] state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContentMetricsDebugInfo {
    /// Device surface size in pixels.
    pub device_size: (i32, i32),
    /// Content size in logical units.
    pub content_size: (i32, i32),
    /// Integer content-to-screen factor.
    pub scale_factor: i32,
    /// Centering offsets in screen pixels.
    pub offsets: (i32, i32),
    /// Visible content region.
    pub screen_content_bounds: Rect,
    /// Current orientation.
    pub orientation: ContentOrientation,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(min: (i32, i32), max: (i32, i32)) -> ContentMetrics {
        ContentMetrics::new(ContentConstraints::new(min.0, min.1, max.0, max.1)).unwrap()
    }

    #[test]
    fn residual_offset_rounds_up() {
        assert_eq!(residual_offset(750, 480, 1), 135);
        assert_eq!(residual_offset(751, 480, 1), 136);
        assert_eq!(residual_offset(750, 375, 2), 0);
    }

    #[test]
    fn tablet_keeps_unit_scale() {
        let mut m = metrics((320, 480), (1024, 768));
        m.set_optimal_content_size(1024, 768).unwrap();
        assert_eq!((m.content_width(), m.content_height()), (1024, 768));
        assert_eq!(m.scale_factor(), 1);
        assert_eq!((m.x_screen_offset(), m.y_screen_offset()), (0, 0));
    }

    #[test]
    fn phone_prefers_larger_scale_with_less_letterboxing() {
        let mut m = metrics((320, 480), (480, 854));
        m.set_optimal_content_size(750, 1334).unwrap();
        assert_eq!(m.scale_factor(), 2);
        assert_eq!((m.content_width(), m.content_height()), (375, 667));
        assert_eq!((m.x_screen_offset(), m.y_screen_offset()), (0, 0));
        assert_eq!(m.screen_content_bounds(), Rect::new(0.0, 0.0, 375.0, 667.0));
        assert!((m.screen_to_content_scale() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn small_letterbox_stays_within_tolerance() {
        // Scale 1 letterboxes (2, 2): within the tolerance, so scale 2 is not considered.
        let mut m = metrics((100, 100), (200, 200));
        m.set_optimal_content_size(204, 204).unwrap();
        assert_eq!(m.scale_factor(), 1);
        assert_eq!((m.content_width(), m.content_height()), (200, 200));
        assert_eq!((m.x_screen_offset(), m.y_screen_offset()), (2, 2));

        m.set_offset_tolerance(0);
        m.set_optimal_content_size(204, 204).unwrap();
        assert_eq!(m.scale_factor(), 2);
        assert_eq!((m.content_width(), m.content_height()), (102, 102));
    }

    #[test]
    fn minimum_larger_than_device_is_fatal() {
        let mut m = metrics((800, 480), (1024, 768));
        assert_eq!(
            m.set_optimal_content_size(640, 960),
            Err(MetricsError::MinExceedsDevice {
                axis: Axis::Horizontal,
                min: 800,
                device: 640
            })
        );
        assert!(matches!(
            m.set_optimal_content_size(0, 960),
            Err(MetricsError::InvalidDeviceSize { .. })
        ));
    }

    #[test]
    fn orientation_swaps_without_rescaling() {
        let mut m = metrics((320, 480), (480, 854));
        m.set_optimal_content_size(750, 1334).unwrap();
        m.set_orientation(ContentOrientation::SidewaysLeft);
        assert_eq!(m.scale_factor(), 2);
        assert_eq!((m.device_width(), m.device_height()), (1334, 750));
        assert_eq!((m.content_width(), m.content_height()), (667, 375));
        assert_eq!(m.screen_content_bounds(), Rect::new(0.0, 0.0, 667.0, 375.0));
        assert_eq!(m.constraints(), ContentConstraints::new(480, 320, 854, 480));

        // Sideways to sideways keeps the dimensions.
        m.set_orientation(ContentOrientation::SidewaysRight);
        assert_eq!((m.content_width(), m.content_height()), (667, 375));
        m.set_orientation(ContentOrientation::Upright);
        assert_eq!((m.content_width(), m.content_height()), (375, 667));
    }

    #[test]
    fn screen_conversions() {
        let mut m = metrics((320, 480), (480, 854));
        m.set_optimal_content_size(750, 1334).unwrap();
        assert_eq!(m.content_to_screen(Point::new(10.0, 20.0)), (20, 40));
        assert_eq!(
            m.content_to_screen_rect(Rect::new(10.0, 20.0, 30.0, 60.0)),
            ScreenRect::new(20, 40, 60, 120)
        );
        let back = m.screen_to_content(Point::new(20.0, 40.0));
        assert!((back.x - 10.0).abs() < 1e-12 && (back.y - 20.0).abs() < 1e-12);
        assert_eq!(m.viewport(), ScreenRect::new(0, 0, 750, 1334));
    }

    #[test]
    fn pixels_flip_vertical_axis() {
        let mut m = metrics((100, 100), (100, 100));
        m.set_optimal_content_size(100, 100).unwrap();
        m.set_properties(MetricsProperties::FLIP_VERTICAL_AXIS);
        assert_eq!(
            m.content_to_pixels(Rect::new(0.0, 0.0, 10.0, 20.0)),
            ScreenRect::new(0, 80, 10, 20)
        );
        let p = m.pixels_to_content(Point::new(5.0, 90.0));
        assert!((p.y - 10.0).abs() < 1e-12);
    }

    #[test]
    fn affine_agrees_with_unrounded() {
        let mut m = metrics((320, 480), (480, 854));
        m.set_optimal_content_size(760, 1334).unwrap();
        let p = Point::new(12.5, 33.25);
        let a = m.content_to_screen_transform() * p;
        let b = m.content_to_screen_unrounded(p);
        assert!((a - b).hypot() < 1e-9);
    }
}
