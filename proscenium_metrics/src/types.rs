// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Plain value types shared by the content metrics: constraints, orientation and pixel-space properties.

use core::fmt;

use crate::MetricsError;

/// A coordinate axis, used for error reporting.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The horizontal axis (widths).
    Horizontal,
    /// The vertical axis (heights).
    Vertical,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horizontal => f.write_str("width"),
            Self::Vertical => f.write_str("height"),
        }
    }
}

/// Application-declared bounds on the logical content size.
///
/// These are read once at startup, before the first call to
/// [`ContentMetrics::set_optimal_content_size`](crate::ContentMetrics::set_optimal_content_size).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContentConstraints {
    /// Smallest acceptable content width.
    pub min_width: i32,
    /// Smallest acceptable content height.
    pub min_height: i32,
    /// Largest acceptable content width.
    pub max_width: i32,
    /// Largest acceptable content height.
    pub max_height: i32,
}

impl ContentConstraints {
    /// Creates a constraint set from the minimum and maximum content sizes.
    #[must_use]
    pub const fn new(min_width: i32, min_height: i32, max_width: i32, max_height: i32) -> Self {
        Self {
            min_width,
            min_height,
            max_width,
            max_height,
        }
    }

    /// Checks the constraints on their own, independent of any device size.
    ///
    /// Minimums must be positive and must not exceed the matching maximum.
    pub fn validate(&self) -> Result<(), MetricsError> {
        if self.min_width <= 0 || self.min_height <= 0 {
            return Err(MetricsError::NonPositiveMinimum {
                min_width: self.min_width,
                min_height: self.min_height,
            });
        }
        if self.min_width > self.max_width {
            return Err(MetricsError::MinExceedsMax {
                axis: Axis::Horizontal,
                min: self.min_width,
                max: self.max_width,
            });
        }
        if self.min_height > self.max_height {
            return Err(MetricsError::MinExceedsMax {
                axis: Axis::Vertical,
                min: self.min_height,
                max: self.max_height,
            });
        }
        Ok(())
    }

    /// Returns the constraints with the width and height bounds exchanged.
    #[must_use]
    pub const fn transposed(self) -> Self {
        Self {
            min_width: self.min_height,
            min_height: self.min_width,
            max_width: self.max_height,
            max_height: self.max_width,
        }
    }
}

/// Orientation of the content relative to the device's natural orientation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum ContentOrientation {
    /// Natural device orientation.
    #[default]
    Upright,
    /// Rotated by 180 degrees.
    UpsideDown,
    /// Rotated so the top of the content is on the device's left edge.
    SidewaysLeft,
    /// Rotated so the top of the content is on the device's right edge.
    SidewaysRight,
}

impl ContentOrientation {
    /// Returns true for the two orientations that exchange width and height.
    #[must_use]
    pub const fn is_sideways(self) -> bool {
        matches!(self, Self::SidewaysLeft | Self::SidewaysRight)
    }
}

bitflags::bitflags! {
    /// Properties of the pixel space produced by
    /// [`ContentMetrics::content_to_pixels`](crate::ContentMetrics::content_to_pixels).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct MetricsProperties: u8 {
        /// Pixel space has its origin at the bottom-left corner, so y is flipped
        /// relative to the device height.
        const FLIP_VERTICAL_AXIS = 0b0000_0001;
    }
}

/// An integer rectangle in screen or pixel space.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct ScreenRect {
    /// Left edge.
    pub x: i32,
    /// Top edge (or bottom edge when the vertical axis is flipped).
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl ScreenRect {
    /// Creates a rectangle from its origin and extent.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns true if the rectangle covers no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_validation() {
        assert_eq!(ContentConstraints::new(320, 480, 480, 854).validate(), Ok(()));
        assert_eq!(
            ContentConstraints::new(0, 480, 480, 854).validate(),
            Err(MetricsError::NonPositiveMinimum {
                min_width: 0,
                min_height: 480
            })
        );
        assert_eq!(
            ContentConstraints::new(320, 900, 480, 854).validate(),
            Err(MetricsError::MinExceedsMax {
                axis: Axis::Vertical,
                min: 900,
                max: 854
            })
        );
    }

    #[test]
    fn transposed_swaps_axes() {
        let c = ContentConstraints::new(1, 2, 3, 4).transposed();
        assert_eq!(c, ContentConstraints::new(2, 1, 4, 3));
    }
}
