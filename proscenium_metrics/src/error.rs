// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

use crate::Axis;

/// Configuration errors detected while computing content metrics.
///
/// All of these mean that no valid integer scale factor exists. They are raised
/// at startup and are not recoverable by the running frame loop.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsError {
    /// The platform reported a surface with no area.
    #[error("invalid device size {width}x{height}")]
    InvalidDeviceSize {
        /// Reported device width.
        width: i32,
        /// Reported device height.
        height: i32,
    },

    /// Minimum content sizes must be positive.
    #[error("minimum content size must be positive, got {min_width}x{min_height}")]
    NonPositiveMinimum {
        /// Declared minimum width.
        min_width: i32,
        /// Declared minimum height.
        min_height: i32,
    },

    /// A minimum content size is larger than the matching maximum.
    #[error("minimum content {axis} {min} exceeds maximum {max}")]
    MinExceedsMax {
        /// Offending axis.
        axis: Axis,
        /// Declared minimum.
        min: i32,
        /// Declared maximum.
        max: i32,
    },

    /// A minimum content size is larger than the device, so no scale factor of at least 1 fits.
    #[error("minimum content {axis} {min} exceeds device {axis} {device}")]
    MinExceedsDevice {
        /// Offending axis.
        axis: Axis,
        /// Declared minimum.
        min: i32,
        /// Device size on that axis.
        device: i32,
    },
}
