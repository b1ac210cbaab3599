// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Proscenium Metrics: dynamic content scaling.
//!
//! Applications author against a logical *content* size bounded by a minimum and a
//! maximum. Devices report a surface in *pixels*. This crate picks an integer
//! scale factor that maps content onto the device with as little letterboxing as
//! possible and converts coordinates between the three spaces:
//!
//! - **Content space**: logical, device-independent units.
//! - **Screen space**: content scaled by the integer factor and shifted by the
//!   centering offsets.
//! - **Pixel space**: screen space with the device's pixel origin convention
//!   (optionally bottom-left, see [`MetricsProperties`]).
//!
//! ## Example
//!
//! ```rust
//! use kurbo::Point;
//! use proscenium_metrics::{ContentConstraints, ContentMetrics};
//!
//! let constraints = ContentConstraints::new(320, 480, 480, 854);
//! let mut metrics = ContentMetrics::new(constraints).unwrap();
//! metrics.set_optimal_content_size(750, 1334).unwrap();
//!
//! assert_eq!(metrics.scale_factor(), 2);
//! assert_eq!((metrics.content_width(), metrics.content_height()), (375, 667));
//!
//! let content = metrics.pixels_to_content(Point::new(100.0, 200.0));
//! assert_eq!(content, Point::new(50.0, 100.0));
//! ```
//!
//! Orientation changes exchange widths and heights and re-center the content but
//! keep the scale factor, which depends only on the device's pixel size.
//!
//! This crate is `no_std`.

#![no_std]

mod error;
mod metrics;
mod types;

pub use error::MetricsError;
pub use metrics::{ContentMetrics, ContentMetricsDebugInfo, DEFAULT_OFFSET_TOLERANCE};
pub use types::{Axis, ContentConstraints, ContentOrientation, MetricsProperties, ScreenRect};
