// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sweeps of the scale selection over many device sizes.

use kurbo::Point;
use proscenium_metrics::{ContentConstraints, ContentMetrics, MetricsError};

const DEVICES: &[(i32, i32)] = &[
    (320, 480),
    (640, 960),
    (640, 1136),
    (750, 1334),
    (768, 1024),
    (1080, 1920),
    (1125, 2436),
    (1242, 2688),
    (1536, 2048),
    (2048, 2732),
    (481, 855),
    (333, 777),
];

#[test]
fn content_stays_within_constraints() {
    let constraints = ContentConstraints::new(320, 480, 480, 854);
    for &(w, h) in DEVICES {
        let mut m = ContentMetrics::new(constraints).unwrap();
        m.set_optimal_content_size(w, h).unwrap();
        assert!(m.scale_factor() >= 1, "scale for {w}x{h}");
        assert!((320..=480).contains(&m.content_width()), "width for {w}x{h}");
        assert!((480..=854).contains(&m.content_height()), "height for {w}x{h}");
        assert!(m.scaled_content_width() <= w, "scaled width for {w}x{h}");
        assert!(m.scaled_content_height() <= h, "scaled height for {w}x{h}");

        let b = m.screen_content_bounds();
        assert_eq!(b.x0, 0.0);
        assert_eq!(b.y0, 0.0);
        assert_eq!(b.x1, f64::from(m.content_width()));
        assert_eq!(b.y1, f64::from(m.content_height()));
    }
}

#[test]
fn screen_round_trip_within_one_unit() {
    let constraints = ContentConstraints::new(320, 480, 480, 854);
    for &(w, h) in DEVICES {
        let mut m = ContentMetrics::new(constraints).unwrap();
        m.set_optimal_content_size(w, h).unwrap();
        let bounds = m.screen_content_bounds();
        for i in 0..=10 {
            for j in 0..=10 {
                let p = Point::new(
                    bounds.x0 + bounds.width() * f64::from(i) / 10.0,
                    bounds.y0 + bounds.height() * f64::from(j) / 10.0,
                );
                let (sx, sy) = m.content_to_screen(p);
                let back = m.screen_to_content(Point::new(f64::from(sx), f64::from(sy)));
                assert!((back.x - p.x).abs() <= 1.0, "x drift at {p:?} on {w}x{h}");
                assert!((back.y - p.y).abs() <= 1.0, "y drift at {p:?} on {w}x{h}");
            }
        }
    }
}

#[test]
fn recomputation_is_stable() {
    let constraints = ContentConstraints::new(320, 480, 1024, 1366);
    let mut m = ContentMetrics::new(constraints).unwrap();
    m.set_optimal_content_size(1536, 2048).unwrap();
    let first = m.debug_info();
    assert!(!m.has_device_size_changed(1536, 2048));
    m.set_optimal_content_size(1536, 2048).unwrap();
    assert_eq!(first, m.debug_info());
    assert!(m.has_device_size_changed(2048, 1536));
}

#[test]
fn invalid_constraints_fail_at_construction() {
    let err = ContentMetrics::new(ContentConstraints::new(500, 480, 480, 854)).unwrap_err();
    assert!(matches!(err, MetricsError::MinExceedsMax { .. }));
}
