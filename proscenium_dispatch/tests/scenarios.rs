// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end routing scenarios.

use kurbo::{Affine, Rect};
use proscenium_dispatch::{Event, EventDispatcher, EventHost, Phase, RawInput, dispatch_snapshot};
use proscenium_metrics::{ContentConstraints, ContentMetrics};
use proscenium_scene::{DisplayNode, Geometry, ListenerMask, NodeId, Scene, TouchId};

fn metrics() -> ContentMetrics {
    let mut m = ContentMetrics::new(ContentConstraints::new(320, 480, 320, 480)).unwrap();
    m.set_optimal_content_size(320, 480).unwrap();
    m
}

fn touch_rect(x: f64, y: f64, w: f64, h: f64) -> DisplayNode {
    DisplayNode::shape(Geometry::Rect(Rect::new(0.0, 0.0, w, h)))
        .with_transform(Affine::translate((x, y)))
        .with_listeners(ListenerMask::TOUCH)
}

/// Takes focus on `began`, handles everything, and records each delivery.
#[derive(Default)]
struct Grabber {
    log: Vec<(NodeId, Phase, Option<TouchId>)>,
}

impl EventHost for Grabber {
    fn dispatch(&mut self, scene: &mut Scene, target: NodeId, event: &Event) -> bool {
        self.log.push((target, event.phase, event.id));
        if event.phase == Phase::Began {
            if let Some(id) = event.id {
                assert!(scene.set_touch_focus(target, id));
            }
        }
        true
    }
}

#[test]
fn focused_touch_sequence_clears_focus_on_end() {
    let m = metrics();
    let mut scene = Scene::new();
    let stage = scene.main_stage();
    let full = scene.insert(stage, touch_rect(0.0, 0.0, 320.0, 480.0)).unwrap();

    let mut host = Grabber::default();
    let mut d = EventDispatcher::new();
    let id = Some(TouchId(1));
    for (pos, phase) in [
        ((10.0, 10.0), Phase::Began),
        ((12.0, 11.0), Phase::Moved),
        ((12.0, 11.0), Phase::Ended),
    ] {
        assert!(d.dispatch(&mut scene, &m, &mut host, &RawInput::touch(pos, phase, id)));
        if phase != Phase::Ended {
            assert_eq!(scene.touch_focus(stage, TouchId(1)), Some(full));
        }
    }

    assert_eq!(
        host.log,
        vec![
            (full, Phase::Began, id),
            (full, Phase::Moved, id),
            (full, Phase::Ended, id),
        ]
    );
    assert_eq!(scene.touch_focus(stage, TouchId(1)), None);
    assert_eq!(scene.focus_id(full), None);
    assert_eq!(d.active_touches(), 0);
}

#[test]
fn only_the_front_child_of_overlapping_pair_is_reached() {
    let m = metrics();
    let mut scene = Scene::new();
    let stage = scene.main_stage();
    let group = scene
        .insert(stage, DisplayNode::group().with_listeners(ListenerMask::TOUCH))
        .unwrap();
    let back = scene.insert(group, touch_rect(0.0, 0.0, 100.0, 100.0)).unwrap();
    let front = scene.insert(group, touch_rect(50.0, 50.0, 100.0, 100.0)).unwrap();

    let mut host = Grabber::default();
    let mut d = EventDispatcher::new();
    assert!(d.dispatch(
        &mut scene,
        &m,
        &mut host,
        &RawInput::touch((75.0, 75.0), Phase::Began, None)
    ));
    let reached: Vec<NodeId> = host.log.iter().map(|e| e.0).collect();
    assert_eq!(reached, vec![front]);
    assert!(!reached.contains(&back));
    assert!(!reached.contains(&group));
}

#[test]
fn visit_order_is_stable_for_an_unchanged_tree() {
    let m = metrics();
    let mut scene = Scene::new();
    let stage = scene.main_stage();
    for i in 0..5 {
        let g = scene.insert(stage, DisplayNode::group()).unwrap();
        for j in 0..3 {
            let offset = f64::from(i * 3 + j);
            scene.insert(g, touch_rect(offset, offset, 100.0, 100.0)).unwrap();
        }
    }
    let d = EventDispatcher::new();
    let first = d.hit_test(&scene, &m, (60.0, 60.0).into()).post_order();
    let second = d.hit_test(&scene, &m, (60.0, 60.0).into()).post_order();
    assert_eq!(first, second);
    assert_eq!(first.len(), 5 * 3 + 5 + 1);
    assert_eq!(first.last(), Some(&stage));
}

/// Removes every node it is handed, then declines the event.
struct Remover {
    seen: Vec<NodeId>,
}

impl EventHost for Remover {
    fn dispatch(&mut self, scene: &mut Scene, target: NodeId, _: &Event) -> bool {
        self.seen.push(target);
        if scene.remove(target) {
            assert_eq!(
                scene.parent_of(target),
                Some(scene.hit_test_orphanage()),
                "{target:?} is still referenced by the walk"
            );
        }
        false
    }
}

#[test]
fn nodes_removed_mid_walk_reach_the_orphanage_afterwards() {
    let m = metrics();
    let mut scene = Scene::new();
    let stage = scene.main_stage();
    let group = scene
        .insert(stage, DisplayNode::group().with_listeners(ListenerMask::TOUCH))
        .unwrap();
    let a = scene.insert(group, touch_rect(0.0, 0.0, 50.0, 50.0)).unwrap();
    let b = scene.insert(group, touch_rect(0.0, 0.0, 50.0, 50.0)).unwrap();

    let mut host = Remover { seen: Vec::new() };
    let mut d = EventDispatcher::new();
    assert!(!d.dispatch(
        &mut scene,
        &m,
        &mut host,
        &RawInput::touch((10.0, 10.0), Phase::Began, None)
    ));
    // Every snapshot member was still alive when reached.
    assert_eq!(host.seen, vec![b, a, group]);
    assert!(scene.children_of(scene.hit_test_orphanage()).is_empty());
    assert_eq!(scene.children_of(scene.orphanage()), &[b, a, group]);
    assert!(!scene.is_used_by_hit_test(a));
}

/// Declines everything.
struct Silent;

impl EventHost for Silent {
    fn dispatch(&mut self, _: &mut Scene, _: NodeId, _: &Event) -> bool {
        false
    }
}

/// On its first delivery, removes `victim` and runs a nested dispatch at the same point.
struct Reentrant {
    metrics: ContentMetrics,
    victim: NodeId,
    nested: bool,
    seen: Vec<NodeId>,
    victim_parent_after_nested: Option<NodeId>,
}

impl EventHost for Reentrant {
    fn dispatch(&mut self, scene: &mut Scene, target: NodeId, event: &Event) -> bool {
        self.seen.push(target);
        if !self.nested {
            self.nested = true;
            assert!(scene.remove(self.victim));
            let inner = EventDispatcher::new().hit_test(scene, &self.metrics, event.position());
            dispatch_snapshot(scene, &mut Silent, &inner, event, ListenerMask::TOUCH);
            self.victim_parent_after_nested = scene.parent_of(self.victim);
        }
        false
    }
}

#[test]
fn nested_dispatch_keeps_outer_removals_parked() {
    let m = metrics();
    let mut scene = Scene::new();
    let stage = scene.main_stage();
    let group = scene
        .insert(stage, DisplayNode::group().with_listeners(ListenerMask::TOUCH))
        .unwrap();
    let a = scene.insert(group, touch_rect(0.0, 0.0, 50.0, 50.0)).unwrap();
    let b = scene.insert(group, touch_rect(0.0, 0.0, 50.0, 50.0)).unwrap();

    let mut host = Reentrant {
        metrics: m.clone(),
        victim: a,
        nested: false,
        seen: Vec::new(),
        victim_parent_after_nested: None,
    };
    let mut d = EventDispatcher::new();
    d.dispatch(
        &mut scene,
        &m,
        &mut host,
        &RawInput::touch((10.0, 10.0), Phase::Began, None),
    );

    // The outer walk still referred to `a`, so the nested one left it parked.
    assert_eq!(
        host.victim_parent_after_nested,
        Some(scene.hit_test_orphanage())
    );
    assert_eq!(host.seen, vec![b, group]);
    assert_eq!(scene.parent_of(a), Some(scene.orphanage()));
    assert!(!scene.is_used_by_hit_test(a));
    assert!(!scene.is_used_by_hit_test(b));
}

#[test]
fn multitouch_routes_each_id_independently() {
    let m = metrics();
    let mut scene = Scene::new();
    let stage = scene.main_stage();
    let left = scene.insert(stage, touch_rect(0.0, 0.0, 160.0, 480.0)).unwrap();
    let right = scene.insert(stage, touch_rect(160.0, 0.0, 160.0, 480.0)).unwrap();

    let mut host = Grabber::default();
    let mut d = EventDispatcher::new();
    let (one, two) = (Some(TouchId(1)), Some(TouchId(2)));
    d.dispatch_multitouch(
        &mut scene,
        &m,
        &mut host,
        &[
            RawInput::touch((10.0, 10.0), Phase::Began, one),
            RawInput::touch((300.0, 10.0), Phase::Began, two),
        ],
    );
    assert_eq!(scene.touch_focus(stage, TouchId(1)), Some(left));
    assert_eq!(scene.touch_focus(stage, TouchId(2)), Some(right));

    // Both fingers cross over; focus keeps each on its own node.
    host.log.clear();
    d.dispatch_multitouch(
        &mut scene,
        &m,
        &mut host,
        &[
            RawInput::touch((300.0, 10.0), Phase::Moved, one),
            RawInput::touch((10.0, 10.0), Phase::Moved, two),
        ],
    );
    assert_eq!(
        host.log,
        vec![(left, Phase::Moved, one), (right, Phase::Moved, two)]
    );

    d.dispatch_multitouch(
        &mut scene,
        &m,
        &mut host,
        &[
            RawInput::touch((300.0, 10.0), Phase::Cancelled, one),
            RawInput::touch((10.0, 10.0), Phase::Cancelled, two),
        ],
    );
    assert_eq!(scene.touch_focus_count(stage), 0);
}
