// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node lifecycle across removal, focus and collection.

use kurbo::{Affine, Rect};
use proscenium_reclaim::{GpuHandle, ReleaseSink};
use proscenium_scene::{DisplayNode, Geometry, Scene, SceneSink, ScriptBinding, TouchId};

#[derive(Default)]
struct Host {
    freed: Vec<GpuHandle>,
    released: Vec<ScriptBinding>,
    live: Vec<ScriptBinding>,
}

impl ReleaseSink for Host {
    fn release_resource(&mut self, handle: GpuHandle) {
        self.freed.push(handle);
    }
}

impl SceneSink for Host {
    fn release_binding(&mut self, binding: ScriptBinding) {
        self.released.push(binding);
    }

    fn is_binding_reachable(&self, binding: ScriptBinding) -> bool {
        self.live.contains(&binding)
    }
}

fn tile(x: f64, handle: u64, binding: u64) -> DisplayNode {
    DisplayNode::shape(Geometry::Rect(Rect::new(0.0, 0.0, 10.0, 10.0)))
        .with_transform(Affine::translate((x, 0.0)))
        .with_resource(GpuHandle(handle))
        .with_script(ScriptBinding(binding))
}

#[test]
fn removed_subtree_is_released_within_two_sweeps() {
    let mut scene = Scene::new();
    let stage = scene.main_stage();
    let row = scene.insert(stage, DisplayNode::group()).unwrap();
    let tiles: Vec<_> = (0_u32..4)
        .map(|i| scene.insert(row, tile(f64::from(i) * 10.0, u64::from(i), 100 + u64::from(i))))
        .collect::<Option<_>>()
        .unwrap();
    assert!(scene.set_touch_focus(tiles[2], TouchId(1)));
    assert_eq!(scene.stage_bounds(row), Some(Rect::new(0.0, 0.0, 40.0, 10.0)));

    assert!(scene.remove(row));
    assert_eq!(scene.touch_focus(stage, TouchId(1)), None);
    assert_eq!(scene.focus_id(tiles[2]), None);
    assert_eq!(scene.stage_of(tiles[0]), None);
    assert!(scene.children_of(stage).is_empty());

    let mut host = Host::default();
    for _ in 0..32 {
        scene.collect(&mut host);
    }
    assert!(tiles.iter().all(|&t| !scene.is_alive(t)));
    assert!(!scene.is_alive(row));
    assert_eq!(
        host.released,
        vec![ScriptBinding(100), ScriptBinding(101), ScriptBinding(102), ScriptBinding(103)]
    );

    for _ in 0..8 {
        scene.collect(&mut host);
    }
    host.freed.sort();
    assert_eq!(
        host.freed,
        vec![GpuHandle(0), GpuHandle(1), GpuHandle(2), GpuHandle(3)]
    );
    assert_eq!(scene.len(), 4);
}

#[test]
fn reachable_orphan_can_be_reattached() {
    let mut scene = Scene::new();
    let stage = scene.main_stage();
    let a = scene.insert(stage, tile(0.0, 1, 7)).unwrap();
    assert!(scene.remove(a));

    let mut host = Host {
        live: vec![ScriptBinding(7)],
        ..Host::default()
    };
    scene.force_collect(&mut host);
    assert!(scene.is_alive(a));
    assert!(host.freed.is_empty());

    assert!(scene.attach(stage, a, 0));
    assert_eq!(scene.stage_of(a), Some(stage));
    assert!(scene.children_of(scene.orphanage()).is_empty());
}

#[test]
fn stages_keep_separate_focus() {
    let mut scene = Scene::new();
    let main = scene.main_stage();
    let popup = scene.create_stage();
    let a = scene.insert(main, tile(0.0, 1, 1)).unwrap();
    let b = scene.insert(popup, tile(0.0, 2, 2)).unwrap();

    assert!(scene.push_stage(popup));
    assert_eq!(scene.current_stage(), popup);
    assert!(scene.set_touch_focus(a, TouchId(5)));
    assert!(scene.set_touch_focus(b, TouchId(5)));
    assert_eq!(scene.touch_focus(main, TouchId(5)), Some(a));
    assert_eq!(scene.touch_focus(popup, TouchId(5)), Some(b));

    assert!(!scene.set_global_focus(main, Some(b)));
    assert!(scene.set_global_focus(popup, Some(b)));
    assert_eq!(scene.global_focus(popup), Some(b));

    assert_eq!(scene.pop_stage(), Some(popup));
    assert_eq!(scene.current_stage(), main);
    // The main stage is the bottom of the stack.
    assert_eq!(scene.pop_stage(), None);
}
