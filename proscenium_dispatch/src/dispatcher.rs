// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event delivery: global entry, focused chains and snapshot walks.
//!
//! A positional event goes through three steps:
//!
//! 1. **Build**: test the current stage against the content-space point and
//!    record the result in a [`HitSnapshot`].
//! 2. **Walk**: visit the snapshot in post order. Children front to back come
//!    before their parent, so the front-most, deepest node sees the event first.
//!    The walk stops at the first listener that reports the event handled.
//! 3. **Cleanup**: nodes that listeners removed during the walk sat in the scene's
//!    hit-test orphanage; once no dispatch (including an enclosing one, for
//!    nested dispatches) refers to them, they move to the orphanage for the next
//!    sweep.
//!
//! Nodes holding focus bypass the snapshot: the event goes up the ancestor chain
//! of the focused node instead.

use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::{Point, Rect};
use proscenium_metrics::ContentMetrics;
use proscenium_scene::{ListenerMask, NodeId, Scene, TouchId};

use crate::{
    DEFAULT_ALPHA_THRESHOLD, Event, HitSnapshot, HitTester, InputKind, Phase, Probe, RawInput,
};

/// The scripting host's side of dispatch.
///
/// Listeners run with mutable access to the scene and may restructure it.
pub trait EventHost {
    /// Runtime-global listeners. They see every event before the scene does.
    /// Returning true marks the event handled but does not stop scene delivery.
    fn dispatch_global(&mut self, scene: &mut Scene, event: &Event) -> bool {
        let _ = (scene, event);
        false
    }

    /// Listeners of `target`. Returns true if the event was handled.
    fn dispatch(&mut self, scene: &mut Scene, target: NodeId, event: &Event) -> bool;
}

/// Routes input to the scripting host.
///
/// Holds no scene state; the scene and metrics are passed to every call. It does
/// remember where each active touch began, for [`Event::x_start`].
#[derive(Clone, Debug)]
pub struct EventDispatcher {
    alpha_threshold: u8,
    touch_starts: HashMap<Option<TouchId>, Point>,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDispatcher {
    /// A dispatcher with the default mask alpha threshold.
    #[must_use]
    pub fn new() -> Self {
        Self {
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            touch_starts: HashMap::new(),
        }
    }

    /// Sets the mask alpha a sample must exceed to count as a hit.
    pub fn set_alpha_threshold(&mut self, threshold: u8) {
        self.alpha_threshold = threshold;
    }

    /// Mask alpha a sample must exceed to count as a hit.
    #[must_use]
    pub fn alpha_threshold(&self) -> u8 {
        self.alpha_threshold
    }

    /// Number of touches between began and ended.
    #[must_use]
    pub fn active_touches(&self) -> usize {
        self.touch_starts.len()
    }

    /// Converts a raw record to content space and fills in the touch start.
    pub fn normalize(&mut self, metrics: &ContentMetrics, raw: &RawInput) -> Event {
        let pos = metrics.pixels_to_content(raw.position);
        let start = if matches!(raw.kind, InputKind::Touch) {
            match raw.phase {
                Phase::Began => {
                    self.touch_starts.insert(raw.touch_id, pos);
                    pos
                }
                _ => self.touch_starts.get(&raw.touch_id).copied().unwrap_or(pos),
            }
        } else {
            pos
        };
        Event {
            kind: raw.kind,
            phase: raw.phase,
            x: pos.x,
            y: pos.y,
            x_start: start.x,
            y_start: start.y,
            id: raw.touch_id,
            modifiers: raw.modifiers,
            time: raw.timestamp,
        }
    }

    /// Delivers one input record. Returns true if some listener handled it.
    ///
    /// Every event goes to the global entry first. Keys and characters go to it
    /// only; positional input then reaches the scene. Touches resolve focus
    /// per touch id first, then the stage's global focus, then hit testing. A
    /// touch's focus binding is released when the touch ends or is cancelled.
    pub fn dispatch<H: EventHost + ?Sized>(
        &mut self,
        scene: &mut Scene,
        metrics: &ContentMetrics,
        host: &mut H,
        raw: &RawInput,
    ) -> bool {
        let event = self.normalize(metrics, raw);
        log::trace!(
            "dispatch {} {} at ({}, {}) id {:?}",
            event.name(),
            event.phase_str(),
            event.x,
            event.y,
            event.id
        );
        let global = host.dispatch_global(scene, &event);
        let local =
            raw.kind.is_positional() && self.dispatch_to_stage(scene, metrics, host, &event);
        let handled = global || local;
        if matches!(raw.kind, InputKind::Touch) && raw.phase.is_terminal() {
            self.touch_starts.remove(&raw.touch_id);
            if let Some(id) = raw.touch_id {
                let stage = scene.current_stage();
                if let Some(node) = scene.clear_touch_focus(stage, id) {
                    log::trace!("touch {id:?} released focus on {node:?}");
                }
            }
        }
        handled
    }

    /// Delivers a set of simultaneous touches one by one.
    ///
    /// Each touch resolves focused versus hit-tested delivery on its own. Returns
    /// true if any of them was handled.
    pub fn dispatch_multitouch<H: EventHost + ?Sized>(
        &mut self,
        scene: &mut Scene,
        metrics: &ContentMetrics,
        host: &mut H,
        touches: &[RawInput],
    ) -> bool {
        let mut any = false;
        for raw in touches {
            any |= self.dispatch(scene, metrics, host, raw);
        }
        any
    }

    fn dispatch_to_stage<H: EventHost + ?Sized>(
        &self,
        scene: &mut Scene,
        metrics: &ContentMetrics,
        host: &mut H,
        event: &Event,
    ) -> bool {
        let stage = scene.current_stage();
        let listener = event.kind.listener();
        let touch_focus = match (event.kind, event.id) {
            (InputKind::Touch, Some(id)) => scene.touch_focus(stage, id),
            _ => None,
        };
        if let Some(focus) = touch_focus.or_else(|| scene.global_focus(stage)) {
            return dispatch_focused(scene, host, stage, focus, event, listener);
        }
        let snapshot = self.hit_test(scene, metrics, event.position());
        dispatch_snapshot(scene, host, &snapshot, event, listener)
    }

    /// Hit tests the current stage at a content-space point.
    #[must_use]
    pub fn hit_test(&self, scene: &Scene, metrics: &ContentMetrics, point: Point) -> HitSnapshot {
        self.tester(scene, metrics, Probe::Point(point))
            .build(scene, scene.current_stage())
    }

    /// Hit tests the current stage against a content-space region.
    ///
    /// Returns `None` for zero-area or inverted regions without testing anything.
    #[must_use]
    pub fn hit_test_region(
        &self,
        scene: &Scene,
        metrics: &ContentMetrics,
        region: Rect,
    ) -> Option<HitSnapshot> {
        if !(region.width() > 0.0 && region.height() > 0.0) {
            log::warn!("hit_test_region: rejecting empty region {region:?}");
            return None;
        }
        Some(
            self.tester(scene, metrics, Probe::Region(region))
                .build(scene, scene.current_stage()),
        )
    }

    fn tester(&self, scene: &Scene, metrics: &ContentMetrics, probe: Probe) -> HitTester {
        let cull = scene
            .snapshot_bounds(scene.current_stage())
            .unwrap_or_else(|| metrics.screen_content_bounds());
        HitTester::new(probe, cull).with_alpha_threshold(self.alpha_threshold)
    }
}

/// Walks `snapshot` in post order and cleans up afterwards.
pub fn dispatch_snapshot<H: EventHost + ?Sized>(
    scene: &mut Scene,
    host: &mut H,
    snapshot: &HitSnapshot,
    event: &Event,
    listener: ListenerMask,
) -> bool {
    let targets: Vec<NodeId> = snapshot.targets().collect();
    for &id in &targets {
        scene.mark_used_by_hit_test(id);
    }
    let handled = walk(scene, host, snapshot, 0, snapshot.root(), event, listener);
    release(scene, &targets);
    handled
}

fn walk<H: EventHost + ?Sized>(
    scene: &mut Scene,
    host: &mut H,
    snapshot: &HitSnapshot,
    entry: usize,
    stage: NodeId,
    event: &Event,
    listener: ListenerMask,
) -> bool {
    for &child in snapshot.entry_children(entry) {
        if walk(scene, host, snapshot, child, stage, event, listener) {
            return true;
        }
    }
    deliver(scene, host, snapshot.entry_target(entry), stage, event, listener)
}

/// Delivers up the ancestor chain of `focus`, starting at `focus`.
fn dispatch_focused<H: EventHost + ?Sized>(
    scene: &mut Scene,
    host: &mut H,
    stage: NodeId,
    focus: NodeId,
    event: &Event,
    listener: ListenerMask,
) -> bool {
    let mut chain = Vec::new();
    let mut cur = Some(focus);
    while let Some(id) = cur {
        chain.push(id);
        scene.mark_used_by_hit_test(id);
        cur = scene.parent_of(id);
    }
    let mut handled = false;
    for &id in &chain {
        if deliver(scene, host, id, stage, event, listener) {
            handled = true;
            break;
        }
    }
    release(scene, &chain);
    handled
}

fn deliver<H: EventHost + ?Sized>(
    scene: &mut Scene,
    host: &mut H,
    target: NodeId,
    stage: NodeId,
    event: &Event,
    listener: ListenerMask,
) -> bool {
    // Removed by an earlier listener in this dispatch.
    if scene.stage_of(target) != Some(stage) {
        return false;
    }
    if !scene.listeners(target).intersects(listener) {
        return false;
    }
    let handled = host.dispatch(scene, target, event);
    log::trace!("{} -> {target:?}: handled={handled}", event.name());
    handled
}

fn release(scene: &mut Scene, targets: &[NodeId]) {
    for &id in targets {
        scene.unmark_used_by_hit_test(id);
    }
    let moved = scene.flush_hit_test_orphanage();
    if moved > 0 {
        log::debug!("{moved} nodes removed during dispatch moved to the orphanage");
    }
}
