// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hit-test snapshots.
//!
//! A snapshot mirrors the part of a stage that an input touched, captured before
//! any listener runs. Listeners may restructure the scene while the snapshot is
//! walked; the snapshot keeps the delivery order fixed.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use alloc::vec::Vec;

use kurbo::{Affine, Point, Rect};
use proscenium_scene::{Maskable, NodeId, Scene};
use smallvec::SmallVec;

/// Mask alpha a sample must exceed to count as a hit, by default.
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 0;

/// What a snapshot is built against.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Probe {
    /// A content-space point: bounds, geometry and mask are tested.
    Point(Point),
    /// A content-space region: nodes whose stage bounds overlap it are hit.
    Region(Rect),
}

#[derive(Clone, Debug)]
struct Entry {
    target: NodeId,
    parent: Option<usize>,
    /// Front to back.
    children: SmallVec<[usize; 4]>,
}

/// Transient mirror of the hit part of a stage.
///
/// Entry `0` is the stage root. Every other entry is a hit leaf or a container
/// with at least one hit descendant. Child lists are front to back.
#[derive(Clone, Debug)]
pub struct HitSnapshot {
    entries: Vec<Entry>,
}

impl HitSnapshot {
    fn new(root: NodeId) -> Self {
        Self {
            entries: alloc::vec![Entry {
                target: root,
                parent: None,
                children: SmallVec::new(),
            }],
        }
    }

    fn push(&mut self, target: NodeId, parent: usize) -> usize {
        let idx = self.entries.len();
        self.entries.push(Entry {
            target,
            parent: Some(parent),
            children: SmallVec::new(),
        });
        idx
    }

    fn prepend(&mut self, parent: usize, child: usize) {
        self.entries[parent].children.insert(0, child);
    }

    fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    /// The stage the snapshot was built from.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.entries[0].target
    }

    /// Number of entries, including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: the root entry is always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// True if anything below the root was hit.
    #[must_use]
    pub fn has_hits(&self) -> bool {
        !self.entries[0].children.is_empty()
    }

    /// Contains `id` anywhere.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.iter().any(|e| e.target == id)
    }

    /// All targets in delivery order: children front to back, each before its
    /// parent, ending with the root.
    #[must_use]
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.entries.len());
        self.post_order_rec(0, &mut out);
        out
    }

    fn post_order_rec(&self, idx: usize, out: &mut Vec<NodeId>) {
        for &c in &self.entries[idx].children {
            self.post_order_rec(c, out);
        }
        out.push(self.entries[idx].target);
    }

    /// Hit leaves, front-most first.
    #[must_use]
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        for id in self.post_order() {
            if self.children_of(id).is_none_or(|c| c.is_empty()) && id != self.root() {
                out.push(id);
            }
        }
        out
    }

    /// The parent target of `id` within the snapshot.
    #[must_use]
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        let e = self.entries.iter().find(|e| e.target == id)?;
        e.parent.map(|p| self.entries[p].target)
    }

    fn children_of(&self, id: NodeId) -> Option<&[usize]> {
        self.entries
            .iter()
            .find(|e| e.target == id)
            .map(|e| e.children.as_slice())
    }

    pub(crate) fn entry_target(&self, idx: usize) -> NodeId {
        self.entries[idx].target
    }

    pub(crate) fn entry_children(&self, idx: usize) -> &[usize] {
        &self.entries[idx].children
    }

    pub(crate) fn targets(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.iter().map(|e| e.target)
    }
}

/// Builds [`HitSnapshot`]s for one probe.
#[derive(Copy, Clone, Debug)]
pub struct HitTester {
    probe: Probe,
    cull: Rect,
    alpha_threshold: u8,
}

impl HitTester {
    /// A tester for `probe`, culling leaves whose stage bounds miss `cull`.
    #[must_use]
    pub fn new(probe: Probe, cull: Rect) -> Self {
        Self {
            probe,
            cull,
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
        }
    }

    /// Sets the mask alpha a sample must exceed.
    #[must_use]
    pub fn with_alpha_threshold(mut self, threshold: u8) -> Self {
        self.alpha_threshold = threshold;
        self
    }

    /// Tests the children of `stage` and returns the snapshot.
    #[must_use]
    pub fn build(&self, scene: &Scene, stage: NodeId) -> HitSnapshot {
        let mut snapshot = HitSnapshot::new(stage);
        let base = scene.world_transform(stage).unwrap_or(Affine::IDENTITY);
        self.test_children(scene, &mut snapshot, 0, stage, base);
        snapshot
    }

    fn test_children(
        &self,
        scene: &Scene,
        snapshot: &mut HitSnapshot,
        parent_entry: usize,
        parent: NodeId,
        parent_world: Affine,
    ) {
        for &child in scene.children_of(parent) {
            if !scene.should_hit_test(child) || scene.focus_id(child).is_some() {
                continue;
            }
            let Some(local) = scene.local_transform(child) else {
                continue;
            };
            let world = parent_world * local;
            if scene.container(child).is_some() {
                if !self.container_passes(scene, child, world) {
                    continue;
                }
                let mark = snapshot.len();
                let entry = snapshot.push(child, parent_entry);
                self.test_children(scene, snapshot, entry, child, world);
                if snapshot.entry_children(entry).is_empty() {
                    snapshot.truncate(mark);
                } else {
                    snapshot.prepend(parent_entry, entry);
                }
            } else if !scene.is_offscreen(child, self.cull) && self.leaf_passes(scene, child, world)
            {
                let entry = snapshot.push(child, parent_entry);
                snapshot.prepend(parent_entry, entry);
            }
        }
    }

    fn container_passes(&self, scene: &Scene, id: NodeId, world: Affine) -> bool {
        if !scene.hit_testable(id).is_some_and(|h| h.masked) {
            return true;
        }
        let Some(bounds) = scene.stage_bounds(id) else {
            return false;
        };
        match self.probe {
            Probe::Point(p) => {
                bounds.contains(p)
                    && scene
                        .mask(id)
                        .is_none_or(|m| mask_hit(world, m, p, self.alpha_threshold))
            }
            Probe::Region(r) => overlaps(bounds, r),
        }
    }

    fn leaf_passes(&self, scene: &Scene, id: NodeId, world: Affine) -> bool {
        let Some(bounds) = scene.stage_bounds(id) else {
            return false;
        };
        let p = match self.probe {
            Probe::Point(p) => p,
            Probe::Region(r) => return overlaps(bounds, r),
        };
        if !bounds.contains(p) {
            return false;
        }
        let Some(renderable) = scene.renderable(id) else {
            return false;
        };
        let Some(inverse) = invert(world) else {
            return false;
        };
        if !renderable.geometry.contains(inverse * p) {
            return false;
        }
        if scene.hit_testable(id).is_some_and(|h| h.masked) {
            if let Some(mask) = scene.mask(id) {
                return mask_hit(world, mask, p, self.alpha_threshold);
            }
        }
        true
    }
}

fn invert(m: Affine) -> Option<Affine> {
    let det = m.determinant();
    (det != 0.0 && det.is_finite()).then(|| m.inverse())
}

fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

/// Samples `mask` at content point `p` for a node with world transform `world`.
///
/// The bitmap is centered on the origin of mask space. Points outside it miss,
/// and so does a degenerate mask transform.
fn mask_hit(world: Affine, mask: &Maskable, p: Point, threshold: u8) -> bool {
    let Some(inverse) = invert(world * mask.transform) else {
        return false;
    };
    let local = inverse * p;
    let bitmap = &mask.bitmap;
    let x = local.x + f64::from(bitmap.width()) / 2.0;
    let y = local.y + f64::from(bitmap.height()) / 2.0;
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Out-of-range samples saturate and land outside the bitmap."
    )]
    let (x, y) = (x.floor() as i64, y.floor() as i64);
    bitmap.alpha_at(x, y) > threshold
}
