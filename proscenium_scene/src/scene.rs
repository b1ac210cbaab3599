// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene arena: node storage, structure updates, stages and focus.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::Cell;

use hashbrown::HashMap;
use kurbo::{Affine, Rect};
use proscenium_reclaim::{CollectLatch, GpuHandle, ResourceReclaimer};

use crate::{
    Container, DisplayNode, HitTestable, ListenerMask, Maskable, NodeFlags, NodeId, Renderable,
    ScriptBinding, TouchId,
};

/// Focus bookkeeping kept on every stage root.
#[derive(Clone, Debug, Default)]
pub(crate) struct StageState {
    pub(crate) touch_focus: HashMap<TouchId, NodeId>,
    pub(crate) global_focus: Option<NodeId>,
    pub(crate) snapshot_bounds: Option<Rect>,
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) generation: u32,
    pub(crate) parent: Option<NodeId>,
    /// Stage root this node is attached to, if any.
    pub(crate) stage: Option<NodeId>,
    pub(crate) data: DisplayNode,
    pub(crate) focus_id: Option<TouchId>,
    pub(crate) stage_state: Option<Box<StageState>>,
    /// Stage-space bounds; `None` when stale.
    pub(crate) bounds: Cell<Option<Rect>>,
    /// Number of in-flight dispatches whose snapshot refers to this node.
    pub(crate) hit_test_uses: u32,
}

impl Node {
    fn new(generation: u32, data: DisplayNode) -> Self {
        Self {
            generation,
            parent: None,
            stage: None,
            data,
            focus_id: None,
            stage_state: None,
            bounds: Cell::new(None),
            hit_test_uses: 0,
        }
    }

    fn children(&self) -> &[NodeId] {
        self.data.container.as_ref().map_or(&[], |c| &c.children)
    }
}

/// The live tree of display nodes.
///
/// Nodes live in a generational arena and refer to their parent and stage by
/// [`NodeId`]; each container owns its children's ids in back-to-front order.
///
/// A scene always has:
/// - a **main stage**, the bottom of the stage stack;
/// - an **offscreen stage** for render-target content;
/// - an **orphanage**, which receives removed nodes until a sweep tears them down;
/// - a **hit-test orphanage**, which receives nodes removed while a dispatch
///   snapshot still refers to them. [`flush_hit_test_orphanage`](Self::flush_hit_test_orphanage)
///   moves them into the orphanage once no dispatch refers to them any more.
///
/// Neither orphanage is ever rendered or hit-tested.
pub struct Scene {
    nodes: Vec<Option<Node>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    stage_stack: Vec<NodeId>,
    offscreen_stage: NodeId,
    orphanage: NodeId,
    hit_test_orphanage: NodeId,
    valid: bool,
    pub(crate) reclaimer: ResourceReclaimer,
    pub(crate) script_releases: Vec<ScriptBinding>,
    pub(crate) latch: CollectLatch,
}

impl core::fmt::Debug for Scene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Scene")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("stage_stack", &self.stage_stack)
            .field("valid", &self.valid)
            .field("reclaimer", &self.reclaimer)
            .finish_non_exhaustive()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Creates a scene with a main stage, an offscreen stage and both orphanages.
    #[must_use]
    pub fn new() -> Self {
        let mut scene = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            stage_stack: Vec::new(),
            offscreen_stage: NodeId::new(0, 0),
            orphanage: NodeId::new(0, 0),
            hit_test_orphanage: NodeId::new(0, 0),
            valid: false,
            reclaimer: ResourceReclaimer::new(),
            script_releases: Vec::new(),
            latch: CollectLatch::new(),
        };
        let main = scene.create_stage();
        scene.stage_stack.push(main);
        scene.offscreen_stage = scene.create_stage();
        scene.orphanage = scene.alloc(DisplayNode::group());
        scene.hit_test_orphanage = scene.alloc(DisplayNode::group());
        scene
    }

    fn alloc(&mut self, data: DisplayNode) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, data));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, data)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        NodeId::new(idx, generation)
    }

    pub(crate) fn free(&mut self, id: NodeId) -> Option<Node> {
        if !self.is_alive(id) {
            return None;
        }
        let node = self.nodes[id.idx()].take();
        self.free_list.push(id.idx());
        node
    }

    pub(crate) fn node_opt(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .filter(|n| n.generation == id.1)
    }

    pub(crate) fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes
            .get_mut(id.idx())
            .and_then(|n| n.as_mut())
            .filter(|n| n.generation == id.1)
    }

    /// Returns true if `id` refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some()
    }

    /// Number of live nodes, including stages and orphanages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Always false: a scene has at least its stages and orphanages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    // --- stages ---

    /// Creates a new, empty stage root that is not on the stage stack.
    pub fn create_stage(&mut self) -> NodeId {
        let id = self.alloc(DisplayNode::group());
        if let Some(n) = self.node_opt_mut(id) {
            n.stage = Some(id);
            n.stage_state = Some(Box::default());
        }
        id
    }

    /// Returns true if `id` is a live stage root.
    #[must_use]
    pub fn is_stage(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some_and(|n| n.stage_state.is_some())
    }

    /// The stage on top of the stack: the one rendered and dispatched to.
    #[must_use]
    pub fn current_stage(&self) -> NodeId {
        // The stack is never empty: the main stage cannot be popped.
        self.stage_stack[self.stage_stack.len() - 1]
    }

    /// The stage at the bottom of the stack.
    #[must_use]
    pub fn main_stage(&self) -> NodeId {
        self.stage_stack[0]
    }

    /// The stage used for rendering into offscreen targets.
    #[must_use]
    pub fn offscreen_stage(&self) -> NodeId {
        self.offscreen_stage
    }

    /// The container holding removed nodes until they are swept.
    #[must_use]
    pub fn orphanage(&self) -> NodeId {
        self.orphanage
    }

    /// The container holding nodes removed while referenced by a dispatch snapshot.
    #[must_use]
    pub fn hit_test_orphanage(&self) -> NodeId {
        self.hit_test_orphanage
    }

    /// Makes `stage` the current stage.
    ///
    /// Returns false (and changes nothing) if `stage` is not a live stage root.
    pub fn push_stage(&mut self, stage: NodeId) -> bool {
        if !self.is_stage(stage) {
            log::warn!("push_stage: {stage:?} is not a stage");
            return false;
        }
        self.stage_stack.push(stage);
        self.invalidate();
        true
    }

    /// Restores the previous stage and returns the one that was current.
    ///
    /// The main stage is never popped; `None` is returned instead.
    pub fn pop_stage(&mut self) -> Option<NodeId> {
        if self.stage_stack.len() <= 1 {
            return None;
        }
        let popped = self.stage_stack.pop();
        self.invalidate();
        popped
    }

    /// Sets the stage's culling rectangle for snapshot building.
    ///
    /// `None` falls back to the visible content bounds.
    pub fn set_snapshot_bounds(&mut self, stage: NodeId, bounds: Option<Rect>) {
        if let Some(state) = self.stage_state_mut(stage) {
            state.snapshot_bounds = bounds;
        }
    }

    /// The stage's culling rectangle override.
    #[must_use]
    pub fn snapshot_bounds(&self, stage: NodeId) -> Option<Rect> {
        self.stage_state(stage).and_then(|s| s.snapshot_bounds)
    }

    pub(crate) fn stage_state(&self, stage: NodeId) -> Option<&StageState> {
        self.node_opt(stage).and_then(|n| n.stage_state.as_deref())
    }

    fn stage_state_mut(&mut self, stage: NodeId) -> Option<&mut StageState> {
        self.node_opt_mut(stage)
            .and_then(|n| n.stage_state.as_deref_mut())
    }

    // --- validity ---

    /// Forces the next frame to be rendered.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// True if nothing changed since the last [`mark_valid`](Self::mark_valid).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Records that the current state has been rendered.
    pub fn mark_valid(&mut self) {
        self.valid = true;
    }

    // --- structure ---

    /// Creates a node from `data` and appends it as the front-most child of `parent`.
    ///
    /// Returns `None` if `parent` is stale or not a container.
    pub fn insert(&mut self, parent: NodeId, data: DisplayNode) -> Option<NodeId> {
        self.insert_at(parent, usize::MAX, data)
    }

    /// Like [`insert`](Self::insert), placing the node at `index` among the
    /// children (clamped to the child count).
    pub fn insert_at(
        &mut self,
        parent: NodeId,
        index: usize,
        mut data: DisplayNode,
    ) -> Option<NodeId> {
        if !self.is_container(parent) {
            log::warn!("insert: {parent:?} is not a live container");
            return None;
        }
        // Children are only ever added through the scene.
        if let Some(c) = data.container.as_mut() {
            c.children.clear();
        }
        let id = self.alloc(data);
        self.link(parent, id, index);
        Some(id)
    }

    /// Moves an existing node under `parent` at `index` (clamped).
    ///
    /// Works for attached nodes and for nodes waiting in the orphanage. Fails if
    /// either id is stale, `parent` is not a container, `id` is a stage or an
    /// orphanage, or `parent` lies inside `id`'s subtree.
    pub fn attach(&mut self, parent: NodeId, id: NodeId, index: usize) -> bool {
        if !self.is_container(parent) || !self.is_alive(id) || self.is_root(id) {
            return false;
        }
        if self.is_ancestor_or_self(id, parent) {
            log::warn!("attach: {parent:?} is inside the subtree of {id:?}");
            return false;
        }
        self.unlink(id);
        self.link(parent, id, index);
        true
    }

    /// Detaches `id` from its parent and parks it for teardown.
    ///
    /// The node keeps its subtree. It goes to the hit-test orphanage if a dispatch
    /// snapshot refers to it, otherwise to the orphanage. Any focus it or its
    /// descendants held is cleared. Returns false for stale ids, stages and
    /// orphanages, and nodes already parked.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if !self.is_alive(id) || self.is_root(id) {
            return false;
        }
        let Some(parent) = self.parent_of(id) else {
            return false;
        };
        if parent == self.orphanage || parent == self.hit_test_orphanage {
            return false;
        }
        let target = if self.is_used_by_hit_test(id) {
            self.hit_test_orphanage
        } else {
            self.orphanage
        };
        self.unlink(id);
        self.link(target, id, usize::MAX);
        true
    }

    /// Moves the nodes in the hit-test orphanage that no dispatch refers to any
    /// more into the orphanage.
    ///
    /// Returns how many nodes were moved.
    pub fn flush_hit_test_orphanage(&mut self) -> usize {
        let pending: Vec<NodeId> = self
            .children_of(self.hit_test_orphanage)
            .iter()
            .copied()
            .filter(|&id| !self.is_used_by_hit_test(id))
            .collect();
        for &id in &pending {
            self.unlink(id);
            self.link(self.orphanage, id, usize::MAX);
        }
        pending.len()
    }

    /// Records that one more dispatch snapshot refers to `id`.
    ///
    /// While any snapshot does, [`remove`](Self::remove) parks the node in the
    /// hit-test orphanage. Dispatches may nest, so every mark must be paired
    /// with [`unmark_used_by_hit_test`](Self::unmark_used_by_hit_test).
    pub fn mark_used_by_hit_test(&mut self, id: NodeId) {
        if let Some(n) = self.node_opt_mut(id) {
            n.hit_test_uses = n.hit_test_uses.saturating_add(1);
        }
    }

    /// Drops one reference taken by [`mark_used_by_hit_test`](Self::mark_used_by_hit_test).
    pub fn unmark_used_by_hit_test(&mut self, id: NodeId) {
        if let Some(n) = self.node_opt_mut(id) {
            n.hit_test_uses = n.hit_test_uses.saturating_sub(1);
        }
    }

    /// Whether some dispatch snapshot currently refers to `id`.
    #[must_use]
    pub fn is_used_by_hit_test(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some_and(|n| n.hit_test_uses > 0)
    }

    fn is_container(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some_and(|n| n.data.container.is_some())
    }

    pub(crate) fn is_root(&self, id: NodeId) -> bool {
        self.is_stage(id) || id == self.orphanage || id == self.hit_test_orphanage
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == ancestor {
                return true;
            }
            cur = self.parent_of(c);
        }
        false
    }

    fn link(&mut self, parent: NodeId, id: NodeId, index: usize) {
        let stage = self.node_opt(parent).and_then(|p| p.stage);
        if let Some(c) = self
            .node_opt_mut(parent)
            .and_then(|p| p.data.container.as_mut())
        {
            let index = index.min(c.children.len());
            c.children.insert(index, id);
        }
        if let Some(n) = self.node_opt_mut(id) {
            n.parent = Some(parent);
        }
        self.set_subtree_stage(id, stage);
        self.invalidate_subtree_bounds(id);
        self.invalidate_bounds(id);
    }

    pub(crate) fn unlink(&mut self, id: NodeId) {
        let Some(parent) = self.parent_of(id) else {
            return;
        };
        self.clear_subtree_focus(id);
        if let Some(c) = self
            .node_opt_mut(parent)
            .and_then(|p| p.data.container.as_mut())
        {
            c.children.retain(|&c| c != id);
        }
        if let Some(n) = self.node_opt_mut(id) {
            n.parent = None;
        }
        self.set_subtree_stage(id, None);
        self.invalidate_ancestor_bounds(parent);
    }

    fn set_subtree_stage(&mut self, id: NodeId, stage: Option<NodeId>) {
        let mut stack = alloc::vec![id];
        while let Some(cur) = stack.pop() {
            if let Some(n) = self.node_opt_mut(cur) {
                n.stage = stage;
                stack.extend_from_slice(n.children());
            }
        }
    }

    /// Collects `id` and all of its descendants, parents before children.
    pub(crate) fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = alloc::vec![id];
        while let Some(cur) = stack.pop() {
            if let Some(n) = self.node_opt(cur) {
                out.push(cur);
                stack.extend(n.children().iter().rev());
            }
        }
        out
    }

    // --- queries ---

    /// Parent of `id`, if attached.
    #[must_use]
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.parent)
    }

    /// Children of `id`, back to front; empty for leaves and stale ids.
    #[must_use]
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.node_opt(id).map_or(&[], Node::children)
    }

    /// The stage `id` is attached to; a stage is attached to itself.
    #[must_use]
    pub fn stage_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.stage)
    }

    /// The node's per-node data.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&DisplayNode> {
        self.node_opt(id).map(|n| &n.data)
    }

    /// Local transform of `id`.
    #[must_use]
    pub fn local_transform(&self, id: NodeId) -> Option<Affine> {
        self.node_opt(id).map(|n| n.data.local_transform)
    }

    /// Flags of `id`.
    #[must_use]
    pub fn flags(&self, id: NodeId) -> Option<NodeFlags> {
        self.node_opt(id).map(|n| n.data.flags)
    }

    /// Listener categories of `id`; empty for stale ids.
    #[must_use]
    pub fn listeners(&self, id: NodeId) -> ListenerMask {
        self.node_opt(id)
            .map_or(ListenerMask::empty(), |n| n.data.listeners)
    }

    /// Drawable record of `id`.
    #[must_use]
    pub fn renderable(&self, id: NodeId) -> Option<&Renderable> {
        self.node_opt(id).and_then(|n| n.data.renderable.as_ref())
    }

    /// Hit-test record of `id`.
    #[must_use]
    pub fn hit_testable(&self, id: NodeId) -> Option<HitTestable> {
        self.node_opt(id).and_then(|n| n.data.hit)
    }

    /// Child list record of `id`.
    #[must_use]
    pub fn container(&self, id: NodeId) -> Option<&Container> {
        self.node_opt(id).and_then(|n| n.data.container.as_ref())
    }

    /// Mask record of `id`.
    #[must_use]
    pub fn mask(&self, id: NodeId) -> Option<&Maskable> {
        self.node_opt(id).and_then(|n| n.data.mask.as_ref())
    }

    /// Touch that `id` holds focus for, if any.
    #[must_use]
    pub fn focus_id(&self, id: NodeId) -> Option<TouchId> {
        self.node_opt(id).and_then(|n| n.focus_id)
    }

    /// Host object bound to `id`.
    #[must_use]
    pub fn script_binding(&self, id: NodeId) -> Option<ScriptBinding> {
        self.node_opt(id).and_then(|n| n.data.script)
    }

    /// Whether `id` should be considered by hit testing at all.
    ///
    /// The node needs a [`HitTestable`] record and must be visible, unless it
    /// opted into [`NodeFlags::HIT_TEST_WHEN_HIDDEN`].
    #[must_use]
    pub fn should_hit_test(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some_and(|n| {
            n.data.hit.is_some()
                && n.data
                    .flags
                    .intersects(NodeFlags::VISIBLE | NodeFlags::HIT_TEST_WHEN_HIDDEN)
        })
    }

    // --- mutation ---

    /// Sets the local transform of `id`.
    pub fn set_local_transform(&mut self, id: NodeId, transform: Affine) {
        if let Some(n) = self.node_opt_mut(id) {
            n.data.local_transform = transform;
            self.invalidate_subtree_bounds(id);
            self.invalidate_bounds(id);
        }
    }

    /// Replaces the flags of `id`.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) {
        if let Some(n) = self.node_opt_mut(id) {
            n.data.flags = flags;
            self.invalidate();
        }
    }

    /// Shows or hides `id`.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(n) = self.node_opt_mut(id) {
            n.data.flags.set(NodeFlags::VISIBLE, visible);
            self.invalidate();
        }
    }

    /// Replaces the listener categories of `id`.
    pub fn set_listeners(&mut self, id: NodeId, listeners: ListenerMask) {
        if let Some(n) = self.node_opt_mut(id) {
            n.data.listeners = listeners;
        }
    }

    /// Replaces the hit-test record of `id`.
    pub fn set_hit_testable(&mut self, id: NodeId, hit: Option<HitTestable>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.data.hit = hit;
        }
    }

    /// Replaces the mask of `id`.
    pub fn set_mask(&mut self, id: NodeId, mask: Option<Maskable>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.data.mask = mask;
            self.invalidate();
        }
    }

    /// Replaces the geometry of a drawable node.
    pub fn set_geometry(&mut self, id: NodeId, geometry: crate::Geometry) {
        if let Some(r) = self
            .node_opt_mut(id)
            .and_then(|n| n.data.renderable.as_mut())
        {
            r.geometry = geometry;
            self.invalidate_bounds(id);
        }
    }

    /// Binds (or unbinds) a host object.
    pub fn set_script_binding(&mut self, id: NodeId, binding: Option<ScriptBinding>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.data.script = binding;
        }
    }

    /// Records a backend resource owned by a drawable node.
    ///
    /// Returns false if `id` is stale or not drawable.
    pub fn attach_resource(&mut self, id: NodeId, handle: GpuHandle) -> bool {
        match self
            .node_opt_mut(id)
            .and_then(|n| n.data.renderable.as_mut())
        {
            Some(r) => {
                r.resources.push(handle);
                true
            }
            None => false,
        }
    }

    // --- transforms and bounds ---

    /// Product of the local transforms from the root down to `id`.
    #[must_use]
    pub fn world_transform(&self, id: NodeId) -> Option<Affine> {
        let mut n = self.node_opt(id)?;
        let mut tf = n.data.local_transform;
        while let Some(p) = n.parent {
            n = self.node_opt(p)?;
            tf = n.data.local_transform * tf;
        }
        Some(tf)
    }

    /// Axis-aligned stage-space bounds of `id` and its subtree.
    ///
    /// Computed on demand and cached until a mutation invalidates it. `None` for
    /// stale ids and for subtrees with no geometry.
    #[must_use]
    pub fn stage_bounds(&self, id: NodeId) -> Option<Rect> {
        let n = self.node_opt(id)?;
        if let Some(b) = n.bounds.get() {
            return Some(b);
        }
        let world = self.world_transform(id)?;
        let mut bounds = n
            .data
            .renderable
            .as_ref()
            .map(|r| world.transform_rect_bbox(r.geometry.bounding_box()));
        for &child in n.children() {
            if let Some(cb) = self.stage_bounds(child) {
                bounds = Some(bounds.map_or(cb, |b| b.union(cb)));
            }
        }
        n.bounds.set(bounds);
        bounds
    }

    /// True if `id` has no bounds or its bounds miss `cull`.
    #[must_use]
    pub fn is_offscreen(&self, id: NodeId, cull: Rect) -> bool {
        self.stage_bounds(id).is_none_or(|b| {
            b.x1 < cull.x0 || b.x0 > cull.x1 || b.y1 < cull.y0 || b.y0 > cull.y1
        })
    }

    fn invalidate_bounds(&mut self, id: NodeId) {
        self.invalidate_ancestor_bounds(id);
        self.invalidate();
    }

    fn invalidate_ancestor_bounds(&mut self, id: NodeId) {
        let mut cur = Some(id);
        while let Some(c) = cur {
            let Some(n) = self.node_opt(c) else { break };
            n.bounds.set(None);
            cur = n.parent;
        }
        self.invalidate();
    }

    fn invalidate_subtree_bounds(&mut self, id: NodeId) {
        for n in self.subtree(id) {
            if let Some(node) = self.node_opt(n) {
                node.bounds.set(None);
            }
        }
    }

    /// Visits the visible nodes under `root` back to front, with their world transforms.
    ///
    /// Hidden nodes are skipped along with their subtrees. This is the draw order.
    pub fn visit_visible(&self, root: NodeId, mut f: impl FnMut(NodeId, Affine)) {
        let Some(parent_tf) = self
            .parent_of(root)
            .map_or(Some(Affine::IDENTITY), |p| self.world_transform(p))
        else {
            return;
        };
        self.visit_visible_rec(root, parent_tf, &mut f);
    }

    fn visit_visible_rec(
        &self,
        id: NodeId,
        parent_tf: Affine,
        f: &mut impl FnMut(NodeId, Affine),
    ) {
        let Some(n) = self.node_opt(id) else { return };
        if !n.data.flags.contains(NodeFlags::VISIBLE) {
            return;
        }
        let tf = parent_tf * n.data.local_transform;
        f(id, tf);
        for &child in n.children() {
            self.visit_visible_rec(child, tf, f);
        }
    }

    // --- focus ---

    /// Binds touch `touch` to `id` on `id`'s stage.
    ///
    /// Later events for that touch go straight to `id` and its ancestors. A node
    /// holds at most one touch; rebinding replaces its previous one. Returns false
    /// if `id` is stale or not attached to a stage.
    pub fn set_touch_focus(&mut self, id: NodeId, touch: TouchId) -> bool {
        let Some(stage) = self.stage_of(id) else {
            return false;
        };
        if let Some(old) = self.focus_id(id) {
            self.clear_touch_focus(stage, old);
        }
        if let Some(previous) = self.touch_focus(stage, touch) {
            if let Some(n) = self.node_opt_mut(previous) {
                n.focus_id = None;
            }
        }
        if let Some(state) = self.stage_state_mut(stage) {
            state.touch_focus.insert(touch, id);
        }
        if let Some(n) = self.node_opt_mut(id) {
            n.focus_id = Some(touch);
        }
        true
    }

    /// Releases the binding of `touch` on `stage`, returning the node that held it.
    pub fn clear_touch_focus(&mut self, stage: NodeId, touch: TouchId) -> Option<NodeId> {
        let id = self.stage_state_mut(stage)?.touch_focus.remove(&touch)?;
        if let Some(n) = self.node_opt_mut(id) {
            n.focus_id = None;
        }
        Some(id)
    }

    /// The node bound to `touch` on `stage`.
    #[must_use]
    pub fn touch_focus(&self, stage: NodeId, touch: TouchId) -> Option<NodeId> {
        self.stage_state(stage)
            .and_then(|s| s.touch_focus.get(&touch).copied())
    }

    /// Number of touches bound on `stage`.
    #[must_use]
    pub fn touch_focus_count(&self, stage: NodeId) -> usize {
        self.stage_state(stage).map_or(0, |s| s.touch_focus.len())
    }

    /// Routes every hit event on `stage` to `id` (or back to hit testing with `None`).
    ///
    /// Returns false if `id` is not attached to `stage`.
    pub fn set_global_focus(&mut self, stage: NodeId, id: Option<NodeId>) -> bool {
        if id.is_some_and(|id| self.stage_of(id) != Some(stage)) {
            return false;
        }
        match self.stage_state_mut(stage) {
            Some(state) => {
                state.global_focus = id;
                true
            }
            None => false,
        }
    }

    /// The node receiving every hit event on `stage`, if any.
    #[must_use]
    pub fn global_focus(&self, stage: NodeId) -> Option<NodeId> {
        self.stage_state(stage).and_then(|s| s.global_focus)
    }

    fn clear_subtree_focus(&mut self, id: NodeId) {
        let Some(stage) = self.stage_of(id) else {
            return;
        };
        for n in self.subtree(id) {
            if let Some(touch) = self.focus_id(n) {
                self.clear_touch_focus(stage, touch);
            }
            if self.global_focus(stage) == Some(n) {
                self.set_global_focus(stage, None);
            }
        }
    }

    // --- release requests ---

    /// Queues a backend resource for deferred release.
    pub fn queue_release(&mut self, handle: GpuHandle) {
        self.reclaimer.queue_release(handle);
    }

    /// Queues a host object for release at the next sweep.
    pub fn queue_script_release(&mut self, binding: ScriptBinding) {
        self.script_releases.push(binding);
    }

    /// The reclaimer backing [`queue_release`](Self::queue_release).
    #[must_use]
    pub fn reclaimer(&self) -> &ResourceReclaimer {
        &self.reclaimer
    }

    /// Number of host objects waiting for release.
    #[must_use]
    pub fn pending_script_releases(&self) -> usize {
        self.script_releases.len()
    }
}
