// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Optional capability records carried by display nodes.
//!
//! A node is not a subclass of anything. It carries whichever of these records
//! apply, and the scene, renderer and dispatcher branch on their presence.

use alloc::rc::Rc;
use alloc::vec::Vec;

use kurbo::{Affine, BezPath, Circle, Ellipse, Point, Rect, RoundedRect, Shape};
use proscenium_reclaim::GpuHandle;
use smallvec::SmallVec;

use crate::{ListenerMask, NodeFlags, NodeId, ScriptBinding};

/// Local-space geometry of a drawable node.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// Axis-aligned rectangle.
    Rect(Rect),
    /// Rectangle with rounded corners.
    RoundedRect(RoundedRect),
    /// Circle.
    Circle(Circle),
    /// Axis-aligned ellipse (possibly rotated by its own affine).
    Ellipse(Ellipse),
    /// Arbitrary closed path, filled with the non-zero rule.
    Path(BezPath),
}

impl Geometry {
    /// Local-space bounding box.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        match self {
            Self::Rect(r) => *r,
            Self::RoundedRect(r) => r.bounding_box(),
            Self::Circle(c) => c.bounding_box(),
            Self::Ellipse(e) => e.bounding_box(),
            Self::Path(p) => p.bounding_box(),
        }
    }

    /// Point-in-region test in local space.
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        match self {
            Self::Rect(r) => r.contains(pt),
            Self::RoundedRect(r) => r.contains(pt),
            Self::Circle(c) => c.contains(pt),
            Self::Ellipse(e) => e.contains(pt),
            Self::Path(p) => p.contains(pt),
        }
    }
}

/// Something the renderer draws.
#[derive(Clone, Debug, PartialEq)]
pub struct Renderable {
    /// Local-space geometry, also used for hit testing.
    pub geometry: Geometry,
    /// Backend resources owned by this node, released when it is torn down.
    pub resources: SmallVec<[GpuHandle; 2]>,
}

impl Renderable {
    /// A renderable with the given geometry and no backend resources yet.
    #[must_use]
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            resources: SmallVec::new(),
        }
    }
}

/// Participation in hit testing.
///
/// A node without this record is skipped by hit testing together with its
/// subtree. On a container, `masked` makes the container's own bounds and mask
/// gate the test of its children.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HitTestable {
    /// Test the node's [`Maskable`] record as well as its geometry.
    pub masked: bool,
}

/// Ordered child list of a group or stage.
///
/// Children are kept back to front: the last child is drawn last and is the
/// front-most.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Container {
    pub(crate) children: Vec<NodeId>,
}

impl Container {
    /// An empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Children, back to front.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Alpha-only bitmap used as a per-pixel mask.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaskBitmap {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

impl MaskBitmap {
    /// Wraps `alpha`, one byte per pixel in row-major order.
    ///
    /// Returns `None` if the buffer length does not match the dimensions.
    #[must_use]
    pub fn new(width: u32, height: u32, alpha: Vec<u8>) -> Option<Self> {
        let expected = usize::try_from(u64::from(width) * u64::from(height)).ok()?;
        (alpha.len() == expected).then_some(Self {
            width,
            height,
            alpha,
        })
    }

    /// Builds a bitmap by evaluating `f(x, y)` for every pixel.
    #[must_use]
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> u8) -> Self {
        let mut alpha = Vec::new();
        for y in 0..height {
            for x in 0..width {
                alpha.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            alpha,
        }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Alpha at integer pixel `(x, y)`; zero outside the bitmap.
    #[must_use]
    pub fn alpha_at(&self, x: i64, y: i64) -> u8 {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return 0;
        };
        if x >= self.width || y >= self.height {
            return 0;
        }
        let i = y as usize * self.width as usize + x as usize;
        self.alpha.get(i).copied().unwrap_or(0)
    }
}

/// A mask applied to a node.
///
/// The bitmap is centered on the origin of its own space; `transform` places it
/// in the node's local space.
#[derive(Clone, Debug, PartialEq)]
pub struct Maskable {
    /// Shared mask pixels.
    pub bitmap: Rc<MaskBitmap>,
    /// Mask space to node local space.
    pub transform: Affine,
}

impl Maskable {
    /// A mask with an identity transform.
    #[must_use]
    pub fn new(bitmap: Rc<MaskBitmap>) -> Self {
        Self {
            bitmap,
            transform: Affine::IDENTITY,
        }
    }
}

/// Description of a node to insert, and the node's per-node data once inserted.
///
/// Start from [`DisplayNode::group`] or [`DisplayNode::shape`] and adjust with the
/// `with_*` builders.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayNode {
    /// Local transform relative to the parent.
    pub local_transform: Affine,
    /// State flags.
    pub flags: NodeFlags,
    /// Event categories with listeners.
    pub listeners: ListenerMask,
    /// Drawable geometry, if any.
    pub renderable: Option<Renderable>,
    /// Hit-test participation, if any.
    pub hit: Option<HitTestable>,
    /// Child list, if this node is a group.
    pub container: Option<Container>,
    /// Per-pixel mask, if any.
    pub mask: Option<Maskable>,
    /// Host object bound to this node, if any.
    pub script: Option<ScriptBinding>,
}

impl DisplayNode {
    /// An empty group. It is hit only through its children.
    #[must_use]
    pub fn group() -> Self {
        Self {
            local_transform: Affine::IDENTITY,
            flags: NodeFlags::default(),
            listeners: ListenerMask::empty(),
            renderable: None,
            hit: Some(HitTestable::default()),
            container: Some(Container::new()),
            mask: None,
            script: None,
        }
    }

    /// A drawable, hit-testable leaf.
    #[must_use]
    pub fn shape(geometry: Geometry) -> Self {
        Self {
            local_transform: Affine::IDENTITY,
            flags: NodeFlags::default(),
            listeners: ListenerMask::empty(),
            renderable: Some(Renderable::new(geometry)),
            hit: Some(HitTestable::default()),
            container: None,
            mask: None,
            script: None,
        }
    }

    /// Sets the local transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.local_transform = transform;
        self
    }

    /// Sets the listener categories.
    #[must_use]
    pub fn with_listeners(mut self, listeners: ListenerMask) -> Self {
        self.listeners = listeners;
        self
    }

    /// Sets the flags.
    #[must_use]
    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Attaches a mask. Mask-based hit testing is enabled separately with
    /// [`with_masked_hit_test`](Self::with_masked_hit_test).
    #[must_use]
    pub fn with_mask(mut self, mask: Maskable) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Makes the node hit-testable and opts it into mask-based hit testing.
    #[must_use]
    pub fn with_masked_hit_test(mut self) -> Self {
        self.hit = Some(HitTestable { masked: true });
        self
    }

    /// Sets the hit-test record (`None` removes the node from hit testing).
    #[must_use]
    pub fn with_hit(mut self, hit: Option<HitTestable>) -> Self {
        self.hit = hit;
        self
    }

    /// Binds a host object.
    #[must_use]
    pub fn with_script(mut self, binding: ScriptBinding) -> Self {
        self.script = Some(binding);
        self
    }

    /// Records a backend resource owned by the node.
    ///
    /// Ignored for nodes without a [`Renderable`].
    #[must_use]
    pub fn with_resource(mut self, handle: GpuHandle) -> Self {
        if let Some(r) = self.renderable.as_mut() {
            r.resources.push(handle);
        }
        self
    }
}
