// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identifiers and flag sets for scene nodes.

/// Identifier for a node in a [`Scene`](crate::Scene).
///
/// A slot index plus a generation counter. A freshly allocated slot starts at
/// generation `1`; reusing a freed slot increments it, so an identifier kept
/// after its node was torn down never aliases the slot's next occupant.
/// Use [`Scene::is_alive`](crate::Scene::is_alive) to check liveness.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of one touch (finger or pen contact) for the lifetime of the contact.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TouchId(pub u64);

/// Handle to the scripting host's object bound to a node.
///
/// The scene never interprets it; it only hands it back to the host for
/// reachability checks and release.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ScriptBinding(pub u64);

bitflags::bitflags! {
    /// Per-node state flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node is drawn and, by default, hit-testable.
        const VISIBLE = 0b0000_0001;
        /// Node is hit-tested even while not visible.
        const HIT_TEST_WHEN_HIDDEN = 0b0000_0010;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE
    }
}

bitflags::bitflags! {
    /// Event categories a node has listeners for.
    ///
    /// Dispatch only delivers an event to nodes whose mask contains the event's
    /// category. Bits above the named ones are free for application categories;
    /// build them with [`ListenerMask::from_bits_retain`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ListenerMask: u32 {
        /// Touch began/moved/ended/cancelled.
        const TOUCH = 1 << 0;
        /// Mouse movement and buttons.
        const MOUSE = 1 << 1;
    }
}
