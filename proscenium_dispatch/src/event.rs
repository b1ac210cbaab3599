// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raw input records and the normalized events delivered to listeners.

use kurbo::Point;
use proscenium_scene::{ListenerMask, TouchId};

/// Phase of a touch or mouse interaction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Contact started.
    Began,
    /// Contact moved.
    Moved,
    /// Contact is down and did not move.
    Stationary,
    /// Contact lifted.
    Ended,
    /// The platform aborted the contact.
    Cancelled,
}

impl Phase {
    /// Name of the phase as delivered to the scripting host.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Began => "began",
            Self::Moved => "moved",
            Self::Stationary => "stationary",
            Self::Ended => "ended",
            Self::Cancelled => "cancelled",
        }
    }

    /// True for the phases that end a contact.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Cancelled)
    }
}

impl core::fmt::Display for Phase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags::bitflags! {
    /// Modifier keys held while the input occurred.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Shift.
        const SHIFT = 1 << 0;
        /// Control.
        const CONTROL = 1 << 1;
        /// Alt / Option.
        const ALT = 1 << 2;
        /// Command / Windows / Super.
        const COMMAND = 1 << 3;
    }
}

bitflags::bitflags! {
    /// Mouse buttons held down.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct MouseButtons: u8 {
        /// Primary (usually left) button.
        const PRIMARY = 1 << 0;
        /// Secondary (usually right) button.
        const SECONDARY = 1 << 1;
        /// Middle button.
        const MIDDLE = 1 << 2;
    }
}

/// What produced a raw input record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// Finger or pen contact.
    Touch,
    /// Mouse movement or button change.
    Mouse {
        /// Buttons held after the change.
        buttons: MouseButtons,
    },
    /// Physical key.
    Key {
        /// Platform key code.
        code: u32,
    },
    /// Text input.
    Character(char),
}

impl InputKind {
    /// Name of the event as delivered to the scripting host.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Touch => "touch",
            Self::Mouse { .. } => "mouse",
            Self::Key { .. } => "key",
            Self::Character(_) => "character",
        }
    }

    /// Listener category scene nodes must declare to receive this input.
    ///
    /// Empty for keys and characters, which only go to the global entry.
    #[must_use]
    pub const fn listener(self) -> ListenerMask {
        match self {
            Self::Touch => ListenerMask::TOUCH,
            Self::Mouse { .. } => ListenerMask::MOUSE,
            Self::Key { .. } | Self::Character(_) => ListenerMask::empty(),
        }
    }

    /// True for inputs routed through hit testing.
    #[must_use]
    pub const fn is_positional(self) -> bool {
        matches!(self, Self::Touch | Self::Mouse { .. })
    }
}

/// One input record from the platform layer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RawInput {
    /// Source of the input.
    pub kind: InputKind,
    /// Position in device pixels.
    pub position: Point,
    /// Interaction phase.
    pub phase: Phase,
    /// Touch identifier, for touches that carry one.
    pub touch_id: Option<TouchId>,
    /// Modifier keys.
    pub modifiers: Modifiers,
    /// Timestamp in milliseconds.
    pub timestamp: f64,
}

impl RawInput {
    /// A touch at `position` (device pixels).
    #[must_use]
    pub fn touch(position: impl Into<Point>, phase: Phase, touch_id: Option<TouchId>) -> Self {
        Self {
            kind: InputKind::Touch,
            position: position.into(),
            phase,
            touch_id,
            modifiers: Modifiers::empty(),
            timestamp: 0.0,
        }
    }

    /// A mouse record at `position` (device pixels).
    #[must_use]
    pub fn mouse(position: impl Into<Point>, phase: Phase, buttons: MouseButtons) -> Self {
        Self {
            kind: InputKind::Mouse { buttons },
            position: position.into(),
            phase,
            touch_id: None,
            modifiers: Modifiers::empty(),
            timestamp: 0.0,
        }
    }

    /// A key record.
    #[must_use]
    pub fn key(code: u32, phase: Phase) -> Self {
        Self {
            kind: InputKind::Key { code },
            position: Point::ZERO,
            phase,
            touch_id: None,
            modifiers: Modifiers::empty(),
            timestamp: 0.0,
        }
    }

    /// Sets the modifiers.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Sets the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Normalized event record handed to the scripting host.
///
/// Coordinates are in content space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Event {
    /// Source of the input.
    pub kind: InputKind,
    /// Interaction phase.
    pub phase: Phase,
    /// Content-space x.
    pub x: f64,
    /// Content-space y.
    pub y: f64,
    /// Content-space x where the touch began (equal to `x` for other inputs).
    pub x_start: f64,
    /// Content-space y where the touch began (equal to `y` for other inputs).
    pub y_start: f64,
    /// Touch identifier, if any.
    pub id: Option<TouchId>,
    /// Modifier keys.
    pub modifiers: Modifiers,
    /// Timestamp in milliseconds.
    pub time: f64,
}

impl Event {
    /// Event name (`"touch"`, `"mouse"`, `"key"` or `"character"`).
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Phase name (`"began"`, `"moved"`, ...).
    #[must_use]
    pub const fn phase_str(&self) -> &'static str {
        self.phase.as_str()
    }

    /// Content-space position.
    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Content-space offset from the start of the touch.
    #[must_use]
    pub fn delta(&self) -> kurbo::Vec2 {
        kurbo::Vec2::new(self.x - self.x_start, self.y - self.y_start)
    }
}
