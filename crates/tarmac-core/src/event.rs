#![forbid(unsafe_code)]

//! Page events routed by the application root.
//!
//! Targets are element handles; the host translates its native event
//! objects into these before dispatch.

use crate::dom::ElementHandle;

/// Keys the overlay components react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Char(char),
    Other,
}

/// A page event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// Primary-button click on `target`.
    Click { target: ElementHandle },
    /// Key pressed with focus anywhere in the document.
    KeyDown { key: Key },
    /// Pointer entered `target`.
    PointerEnter { target: ElementHandle },
    /// Pointer left `target`.
    PointerLeave { target: ElementHandle },
    /// `target` gained focus.
    Focus { target: ElementHandle },
    /// `target` lost focus.
    Blur { target: ElementHandle },
    /// Window was resized.
    Resize { width: f64, height: f64 },
    /// Device orientation changed.
    OrientationChange,
}

impl Event {
    /// Element the event was dispatched to, if it has one.
    #[must_use]
    pub const fn target(&self) -> Option<ElementHandle> {
        match self {
            Self::Click { target }
            | Self::PointerEnter { target }
            | Self::PointerLeave { target }
            | Self::Focus { target }
            | Self::Blur { target } => Some(*target),
            Self::KeyDown { .. } | Self::Resize { .. } | Self::OrientationChange => None,
        }
    }

    /// Check for a press of `key`.
    #[must_use]
    pub fn is_key(&self, key: Key) -> bool {
        matches!(self, Self::KeyDown { key: k } if *k == key)
    }
}

/// Whether an event should continue to other handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Propagation {
    #[default]
    Continue,
    Stop,
}

impl Propagation {
    #[must_use]
    pub const fn is_stopped(self) -> bool {
        matches!(self, Self::Stop)
    }
}
