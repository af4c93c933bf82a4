#![forbid(unsafe_code)]

//! Floating panel placement.
//!
//! [`place`] centers a panel horizontally on its anchor and puts it above
//! the anchor, then corrects for the viewport:
//!
//! - a panel that would start left of the page is pinned to the anchor (or
//!   to the left margin on small windows),
//! - a panel that would end past the right edge is pulled left of the
//!   anchor,
//! - a panel that would not fit above the anchor (or above the scrolled
//!   viewport) goes below it. [`VerticalPolicy::Above`] is not absolute
//!   either: it still goes below when staying above would put the panel
//!   at a negative `top`.
//!
//! An anchor above the page origin can leave even the below position
//! negative; `top` is then clamped to zero.
//!
//! The result is a plain value. Applying it to the document is the caller's
//! job.

use bitflags::bitflags;
use tarmac_core::animation::{TRANSITION_TRAVEL, Transition};
use tarmac_core::geometry::{Rect, ScrollOffsets, Size};

/// Gap between anchor and panel.
pub const VERTICAL_GAP: f64 = 25.0;
/// Left position used on small windows when centering overflows left.
pub const MIN_LEFT_MARGIN: f64 = 7.0;
/// Left position used when pulling a panel back from the right edge goes
/// negative.
pub const RIGHT_CLAMP: f64 = 8.0;
/// Distance from the anchor center to the arrow of a left-pinned panel.
pub const ARROW_INSET: f64 = 14.0;
/// Overhang past the anchor center for a right-pinned panel.
pub const RIGHT_NUDGE: f64 = 10.0;
/// A window narrower than `panel.width * SMALL_WINDOW_RATIO` is small.
pub const SMALL_WINDOW_RATIO: f64 = 1.5;
/// Arrow correction for right-pinned panels on small windows.
pub const ARROW_RIGHT_ADJUST: f64 = -3.0;
/// Arrow correction otherwise.
pub const ARROW_LEFT_ADJUST: f64 = 5.0;

bitflags! {
    /// Which corrections were applied.
    ///
    /// `TOP` means the arrow sits on the panel's top edge, i.e. the panel
    /// was placed below its anchor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SideFlags: u8 {
        const TOP   = 0b0000_0001;
        const LEFT  = 0b0000_0010;
        const RIGHT = 0b0000_0100;
    }
}

impl SideFlags {
    /// Class names for the set flags, in `top`, `left`, `right` order.
    pub fn class_names(self) -> impl Iterator<Item = &'static str> {
        [
            (Self::TOP, "top"),
            (Self::LEFT, "left"),
            (Self::RIGHT, "right"),
        ]
        .into_iter()
        .filter(move |(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
    }

    /// Every class name a flag can produce.
    pub const ALL_CLASSES: [&'static str; 3] = ["top", "left", "right"];
}

/// Vertical placement preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalPolicy {
    /// Above, unless that would leave the page or the visible area.
    #[default]
    Auto,
    /// Above, unless that would leave the page. Unlike a plain "above",
    /// a negative `top` still flips the panel below.
    Above,
    /// Always below.
    Below,
}

impl VerticalPolicy {
    /// Parse a policy name. Empty and unknown names mean [`Auto`](Self::Auto).
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "below" => Self::Below,
            "above" | "top" => Self::Above,
            _ => Self::Auto,
        }
    }
}

/// Computed panel placement in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub left: f64,
    pub top: f64,
    pub flags: SideFlags,
    /// Arrow offset from the panel's left edge. Only set on small windows;
    /// otherwise the side classes position the arrow.
    pub arrow_left: Option<f64>,
    pub small_window: bool,
}

impl Placement {
    /// Whether the panel sits below its anchor.
    pub fn is_below(&self) -> bool {
        self.flags.contains(SideFlags::TOP)
    }

    /// Entrance transition: travels toward the anchor onto the placement.
    pub fn entrance(&self) -> Transition {
        Transition::enter(self.away_from_anchor())
    }

    /// Exit transition: travels away from the anchor.
    pub fn exit(&self) -> Transition {
        Transition::exit(self.away_from_anchor())
    }

    fn away_from_anchor(&self) -> f64 {
        if self.is_below() {
            TRANSITION_TRAVEL
        } else {
            -TRANSITION_TRAVEL
        }
    }
}

/// Place `panel` relative to `anchor`.
///
/// `anchor` is in page coordinates. The result never has negative
/// coordinates, and a panel no wider than the viewport never ends past its
/// right edge.
pub fn place(
    anchor: Rect,
    panel: Size,
    viewport: Size,
    scroll: ScrollOffsets,
    policy: VerticalPolicy,
) -> Placement {
    let anchor = anchor.sanitized();
    let panel = panel.sanitized();
    let viewport = viewport.sanitized();
    let mut flags = SideFlags::empty();

    let center = anchor.center_x();
    let mut left = center - panel.width / 2.0;
    let small_window = panel.width * SMALL_WINDOW_RATIO > viewport.width;

    if left < 0.0 {
        if small_window {
            left = MIN_LEFT_MARGIN;
        } else {
            left = center - ARROW_INSET;
            flags |= SideFlags::LEFT;
        }
    }

    if left + panel.width > viewport.width {
        left = anchor.left - panel.width + anchor.width / 2.0 + RIGHT_NUDGE;
        if left < 0.0 {
            left = RIGHT_CLAMP;
        }
        flags |= SideFlags::RIGHT;
    }

    // Degenerate anchors (zero-size, off-page) can still leave the panel
    // outside the page after the corrections above.
    if panel.width <= viewport.width && left + panel.width > viewport.width {
        left = viewport.width - panel.width;
    }
    if left < 0.0 {
        left = MIN_LEFT_MARGIN;
    }

    let above = anchor.top - panel.height - VERTICAL_GAP;
    let below = match policy {
        VerticalPolicy::Auto => above < 0.0 || above < scroll.top,
        VerticalPolicy::Above => above < 0.0,
        VerticalPolicy::Below => true,
    };
    let top = if below {
        flags |= SideFlags::TOP;
        anchor.bottom() + VERTICAL_GAP
    } else {
        above
    };
    // Anchors above the page origin.
    let top = top.max(0.0);

    let arrow_left = small_window.then(|| {
        if flags.contains(SideFlags::RIGHT) {
            anchor.left - left + ARROW_RIGHT_ADJUST
        } else {
            anchor.left - left + ARROW_LEFT_ADJUST
        }
    });

    Placement {
        left,
        top,
        flags,
        arrow_left,
        small_window,
    }
}
