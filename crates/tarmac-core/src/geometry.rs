#![forbid(unsafe_code)]

//! Geometric primitives and page measurement helpers.
//!
//! All coordinates are CSS pixels. A [`Rect`] produced by [`measure`] is in
//! page coordinates: the element's client box shifted by the scroll offsets
//! at measurement time, so two measurements taken at different scroll
//! positions are directly comparable.

use crate::dom::{Dom, ElementHandle};

/// An element box: left/top edge plus extent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Create a rectangle at the origin with the given size.
    #[inline]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Horizontal center.
    #[inline]
    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    /// Vertical center.
    #[inline]
    pub fn center_y(&self) -> f64 {
        self.top + self.height / 2.0
    }

    /// Extent of the rectangle.
    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Check if the rectangle has zero (or negative) area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if a point lies inside the rectangle.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }

    /// Shift the rectangle by the given offsets.
    #[inline]
    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.left + dx, self.top + dy, self.width, self.height)
    }

    /// Replace non-finite components with zero and negative extents with zero.
    ///
    /// Measurement of detached or collapsed elements can report garbage; the
    /// positioner relies on this to fall back to its clamp branches.
    pub fn sanitized(&self) -> Rect {
        Rect::new(
            finite_or_zero(self.left),
            finite_or_zero(self.top),
            finite_or_zero(self.width).max(0.0),
            finite_or_zero(self.height).max(0.0),
        )
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// The empty size.
    pub const ZERO: Size = Size::new(0.0, 0.0);

    /// Create a new size.
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether this size fits inside `outer` on both axes.
    #[inline]
    pub fn fits_within(&self, outer: Size) -> bool {
        self.width <= outer.width && self.height <= outer.height
    }

    /// Non-finite or negative components become zero.
    pub fn sanitized(&self) -> Size {
        Size::new(
            finite_or_zero(self.width).max(0.0),
            finite_or_zero(self.height).max(0.0),
        )
    }
}

/// Document scroll position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOffsets {
    pub top: f64,
    pub left: f64,
}

impl ScrollOffsets {
    /// Create new scroll offsets.
    #[inline]
    pub const fn new(top: f64, left: f64) -> Self {
        Self { top, left }
    }
}

/// Per-edge lengths for padding and margin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sides {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Sides {
    /// Same length on every edge.
    pub const fn all(val: f64) -> Self {
        Self::new(val, val, val, val)
    }

    /// Explicit lengths, CSS order.
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Sum of left and right.
    #[inline]
    pub fn horizontal_sum(&self) -> f64 {
        self.left + self.right
    }

    /// Sum of top and bottom.
    #[inline]
    pub fn vertical_sum(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Padding and margin of an element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxMetrics {
    pub padding: Sides,
    pub margin: Sides,
}

#[inline]
fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Measure an element in page coordinates.
///
/// Absent or detached elements measure as a zero rectangle.
pub fn measure(dom: &dyn Dom, element: ElementHandle) -> Rect {
    match dom.client_rect(element) {
        Some(rect) => {
            let scroll = dom.scroll_offsets();
            rect.sanitized().translate(scroll.left, scroll.top)
        }
        None => Rect::default(),
    }
}

/// Current viewport size.
pub fn viewport_size(dom: &dyn Dom) -> Size {
    dom.viewport().sanitized()
}

/// Current document scroll offsets.
pub fn scroll_offsets(dom: &dyn Dom) -> ScrollOffsets {
    dom.scroll_offsets()
}
