#![forbid(unsafe_code)]

//! Document abstraction.
//!
//! Components never hold closures bound to elements. They receive a `&mut dyn
//! Dom` for each call and address elements through opaque [`ElementHandle`]s.
//! Events are routed to them by the application root (see
//! [`crate::event::Event`]).
//!
//! # Selectors
//!
//! Implementations must support at least the simple selector forms the
//! overlay crates emit: `#id`, `.class`, `tag`, `[attr]`, `[attr=value]` and
//! comma-separated lists of those.

use crate::geometry::{BoxMetrics, Rect, ScrollOffsets, Size};

/// Opaque reference to a document element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementHandle(u64);

impl ElementHandle {
    /// Wrap a host-assigned identifier.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Host-assigned identifier.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Inline style properties written by the overlay components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StyleProp {
    Left,
    Top,
    Width,
    Height,
    MaxWidth,
    MaxHeight,
    MinHeight,
    ZIndex,
    Opacity,
    Position,
    Overflow,
}

/// Value of an inline style property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StyleValue {
    /// Length in CSS pixels.
    Px(f64),
    /// Unitless number (opacity, z-index).
    Number(f64),
    /// Percentage of the containing block.
    Percent(f64),
    /// `auto`.
    Auto,
    /// Any other keyword (`absolute`, `fixed`, `hidden`, ...).
    Keyword(&'static str),
    /// Remove the inline declaration.
    Unset,
}

impl StyleValue {
    /// Pixel length, if this is one.
    pub fn as_px(&self) -> Option<f64> {
        match self {
            Self::Px(v) => Some(*v),
            _ => None,
        }
    }
}

/// Host document operations.
pub trait Dom {
    /// All elements matching `selector`, in document order.
    fn query(&self, selector: &str) -> Vec<ElementHandle>;

    /// First descendant of `root` matching `selector`.
    fn find(&self, root: ElementHandle, selector: &str) -> Option<ElementHandle>;

    /// The document body, parent of created overlays.
    fn body(&self) -> ElementHandle;

    /// Whether the element is still attached to the document.
    fn is_connected(&self, element: ElementHandle) -> bool;

    /// Whether `element` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: ElementHandle, element: ElementHandle) -> bool;

    /// Border box relative to the viewport, `None` when detached.
    fn client_rect(&self, element: ElementHandle) -> Option<Rect>;

    /// Viewport size.
    fn viewport(&self) -> Size;

    /// Document scroll position.
    fn scroll_offsets(&self) -> ScrollOffsets;

    /// Computed padding and margin.
    fn box_metrics(&self, element: ElementHandle) -> BoxMetrics;

    fn is_visible(&self, element: ElementHandle) -> bool;
    fn show(&mut self, element: ElementHandle);
    fn hide(&mut self, element: ElementHandle);

    fn has_class(&self, element: ElementHandle, class: &str) -> bool;
    fn add_class(&mut self, element: ElementHandle, class: &str);
    fn remove_class(&mut self, element: ElementHandle, class: &str);

    fn attr(&self, element: ElementHandle, name: &str) -> Option<String>;
    fn set_attr(&mut self, element: ElementHandle, name: &str, value: &str);

    /// Inner HTML.
    fn html(&self, element: ElementHandle) -> String;
    fn set_html(&mut self, element: ElementHandle, html: &str);

    fn set_style(&mut self, element: ElementHandle, prop: StyleProp, value: StyleValue);

    /// Create an element with the given tag and class list (space separated)
    /// and append it as the last child of `parent`.
    fn create_element(&mut self, parent: ElementHandle, tag: &str, class: &str) -> ElementHandle;

    /// Move `child` (with its subtree) to the end of `parent`'s children.
    fn append(&mut self, parent: ElementHandle, child: ElementHandle);

    /// Detach an element and its descendants. Removing a detached element
    /// is a no-op.
    fn remove(&mut self, element: ElementHandle);

    fn focus(&mut self, element: ElementHandle);

    /// Element currently holding focus, if any.
    fn focused(&self) -> Option<ElementHandle>;
}

/// Apply a space-separated class list.
pub fn add_classes(dom: &mut dyn Dom, element: ElementHandle, classes: &str) {
    for class in classes.split_whitespace() {
        dom.add_class(element, class);
    }
}

/// Remove a space-separated class list.
pub fn remove_classes(dom: &mut dyn Dom, element: ElementHandle, classes: &str) {
    for class in classes.split_whitespace() {
        dom.remove_class(element, class);
    }
}
