#![forbid(unsafe_code)]

//! Tooltip configuration, per-anchor overrides and lifecycle hooks.

use tarmac_core::dom::{Dom, ElementHandle, StyleValue};

use crate::positioner::VerticalPolicy;

/// Prefix of anchor attributes that override configuration per anchor,
/// e.g. `data-tooltip-title`.
pub const OVERRIDE_PREFIX: &str = "data-tooltip-";

/// Default stacking order of tooltip panels.
pub const DEFAULT_Z_INDEX: i32 = 9999;

/// How a tooltip is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerMode {
    /// Pointer enter opens, pointer leave closes.
    Hover,
    /// Click on the anchor opens; a close button and outside clicks close.
    /// Focus moving into a form control inside the anchor also opens.
    #[default]
    Click,
    /// Focus on the anchor opens, blur closes.
    Focus,
}

/// A panel dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    Px(f64),
    Percent(f64),
}

impl Dimension {
    /// Parse `auto`, `300`, `300px` or `40%`. Empty or malformed input
    /// yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if raw.eq_ignore_ascii_case("auto") {
            return Some(Self::Auto);
        }
        if let Some(pct) = raw.strip_suffix('%') {
            return pct.trim().parse().ok().map(Self::Percent);
        }
        let px = raw.strip_suffix("px").unwrap_or(raw);
        px.trim().parse().ok().filter(|v: &f64| v.is_finite()).map(Self::Px)
    }

    pub fn to_style(self) -> StyleValue {
        match self {
            Self::Auto => StyleValue::Auto,
            Self::Px(v) => StyleValue::Px(v),
            Self::Percent(v) => StyleValue::Percent(v),
        }
    }
}

/// Configuration of one named tooltip.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipConfig {
    /// Selector resolving the anchor set; re-resolved on every open.
    pub selector: String,
    pub trigger: TriggerMode,
    pub title: String,
    pub subtitle: String,
    /// Plain text content, used when no html is available.
    pub text: String,
    pub html: String,
    /// Selector of an element whose inner html becomes the content.
    pub html_ref: String,
    /// Extra classes for the panel, space separated.
    pub css_class: String,
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub position: VerticalPolicy,
    /// Applied when positive.
    pub z_index: i32,
    pub show_title: bool,
    pub show_close: bool,
    pub show_arrow: bool,
    pub animation: bool,
    pub close_on_escape: bool,
    /// Touch devices dismiss on orientation change instead of closing on
    /// window resize.
    pub touch_device: bool,
    pub visible: bool,
}

impl Default for TooltipConfig {
    fn default() -> Self {
        Self {
            selector: String::new(),
            trigger: TriggerMode::Click,
            title: String::new(),
            subtitle: String::new(),
            text: String::new(),
            html: String::new(),
            html_ref: String::new(),
            css_class: String::new(),
            width: None,
            height: None,
            position: VerticalPolicy::Auto,
            z_index: DEFAULT_Z_INDEX,
            show_title: true,
            show_close: true,
            show_arrow: true,
            animation: true,
            close_on_escape: true,
            touch_device: false,
            visible: true,
        }
    }
}

impl TooltipConfig {
    /// Configuration for anchors matching `selector`.
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn trigger(mut self, trigger: TriggerMode) -> Self {
        self.trigger = trigger;
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    #[must_use]
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = html.into();
        self
    }

    #[must_use]
    pub fn html_ref(mut self, selector: impl Into<String>) -> Self {
        self.html_ref = selector.into();
        self
    }

    #[must_use]
    pub fn css_class(mut self, class: impl Into<String>) -> Self {
        self.css_class = class.into();
        self
    }

    #[must_use]
    pub fn width(mut self, width: Dimension) -> Self {
        self.width = Some(width);
        self
    }

    #[must_use]
    pub fn height(mut self, height: Dimension) -> Self {
        self.height = Some(height);
        self
    }

    #[must_use]
    pub fn position(mut self, position: VerticalPolicy) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    #[must_use]
    pub fn show_title(mut self, show: bool) -> Self {
        self.show_title = show;
        self
    }

    #[must_use]
    pub fn show_close(mut self, show: bool) -> Self {
        self.show_close = show;
        self
    }

    #[must_use]
    pub fn show_arrow(mut self, show: bool) -> Self {
        self.show_arrow = show;
        self
    }

    #[must_use]
    pub fn animation(mut self, animation: bool) -> Self {
        self.animation = animation;
        self
    }

    #[must_use]
    pub fn close_on_escape(mut self, close: bool) -> Self {
        self.close_on_escape = close;
        self
    }

    #[must_use]
    pub fn touch_device(mut self, touch: bool) -> Self {
        self.touch_device = touch;
        self
    }

    #[must_use]
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Settings for a particular anchor: this configuration with the
    /// anchor's `data-tooltip-*` attributes applied on top.
    ///
    /// Empty attributes do not override. Booleans are true only for a
    /// case-insensitive `true`; unparsable numbers and dimensions keep the
    /// configured value.
    pub fn resolved_for(&self, dom: &dyn Dom, anchor: ElementHandle) -> TooltipConfig {
        let lookup = |name: &str| {
            dom.attr(anchor, &format!("{OVERRIDE_PREFIX}{name}"))
                .filter(|v| !v.is_empty())
        };
        let flag = |name: &str, current: bool| {
            lookup(name).map_or(current, |v| v.trim().eq_ignore_ascii_case("true"))
        };

        let mut out = self.clone();
        if let Some(v) = lookup("title") {
            out.title = v;
        }
        if let Some(v) = lookup("subtitle") {
            out.subtitle = v;
        }
        if let Some(v) = lookup("text") {
            out.text = v;
        }
        if let Some(v) = lookup("htmlref") {
            out.html_ref = v;
        }
        if let Some(v) = lookup("cssclass") {
            out.css_class = v;
        }
        if let Some(v) = lookup("position") {
            out.position = VerticalPolicy::parse(&v);
        }
        if let Some(d) = lookup("width").and_then(|v| Dimension::parse(&v)) {
            out.width = Some(d);
        }
        if let Some(d) = lookup("height").and_then(|v| Dimension::parse(&v)) {
            out.height = Some(d);
        }
        if let Some(z) = lookup("zindex").and_then(|v| v.trim().parse().ok()) {
            out.z_index = z;
        }
        out.show_title = flag("showtitle", out.show_title);
        out.show_close = flag("showclose", out.show_close);
        out.show_arrow = flag("showarrow", out.show_arrow);
        out.animation = flag("animation", out.animation);
        out.visible = flag("visible", out.visible);
        out
    }
}

/// Callbacks around a tooltip's open and close.
///
/// Hooks see only the tooltip name and anchor; they cannot reach the
/// registry, so they cannot open or close other tooltips mid-operation.
pub trait TooltipHooks {
    /// Return `false` to cancel the open.
    fn before_open(&mut self, _name: &str, _anchor: ElementHandle) -> bool {
        true
    }

    fn on_open(&mut self, _name: &str, _anchor: ElementHandle) {}

    /// Return `false` to cancel the close.
    fn before_close(&mut self, _name: &str) -> bool {
        true
    }

    fn on_close(&mut self, _name: &str) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl TooltipHooks for NoHooks {}

/// Stable reference to a configured tooltip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TooltipHandle(pub(crate) usize);

impl TooltipHandle {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Lifecycle of a tooltip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TooltipPhase {
    /// No panel in the document.
    #[default]
    Hidden,
    /// Panel shown (possibly still entering).
    Visible,
    /// Closed; the panel is running its exit transition.
    Exiting,
}

/// The stock tooltips bound to `data-behavior` markers.
pub fn default_tooltips() -> Vec<(&'static str, TooltipConfig)> {
    vec![
        ("default", TooltipConfig::new("[data-behavior=tooltip]")),
        (
            "default-auto",
            TooltipConfig::new("[data-behavior=tooltip-auto]").width(Dimension::Auto),
        ),
        (
            "default-warning",
            TooltipConfig::new("[data-behavior=tooltip-warning]")
                .css_class("warning")
                .title("Warning"),
        ),
        (
            "default-error",
            TooltipConfig::new("[data-behavior=tooltip-error]").css_class("error"),
        ),
        (
            "default-success",
            TooltipConfig::new("[data-behavior=tooltip-success]").css_class("success"),
        ),
    ]
}
