#![forbid(unsafe_code)]

//! Dialog descriptors, buttons and hooks.

use tarmac_core::dom::ElementHandle;

/// Configured dialog width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DialogWidth {
    Small,
    Medium,
    Large,
    Px(f64),
}

impl Default for DialogWidth {
    fn default() -> Self {
        Self::Px(882.0)
    }
}

impl DialogWidth {
    /// Width in pixels.
    pub fn px(self) -> f64 {
        match self {
            Self::Small => 582.0,
            Self::Medium => 840.0,
            Self::Large => 926.0,
            Self::Px(v) => v,
        }
    }

    /// Parse a preset name or a pixel count.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" => Some(Self::Large),
            other => other
                .strip_suffix("px")
                .unwrap_or(other)
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v > 0.0)
                .map(Self::Px),
        }
    }
}

/// Configured dialog height.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum HeightPolicy {
    /// Size to content.
    #[default]
    Auto,
    /// Total height in pixels, chrome included.
    Fixed(f64),
    /// Total height as a percentage of the viewport height.
    Percent(f64),
}

/// Where a non-responsive dialog sits.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DialogPosition {
    /// Centered in the viewport.
    #[default]
    Center,
    /// Fixed viewport coordinates.
    At { left: f64, top: f64 },
}

/// Device class, used by responsive dialogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceClass {
    #[default]
    Desktop,
    Phone,
}

/// One button in a dialog's button pane.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogButton {
    pub label: String,
    /// Class applied next to the base `btn` class.
    pub css_role: String,
    /// Close the dialog after the button's action is reported.
    pub closes_on_invoke: bool,
    /// Action name reported when the button is invoked.
    pub action: Option<String>,
    /// Element id; defaults to `<dialog>DialogButton<index>`.
    pub id: Option<String>,
    pub hidden: bool,
}

impl Default for DialogButton {
    fn default() -> Self {
        Self {
            label: "OK".to_owned(),
            css_role: "btn-primary".to_owned(),
            closes_on_invoke: true,
            action: None,
            id: None,
            hidden: false,
        }
    }
}

impl DialogButton {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn css_role(mut self, role: impl Into<String>) -> Self {
        self.css_role = role.into();
        self
    }

    #[must_use]
    pub fn closes_on_invoke(mut self, closes: bool) -> Self {
        self.closes_on_invoke = closes;
        self
    }

    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }
}

/// Everything the manager needs to build and lay out a dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogDescriptor {
    /// Heading html. When `None` the page's `#<name>Title` element supplies
    /// it (its `value` attribute, else its html).
    pub title: Option<String>,
    pub width: DialogWidth,
    pub height: HeightPolicy,
    pub max_height: f64,
    pub min_height: f64,
    pub modal: bool,
    /// Draw the modal backdrop. Without it the backdrop is transparent.
    pub overlay: bool,
    pub css_class: String,
    pub show_title: bool,
    pub show_close: bool,
    /// Start the busy overlay on open.
    pub show_busy: bool,
    /// Lock body scrolling while open.
    pub toggle_scroll: bool,
    pub z_index: i32,
    pub close_on_escape: bool,
    pub position: DialogPosition,
    /// Phone layout: absolutely positioned, no height clamp.
    pub responsive: bool,
    /// Re-run the layout when the window is resized.
    pub resizable: bool,
    pub buttons: Vec<DialogButton>,
    /// Accessible text of the close icon.
    pub close_text: String,
}

impl Default for DialogDescriptor {
    fn default() -> Self {
        Self {
            title: None,
            width: DialogWidth::default(),
            height: HeightPolicy::Auto,
            max_height: 600.0,
            min_height: 150.0,
            modal: true,
            overlay: true,
            css_class: String::new(),
            show_title: true,
            show_close: true,
            show_busy: false,
            toggle_scroll: false,
            z_index: 1000,
            close_on_escape: true,
            position: DialogPosition::Center,
            responsive: true,
            resizable: true,
            buttons: Vec::new(),
            close_text: "Close window".to_owned(),
        }
    }
}

impl DialogDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn width(mut self, width: DialogWidth) -> Self {
        self.width = width;
        self
    }

    #[must_use]
    pub fn height(mut self, height: HeightPolicy) -> Self {
        self.height = height;
        self
    }

    #[must_use]
    pub fn max_height(mut self, max_height: f64) -> Self {
        self.max_height = max_height;
        self
    }

    #[must_use]
    pub fn min_height(mut self, min_height: f64) -> Self {
        self.min_height = min_height;
        self
    }

    #[must_use]
    pub fn modal(mut self, modal: bool) -> Self {
        self.modal = modal;
        self
    }

    #[must_use]
    pub fn overlay(mut self, overlay: bool) -> Self {
        self.overlay = overlay;
        self
    }

    #[must_use]
    pub fn css_class(mut self, class: impl Into<String>) -> Self {
        self.css_class = class.into();
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
    pub fn show_busy(mut self, show: bool) -> Self {
        self.show_busy = show;
        self
    }

    #[must_use]
    pub fn toggle_scroll(mut self, toggle: bool) -> Self {
        self.toggle_scroll = toggle;
        self
    }

    #[must_use]
    pub fn z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    #[must_use]
    pub fn close_on_escape(mut self, close: bool) -> Self {
        self.close_on_escape = close;
        self
    }

    #[must_use]
    pub fn position(mut self, position: DialogPosition) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn responsive(mut self, responsive: bool) -> Self {
        self.responsive = responsive;
        self
    }

    #[must_use]
    pub fn resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    #[must_use]
    pub fn button(mut self, button: DialogButton) -> Self {
        self.buttons.push(button);
        self
    }

    #[must_use]
    pub fn close_text(mut self, text: impl Into<String>) -> Self {
        self.close_text = text.into();
        self
    }
}

/// Per-dialog lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogPhase {
    #[default]
    Unregistered,
    Registered,
    Open,
    Closed,
}

/// Callbacks around a dialog's open and close.
///
/// `before_close` is a notification only; a close always proceeds.
pub trait DialogHooks {
    /// Return `false` to cancel the open.
    fn before_open(&mut self, _id: &str, _trigger: Option<ElementHandle>) -> bool {
        true
    }

    fn on_open(&mut self, _id: &str) {}

    fn before_close(&mut self, _id: &str) {}

    fn on_close(&mut self, _id: &str) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDialogHooks;

impl DialogHooks for NoDialogHooks {}

/// A button press reported by the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonInvocation {
    pub dialog: String,
    pub index: usize,
    pub action: Option<String>,
    /// Close the dialog once the action has run.
    pub closes: bool,
}

/// Result of routing an event to the dialog manager.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DialogOutcome {
    /// Not for any dialog.
    #[default]
    Ignored,
    /// Consumed (dialog opened, closed, or resized).
    Handled,
    /// A dialog button was pressed.
    Button(ButtonInvocation),
}
