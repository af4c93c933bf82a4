#![forbid(unsafe_code)]

//! Modal dialog lifecycle.
//!
//! [`DialogManager`] builds a frame around page-supplied dialog content at
//! registration, then opens, closes and lays it out on demand. It owns the
//! single active dialog: opening one closes whichever other dialog is open,
//! and the previous dialog's `on_close` always runs before the next one's
//! `on_open`.
//!
//! Dialog ids are the page names of their content: `"help"` wraps the
//! element `#helpDialog` and takes its heading from `#helpTitle`. An id
//! starting with `#` names the content element directly.
//!
//! Operations on unknown, unregistered or closed dialogs return `false` (or
//! `None`) and log at trace level; nothing here fails loudly.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tarmac_core::dom::{Dom, ElementHandle, StyleProp, StyleValue, add_classes};
use tarmac_core::event::{Event, Key};
use tarmac_core::geometry::{measure, scroll_offsets, viewport_size};
use tarmac_core::{debug, trace};

use crate::busy::BusyOverlay;
use crate::dialog::{
    ButtonInvocation, DeviceClass, DialogDescriptor, DialogHooks, DialogOutcome, DialogPhase,
    NoDialogHooks,
};
use crate::layout::{ChromeMetrics, DialogLayout, FramePosition, LayoutParams, compute_layout};

/// Class prefix of page links that open a dialog by id.
pub const DIALOG_LINK_PREFIX: &str = "dialog-link-";

/// Class of a hidden dialog button.
pub const HIDDEN_CLASS: &str = "is-hidden";

/// Element inside the content whose html `set_body` replaces.
const BODY_SELECTOR: &str = ".js-dialogBody";

const FOCUSABLE: &str = "a, button, input, select, textarea, [tabindex]";

#[derive(Debug, Clone)]
struct DialogParts {
    frame: ElementHandle,
    titlebar: ElementHandle,
    heading: ElementHandle,
    close: Option<ElementHandle>,
    wrapper: ElementHandle,
    content: ElementHandle,
    buttonpane: Option<ElementHandle>,
    buttons: Vec<ElementHandle>,
}

struct Entry {
    id: String,
    descriptor: DialogDescriptor,
    hooks: Box<dyn DialogHooks>,
    phase: DialogPhase,
    parts: DialogParts,
    trigger: Option<ElementHandle>,
    backdrop: Option<ElementHandle>,
    layout: Option<DialogLayout>,
}

/// Owner of every registered dialog and of the active one.
#[derive(Default)]
pub struct DialogManager {
    dialogs: Vec<Entry>,
    by_id: HashMap<String, usize>,
    active: Option<usize>,
    busy: BusyOverlay,
    device: DeviceClass,
}

impl fmt::Debug for DialogManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogManager")
            .field("dialogs", &self.dialogs.iter().map(|d| &d.id).collect::<Vec<_>>())
            .field("active", &self.active())
            .field("device", &self.device)
            .finish()
    }
}

fn normalize(id: &str) -> &str {
    id.trim_start_matches('#')
}

impl DialogManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager for the given device class.
    pub fn with_device(device: DeviceClass) -> Self {
        Self {
            device,
            ..Self::default()
        }
    }

    pub fn device(&self) -> DeviceClass {
        self.device
    }

    pub fn set_device(&mut self, device: DeviceClass) {
        self.device = device;
    }

    /// Register `id` with no hooks. See [`register_with_hooks`](Self::register_with_hooks).
    pub fn register(&mut self, dom: &mut dyn Dom, id: &str, descriptor: DialogDescriptor) -> bool {
        self.register_with_hooks(dom, id, descriptor, Box::new(NoDialogHooks))
    }

    /// Build the dialog frame around the page's content element and bind
    /// `descriptor` to `id`.
    ///
    /// Registering an existing id replaces its descriptor and hooks and
    /// rebuilds the frame, closing the dialog first if it is open. Returns
    /// `false` when the content element is missing.
    pub fn register_with_hooks(
        &mut self,
        dom: &mut dyn Dom,
        id: &str,
        descriptor: DialogDescriptor,
        hooks: Box<dyn DialogHooks>,
    ) -> bool {
        let name = normalize(id);
        let selector = if id.starts_with('#') {
            id.to_owned()
        } else {
            format!("#{name}Dialog")
        };
        let Some(&content) = dom.query(&selector).first() else {
            trace!(dialog = %name, selector = %selector, "register: no content element");
            return false;
        };

        let existing = self.by_id.get(name).copied();
        if let Some(idx) = existing {
            self.close_index(dom, idx);
            let old = &self.dialogs[idx].parts;
            let body = dom.body();
            dom.append(body, old.content);
            dom.remove(old.frame);
        }

        let title = match &descriptor.title {
            Some(t) => t.clone(),
            None => dom
                .query(&format!("#{name}Title"))
                .first()
                .map(|&el| dom.attr(el, "value").unwrap_or_else(|| dom.html(el)))
                .unwrap_or_default(),
        };
        let parts = build_frame(dom, name, &descriptor, &title, content);
        let entry = Entry {
            id: name.to_owned(),
            descriptor,
            hooks,
            phase: DialogPhase::Registered,
            parts,
            trigger: None,
            backdrop: None,
            layout: None,
        };
        match existing {
            Some(idx) => {
                self.dialogs[idx] = entry;
                debug!(dialog = %name, "dialog re-registered");
            }
            None => {
                self.by_id.insert(name.to_owned(), self.dialogs.len());
                self.dialogs.push(entry);
                debug!(dialog = %name, "dialog registered");
            }
        }
        true
    }

    fn index(&self, id: &str) -> Option<usize> {
        self.by_id.get(normalize(id)).copied()
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.index(id).is_some()
    }

    pub fn phase(&self, id: &str) -> DialogPhase {
        self.index(id)
            .map_or(DialogPhase::Unregistered, |i| self.dialogs[i].phase)
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.phase(id) == DialogPhase::Open
    }

    /// Id of the active dialog.
    pub fn active(&self) -> Option<&str> {
        self.active.map(|i| self.dialogs[i].id.as_str())
    }

    pub fn descriptor(&self, id: &str) -> Option<&DialogDescriptor> {
        self.index(id).map(|i| &self.dialogs[i].descriptor)
    }

    pub fn frame(&self, id: &str) -> Option<ElementHandle> {
        self.index(id).map(|i| self.dialogs[i].parts.frame)
    }

    pub fn heading(&self, id: &str) -> Option<ElementHandle> {
        self.index(id).map(|i| self.dialogs[i].parts.heading)
    }

    pub fn close_control(&self, id: &str) -> Option<ElementHandle> {
        self.index(id).and_then(|i| self.dialogs[i].parts.close)
    }

    pub fn wrapper(&self, id: &str) -> Option<ElementHandle> {
        self.index(id).map(|i| self.dialogs[i].parts.wrapper)
    }

    pub fn content(&self, id: &str) -> Option<ElementHandle> {
        self.index(id).map(|i| self.dialogs[i].parts.content)
    }

    pub fn button(&self, id: &str, index: usize) -> Option<ElementHandle> {
        self.index(id)
            .and_then(|i| self.dialogs[i].parts.buttons.get(index).copied())
    }

    /// Modal backdrop of an open dialog.
    pub fn backdrop(&self, id: &str) -> Option<ElementHandle> {
        self.index(id).and_then(|i| self.dialogs[i].backdrop)
    }

    /// Layout applied by the last resize.
    pub fn layout(&self, id: &str) -> Option<&DialogLayout> {
        self.index(id).and_then(|i| self.dialogs[i].layout.as_ref())
    }

    pub fn busy(&self) -> &BusyOverlay {
        &self.busy
    }

    pub fn len(&self) -> usize {
        self.dialogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialogs.is_empty()
    }

    /// Open `id`, remembering `trigger` (or the focused element) for focus
    /// restoration on close.
    ///
    /// Another open dialog is closed first; an already open `id` is closed
    /// and reopened. When `before_open` vetoes, nothing is active afterwards.
    pub fn open(&mut self, dom: &mut dyn Dom, id: &str, trigger: Option<ElementHandle>) -> bool {
        let Some(idx) = self.index(id) else {
            trace!(dialog = %id, "open: unknown dialog");
            return false;
        };
        if let Some(prev) = self.active
            && prev != idx
        {
            self.close_index(dom, prev);
        }
        if self.dialogs[idx].phase == DialogPhase::Open {
            self.close_index(dom, idx);
        }

        self.active = Some(idx);
        let device = self.device;
        let entry = &mut self.dialogs[idx];
        if !entry.hooks.before_open(&entry.id, trigger) {
            trace!(dialog = %entry.id, "open vetoed");
            self.active = None;
            return false;
        }
        entry.trigger = trigger.or_else(|| dom.focused());

        let d = &entry.descriptor;
        let body = dom.body();
        if d.modal {
            let class = if d.overlay {
                "dialog-overlay"
            } else {
                "dialog-overlay is-transparent"
            };
            let backdrop = dom.create_element(body, "div", class);
            dom.set_style(
                backdrop,
                StyleProp::ZIndex,
                StyleValue::Number(f64::from(d.z_index) - 1.0),
            );
            entry.backdrop = Some(backdrop);
        }
        if d.toggle_scroll {
            let overflow = if device == DeviceClass::Phone {
                "auto"
            } else {
                "hidden"
            };
            dom.set_style(body, StyleProp::Overflow, StyleValue::Keyword(overflow));
        }
        dom.show(entry.parts.frame);
        entry.phase = DialogPhase::Open;
        let show_busy = d.show_busy;

        self.resize_index(dom, idx);
        let parts = self.dialogs[idx].parts.clone();
        if show_busy {
            self.busy.start(dom, parts.frame, "");
        }
        if dom.find(parts.wrapper, FOCUSABLE).is_none() {
            dom.set_attr(parts.wrapper, "tabindex", "0");
        }
        dom.focus(parts.heading);

        let entry = &mut self.dialogs[idx];
        debug!(dialog = %entry.id, "dialog opened");
        entry.hooks.on_open(&entry.id);
        true
    }

    /// Close `id`. Returns `false` if it was not open. `before_close` is
    /// notified but cannot stop the close.
    pub fn close(&mut self, dom: &mut dyn Dom, id: &str) -> bool {
        match self.index(id) {
            Some(idx) => self.close_index(dom, idx),
            None => {
                trace!(dialog = %id, "close: unknown dialog");
                false
            }
        }
    }

    /// Close whichever dialog is active.
    pub fn close_active(&mut self, dom: &mut dyn Dom) -> bool {
        match self.active {
            Some(idx) => self.close_index(dom, idx),
            None => false,
        }
    }

    fn close_index(&mut self, dom: &mut dyn Dom, idx: usize) -> bool {
        let entry = &mut self.dialogs[idx];
        if entry.phase != DialogPhase::Open {
            trace!(dialog = %entry.id, "close: not open");
            return false;
        }
        entry.hooks.before_close(&entry.id);
        dom.hide(entry.parts.frame);
        entry.phase = DialogPhase::Closed;
        if self.active == Some(idx) {
            self.active = None;
        }
        if self.busy.frame() == Some(entry.parts.frame) {
            self.busy.abort(dom);
        }
        if let Some(backdrop) = entry.backdrop.take() {
            dom.remove(backdrop);
        }
        if entry.descriptor.toggle_scroll {
            let body = dom.body();
            dom.set_style(body, StyleProp::Overflow, StyleValue::Auto);
        }
        debug!(dialog = %entry.id, "dialog closed");
        entry.hooks.on_close(&entry.id);
        if let Some(trigger) = entry.trigger.take()
            && dom.is_connected(trigger)
        {
            dom.focus(trigger);
        }
        true
    }

    /// Recompute and apply the layout of an open dialog.
    pub fn resize(&mut self, dom: &mut dyn Dom, id: &str) -> bool {
        match self.index(id) {
            Some(idx) if self.dialogs[idx].phase == DialogPhase::Open => {
                self.resize_index(dom, idx);
                true
            }
            _ => false,
        }
    }

    fn resize_index(&mut self, dom: &mut dyn Dom, idx: usize) {
        let device = self.device;
        let entry = &mut self.dialogs[idx];
        let parts = &entry.parts;
        let d = &entry.descriptor;

        let frame_metrics = dom.box_metrics(parts.frame);
        let wrapper_metrics = dom.box_metrics(parts.wrapper);
        let chrome = ChromeMetrics {
            titlebar_height: if dom.is_visible(parts.titlebar) {
                measure(dom, parts.titlebar).height
            } else {
                0.0
            },
            buttonpane_height: parts
                .buttonpane
                .map_or(0.0, |pane| measure(dom, pane).height),
            frame_padding: frame_metrics.padding,
            content_padding: wrapper_metrics.padding,
            content_margin: wrapper_metrics.margin,
        };
        let natural = measure(dom, parts.content).height;
        let layout = compute_layout(
            &LayoutParams::from(d),
            &chrome,
            viewport_size(dom),
            scroll_offsets(dom),
            device,
            natural,
        );
        apply_layout(dom, parts, &layout, d.z_index);
        trace!(
            dialog = %entry.id,
            width = layout.frame_width,
            height = layout.box_height,
            clamped = layout.height_clamped,
            "dialog laid out"
        );
        entry.layout = Some(layout);
    }

    /// Report a press of button `index` on the open dialog `id`.
    ///
    /// The dialog stays open; pass the invocation to
    /// [`complete_invocation`](Self::complete_invocation) once its action has
    /// run. Hidden buttons cannot be invoked.
    pub fn invoke_button(&mut self, id: &str, index: usize) -> Option<ButtonInvocation> {
        let idx = self.index(id)?;
        let entry = &self.dialogs[idx];
        if entry.phase != DialogPhase::Open {
            trace!(dialog = %entry.id, "invoke: dialog not open");
            return None;
        }
        let button = entry.descriptor.buttons.get(index)?;
        if button.hidden {
            trace!(dialog = %entry.id, index, "invoke: button hidden");
            return None;
        }
        Some(ButtonInvocation {
            dialog: entry.id.clone(),
            index,
            action: button.action.clone(),
            closes: button.closes_on_invoke,
        })
    }

    /// Close the invoking dialog if its button asks for it.
    pub fn complete_invocation(&mut self, dom: &mut dyn Dom, invocation: &ButtonInvocation) {
        if invocation.closes {
            self.close(dom, &invocation.dialog);
        }
    }

    /// Invoke a button, run `action`, then close if the button closes.
    pub fn press_button(
        &mut self,
        dom: &mut dyn Dom,
        id: &str,
        index: usize,
        action: impl FnOnce(&ButtonInvocation),
    ) -> bool {
        let Some(invocation) = self.invoke_button(id, index) else {
            return false;
        };
        action(&invocation);
        self.complete_invocation(dom, &invocation);
        true
    }

    /// Show or hide button `index`.
    pub fn set_button_hidden(
        &mut self,
        dom: &mut dyn Dom,
        id: &str,
        index: usize,
        hidden: bool,
    ) -> bool {
        let Some(idx) = self.index(id) else {
            return false;
        };
        let entry = &mut self.dialogs[idx];
        let (Some(button), Some(&el)) = (
            entry.descriptor.buttons.get_mut(index),
            entry.parts.buttons.get(index),
        ) else {
            return false;
        };
        button.hidden = hidden;
        if hidden {
            dom.add_class(el, HIDDEN_CLASS);
            dom.hide(el);
        } else {
            dom.remove_class(el, HIDDEN_CLASS);
            dom.show(el);
        }
        true
    }

    /// Replace the heading html.
    pub fn set_title(&mut self, dom: &mut dyn Dom, id: &str, html: &str) -> bool {
        let Some(idx) = self.index(id) else {
            return false;
        };
        let entry = &mut self.dialogs[idx];
        entry.descriptor.title = Some(html.to_owned());
        dom.set_html(entry.parts.heading, html);
        true
    }

    /// Replace the body html: the content's `.js-dialogBody` element when it
    /// has one, otherwise the whole content.
    pub fn set_body(&mut self, dom: &mut dyn Dom, id: &str, html: &str) -> bool {
        let Some(idx) = self.index(id) else {
            return false;
        };
        let content = self.dialogs[idx].parts.content;
        let target = dom.find(content, BODY_SELECTOR).unwrap_or(content);
        dom.set_html(target, html);
        true
    }

    /// Show the busy overlay on the active dialog.
    pub fn busy_start(&mut self, dom: &mut dyn Dom, message: &str) -> bool {
        let Some(idx) = self.active else {
            trace!("busy_start: no active dialog");
            return false;
        };
        let frame = self.dialogs[idx].parts.frame;
        self.busy.start(dom, frame, message);
        true
    }

    /// Fade the busy overlay out.
    pub fn busy_stop(&mut self) -> bool {
        self.busy.stop()
    }

    /// Advance the busy fade. When it completes on an open dialog, the
    /// dialog is laid out again and its heading takes focus unless focus is
    /// already inside the frame.
    pub fn tick(&mut self, dom: &mut dyn Dom, dt: Duration) {
        let Some(frame) = self.busy.tick(dom, dt) else {
            return;
        };
        let Some(idx) = self
            .dialogs
            .iter()
            .position(|d| d.parts.frame == frame && d.phase == DialogPhase::Open)
        else {
            return;
        };
        self.resize_index(dom, idx);
        let inside = dom.focused().is_some_and(|f| dom.contains(frame, f));
        if !inside {
            dom.focus(self.dialogs[idx].parts.heading);
        }
    }

    /// Route a page event.
    ///
    /// Handles the active dialog's close control and buttons, dialog links,
    /// Escape, and window resizes. Resizes re-layout the active dialog but
    /// report [`DialogOutcome::Ignored`] so other components still see them.
    pub fn handle_event(&mut self, dom: &mut dyn Dom, event: &Event) -> DialogOutcome {
        match *event {
            Event::Click { target } => self.on_click(dom, target),
            Event::KeyDown { key: Key::Escape } => match self.active {
                Some(idx) if self.dialogs[idx].descriptor.close_on_escape => {
                    self.close_index(dom, idx);
                    DialogOutcome::Handled
                }
                _ => DialogOutcome::Ignored,
            },
            Event::Resize { .. } | Event::OrientationChange => {
                if let Some(idx) = self.active
                    && self.dialogs[idx].descriptor.resizable
                {
                    self.resize_index(dom, idx);
                }
                DialogOutcome::Ignored
            }
            _ => DialogOutcome::Ignored,
        }
    }

    fn on_click(&mut self, dom: &mut dyn Dom, target: ElementHandle) -> DialogOutcome {
        if let Some(idx) = self.active {
            let parts = &self.dialogs[idx].parts;
            if parts.close.is_some_and(|c| dom.contains(c, target)) {
                self.close_index(dom, idx);
                return DialogOutcome::Handled;
            }
            if let Some(index) = parts.buttons.iter().position(|&b| dom.contains(b, target)) {
                let id = self.dialogs[idx].id.clone();
                return match self.invoke_button(&id, index) {
                    Some(invocation) => DialogOutcome::Button(invocation),
                    None => DialogOutcome::Handled,
                };
            }
        }

        let hit = self.dialogs.iter().enumerate().find_map(|(idx, d)| {
            dom.query(&format!(".{DIALOG_LINK_PREFIX}{}", d.id))
                .into_iter()
                .find(|&link| dom.contains(link, target))
                .map(|link| (idx, link))
        });
        if let Some((idx, link)) = hit {
            let id = self.dialogs[idx].id.clone();
            self.open(dom, &id, Some(link));
            return DialogOutcome::Handled;
        }
        DialogOutcome::Ignored
    }
}

fn build_frame(
    dom: &mut dyn Dom,
    name: &str,
    d: &DialogDescriptor,
    title: &str,
    content: ElementHandle,
) -> DialogParts {
    let body = dom.body();
    let frame = dom.create_element(body, "div", "dialog");
    add_classes(dom, frame, &d.css_class);
    dom.set_attr(frame, "role", "dialog");
    dom.set_attr(frame, "aria-labelledby", &format!("{name}DialogTitle"));
    dom.set_style(frame, StyleProp::ZIndex, StyleValue::Number(f64::from(d.z_index)));
    dom.hide(frame);

    let titlebar = dom.create_element(frame, "div", "dialog-titlebar");
    if !d.show_title {
        dom.hide(titlebar);
    }
    let heading = dom.create_element(titlebar, "h2", "dialog-title");
    dom.set_attr(heading, "id", &format!("{name}DialogTitle"));
    dom.set_attr(heading, "tabindex", "0");
    dom.set_html(heading, title);

    let close = d.show_close.then(|| {
        let close = dom.create_element(titlebar, "a", "dialog-close");
        dom.set_attr(close, "id", &format!("{name}DialogClose"));
        dom.set_attr(close, "role", "button");
        dom.set_attr(close, "title", &d.close_text);
        let label = dom.create_element(close, "span", "hidden-accessible");
        dom.set_html(label, &d.close_text);
        close
    });

    let wrapper = dom.create_element(frame, "div", "dialog-content-wrapper");
    dom.append(wrapper, content);
    dom.add_class(content, "dialog-content-pad");
    dom.show(content);

    let mut buttons = Vec::with_capacity(d.buttons.len());
    let buttonpane = (!d.buttons.is_empty()).then(|| {
        let pane = dom.create_element(frame, "div", "dialog-buttonpane");
        for (i, b) in d.buttons.iter().enumerate() {
            let el = dom.create_element(pane, "button", "btn");
            add_classes(dom, el, &b.css_role);
            let id = b
                .id
                .clone()
                .unwrap_or_else(|| format!("{name}DialogButton{i}"));
            dom.set_attr(el, "id", &id);
            dom.set_html(el, &b.label);
            if b.hidden {
                dom.add_class(el, HIDDEN_CLASS);
                dom.hide(el);
            }
            buttons.push(el);
        }
        pane
    });

    DialogParts {
        frame,
        titlebar,
        heading,
        close,
        wrapper,
        content,
        buttonpane,
        buttons,
    }
}

fn px_or_unset(value: Option<f64>) -> StyleValue {
    value.map_or(StyleValue::Unset, StyleValue::Px)
}

fn apply_layout(dom: &mut dyn Dom, parts: &DialogParts, layout: &DialogLayout, z_index: i32) {
    let (keyword, left, top) = match layout.position {
        FramePosition::Fixed { left, top } => ("fixed", left, top),
        FramePosition::Absolute { left, top } => ("absolute", left, top),
    };
    let frame = parts.frame;
    dom.set_style(frame, StyleProp::Position, StyleValue::Keyword(keyword));
    dom.set_style(frame, StyleProp::Left, StyleValue::Px(left));
    dom.set_style(frame, StyleProp::Top, StyleValue::Px(top));
    dom.set_style(frame, StyleProp::Width, StyleValue::Px(layout.frame_width));
    dom.set_style(frame, StyleProp::Height, StyleValue::Px(layout.box_height));
    dom.set_style(frame, StyleProp::ZIndex, StyleValue::Number(f64::from(z_index)));

    let wrapper = parts.wrapper;
    let height = layout
        .content_height
        .map_or(StyleValue::Auto, StyleValue::Px);
    dom.set_style(wrapper, StyleProp::Height, height);
    dom.set_style(
        wrapper,
        StyleProp::MaxHeight,
        px_or_unset(layout.max_content_height),
    );
    dom.set_style(
        wrapper,
        StyleProp::MinHeight,
        StyleValue::Px(layout.min_content_height),
    );
    dom.set_style(wrapper, StyleProp::Width, px_or_unset(layout.wrapper_width));
}
