#![forbid(unsafe_code)]

//! Named tooltip instances.
//!
//! The registry owns every configured tooltip and enforces that at most one
//! of them is visible. It is driven entirely from outside: the application
//! root forwards page events to [`TooltipRegistry::handle_event`] and
//! advances transitions with [`TooltipRegistry::tick`].
//!
//! # Invariants
//!
//! - A name maps to one instance for the registry's lifetime; configuring it
//!   again returns the existing handle unchanged.
//! - At most one instance is in [`TooltipPhase::Visible`].
//! - An exiting panel is removed exactly once, either when its transition
//!   completes or when the instance is reopened.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tarmac_core::animation::Transition;
use tarmac_core::dom::{Dom, ElementHandle, StyleProp, StyleValue, add_classes};
use tarmac_core::event::{Event, Key, Propagation};
use tarmac_core::geometry::{measure, scroll_offsets, viewport_size};
use tarmac_core::{debug, trace};

use crate::positioner::{Placement, SideFlags, place};
use crate::tooltip::{
    NoHooks, TooltipConfig, TooltipHandle, TooltipHooks, TooltipPhase, TriggerMode,
    default_tooltips,
};

/// Elements making up one tooltip panel.
#[derive(Debug, Clone, Copy)]
struct PanelParts {
    root: ElementHandle,
    arrow: ElementHandle,
    close: ElementHandle,
}

struct Instance {
    name: String,
    config: TooltipConfig,
    hooks: Box<dyn TooltipHooks>,
    phase: TooltipPhase,
    source: Option<ElementHandle>,
    panel: Option<PanelParts>,
    placement: Option<Placement>,
    transition: Option<Transition>,
    /// Settings in effect for the current panel.
    active: Option<TooltipConfig>,
}

impl Instance {
    fn is_visible(&self) -> bool {
        self.phase == TooltipPhase::Visible
    }

    fn animates(&self) -> bool {
        self.active.as_ref().is_some_and(|s| s.animation)
    }

    fn close_on_escape(&self) -> bool {
        self.active
            .as_ref()
            .map_or(self.config.close_on_escape, |s| s.close_on_escape)
    }
}

/// Registry of named tooltips.
#[derive(Default)]
pub struct TooltipRegistry {
    instances: Vec<Instance>,
    by_name: HashMap<String, TooltipHandle>,
}

impl fmt::Debug for TooltipRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TooltipRegistry")
            .field("names", &self.by_name.keys().collect::<Vec<_>>())
            .field("visible", &self.visible())
            .finish_non_exhaustive()
    }
}

impl TooltipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the stock `default*` tooltips.
    pub fn install_defaults(&mut self) {
        for (name, config) in default_tooltips() {
            self.configure(name, config);
        }
    }

    /// Create the tooltip `name`, or return the existing one.
    ///
    /// An empty name is replaced by the current registry size.
    pub fn configure(&mut self, name: &str, config: TooltipConfig) -> TooltipHandle {
        self.configure_with_hooks(name, config, NoHooks)
    }

    /// [`configure`](Self::configure) with lifecycle hooks. The hooks are
    /// dropped when the name already exists.
    pub fn configure_with_hooks(
        &mut self,
        name: &str,
        config: TooltipConfig,
        hooks: impl TooltipHooks + 'static,
    ) -> TooltipHandle {
        let name = if name.is_empty() {
            self.instances.len().to_string()
        } else {
            name.to_owned()
        };
        if let Some(&handle) = self.by_name.get(&name) {
            trace!(tooltip = %name, "already configured; keeping first configuration");
            return handle;
        }
        let handle = TooltipHandle(self.instances.len());
        debug!(tooltip = %name, selector = %config.selector, "tooltip configured");
        self.by_name.insert(name.clone(), handle);
        self.instances.push(Instance {
            name,
            config,
            hooks: Box::new(hooks),
            phase: TooltipPhase::Hidden,
            source: None,
            panel: None,
            placement: None,
            transition: None,
            active: None,
        });
        handle
    }

    pub fn handle(&self, name: &str) -> Option<TooltipHandle> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, handle: TooltipHandle) -> Option<&str> {
        self.instances.get(handle.0).map(|i| i.name.as_str())
    }

    pub fn config(&self, handle: TooltipHandle) -> Option<&TooltipConfig> {
        self.instances.get(handle.0).map(|i| &i.config)
    }

    pub fn phase(&self, handle: TooltipHandle) -> TooltipPhase {
        self.instances
            .get(handle.0)
            .map_or(TooltipPhase::Hidden, |i| i.phase)
    }

    pub fn is_visible(&self, handle: TooltipHandle) -> bool {
        self.phase(handle) == TooltipPhase::Visible
    }

    /// Anchor of the visible panel.
    pub fn source(&self, handle: TooltipHandle) -> Option<ElementHandle> {
        self.instances.get(handle.0).and_then(|i| i.source)
    }

    /// Panel element, while one is in the document.
    pub fn panel(&self, handle: TooltipHandle) -> Option<ElementHandle> {
        self.instances
            .get(handle.0)
            .and_then(|i| i.panel.map(|p| p.root))
    }

    pub fn placement(&self, handle: TooltipHandle) -> Option<Placement> {
        self.instances.get(handle.0).and_then(|i| i.placement)
    }

    /// The visible tooltip, if any.
    pub fn visible(&self) -> Option<TooltipHandle> {
        self.instances
            .iter()
            .position(Instance::is_visible)
            .map(TooltipHandle)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Open `handle` at `anchor`, or at its first anchor without animation
    /// when `anchor` is `None`.
    ///
    /// Returns `false` when there are no anchors, the tooltip is configured
    /// invisible, it has no content, or `before_open` vetoes. Any visible
    /// tooltip, this one included, is closed first with its hooks; if that
    /// close is vetoed the open is abandoned so two panels are never visible
    /// together.
    pub fn open(
        &mut self,
        dom: &mut dyn Dom,
        handle: TooltipHandle,
        anchor: Option<ElementHandle>,
    ) -> bool {
        let Some(inst) = self.instances.get(handle.0) else {
            trace!(index = handle.0, "open: unknown tooltip");
            return false;
        };
        let anchors = dom.query(&inst.config.selector);
        let Some(&first) = anchors.first() else {
            trace!(tooltip = %inst.name, "open: no anchors");
            return false;
        };
        let (source, animate) = match anchor {
            Some(a) => (a, true),
            None => (first, false),
        };
        let settings = inst.config.resolved_for(dom, source);
        if !settings.visible {
            trace!(tooltip = %inst.name, "open: configured invisible");
            return false;
        }
        let html = match dom.query(&settings.html_ref).first() {
            Some(&r) if !settings.html_ref.is_empty() => dom.html(r),
            _ => settings.html.clone(),
        };
        let content = if html.is_empty() {
            settings.text.clone()
        } else {
            html
        };
        if settings.title.is_empty() && settings.subtitle.is_empty() && content.is_empty() {
            trace!(tooltip = %inst.name, "open: nothing to show");
            return false;
        }

        for idx in 0..self.instances.len() {
            if self.instances[idx].is_visible() && !self.close_index(dom, idx) {
                trace!(index = idx, "open: visible tooltip refused to close");
                return false;
            }
        }
        self.remove_panel(dom, handle.0);

        let inst = &mut self.instances[handle.0];
        if !inst.hooks.before_open(&inst.name, source) {
            trace!(tooltip = %inst.name, "open vetoed");
            return false;
        }

        let parts = build_panel(dom, &settings, &content);
        let anchor_rect = measure(dom, source);
        let panel_size = measure(dom, parts.root).size();
        let placement = place(
            anchor_rect,
            panel_size,
            viewport_size(dom),
            scroll_offsets(dom),
            settings.position,
        );
        apply_placement(dom, parts, &placement);

        let transition = (settings.animation && animate).then(|| placement.entrance());
        apply_frame(dom, parts.root, &placement, transition.as_ref());

        inst.panel = Some(parts);
        inst.placement = Some(placement);
        inst.transition = transition;
        inst.source = Some(source);
        inst.active = Some(settings);
        inst.phase = TooltipPhase::Visible;
        debug!(
            tooltip = %inst.name,
            left = placement.left,
            top = placement.top,
            "tooltip opened"
        );
        inst.hooks.on_open(&inst.name, source);
        true
    }

    /// Close `handle`. No-op unless visible; `before_close` may veto.
    pub fn close(&mut self, dom: &mut dyn Dom, handle: TooltipHandle) -> bool {
        if handle.0 >= self.instances.len() {
            return false;
        }
        self.close_index(dom, handle.0)
    }

    /// Remove the panel immediately, skipping hooks and transitions.
    pub fn dismiss(&mut self, dom: &mut dyn Dom, handle: TooltipHandle) -> bool {
        if handle.0 >= self.instances.len() {
            return false;
        }
        self.remove_panel(dom, handle.0)
    }

    /// Close whichever tooltip is visible.
    pub fn close_all(&mut self, dom: &mut dyn Dom) {
        for idx in 0..self.instances.len() {
            if self.instances[idx].is_visible() {
                self.close_index(dom, idx);
            }
        }
    }

    fn close_index(&mut self, dom: &mut dyn Dom, idx: usize) -> bool {
        let inst = &mut self.instances[idx];
        if !inst.is_visible() {
            trace!(tooltip = %inst.name, "close: not visible");
            return false;
        }
        if !inst.hooks.before_close(&inst.name) {
            trace!(tooltip = %inst.name, "close vetoed");
            return false;
        }
        match (inst.animates(), inst.placement) {
            (true, Some(placement)) if inst.panel.is_some() => {
                inst.transition = Some(placement.exit());
                inst.phase = TooltipPhase::Exiting;
            }
            _ => {
                if let Some(parts) = inst.panel.take() {
                    dom.remove(parts.root);
                }
                inst.transition = None;
                inst.phase = TooltipPhase::Hidden;
            }
        }
        debug!(tooltip = %inst.name, "tooltip closed");
        inst.hooks.on_close(&inst.name);
        inst.source = None;
        true
    }

    fn remove_panel(&mut self, dom: &mut dyn Dom, idx: usize) -> bool {
        let inst = &mut self.instances[idx];
        let Some(parts) = inst.panel.take() else {
            return false;
        };
        dom.remove(parts.root);
        inst.transition = None;
        inst.source = None;
        inst.phase = TooltipPhase::Hidden;
        trace!(tooltip = %inst.name, "panel removed");
        true
    }

    /// Advance running transitions. Exiting panels whose transition
    /// completes are removed.
    pub fn tick(&mut self, dom: &mut dyn Dom, dt: Duration) {
        for inst in &mut self.instances {
            let (Some(parts), Some(placement), Some(transition)) =
                (inst.panel, inst.placement, inst.transition.as_mut())
            else {
                continue;
            };
            let done = transition.advance(dt);
            apply_frame(dom, parts.root, &placement, Some(&*transition));
            if !done {
                continue;
            }
            inst.transition = None;
            if inst.phase == TooltipPhase::Exiting {
                dom.remove(parts.root);
                inst.panel = None;
                inst.phase = TooltipPhase::Hidden;
                trace!(tooltip = %inst.name, "exit complete");
            }
        }
    }

    /// Route a page event. Returns [`Propagation::Stop`] when a click
    /// belonged to a click-triggered tooltip's anchor or panel.
    pub fn handle_event(&mut self, dom: &mut dyn Dom, event: &Event) -> Propagation {
        match *event {
            Event::Click { target } => return self.on_click(dom, target),
            Event::KeyDown { key: Key::Escape } => {
                for idx in 0..self.instances.len() {
                    let inst = &self.instances[idx];
                    if inst.is_visible() && inst.close_on_escape() {
                        self.close_index(dom, idx);
                    }
                }
            }
            Event::KeyDown { .. } => {}
            Event::PointerEnter { target } => {
                if let Some((idx, anchor)) = self.anchor_hit(dom, target, |i| {
                    i.config.trigger == TriggerMode::Hover
                }) {
                    if self.instances[idx].source != Some(anchor) {
                        self.open(dom, TooltipHandle(idx), Some(anchor));
                    }
                }
            }
            Event::PointerLeave { target } => {
                if let Some((idx, _)) = self.anchor_hit(dom, target, |i| {
                    i.config.trigger == TriggerMode::Hover && i.is_visible()
                }) {
                    self.close_index(dom, idx);
                }
            }
            Event::Focus { target } => {
                if let Some((idx, anchor)) = self.focus_hit(dom, target) {
                    self.open(dom, TooltipHandle(idx), Some(anchor));
                }
            }
            Event::Blur { target } => {
                if let Some((idx, _)) = self.focus_hit(dom, target) {
                    self.close_index(dom, idx);
                }
            }
            Event::Resize { .. } => {
                for idx in 0..self.instances.len() {
                    if !self.instances[idx].config.touch_device {
                        self.close_index(dom, idx);
                    }
                }
            }
            Event::OrientationChange => {
                for idx in 0..self.instances.len() {
                    if self.instances[idx].config.touch_device {
                        self.remove_panel(dom, idx);
                    }
                }
            }
        }
        Propagation::Continue
    }

    fn on_click(&mut self, dom: &mut dyn Dom, target: ElementHandle) -> Propagation {
        for idx in 0..self.instances.len() {
            let inst = &self.instances[idx];
            let Some(parts) = inst.panel else { continue };
            if inst.phase != TooltipPhase::Visible || !dom.contains(parts.root, target) {
                continue;
            }
            if dom.contains(parts.close, target) {
                self.close_index(dom, idx);
                return Propagation::Stop;
            }
            if inst.config.trigger == TriggerMode::Click {
                return Propagation::Stop;
            }
        }

        if let Some((idx, anchor)) =
            self.anchor_hit(dom, target, |i| i.config.trigger == TriggerMode::Click)
        {
            self.open(dom, TooltipHandle(idx), Some(anchor));
            return Propagation::Stop;
        }

        self.close_all(dom);
        Propagation::Continue
    }

    /// First instance accepted by `filter` with an anchor containing
    /// `target`.
    fn anchor_hit(
        &self,
        dom: &dyn Dom,
        target: ElementHandle,
        filter: impl Fn(&Instance) -> bool,
    ) -> Option<(usize, ElementHandle)> {
        self.instances.iter().enumerate().find_map(|(idx, inst)| {
            if !filter(inst) {
                return None;
            }
            dom.query(&inst.config.selector)
                .into_iter()
                .find(|&a| dom.contains(a, target))
                .map(|a| (idx, a))
        })
    }

    /// Focus-driven instances: focus triggers on the anchor itself, click
    /// triggers on a control nested inside the anchor.
    fn focus_hit(&self, dom: &dyn Dom, target: ElementHandle) -> Option<(usize, ElementHandle)> {
        self.instances.iter().enumerate().find_map(|(idx, inst)| {
            let nested_only = match inst.config.trigger {
                TriggerMode::Focus => false,
                TriggerMode::Click => true,
                TriggerMode::Hover => return None,
            };
            dom.query(&inst.config.selector)
                .into_iter()
                .find(|&a| dom.contains(a, target) && !(nested_only && a == target))
                .map(|a| (idx, a))
        })
    }
}

fn build_panel(dom: &mut dyn Dom, settings: &TooltipConfig, content: &str) -> PanelParts {
    let body = dom.body();
    let root = dom.create_element(body, "div", "tooltip");
    let wrapper = dom.create_element(root, "div", "tooltip-wrapper");
    let title = dom.create_element(wrapper, "h5", "tooltip-title");
    let subtitle = dom.create_element(wrapper, "p", "tooltip-subtitle");
    let body_el = dom.create_element(wrapper, "div", "tooltip-content");
    let arrow = dom.create_element(root, "div", "tooltip-arrow");
    let close = dom.create_element(root, "a", "tooltip-close");
    dom.set_attr(close, "title", "Close");

    dom.set_html(title, &settings.title);
    dom.set_html(subtitle, &settings.subtitle);
    dom.set_html(body_el, content);

    if !settings.show_title || settings.title.is_empty() {
        dom.hide(title);
    }
    if settings.subtitle.is_empty() {
        dom.hide(subtitle);
    }
    if content.is_empty() {
        dom.hide(body_el);
    }
    let close_shown = match settings.trigger {
        TriggerMode::Hover => false,
        TriggerMode::Click => true,
        TriggerMode::Focus => settings.show_close,
    };
    if !close_shown || !settings.show_close {
        dom.hide(close);
    }
    if !settings.show_arrow {
        dom.hide(arrow);
    }
    add_classes(dom, root, &settings.css_class);
    if let Some(w) = settings.width {
        dom.set_style(root, StyleProp::Width, w.to_style());
    }
    if let Some(h) = settings.height {
        dom.set_style(root, StyleProp::Height, h.to_style());
    }
    if settings.z_index > 0 {
        dom.set_style(
            root,
            StyleProp::ZIndex,
            StyleValue::Number(f64::from(settings.z_index)),
        );
    }
    PanelParts { root, arrow, close }
}

fn apply_placement(dom: &mut dyn Dom, parts: PanelParts, placement: &Placement) {
    for class in SideFlags::ALL_CLASSES {
        dom.remove_class(parts.root, class);
    }
    for class in placement.flags.class_names() {
        dom.add_class(parts.root, class);
    }
    let arrow_left = placement
        .arrow_left
        .map_or(StyleValue::Unset, StyleValue::Px);
    dom.set_style(parts.arrow, StyleProp::Left, arrow_left);
    dom.set_style(parts.root, StyleProp::Left, StyleValue::Px(placement.left));
}

fn apply_frame(
    dom: &mut dyn Dom,
    root: ElementHandle,
    placement: &Placement,
    transition: Option<&Transition>,
) {
    let (offset, opacity) = transition.map_or((0.0, 1.0), |t| (t.offset(), t.opacity()));
    dom.set_style(root, StyleProp::Top, StyleValue::Px(placement.top + offset));
    dom.set_style(root, StyleProp::Opacity, StyleValue::Number(opacity));
}
