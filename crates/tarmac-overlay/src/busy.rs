#![forbid(unsafe_code)]

//! Busy overlay drawn over a dialog frame.

use std::time::Duration;

use tarmac_core::animation::{BUSY_FADE_DURATION, Transition};
use tarmac_core::dom::{Dom, ElementHandle, StyleProp, StyleValue};
use tarmac_core::trace;

/// Class set on a frame while its busy overlay is shown.
pub const BUSY_FRAME_CLASS: &str = "is-busy";

#[derive(Debug, Clone, Copy)]
struct Module {
    frame: ElementHandle,
    root: ElementHandle,
    text: ElementHandle,
}

/// A spinner with an optional message, scoped to one frame at a time.
#[derive(Debug, Default)]
pub struct BusyOverlay {
    module: Option<Module>,
    fade: Option<Transition>,
}

impl BusyOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the overlay on `frame`.
    ///
    /// Starting again on the same frame replaces the message and cancels a
    /// running fade. Starting on another frame drops the old overlay first.
    pub fn start(&mut self, dom: &mut dyn Dom, frame: ElementHandle, message: &str) {
        if let Some(module) = self.module
            && module.frame == frame
            && dom.is_connected(module.root)
        {
            self.fade = None;
            dom.set_style(module.root, StyleProp::Opacity, StyleValue::Unset);
            dom.set_html(module.text, message);
            return;
        }
        self.abort(dom);

        let root = dom.create_element(frame, "div", "busy-module");
        dom.create_element(root, "div", "busy-bg");
        let img = dom.create_element(root, "div", "busy-img");
        dom.create_element(img, "i", "spinner");
        let text = dom.create_element(img, "span", "text");
        dom.set_html(text, message);
        dom.add_class(frame, BUSY_FRAME_CLASS);
        self.module = Some(Module { frame, root, text });
        trace!(frame = frame.raw(), "busy overlay shown");
    }

    /// Begin fading out. Returns `false` when nothing is shown or a fade is
    /// already running.
    pub fn stop(&mut self) -> bool {
        if self.module.is_none() || self.fade.is_some() {
            return false;
        }
        self.fade = Some(Transition::fade_out(BUSY_FADE_DURATION));
        true
    }

    /// Advance the fade. Returns the frame once, when the fade completes and
    /// the overlay has been removed.
    pub fn tick(&mut self, dom: &mut dyn Dom, dt: Duration) -> Option<ElementHandle> {
        let module = self.module?;
        let fade = self.fade.as_mut()?;
        let done = fade.advance(dt);
        if !done {
            dom.set_style(module.root, StyleProp::Opacity, StyleValue::Number(fade.opacity()));
            return None;
        }
        self.remove(dom);
        trace!(frame = module.frame.raw(), "busy overlay faded out");
        Some(module.frame)
    }

    /// Remove the overlay immediately, cancelling any fade.
    pub fn abort(&mut self, dom: &mut dyn Dom) {
        if self.module.is_some() {
            self.remove(dom);
        }
    }

    fn remove(&mut self, dom: &mut dyn Dom) {
        self.fade = None;
        if let Some(module) = self.module.take() {
            dom.remove(module.root);
            dom.remove_class(module.frame, BUSY_FRAME_CLASS);
        }
    }

    /// Frame currently carrying the overlay.
    pub fn frame(&self) -> Option<ElementHandle> {
        self.module.map(|m| m.frame)
    }

    pub fn is_active(&self) -> bool {
        self.module.is_some()
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }
}
