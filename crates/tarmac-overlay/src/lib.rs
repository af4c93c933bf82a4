#![forbid(unsafe_code)]

//! Overlays: tooltip placement, the named tooltip registry and the modal
//! dialog lifecycle.
//!
//! Every component here is driven from outside. Page events arrive as
//! [`tarmac_core::event::Event`]s, time arrives as `tick(dt)` calls, and all
//! document access goes through a `&mut dyn Dom` passed into each call.

pub mod busy;
pub mod dialog;
pub mod layout;
pub mod manager;
pub mod positioner;
pub mod registry;
pub mod tooltip;

pub use busy::BusyOverlay;
pub use dialog::{
    ButtonInvocation, DeviceClass, DialogButton, DialogDescriptor, DialogHooks, DialogOutcome,
    DialogPhase, DialogPosition, DialogWidth, HeightPolicy, NoDialogHooks,
};
pub use layout::{ChromeMetrics, DialogLayout, FramePosition, LayoutParams, compute_layout};
pub use manager::DialogManager;
pub use positioner::{Placement, SideFlags, VerticalPolicy, place};
pub use registry::TooltipRegistry;
pub use tooltip::{
    Dimension, NoHooks, TooltipConfig, TooltipHandle, TooltipHooks, TooltipPhase, TriggerMode,
};
