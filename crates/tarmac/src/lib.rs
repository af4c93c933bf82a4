#![forbid(unsafe_code)]

//! Tarmac public facade crate.
//!
//! Re-exports the overlay and session types and provides [`Page`], the
//! application root that owns the tooltip registry, the dialog manager and
//! the session coordinator, routes page events to them and advances their
//! timers.

use std::fmt;
use std::time::Duration;

// --- Core re-exports -------------------------------------------------------

pub use tarmac_core::dom::{Dom, ElementHandle};
pub use tarmac_core::error::ConfigError;
pub use tarmac_core::event::{Event, Key, Propagation};
pub use tarmac_core::geometry::{Rect, ScrollOffsets, Size};
pub use tarmac_core::labels::{LabelTable, Labels};
pub use tarmac_core::request::{
    Method, Navigator, Request, RequestError, RequestId, Response, Transport,
};

// --- Overlay re-exports ----------------------------------------------------

pub use tarmac_overlay::{
    ButtonInvocation, DeviceClass, DialogButton, DialogDescriptor, DialogHooks, DialogManager,
    DialogOutcome, DialogPhase, DialogPosition, DialogWidth, HeightPolicy, Placement, SideFlags,
    TooltipConfig, TooltipHandle, TooltipHooks, TooltipPhase, TooltipRegistry, TriggerMode,
    VerticalPolicy, place,
};

// --- Session re-exports ----------------------------------------------------

pub use tarmac_session::{SessionConfig, SessionContext, SessionCoordinator, SessionPhase};

use tarmac_core::{debug, trace};
use tarmac_session::coordinator::{CONTINUE_ACTION, HOME_ACTION, SESSION_DIALOG, SESSION_MARKER_CLASS};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for Tarmac pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Label table or session properties failed to load.
    Config(ConfigError),
    /// A request completed with a failure.
    Request(RequestError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Request(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Request(err) => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<RequestError> for Error {
    fn from(err: RequestError) -> Self {
        Self::Request(err)
    }
}

/// Standard result type for Tarmac APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Page ------------------------------------------------------------------

/// Application root for one page.
///
/// Owns the host collaborators and the three overlay components. Events go
/// to the dialog manager first; whatever it ignores reaches the tooltips.
/// Dialog button presses whose action belongs to the session coordinator run
/// there; any other action is queued for the host (see
/// [`take_actions`](Self::take_actions)).
pub struct Page<D, T, N, L> {
    dom: D,
    transport: T,
    navigator: N,
    labels: L,
    tooltips: TooltipRegistry,
    dialogs: DialogManager,
    session: Option<SessionCoordinator>,
    actions: Vec<ButtonInvocation>,
}

impl<D, T, N, L> fmt::Debug for Page<D, T, N, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("tooltips", &self.tooltips)
            .field("dialogs", &self.dialogs)
            .field("session", &self.session)
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

impl<D, T, N, L> Page<D, T, N, L>
where
    D: Dom,
    T: Transport,
    N: Navigator,
    L: Labels,
{
    pub fn new(dom: D, transport: T, navigator: N, labels: L) -> Self {
        Self {
            dom,
            transport,
            navigator,
            labels,
            tooltips: TooltipRegistry::new(),
            dialogs: DialogManager::new(),
            session: None,
            actions: Vec::new(),
        }
    }

    /// Lay dialogs out for `device`.
    #[must_use]
    pub fn with_device(mut self, device: DeviceClass) -> Self {
        self.dialogs.set_device(device);
        self
    }

    /// Register the stock `default*` tooltips.
    #[must_use]
    pub fn with_default_tooltips(mut self) -> Self {
        self.tooltips.install_defaults();
        self
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn labels(&self) -> &L {
        &self.labels
    }

    pub fn tooltips(&self) -> &TooltipRegistry {
        &self.tooltips
    }

    pub fn dialogs(&self) -> &DialogManager {
        &self.dialogs
    }

    pub fn session(&self) -> Option<&SessionCoordinator> {
        self.session.as_ref()
    }

    /// Configure a tooltip. See [`TooltipRegistry::configure`].
    pub fn configure_tooltip(&mut self, name: &str, config: TooltipConfig) -> TooltipHandle {
        self.tooltips.configure(name, config)
    }

    pub fn open_tooltip(&mut self, handle: TooltipHandle, anchor: Option<ElementHandle>) -> bool {
        self.tooltips.open(&mut self.dom, handle, anchor)
    }

    pub fn close_tooltip(&mut self, handle: TooltipHandle) -> bool {
        self.tooltips.close(&mut self.dom, handle)
    }

    /// Register a dialog. See [`DialogManager::register`].
    pub fn register_dialog(&mut self, id: &str, descriptor: DialogDescriptor) -> bool {
        self.dialogs.register(&mut self.dom, id, descriptor)
    }

    pub fn register_dialog_with_hooks(
        &mut self,
        id: &str,
        descriptor: DialogDescriptor,
        hooks: Box<dyn DialogHooks>,
    ) -> bool {
        self.dialogs
            .register_with_hooks(&mut self.dom, id, descriptor, hooks)
    }

    pub fn open_dialog(&mut self, id: &str, trigger: Option<ElementHandle>) -> bool {
        self.dialogs.open(&mut self.dom, id, trigger)
    }

    pub fn close_dialog(&mut self, id: &str) -> bool {
        self.dialogs.close(&mut self.dom, id)
    }

    pub fn resize_dialog(&mut self, id: &str) -> bool {
        self.dialogs.resize(&mut self.dom, id)
    }

    pub fn busy_start(&mut self, message: &str) -> bool {
        self.dialogs.busy_start(&mut self.dom, message)
    }

    pub fn busy_stop(&mut self) -> bool {
        self.dialogs.busy_stop()
    }

    /// Start the session coordinator with `config`.
    ///
    /// Returns `false` when the page has no session dialog markup; the
    /// coordinator then stays idle and is not kept.
    pub fn start_session(&mut self, config: SessionConfig) -> bool {
        let Self {
            dom,
            transport,
            navigator,
            labels,
            dialogs,
            session,
            ..
        } = self;
        let mut coordinator = SessionCoordinator::new(config);
        let mut cx = SessionContext {
            dom,
            dialogs,
            transport,
            navigator,
            labels,
        };
        if coordinator.init(&mut cx) {
            *session = Some(coordinator);
            true
        } else {
            false
        }
    }

    /// Start the session coordinator from the page properties.
    ///
    /// Pages without session dialog markup succeed with `false` without
    /// reading any property.
    pub fn start_session_from_labels(&mut self) -> Result<bool> {
        if !self.has_session_markup() {
            trace!("no session markup; properties not read");
            return Ok(false);
        }
        let config = SessionConfig::from_labels(&self.labels)?;
        Ok(self.start_session(config))
    }

    fn has_session_markup(&self) -> bool {
        self.dom
            .query(&format!("#{SESSION_DIALOG}Dialog"))
            .first()
            .is_some_and(|&el| self.dom.has_class(el, SESSION_MARKER_CLASS))
    }

    /// Route a page event.
    pub fn dispatch(&mut self, event: &Event) -> Propagation {
        match self.dialogs.handle_event(&mut self.dom, event) {
            DialogOutcome::Handled => Propagation::Stop,
            DialogOutcome::Button(invocation) => {
                self.run_invocation(invocation);
                Propagation::Stop
            }
            DialogOutcome::Ignored => self.tooltips.handle_event(&mut self.dom, event),
        }
    }

    fn run_invocation(&mut self, invocation: ButtonInvocation) {
        let session_owned = matches!(
            invocation.action.as_deref(),
            Some(CONTINUE_ACTION | HOME_ACTION)
        );
        if session_owned {
            let Self {
                dom,
                transport,
                navigator,
                labels,
                dialogs,
                session,
                ..
            } = self;
            if let (Some(session), Some(action)) = (session.as_mut(), invocation.action.as_deref())
            {
                let mut cx = SessionContext {
                    dom,
                    dialogs,
                    transport,
                    navigator,
                    labels,
                };
                session.handle_action(&mut cx, action);
            }
        } else {
            debug!(dialog = %invocation.dialog, index = invocation.index, "button action queued");
            self.actions.push(invocation.clone());
        }
        self.dialogs.complete_invocation(&mut self.dom, &invocation);
    }

    /// Button presses awaiting the host, oldest first.
    pub fn take_actions(&mut self) -> Vec<ButtonInvocation> {
        std::mem::take(&mut self.actions)
    }

    /// Advance time: session timers first, then dialog and tooltip
    /// transitions.
    pub fn advance(&mut self, dt: Duration) {
        let Self {
            dom,
            transport,
            navigator,
            labels,
            dialogs,
            session,
            ..
        } = self;
        if let Some(session) = session.as_mut() {
            let mut cx = SessionContext {
                dom,
                dialogs,
                transport,
                navigator,
                labels,
            };
            session.advance(&mut cx, dt);
        }
        self.dialogs.tick(&mut self.dom, dt);
        self.tooltips.tick(&mut self.dom, dt);
    }

    /// Deliver the completion of a request sent through the transport.
    ///
    /// Returns the failure, if any, after the owning component has handled
    /// it. Responses nobody is waiting on are dropped.
    pub fn deliver(&mut self, id: RequestId, response: Response) -> Result<()> {
        let failure = response.as_ref().err().cloned();
        let Self {
            dom,
            transport,
            navigator,
            labels,
            dialogs,
            session,
            ..
        } = self;
        let Some(session) = session.as_mut() else {
            trace!(request = id.raw(), "response without a session");
            return Ok(());
        };
        let mut cx = SessionContext {
            dom,
            dialogs,
            transport,
            navigator,
            labels,
        };
        if !session.on_response(&mut cx, id, response) {
            return Ok(());
        }
        match failure {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    /// Tear the page down: stop session timers and close every overlay.
    pub fn shutdown(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.shutdown();
        }
        self.tooltips.close_all(&mut self.dom);
        self.dialogs.close_active(&mut self.dom);
        debug!("page shut down");
    }
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        DialogButton, DialogDescriptor, DialogWidth, Dom, ElementHandle, Error, Event, Key,
        LabelTable, Labels, Navigator, Page, Propagation, Result, SessionConfig, TooltipConfig,
        Transport, TriggerMode,
    };

    pub use crate::{core, overlay, session};
}

pub use tarmac_core as core;
pub use tarmac_overlay as overlay;
pub use tarmac_session as session;
