#![forbid(unsafe_code)]

//! Session timeout coordinator.
//!
//! Drives the session dialog from two chained timers. After
//! [`init`](SessionCoordinator::init) a warning timer runs; when it fires the
//! session dialog opens and an expiry timer starts. Continuing cancels both
//! and sends a renewal request; a successful renewal re-arms from scratch,
//! anything else expires the session.
//!
//! ```text
//! Idle ──init──▶ Armed ──warning──▶ WarningShown ──continue──▶ Renewing
//!                  ▲                     │                        │
//!                  └──────── renewed ────┼────────────────────────┘
//!                                        ▼ expiry / renewal failed
//!                                     Expired ──home──▶ (navigate)
//! ```
//!
//! At most one warning and one expiry timer are ever pending. Every
//! transition clears both before scheduling replacements, and responses to
//! superseded requests are dropped.

use std::time::Duration;

use serde_json::{Value, json};
use tarmac_core::dom::Dom;
use tarmac_core::labels::Labels;
use tarmac_core::request::{Navigator, Request, RequestId, Response, Transport};
use tarmac_core::{debug, trace, warn};
use tarmac_overlay::{DialogButton, DialogDescriptor, DialogManager, DialogWidth};

use crate::config::{SessionConfig, flag_value};
use crate::timers::{TimerId, TimerQueue};

/// Dialog id of the session dialog; its content is `#sessionTimeOutDialog`.
pub const SESSION_DIALOG: &str = "sessionTimeOut";

/// Class the session dialog markup must carry to enable the coordinator.
pub const SESSION_MARKER_CLASS: &str = "js-spring";

/// Button action that renews the session.
pub const CONTINUE_ACTION: &str = "session.continue";

/// Button action that leaves an expired session.
pub const HOME_ACTION: &str = "session.home";

pub const RENEW_URL: &str = "/shared/session/renew/";
pub const EXPIRED_URL: &str = "/shared/session/expired/";
pub const CANCEL_RESERVATION_URL: &str = "/home/ajax/cancelVPNR";

/// Destination when the expired-session request fails.
pub const FALLBACK_HOME_URL: &str = "/homePage.do";

/// Label keys.
pub mod labels {
    pub const CONTINUE_BUTTON: &str = "session.warning.button";
    pub const HOME_BUTTON: &str = "session.expired.button";
    pub const EXPIRED_TITLE: &str = "session.expired.title";
    pub const EXPIRED_MESSAGE: &str = "session.expired.message";
}

const CONTINUE_BUTTON: usize = 0;
const HOME_BUTTON: usize = 1;

/// Coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Not armed: before init, without session markup, or after shutdown.
    #[default]
    Idle,
    /// Waiting for the warning (or, in final-display mode, the expiry).
    Armed,
    /// Warning dialog open; expiry timer running.
    WarningShown,
    /// Renewal request in flight; no timers pending.
    Renewing,
    /// Session over; only the home action remains.
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    Warning,
    Expiry,
}

/// Collaborators a coordinator step may touch.
pub struct SessionContext<'a> {
    pub dom: &'a mut dyn Dom,
    pub dialogs: &'a mut DialogManager,
    pub transport: &'a mut dyn Transport,
    pub navigator: &'a mut dyn Navigator,
    pub labels: &'a dyn Labels,
}

/// Session timeout coordinator.
#[derive(Debug)]
pub struct SessionCoordinator {
    config: SessionConfig,
    phase: SessionPhase,
    timers: TimerQueue<TimerKind>,
    warning: Option<TimerId>,
    expiry: Option<TimerId>,
    renewal: Option<RequestId>,
    home: Option<RequestId>,
    release: Option<RequestId>,
    last_renewal_succeeded: Option<bool>,
    final_display: bool,
    registered: bool,
}

impl SessionCoordinator {
    pub fn new(config: SessionConfig) -> Self {
        let final_display = config.final_display;
        Self {
            config,
            phase: SessionPhase::Idle,
            timers: TimerQueue::new(),
            warning: None,
            expiry: None,
            renewal: None,
            home: None,
            release: None,
            last_renewal_succeeded: None,
            final_display,
            registered: false,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Time since the coordinator was created.
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    /// Absolute time the warning is due.
    pub fn warning_deadline(&self) -> Option<Duration> {
        self.warning.and_then(|id| self.timers.deadline(id))
    }

    /// Absolute time the session expires.
    pub fn expiry_deadline(&self) -> Option<Duration> {
        self.expiry.and_then(|id| self.timers.deadline(id))
    }

    /// Number of pending timers.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Outcome of the last renewal, if any completed.
    pub fn last_renewal_succeeded(&self) -> Option<bool> {
        self.last_renewal_succeeded
    }

    pub fn is_final_display(&self) -> bool {
        self.final_display
    }

    /// Whether the session dialog was registered.
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Register the session dialog and arm the timers.
    ///
    /// Does nothing (and returns `false`) unless the page carries
    /// `#sessionTimeOutDialog` marked with [`SESSION_MARKER_CLASS`].
    pub fn init(&mut self, cx: &mut SessionContext<'_>) -> bool {
        let marked = cx
            .dom
            .query(&format!("#{SESSION_DIALOG}Dialog"))
            .first()
            .is_some_and(|&el| cx.dom.has_class(el, SESSION_MARKER_CLASS));
        if !marked {
            trace!("session markup absent; coordinator idle");
            return false;
        }
        let descriptor = DialogDescriptor::new()
            .width(DialogWidth::Small)
            .show_close(false)
            .close_on_escape(false)
            .toggle_scroll(true)
            .z_index(99_999)
            .button(
                DialogButton::new(cx.labels.get_property(labels::CONTINUE_BUTTON))
                    .css_role("no-margin")
                    .action(CONTINUE_ACTION)
                    .closes_on_invoke(false),
            )
            .button(
                DialogButton::new(cx.labels.get_property(labels::HOME_BUTTON))
                    .css_role("no-margin")
                    .action(HOME_ACTION)
                    .closes_on_invoke(false)
                    .hidden(true),
            );
        if !cx.dialogs.register(cx.dom, SESSION_DIALOG, descriptor) {
            return false;
        }
        self.registered = true;
        self.arm();
        true
    }

    fn cancel_timers(&mut self) {
        if let Some(id) = self.warning.take() {
            self.timers.cancel(id);
        }
        if let Some(id) = self.expiry.take() {
            self.timers.cancel(id);
        }
    }

    fn arm(&mut self) {
        self.cancel_timers();
        if self.final_display {
            let delay = self.config.final_delay();
            self.expiry = Some(self.timers.schedule(delay, TimerKind::Expiry));
            debug!(delay_ms = delay.as_millis() as u64, "session armed (final display)");
        } else {
            let delay = self.config.warning_delay();
            self.warning = Some(self.timers.schedule(delay, TimerKind::Warning));
            debug!(delay_ms = delay.as_millis() as u64, "session armed");
        }
        self.phase = SessionPhase::Armed;
    }

    /// Advance time by `dt`, firing due timers in order.
    pub fn advance(&mut self, cx: &mut SessionContext<'_>, dt: Duration) {
        let target = self.timers.now() + dt;
        while let Some((id, kind)) = self.timers.pop_due(target) {
            self.fire(cx, id, kind);
        }
        self.timers.settle(target);
    }

    fn fire(&mut self, cx: &mut SessionContext<'_>, id: TimerId, kind: TimerKind) {
        match kind {
            TimerKind::Warning if self.warning == Some(id) => {
                self.warning = None;
                cx.dialogs.open(cx.dom, SESSION_DIALOG, None);
                self.expiry = Some(
                    self.timers
                        .schedule(self.config.warning_interval, TimerKind::Expiry),
                );
                self.phase = SessionPhase::WarningShown;
                debug!("session warning shown");
            }
            TimerKind::Expiry if self.expiry == Some(id) => {
                self.expiry = None;
                self.expire(cx);
            }
            _ => trace!(timer = id.raw(), "stale session timer ignored"),
        }
    }

    /// Renew the session. Only valid while the warning is shown.
    pub fn continue_session(&mut self, cx: &mut SessionContext<'_>) -> bool {
        if self.phase != SessionPhase::WarningShown {
            trace!(phase = ?self.phase, "continue ignored");
            return false;
        }
        self.cancel_timers();
        cx.dialogs.close(cx.dom, SESSION_DIALOG);
        let url = if self.config.pending_reservation {
            format!(
                "{RENEW_URL}?virtualPnr=true&bookingPathStateId={}",
                self.config.booking_path_state_id
            )
        } else {
            RENEW_URL.to_owned()
        };
        let request = Request::post(url).timeout(self.config.request_timeout);
        self.renewal = Some(cx.transport.send(request));
        self.phase = SessionPhase::Renewing;
        debug!("session renewal requested");
        true
    }

    /// Deliver a request completion. Returns `false` for ids this
    /// coordinator is no longer waiting on.
    pub fn on_response(
        &mut self,
        cx: &mut SessionContext<'_>,
        id: RequestId,
        response: Response,
    ) -> bool {
        if self.renewal == Some(id) {
            self.renewal = None;
            self.on_renewal(cx, response);
            true
        } else if self.home == Some(id) {
            self.home = None;
            let url = match response {
                Ok(body) if !body.trim().is_empty() => body.trim().to_owned(),
                Ok(_) => FALLBACK_HOME_URL.to_owned(),
                Err(err) => {
                    warn!(error = %err, "expired-session request failed");
                    FALLBACK_HOME_URL.to_owned()
                }
            };
            cx.navigator.navigate(&url);
            true
        } else if self.release == Some(id) {
            self.release = None;
            if let Err(err) = response {
                warn!(error = %err, "reservation release failed");
            }
            true
        } else {
            trace!(request = id.raw(), "stale response ignored");
            false
        }
    }

    fn on_renewal(&mut self, cx: &mut SessionContext<'_>, response: Response) {
        match response {
            Ok(body) => {
                self.last_renewal_succeeded = Some(true);
                if self.config.pending_reservation {
                    self.final_display = serde_json::from_str::<Value>(&body)
                        .ok()
                        .and_then(|v| v.get("finalVirtualPNRModal").map(flag_value))
                        .unwrap_or(false);
                }
                debug!(final_display = self.final_display, "session renewed");
                self.arm();
            }
            Err(err) => {
                self.last_renewal_succeeded = Some(false);
                warn!(error = %err, "session renewal failed");
                self.expire(cx);
            }
        }
    }

    /// Switch the dialog to its expired form and show it.
    pub fn expire(&mut self, cx: &mut SessionContext<'_>) {
        self.cancel_timers();
        self.phase = SessionPhase::Expired;
        warn!("session expired");
        let dom = &mut *cx.dom;
        let dialogs = &mut *cx.dialogs;
        dialogs.set_title(dom, SESSION_DIALOG, &cx.labels.get_property(labels::EXPIRED_TITLE));
        dialogs.set_body(
            dom,
            SESSION_DIALOG,
            &cx.labels.get_property(labels::EXPIRED_MESSAGE),
        );
        dialogs.set_button_hidden(dom, SESSION_DIALOG, CONTINUE_BUTTON, true);
        dialogs.set_button_hidden(dom, SESSION_DIALOG, HOME_BUTTON, false);
        dialogs.close(dom, SESSION_DIALOG);
        dialogs.open(dom, SESSION_DIALOG, None);

        if self.config.pending_reservation && self.release.is_none() {
            let request = Request::get(CANCEL_RESERVATION_URL)
                .data(json!({ "bookingPathStateId": self.config.booking_path_state_id }))
                .timeout(self.config.request_timeout);
            self.release = Some(cx.transport.send(request));
            debug!("pending reservation released");
        }
    }

    /// Leave the expired session.
    pub fn go_home(&mut self, cx: &mut SessionContext<'_>) -> bool {
        if self.phase != SessionPhase::Expired || self.home.is_some() {
            trace!(phase = ?self.phase, "home ignored");
            return false;
        }
        self.cancel_timers();
        let request = Request::post(EXPIRED_URL).timeout(self.config.request_timeout);
        self.home = Some(cx.transport.send(request));
        debug!("expired-session request sent");
        true
    }

    /// Run a session dialog button action. Returns `false` for actions the
    /// coordinator does not own.
    pub fn handle_action(&mut self, cx: &mut SessionContext<'_>, action: &str) -> bool {
        match action {
            CONTINUE_ACTION => self.continue_session(cx),
            HOME_ACTION => self.go_home(cx),
            _ => false,
        }
    }

    /// Cancel every timer and forget outstanding requests.
    pub fn shutdown(&mut self) {
        self.cancel_timers();
        self.timers.clear();
        self.renewal = None;
        self.home = None;
        self.release = None;
        self.phase = SessionPhase::Idle;
        debug!("session coordinator shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarmac_core::dom::ElementHandle;
    use tarmac_core::geometry::{Rect, Size};
    use tarmac_core::labels::LabelTable;
    use tarmac_core::request::{Method, RequestError};
    use tarmac_core::testing::{MockDom, MockTransport, RecordingNavigator};
    use tarmac_overlay::DialogPhase;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    struct Harness {
        dom: MockDom,
        dialogs: DialogManager,
        transport: MockTransport,
        navigator: RecordingNavigator,
        labels: LabelTable,
        body: ElementHandle,
    }

    impl Harness {
        fn new() -> Self {
            let mut dom = MockDom::new(Size::new(1280.0, 900.0));
            let content = dom.insert_with_id(None, "div", "sessionTimeOutDialog");
            dom.add_class(content, SESSION_MARKER_CLASS);
            dom.set_rect(content, Rect::new(0.0, 0.0, 500.0, 120.0));
            let body = dom.insert(Some(content), "p");
            dom.add_class(body, "js-dialogBody");
            dom.set_html(body, "Your session is about to expire.");
            let title = dom.insert_with_id(None, "span", "sessionTimeOutTitle");
            dom.set_html(title, "Still there?");
            let labels = LabelTable::new()
                .with(labels::CONTINUE_BUTTON, "Continue")
                .with(labels::HOME_BUTTON, "Home")
                .with(labels::EXPIRED_TITLE, "Session expired")
                .with(labels::EXPIRED_MESSAGE, "Please start again.");
            Self {
                dom,
                dialogs: DialogManager::new(),
                transport: MockTransport::new(),
                navigator: RecordingNavigator::new(),
                labels,
                body,
            }
        }

        fn cx(&mut self) -> SessionContext<'_> {
            SessionContext {
                dom: &mut self.dom,
                dialogs: &mut self.dialogs,
                transport: &mut self.transport,
                navigator: &mut self.navigator,
                labels: &self.labels,
            }
        }

        fn last_request(&self) -> (RequestId, Request) {
            self.transport.last().cloned().expect("a request")
        }
    }

    fn standard() -> SessionConfig {
        SessionConfig::new(ms(60_000), ms(10_000))
    }

    fn armed(config: SessionConfig) -> (Harness, SessionCoordinator) {
        let mut h = Harness::new();
        let mut s = SessionCoordinator::new(config);
        assert!(s.init(&mut h.cx()));
        (h, s)
    }

    #[test]
    fn init_without_markup_stays_idle() {
        let mut h = Harness::new();
        let content = h.dom.query("#sessionTimeOutDialog")[0];
        h.dom.remove_class(content, SESSION_MARKER_CLASS);
        let mut s = SessionCoordinator::new(standard());
        assert!(!s.init(&mut h.cx()));
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert_eq!(s.pending_timers(), 0);
        assert!(!h.dialogs.is_registered(SESSION_DIALOG));
    }

    #[test]
    fn init_registers_session_dialog() {
        let (h, s) = armed(standard());
        assert!(s.is_registered());
        let d = h.dialogs.descriptor(SESSION_DIALOG).expect("registered");
        assert_eq!(d.width, DialogWidth::Small);
        assert!(!d.show_close);
        assert!(!d.close_on_escape);
        assert!(d.toggle_scroll);
        assert_eq!(d.z_index, 99_999);
        assert_eq!(d.buttons.len(), 2);
        assert_eq!(d.buttons[0].label, "Continue");
        assert!(!d.buttons[0].closes_on_invoke);
        assert!(d.buttons[1].hidden);
        assert_eq!(s.phase(), SessionPhase::Armed);
    }

    #[test]
    fn warning_opens_at_45_seconds() {
        let (mut h, mut s) = armed(standard());
        assert_eq!(s.warning_deadline(), Some(ms(45_000)));

        s.advance(&mut h.cx(), ms(44_999));
        assert_eq!(s.phase(), SessionPhase::Armed);
        assert!(!h.dialogs.is_open(SESSION_DIALOG));

        s.advance(&mut h.cx(), ms(1));
        assert_eq!(s.phase(), SessionPhase::WarningShown);
        assert!(h.dialogs.is_open(SESSION_DIALOG));
        assert_eq!(s.warning_deadline(), None);
        assert_eq!(s.expiry_deadline(), Some(ms(55_000)));
        assert_eq!(s.pending_timers(), 1);
    }

    #[test]
    fn unanswered_warning_expires() {
        let (mut h, mut s) = armed(standard());
        s.advance(&mut h.cx(), ms(55_000));
        assert_eq!(s.phase(), SessionPhase::Expired);
        assert_eq!(s.pending_timers(), 0);

        assert!(h.dialogs.is_open(SESSION_DIALOG));
        let heading = h.dialogs.heading(SESSION_DIALOG).expect("heading");
        assert_eq!(h.dom.html(heading), "Session expired");
        assert_eq!(h.dom.html(h.body), "Please start again.");
        let cont = h.dialogs.button(SESSION_DIALOG, 0).expect("continue");
        let home = h.dialogs.button(SESSION_DIALOG, 1).expect("home");
        assert!(h.dom.has_class(cont, "is-hidden"));
        assert!(!h.dom.has_class(home, "is-hidden"));
        assert!(h.transport.requests().is_empty());
    }

    #[test]
    fn renewal_success_rearms_one_timer() {
        let (mut h, mut s) = armed(standard());
        s.advance(&mut h.cx(), ms(45_000));
        assert!(s.handle_action(&mut h.cx(), CONTINUE_ACTION));
        assert_eq!(s.phase(), SessionPhase::Renewing);
        assert_eq!(s.pending_timers(), 0);
        assert!(!h.dialogs.is_open(SESSION_DIALOG));

        let (id, req) = h.last_request();
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.url, RENEW_URL);
        assert_eq!(req.timeout, Some(ms(50_000)));

        s.advance(&mut h.cx(), ms(3_000));
        assert!(s.on_response(&mut h.cx(), id, Ok("{}".to_owned())));
        assert_eq!(s.phase(), SessionPhase::Armed);
        assert_eq!(s.last_renewal_succeeded(), Some(true));
        assert_eq!(s.pending_timers(), 1);
        assert_eq!(s.warning_deadline(), Some(ms(48_000 + 45_000)));

        // The old expiry deadline passes without effect.
        s.advance(&mut h.cx(), ms(40_000));
        assert_eq!(s.phase(), SessionPhase::Armed);
        assert!(!h.dialogs.is_open(SESSION_DIALOG));
    }

    #[test]
    fn renewal_failure_expires() {
        let (mut h, mut s) = armed(standard());
        s.advance(&mut h.cx(), ms(45_000));
        s.continue_session(&mut h.cx());
        let (id, _) = h.last_request();
        assert!(s.on_response(&mut h.cx(), id, Err(RequestError::Status(500))));
        assert_eq!(s.phase(), SessionPhase::Expired);
        assert_eq!(s.last_renewal_succeeded(), Some(false));
        assert_eq!(h.dialogs.phase(SESSION_DIALOG), DialogPhase::Open);
        assert_eq!(s.pending_timers(), 0);
    }

    #[test]
    fn continue_outside_warning_is_ignored() {
        let (mut h, mut s) = armed(standard());
        assert!(!s.continue_session(&mut h.cx()));
        assert!(h.transport.requests().is_empty());
        assert_eq!(s.phase(), SessionPhase::Armed);
    }

    #[test]
    fn stale_responses_are_dropped() {
        let (mut h, mut s) = armed(standard());
        s.advance(&mut h.cx(), ms(45_000));
        s.continue_session(&mut h.cx());
        let (id, _) = h.last_request();
        s.shutdown();
        assert!(!s.on_response(&mut h.cx(), id, Ok(String::new())));
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert!(!s.on_response(&mut h.cx(), RequestId::new(999), Ok(String::new())));
    }

    #[test]
    fn pending_reservation_travels_with_renewal_and_expiry() {
        let config = standard().pending_reservation("bps-42");
        let (mut h, mut s) = armed(config);
        s.advance(&mut h.cx(), ms(45_000));
        s.continue_session(&mut h.cx());
        let (id, req) = h.last_request();
        assert_eq!(
            req.url,
            "/shared/session/renew/?virtualPnr=true&bookingPathStateId=bps-42"
        );

        s.on_response(
            &mut h.cx(),
            id,
            Ok(r#"{"finalVirtualPNRModal":true}"#.to_owned()),
        );
        assert!(s.is_final_display());
        assert_eq!(s.warning_deadline(), None);
        assert_eq!(s.expiry_deadline(), Some(ms(45_000 + 55_000)));

        s.advance(&mut h.cx(), ms(55_000));
        assert_eq!(s.phase(), SessionPhase::Expired);
        let (_, cancel) = h.last_request();
        assert_eq!(cancel.method, Method::Get);
        assert_eq!(cancel.url, CANCEL_RESERVATION_URL);
        assert_eq!(
            cancel.data,
            Some(json!({ "bookingPathStateId": "bps-42" }))
        );
    }

    #[test]
    fn final_display_skips_warning() {
        let (mut h, mut s) = armed(standard().final_display(true));
        assert_eq!(s.warning_deadline(), None);
        assert_eq!(s.expiry_deadline(), Some(ms(55_000)));
        s.advance(&mut h.cx(), ms(54_999));
        assert!(!h.dialogs.is_open(SESSION_DIALOG));
        s.advance(&mut h.cx(), ms(1));
        assert_eq!(s.phase(), SessionPhase::Expired);
        assert!(h.dialogs.is_open(SESSION_DIALOG));
    }

    #[test]
    fn home_navigates_to_returned_url() {
        let (mut h, mut s) = armed(standard());
        s.advance(&mut h.cx(), ms(55_000));
        assert!(s.handle_action(&mut h.cx(), HOME_ACTION));
        assert!(!s.go_home(&mut h.cx()));
        let (id, req) = h.last_request();
        assert_eq!(req.url, EXPIRED_URL);
        assert_eq!(req.method, Method::Post);
        s.on_response(&mut h.cx(), id, Ok("/landing.do\n".to_owned()));
        assert_eq!(h.navigator.visited, vec!["/landing.do".to_owned()]);
    }

    #[test]
    fn home_failure_falls_back() {
        let (mut h, mut s) = armed(standard());
        s.advance(&mut h.cx(), ms(55_000));
        s.go_home(&mut h.cx());
        let (id, _) = h.last_request();
        s.on_response(&mut h.cx(), id, Err(RequestError::Timeout));
        assert_eq!(h.navigator.visited, vec![FALLBACK_HOME_URL.to_owned()]);
    }

    #[test]
    fn shutdown_cancels_all_timers() {
        let (mut h, mut s) = armed(standard());
        s.shutdown();
        assert_eq!(s.pending_timers(), 0);
        s.advance(&mut h.cx(), ms(120_000));
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert!(!h.dialogs.is_open(SESSION_DIALOG));
    }

    #[test]
    fn unknown_actions_are_not_handled() {
        let (mut h, mut s) = armed(standard());
        assert!(!s.handle_action(&mut h.cx(), "save"));
        assert!(!s.handle_action(&mut h.cx(), HOME_ACTION));
        assert!(h.transport.requests().is_empty());
    }
}
