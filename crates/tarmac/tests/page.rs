//! Page-level routing tests: events, button actions, session timers and
//! request completions flowing through one [`Page`].

use std::time::Duration;

use tarmac::prelude::*;
use tarmac::{ConfigError, DialogPhase, RequestError, SessionPhase, TooltipPhase};
use tarmac_core::geometry::{Rect, Size};
use tarmac_core::testing::{MockDom, MockTransport, RecordingNavigator};

type TestPage = Page<MockDom, MockTransport, RecordingNavigator, LabelTable>;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn dom() -> MockDom {
    let mut dom = MockDom::new(Size::new(1280.0, 900.0));
    dom.size_for_class("tooltip", Size::new(220.0, 90.0));
    dom
}

fn page_with(dom: MockDom, labels: LabelTable) -> TestPage {
    Page::new(dom, MockTransport::new(), RecordingNavigator::new(), labels)
}

fn session_labels() -> LabelTable {
    LabelTable::new()
        .with("sessionTimeOut", "60")
        .with("sessionExpiresWarningInterval", "10000")
        .with("session.warning.button", "Continue")
        .with("session.expired.button", "Home")
}

fn session_dom() -> MockDom {
    let mut dom = dom();
    let content = dom.insert_with_id(None, "div", "sessionTimeOutDialog");
    dom.add_class(content, "js-spring");
    dom.set_rect(content, Rect::new(0.0, 0.0, 500.0, 120.0));
    dom
}

#[test]
fn clicks_reach_tooltips_when_no_dialog_claims_them() {
    let mut dom = dom();
    let anchor = dom.insert(None, "span");
    dom.add_class(anchor, "hint");
    dom.set_rect(anchor, Rect::new(300.0, 300.0, 20.0, 20.0));
    let elsewhere = dom.insert(None, "p");

    let mut page = page_with(dom, LabelTable::new());
    let tip = page.configure_tooltip("hint", TooltipConfig::new(".hint").text("Help"));

    assert_eq!(
        page.dispatch(&Event::Click { target: anchor }),
        Propagation::Stop
    );
    assert_eq!(page.tooltips().phase(tip), TooltipPhase::Visible);

    assert_eq!(
        page.dispatch(&Event::Click { target: elsewhere }),
        Propagation::Continue
    );
    assert!(!page.tooltips().is_visible(tip));
}

#[test]
fn default_tooltips_are_installed_on_request() {
    let page = page_with(dom(), LabelTable::new()).with_default_tooltips();
    assert!(page.tooltips().handle("default-warning").is_some());
}

#[test]
fn dialog_link_opens_and_button_action_is_queued() {
    let mut dom = dom();
    let content = dom.insert_with_id(None, "div", "confirmDialog");
    dom.set_rect(content, Rect::new(0.0, 0.0, 400.0, 100.0));
    let link = dom.insert(None, "a");
    dom.add_class(link, "dialog-link-confirm");

    let mut page = page_with(dom, LabelTable::new());
    assert!(page.register_dialog(
        "confirm",
        DialogDescriptor::new().button(DialogButton::new("Yes").action("confirm.yes")),
    ));

    assert_eq!(
        page.dispatch(&Event::Click { target: link }),
        Propagation::Stop
    );
    assert!(page.dialogs().is_open("confirm"));

    let button = page.dialogs().button("confirm", 0).expect("button");
    assert_eq!(
        page.dispatch(&Event::Click { target: button }),
        Propagation::Stop
    );
    let actions = page.take_actions();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].action.as_deref(), Some("confirm.yes"));
    assert_eq!(page.dialogs().phase("confirm"), DialogPhase::Closed);
    assert!(page.take_actions().is_empty());
}

#[test]
fn session_needs_markup() {
    let mut page = page_with(dom(), session_labels());
    assert_eq!(page.start_session_from_labels(), Ok(false));
    assert!(page.session().is_none());
}

#[test]
fn session_properties_must_parse() {
    let mut page = page_with(session_dom(), LabelTable::new());
    let err = page.start_session_from_labels().unwrap_err();
    assert_eq!(err, Error::Config(ConfigError::missing("sessionTimeOut")));
}

#[test]
fn session_warning_continue_and_renewal() {
    let mut page = page_with(session_dom(), session_labels());
    assert_eq!(page.start_session_from_labels(), Ok(true));

    page.advance(ms(45_000));
    assert!(page.dialogs().is_open("sessionTimeOut"));

    let cont = page.dialogs().button("sessionTimeOut", 0).expect("continue");
    page.dispatch(&Event::Click { target: cont });
    assert!(page.take_actions().is_empty());
    assert!(!page.dialogs().is_open("sessionTimeOut"));
    let session = page.session().expect("session");
    assert_eq!(session.phase(), SessionPhase::Renewing);

    let (id, request) = page.transport().last().cloned().expect("renewal");
    assert_eq!(request.url, "/shared/session/renew/");
    assert_eq!(page.deliver(id, Ok("{}".to_owned())), Ok(()));
    assert_eq!(page.session().map(|s| s.phase()), Some(SessionPhase::Armed));

    // Delivering the same id twice is a no-op.
    assert_eq!(page.deliver(id, Err(RequestError::Aborted)), Ok(()));
    assert_eq!(page.session().map(|s| s.phase()), Some(SessionPhase::Armed));
}

#[test]
fn failed_renewal_surfaces_and_expires() {
    let mut page = page_with(session_dom(), session_labels());
    page.start_session_from_labels().expect("config");
    page.advance(ms(45_000));
    let cont = page.dialogs().button("sessionTimeOut", 0).expect("continue");
    page.dispatch(&Event::Click { target: cont });
    let (id, _) = page.transport().last().cloned().expect("renewal");

    let err = page
        .deliver(id, Err(RequestError::Status(503)))
        .unwrap_err();
    assert_eq!(err, Error::Request(RequestError::Status(503)));
    assert_eq!(err.to_string(), "request failed with status 503");
    assert_eq!(page.session().map(|s| s.phase()), Some(SessionPhase::Expired));
    assert!(page.dialogs().is_open("sessionTimeOut"));

    let home = page.dialogs().button("sessionTimeOut", 1).expect("home");
    page.dispatch(&Event::Click { target: home });
    let (id, request) = page.transport().last().cloned().expect("home request");
    assert_eq!(request.url, "/shared/session/expired/");
    page.deliver(id, Ok("/start".to_owned())).expect("home ok");
    assert_eq!(page.navigator().visited, vec!["/start".to_owned()]);
}

#[test]
fn escape_does_not_close_session_dialog() {
    let mut page = page_with(session_dom(), session_labels());
    page.start_session_from_labels().expect("config");
    page.advance(ms(45_000));
    page.dispatch(&Event::KeyDown { key: Key::Escape });
    assert!(page.dialogs().is_open("sessionTimeOut"));
}

#[test]
fn shutdown_stops_timers_and_closes_overlays() {
    let mut page = page_with(session_dom(), session_labels());
    page.start_session_from_labels().expect("config");
    page.advance(ms(45_000));
    page.shutdown();
    assert!(!page.dialogs().is_open("sessionTimeOut"));
    assert_eq!(page.session().map(|s| s.pending_timers()), Some(0));
    page.advance(ms(60_000));
    assert_eq!(page.session().map(|s| s.phase()), Some(SessionPhase::Idle));
}

#[test]
fn errors_convert_and_chain() {
    use std::error::Error as _;
    let err: Error = ConfigError::missing("k").into();
    assert_eq!(err.to_string(), "missing property `k`");
    assert!(err.source().is_some());
    let err: Error = RequestError::Timeout.into();
    assert!(matches!(err, Error::Request(RequestError::Timeout)));
}
