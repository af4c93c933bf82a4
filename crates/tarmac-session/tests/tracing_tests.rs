#![forbid(unsafe_code)]
#![cfg(feature = "tracing")]

//! Logging integration tests for the session coordinator.
//!
//! Arming and renewal log at debug level; failed renewals and expiry log at
//! warn level. Run with:
//!   cargo test -p tarmac-session --test tracing_tests

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tarmac_core::dom::Dom;
use tarmac_core::geometry::{Rect, Size};
use tarmac_core::labels::LabelTable;
use tarmac_core::request::RequestError;
use tarmac_core::testing::{MockDom, MockTransport, RecordingNavigator};
use tarmac_overlay::DialogManager;
use tarmac_session::coordinator::SESSION_MARKER_CLASS;
use tarmac_session::{SessionConfig, SessionContext, SessionCoordinator};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: Level,
    message: String,
}

#[derive(Clone, Default)]
struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl EventCapture {
    fn level_of(&self, message: &str) -> Option<Level> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.message == message)
            .map(|e| e.level)
    }
}

struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.0,
        });
    }
}

fn with_capture(f: impl FnOnce()) -> EventCapture {
    let capture = EventCapture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    tracing::subscriber::with_default(subscriber, f);
    capture
}

struct Page {
    dom: MockDom,
    dialogs: DialogManager,
    transport: MockTransport,
    navigator: RecordingNavigator,
    labels: LabelTable,
}

impl Page {
    fn new() -> Self {
        let mut dom = MockDom::new(Size::new(1024.0, 768.0));
        let content = dom.insert_with_id(None, "div", "sessionTimeOutDialog");
        dom.add_class(content, SESSION_MARKER_CLASS);
        dom.set_rect(content, Rect::new(0.0, 0.0, 400.0, 100.0));
        Self {
            dom,
            dialogs: DialogManager::new(),
            transport: MockTransport::new(),
            navigator: RecordingNavigator::new(),
            labels: LabelTable::new(),
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
}

// ============================================================================
// Session
// ============================================================================

#[test]
fn renewal_logs_at_debug() {
    let capture = with_capture(|| {
        let mut page = Page::new();
        let mut session = SessionCoordinator::new(SessionConfig::new(
            Duration::from_secs(60),
            Duration::from_secs(10),
        ));
        session.init(&mut page.cx());
        session.advance(&mut page.cx(), Duration::from_secs(45));
        session.continue_session(&mut page.cx());
        let (id, _) = page.transport.take().pop().unwrap();
        session.on_response(&mut page.cx(), id, Ok(String::new()));
    });

    for message in [
        "session armed",
        "session warning shown",
        "session renewal requested",
        "session renewed",
    ] {
        assert_eq!(capture.level_of(message), Some(Level::DEBUG), "{message}");
    }
    assert_eq!(capture.level_of("session expired"), None);
}

#[test]
fn failure_and_expiry_log_at_warn() {
    let capture = with_capture(|| {
        let mut page = Page::new();
        let mut session = SessionCoordinator::new(SessionConfig::new(
            Duration::from_secs(60),
            Duration::from_secs(10),
        ));
        session.init(&mut page.cx());
        session.advance(&mut page.cx(), Duration::from_secs(45));
        session.continue_session(&mut page.cx());
        let (id, _) = page.transport.take().pop().unwrap();
        session.on_response(&mut page.cx(), id, Err(RequestError::Timeout));
    });

    assert_eq!(
        capture.level_of("session renewal failed"),
        Some(Level::WARN)
    );
    assert_eq!(capture.level_of("session expired"), Some(Level::WARN));
}

#[test]
fn stale_responses_log_at_trace() {
    let capture = with_capture(|| {
        let mut page = Page::new();
        let mut session = SessionCoordinator::new(SessionConfig::new(
            Duration::from_secs(60),
            Duration::from_secs(10),
        ));
        session.init(&mut page.cx());
        session.on_response(
            &mut page.cx(),
            tarmac_core::request::RequestId::new(42),
            Ok(String::new()),
        );
    });
    assert_eq!(
        capture.level_of("stale response ignored"),
        Some(Level::TRACE)
    );
}
