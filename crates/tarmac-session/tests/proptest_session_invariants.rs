//! Property-based invariant tests for the session coordinator.
//!
//! 1. Whatever the sequence of time steps, user actions and responses, at
//!    most one warning and one expiry timer are pending, and never both.
//! 2. Once a renewal succeeds, no deadline from before it fires.
//! 3. The warning opens exactly at `max - warning - buffer`.

use std::time::Duration;

use proptest::prelude::*;
use tarmac_core::dom::Dom;
use tarmac_core::geometry::{Rect, Size};
use tarmac_core::labels::LabelTable;
use tarmac_core::request::RequestError;
use tarmac_core::testing::{MockDom, MockTransport, RecordingNavigator};
use tarmac_overlay::DialogManager;
use tarmac_session::coordinator::{
    CONTINUE_ACTION, HOME_ACTION, SESSION_DIALOG, SESSION_MARKER_CLASS,
};
use tarmac_session::{SessionConfig, SessionContext, SessionCoordinator, SessionPhase};

// ── Helpers ─────────────────────────────────────────────────────────────

struct Page {
    dom: MockDom,
    dialogs: DialogManager,
    transport: MockTransport,
    navigator: RecordingNavigator,
    labels: LabelTable,
}

impl Page {
    fn new() -> Self {
        let mut dom = MockDom::new(Size::new(1280.0, 900.0));
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

#[derive(Debug, Clone)]
enum Step {
    Advance(u64),
    Continue,
    Home,
    RespondOk,
    RespondErr,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => (0u64..30_000).prop_map(Step::Advance),
        2 => Just(Step::Continue),
        1 => Just(Step::Home),
        2 => Just(Step::RespondOk),
        1 => Just(Step::RespondErr),
    ]
}

fn config_strategy() -> impl Strategy<Value = SessionConfig> {
    (10u64..600, 0u64..5_000, any::<bool>()).prop_map(|(secs, warning, final_display)| {
        let max = Duration::from_secs(secs);
        let warning = Duration::from_millis(warning);
        SessionConfig::new(max, warning)
            .buffer(Duration::from_millis(1_000))
            .final_display(final_display)
    })
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Timer count
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn never_more_than_one_live_timer(
        config in config_strategy(),
        steps in prop::collection::vec(step_strategy(), 1..40),
    ) {
        let mut page = Page::new();
        let mut session = SessionCoordinator::new(config);
        prop_assert!(session.init(&mut page.cx()));

        for step in steps {
            match step {
                Step::Advance(ms) => session.advance(&mut page.cx(), Duration::from_millis(ms)),
                Step::Continue => {
                    session.handle_action(&mut page.cx(), CONTINUE_ACTION);
                }
                Step::Home => {
                    session.handle_action(&mut page.cx(), HOME_ACTION);
                }
                Step::RespondOk | Step::RespondErr => {
                    if let Some((id, _)) = page.transport.take().pop() {
                        let response = if matches!(step, Step::RespondOk) {
                            Ok("{}".to_owned())
                        } else {
                            Err(RequestError::Timeout)
                        };
                        session.on_response(&mut page.cx(), id, response);
                    }
                }
            }
            let warning = session.warning_deadline().is_some();
            let expiry = session.expiry_deadline().is_some();
            prop_assert!(!(warning && expiry));
            prop_assert!(session.pending_timers() <= 1);
            match session.phase() {
                SessionPhase::Renewing | SessionPhase::Expired => {
                    prop_assert_eq!(session.pending_timers(), 0);
                }
                SessionPhase::WarningShown => prop_assert!(expiry),
                SessionPhase::Armed => prop_assert!(warning || expiry),
                SessionPhase::Idle => {}
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Stale deadlines
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn renewal_discards_earlier_deadlines(
        secs in 20u64..600,
        warning_ms in 1_000u64..10_000,
        wait_ms in 0u64..1_000,
    ) {
        let config = SessionConfig::new(
            Duration::from_secs(secs),
            Duration::from_millis(warning_ms),
        );
        let mut page = Page::new();
        let mut session = SessionCoordinator::new(config.clone());
        session.init(&mut page.cx());

        session.advance(&mut page.cx(), config.warning_delay());
        prop_assert_eq!(session.phase(), SessionPhase::WarningShown);
        prop_assert!(session.continue_session(&mut page.cx()));
        let (id, _) = page.transport.take().pop().unwrap();
        session.advance(&mut page.cx(), Duration::from_millis(wait_ms));
        prop_assert!(session.on_response(&mut page.cx(), id, Ok(String::new())));

        // Just short of the fresh warning, nothing has fired.
        let renewed_at = session.now();
        session.advance(&mut page.cx(), config.warning_delay() - Duration::from_millis(1));
        prop_assert_eq!(session.phase(), SessionPhase::Armed);
        prop_assert!(!page.dialogs.is_open(SESSION_DIALOG));
        prop_assert_eq!(
            session.warning_deadline(),
            Some(renewed_at + config.warning_delay())
        );
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Warning timing
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn warning_opens_at_computed_delay(
        secs in 10u64..3_600,
        warning_ms in 0u64..5_000,
    ) {
        let config = SessionConfig::new(
            Duration::from_secs(secs),
            Duration::from_millis(warning_ms),
        );
        let delay = config.warning_delay();
        prop_assert_eq!(
            delay,
            Duration::from_secs(secs) - Duration::from_millis(warning_ms) - config.buffer
        );
        let mut page = Page::new();
        let mut session = SessionCoordinator::new(config);
        session.init(&mut page.cx());
        session.advance(&mut page.cx(), delay - Duration::from_millis(1));
        prop_assert!(!page.dialogs.is_open(SESSION_DIALOG));
        session.advance(&mut page.cx(), Duration::from_millis(1));
        prop_assert!(page.dialogs.is_open(SESSION_DIALOG));
        prop_assert_eq!(session.phase(), SessionPhase::WarningShown);
    }
}
