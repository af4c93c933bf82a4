#![forbid(unsafe_code)]

//! Session timeout coordination.
//!
//! Keeps a page ahead of its server-side session: warns before the session
//! lapses, renews it on request, and switches the session dialog to its
//! expired form when renewal is too late or fails.

pub mod config;
pub mod coordinator;
pub mod timers;

pub use config::SessionConfig;
pub use coordinator::{SessionContext, SessionCoordinator, SessionPhase};
pub use timers::{TimerId, TimerQueue};
