#![forbid(unsafe_code)]

//! Logging shim.
//!
//! With the `tracing` feature (on by default) the usual `tracing` macros are
//! re-exported here and at the crate root, so downstream crates can write
//! `tarmac_core::debug!(..)` without depending on `tracing` themselves.
//! Without the feature the same names expand to nothing.
//!
//! Level conventions used across the workspace:
//!
//! - `debug!` for lifecycle transitions (open, close, re-arm).
//! - `trace!` for silent no-ops and vetoed operations.
//! - `warn!` for renewal failures and session expiry.

#[cfg(feature = "tracing")]
pub use tracing::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};

#[cfg(not(feature = "tracing"))]
mod disabled {
    /// Discards its arguments.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// Discards its arguments.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// Discards its arguments.
    #[macro_export]
    macro_rules! info {
        ($($arg:tt)*) => {};
    }

    /// Discards its arguments.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }

    /// Discards its arguments.
    #[macro_export]
    macro_rules! error {
        ($($arg:tt)*) => {};
    }

    #[macro_export]
    macro_rules! trace_span {
        ($($arg:tt)*) => {
            $crate::logging::DisabledSpan
        };
    }

    #[macro_export]
    macro_rules! debug_span {
        ($($arg:tt)*) => {
            $crate::logging::DisabledSpan
        };
    }

    #[macro_export]
    macro_rules! info_span {
        ($($arg:tt)*) => {
            $crate::logging::DisabledSpan
        };
    }

    #[macro_export]
    macro_rules! warn_span {
        ($($arg:tt)*) => {
            $crate::logging::DisabledSpan
        };
    }

    #[macro_export]
    macro_rules! error_span {
        ($($arg:tt)*) => {
            $crate::logging::DisabledSpan
        };
    }
}

/// Stand-in span returned by the `*_span!` macros when tracing is off.
#[cfg(not(feature = "tracing"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSpan;

#[cfg(not(feature = "tracing"))]
impl DisabledSpan {
    /// Entering a disabled span yields an inert guard.
    pub fn enter(&self) -> DisabledGuard {
        DisabledGuard
    }
}

/// Guard for [`DisabledSpan::enter`].
#[cfg(not(feature = "tracing"))]
#[derive(Debug)]
pub struct DisabledGuard;
