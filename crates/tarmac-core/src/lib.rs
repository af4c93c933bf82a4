#![forbid(unsafe_code)]

//! Core: geometry, DOM handle abstraction, events, transitions and the host
//! interfaces (labels, transport, navigation) shared by the overlay crates.

pub mod animation;
pub mod dom;
pub mod error;
pub mod event;
pub mod geometry;
pub mod labels;
pub mod logging;
pub mod request;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use error::ConfigError;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};
