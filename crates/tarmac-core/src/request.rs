#![forbid(unsafe_code)]

//! Outgoing requests and page navigation.
//!
//! The transport is asynchronous from the caller's point of view: `send`
//! returns immediately with a [`RequestId`] and the host later delivers one
//! [`Response`] for that id to whichever component issued it.

use std::fmt;
use std::time::Duration;

use serde_json::Value;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// A request handed to the [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    /// Form data, if any.
    pub data: Option<Value>,
    /// Abort after this long. `None` leaves the decision to the transport.
    pub timeout: Option<Duration>,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            data: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Identifier of an in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Why a request did not produce a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Non-success HTTP status.
    Status(u16),
    Timeout,
    /// Cancelled by the host (page unload, network down).
    Aborted,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "request failed with status {code}"),
            Self::Timeout => f.write_str("request timed out"),
            Self::Aborted => f.write_str("request aborted"),
        }
    }
}

impl std::error::Error for RequestError {}

/// Outcome of a request: the response body or the failure.
pub type Response = Result<String, RequestError>;

/// Sends requests on behalf of the page.
pub trait Transport {
    fn send(&mut self, request: Request) -> RequestId;
}

/// Changes the page location.
pub trait Navigator {
    fn navigate(&mut self, url: &str);
}
