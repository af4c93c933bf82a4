#![forbid(unsafe_code)]

//! Session timing and reservation settings.
//!
//! Pages publish these as properties: the session lifetime in seconds, the
//! warning lead time in milliseconds, and whether a pending reservation
//! (with its booking-path-state id) is attached to the session. Values may
//! arrive as JSON numbers and booleans or as their string forms.

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tarmac_core::error::{ConfigError, parse_number};
use tarmac_core::labels::Labels;

/// Property keys.
pub mod keys {
    pub const SESSION_TIMEOUT: &str = "sessionTimeOut";
    pub const WARNING_INTERVAL: &str = "sessionExpiresWarningInterval";
    pub const BUFFER: &str = "sessionTimeoutBuffer";
    pub const PENDING_RESERVATION: &str = "isDisplayVirtualPNRModal";
    pub const FINAL_DISPLAY: &str = "isFinalDisplay";
    pub const BOOKING_PATH_STATE_ID: &str = "bookingPathStateId";
}

/// Slack subtracted from every deadline so the page acts before the server
/// drops the session.
pub const DEFAULT_BUFFER: Duration = Duration::from_millis(5000);

/// Timeout handed to the transport with every session request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(50_000);

/// Session coordinator settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Server-side inactivity limit.
    #[serde(rename = "sessionTimeOut", deserialize_with = "de_secs")]
    pub max_inactive: Duration,
    /// How long the warning stays up before the session is treated as
    /// expired.
    #[serde(rename = "sessionExpiresWarningInterval", deserialize_with = "de_millis")]
    pub warning_interval: Duration,
    #[serde(
        rename = "sessionTimeoutBuffer",
        default = "default_buffer",
        deserialize_with = "de_millis"
    )]
    pub buffer: Duration,
    #[serde(default = "default_request_timeout", deserialize_with = "de_millis")]
    pub request_timeout: Duration,
    /// A reservation is held for this session and must be released when it
    /// expires.
    #[serde(rename = "isDisplayVirtualPNRModal", default, deserialize_with = "de_flag")]
    pub pending_reservation: bool,
    /// Skip the warning and expire directly at the deadline.
    #[serde(rename = "isFinalDisplay", default, deserialize_with = "de_flag")]
    pub final_display: bool,
    #[serde(default)]
    pub booking_path_state_id: String,
}

fn default_buffer() -> Duration {
    DEFAULT_BUFFER
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

impl SessionConfig {
    pub fn new(max_inactive: Duration, warning_interval: Duration) -> Self {
        Self {
            max_inactive,
            warning_interval,
            buffer: DEFAULT_BUFFER,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            pending_reservation: false,
            final_display: false,
            booking_path_state_id: String::new(),
        }
    }

    #[must_use]
    pub fn buffer(mut self, buffer: Duration) -> Self {
        self.buffer = buffer;
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Attach a pending reservation.
    #[must_use]
    pub fn pending_reservation(mut self, booking_path_state_id: impl Into<String>) -> Self {
        self.pending_reservation = true;
        self.booking_path_state_id = booking_path_state_id.into();
        self
    }

    #[must_use]
    pub fn final_display(mut self, final_display: bool) -> Self {
        self.final_display = final_display;
        self
    }

    /// Delay before the warning opens.
    pub fn warning_delay(&self) -> Duration {
        self.max_inactive
            .saturating_sub(self.warning_interval)
            .saturating_sub(self.buffer)
    }

    /// Delay before a final-display session expires.
    pub fn final_delay(&self) -> Duration {
        self.max_inactive.saturating_sub(self.buffer)
    }

    /// Read settings from page properties.
    ///
    /// The session lifetime and warning interval are required; everything
    /// else falls back to its default.
    pub fn from_labels(labels: &dyn Labels) -> Result<Self, ConfigError> {
        let max_inactive = secs(
            keys::SESSION_TIMEOUT,
            parse_number(keys::SESSION_TIMEOUT, &labels.get_property(keys::SESSION_TIMEOUT))?,
        )?;
        let warning_interval = millis(
            keys::WARNING_INTERVAL,
            parse_number(
                keys::WARNING_INTERVAL,
                &labels.get_property(keys::WARNING_INTERVAL),
            )?,
        )?;
        let mut config = Self::new(max_inactive, warning_interval);

        let buffer = labels.get_property(keys::BUFFER);
        if !buffer.trim().is_empty() {
            config.buffer = millis(keys::BUFFER, parse_number(keys::BUFFER, &buffer)?)?;
        }
        config.pending_reservation = is_true(&labels.get_property(keys::PENDING_RESERVATION));
        config.final_display = is_true(&labels.get_property(keys::FINAL_DISPLAY));
        config.booking_path_state_id = labels.get_property(keys::BOOKING_PATH_STATE_ID);
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON object of page properties.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings under which the warning could never be shown.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_inactive.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: keys::SESSION_TIMEOUT.to_owned(),
                reason: "must be positive",
            });
        }
        if !self.final_display && self.warning_interval + self.buffer >= self.max_inactive {
            return Err(ConfigError::InvalidValue {
                key: keys::WARNING_INTERVAL.to_owned(),
                reason: "warning interval plus buffer must be shorter than the session",
            });
        }
        Ok(())
    }
}

/// `true` for a JSON `true` or the string `"true"`.
pub(crate) fn flag_value(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => is_true(s),
        _ => false,
    }
}

fn is_true(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

fn secs(key: &str, value: f64) -> Result<Duration, ConfigError> {
    millis(key, value * 1000.0)
}

fn millis(key: &str, value: f64) -> Result<Duration, ConfigError> {
    if value < 0.0 || !value.is_finite() {
        return Err(ConfigError::InvalidValue {
            key: key.to_owned(),
            reason: "must not be negative",
        });
    }
    Ok(Duration::from_millis(value.round() as u64))
}

fn number_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let parsed = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| serde::de::Error::custom(format!("expected a non-negative number, got {value}")))
}

fn de_secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let v = number_value(deserializer)?;
    Ok(Duration::from_millis((v * 1000.0).round() as u64))
}

fn de_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let v = number_value(deserializer)?;
    Ok(Duration::from_millis(v.round() as u64))
}

fn de_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(flag_value(&Value::deserialize(deserializer)?))
}
