#![forbid(unsafe_code)]

//! Configuration loading errors.

use std::fmt;

/// Failure to load a label table or session properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Input was not valid JSON, or not a JSON object.
    InvalidJson(String),
    /// A required property is absent or empty.
    MissingProperty { key: String },
    /// A numeric property did not parse.
    InvalidNumber { key: String, value: String },
    /// A property holds a value of the wrong shape.
    InvalidValue { key: String, reason: &'static str },
}

impl ConfigError {
    pub fn missing(key: impl Into<String>) -> Self {
        Self::MissingProperty { key: key.into() }
    }

    /// The offending property name, when there is one.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::InvalidJson(_) => None,
            Self::MissingProperty { key }
            | Self::InvalidNumber { key, .. }
            | Self::InvalidValue { key, .. } => Some(key),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson(msg) => write!(f, "invalid json: {msg}"),
            Self::MissingProperty { key } => write!(f, "missing property `{key}`"),
            Self::InvalidNumber { key, value } => {
                write!(f, "property `{key}` is not a number: {value:?}")
            }
            Self::InvalidValue { key, reason } => write!(f, "property `{key}`: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidJson(err.to_string())
    }
}

/// Parse a required numeric property.
pub fn parse_number(key: &str, raw: &str) -> Result<f64, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::missing(key));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ConfigError::InvalidNumber {
            key: key.to_owned(),
            value: raw.to_owned(),
        })
}
