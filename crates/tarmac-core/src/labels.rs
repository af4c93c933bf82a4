#![forbid(unsafe_code)]

//! Localized label lookup.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::ConfigError;

/// Source of page properties and localized strings.
pub trait Labels {
    /// Value for `key`, or an empty string when unknown.
    fn get_property(&self, key: &str) -> String;
}

/// In-memory label table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    entries: HashMap<String, String>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load from a flat JSON object.
    ///
    /// String values are taken as-is; numbers and booleans are stored in
    /// their JSON text form; `null` is stored as empty. Nested objects and
    /// arrays are rejected.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(json)?;
        let Value::Object(map) = value else {
            return Err(ConfigError::InvalidJson(
                "label table must be a JSON object".to_owned(),
            ));
        };
        let mut table = Self::new();
        for (key, value) in map {
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => String::new(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(ConfigError::InvalidValue {
                        key,
                        reason: "expected a scalar",
                    });
                }
            };
            table.entries.insert(key, text);
        }
        Ok(table)
    }
}

impl Labels for LabelTable {
    fn get_property(&self, key: &str) -> String {
        self.entries.get(key).cloned().unwrap_or_default()
    }
}

impl<L: Labels + ?Sized> Labels for &L {
    fn get_property(&self, key: &str) -> String {
        (**self).get_property(key)
    }
}
