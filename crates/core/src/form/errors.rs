//! Per-field validation messages.
//!
//! Client-side checks and server `400` bodies both end up here, so the two
//! render identically.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

/// Ordered `field -> messages` map.
///
/// Messages not tied to a field (a bare string or list body from the server)
/// are kept under the empty field name and render without a prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    fields: IndexMap<String, Vec<String>>,
}

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message for `field`.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Add a message not tied to any field.
    pub fn push_general(&mut self, message: impl Into<String>) {
        self.push(String::new(), message);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// `Ok(value)` when no message was recorded, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns `self` if any field has a message.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }

    /// Read a server validation body.
    ///
    /// Objects map keys to fields; each value may be a list of messages or a
    /// single message. Any other body becomes one general message.
    #[must_use]
    pub fn from_json(body: &Value) -> Self {
        let mut errors = Self::new();
        match body {
            Value::Object(map) => {
                for (field, messages) in map {
                    for message in messages_of(messages) {
                        errors.push(field.clone(), message);
                    }
                }
            }
            other => {
                for message in messages_of(other) {
                    errors.push_general(message);
                }
            }
        }
        errors
    }
}

fn messages_of(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(message_text).collect(),
        other => vec![message_text(other)],
    }
}

fn message_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, messages)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(". ")?;
            }
            if !field.is_empty() {
                write!(f, "{field}: ")?;
            }
            f.write_str(&messages.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}
