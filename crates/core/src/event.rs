//! Live update events pushed over the product channel.
//!
//! Frames arrive as JSON text in one of two shapes:
//!
//! ```json
//! {"type": "connection_established", "message": "..."}
//! {"action": "create", "data": { ...product... }}
//! ```
//!
//! A `delete` frame only needs `data.id`; the rest of the record may be
//! partial or missing.

use serde::Deserialize;
use thiserror::Error;

use crate::types::{Product, ProductId};

/// A decoded frame from the live channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveEvent {
    /// Handshake marker sent by the server once subscribed. The store
    /// ignores it.
    ConnectionEstablished { message: Option<String> },
    Created(Product),
    Updated(Product),
    Deleted(ProductId),
}

/// Why a frame could not be turned into a [`LiveEvent`].
#[derive(Debug, Error)]
pub enum EventParseError {
    #[error("frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("unknown message type: {0}")]
    UnknownType(String),

    #[error("frame has neither an action nor a type")]
    Untagged,

    #[error("{action} frame is missing data")]
    MissingData { action: &'static str },
}

#[derive(Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: Option<String>,
    action: Option<String>,
    data: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct IdOnly {
    id: ProductId,
}

impl LiveEvent {
    /// Decode one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`EventParseError`] for malformed JSON, unknown actions or
    /// types, and frames whose `data` does not describe a product.
    pub fn parse(text: &str) -> Result<Self, EventParseError> {
        let raw: RawFrame = serde_json::from_str(text)?;

        if let Some(action) = raw.action {
            let data = |action| raw.data.ok_or(EventParseError::MissingData { action });
            return match action.as_str() {
                "create" => Ok(Self::Created(serde_json::from_value(data("create")?)?)),
                "update" => Ok(Self::Updated(serde_json::from_value(data("update")?)?)),
                "delete" => {
                    let IdOnly { id } = serde_json::from_value(data("delete")?)?;
                    Ok(Self::Deleted(id))
                }
                _ => Err(EventParseError::UnknownAction(action)),
            };
        }

        match raw.kind.as_deref() {
            Some("connection_established") => Ok(Self::ConnectionEstablished {
                message: raw.message,
            }),
            Some(other) => Err(EventParseError::UnknownType(other.to_owned())),
            None => Err(EventParseError::Untagged),
        }
    }

    /// Id of the product this event touches, if any.
    #[must_use]
    pub const fn product_id(&self) -> Option<ProductId> {
        match self {
            Self::ConnectionEstablished { .. } => None,
            Self::Created(p) | Self::Updated(p) => Some(p.id),
            Self::Deleted(id) => Some(*id),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_connection_established() {
        let event = LiveEvent::parse(
            r#"{"type":"connection_established","message":"You are now connected to the live product feed."}"#,
        )
        .unwrap();
        assert!(matches!(
            event,
            LiveEvent::ConnectionEstablished { message: Some(ref m) } if m.starts_with("You are now")
        ));
        assert_eq!(event.product_id(), None);
    }

    #[test]
    fn test_parse_create() {
        let event = LiveEvent::parse(
            r#"{"action":"create","data":{"id":2,"name":"Book","price":"9.99","category":"books"}}"#,
        )
        .unwrap();
        match event {
            LiveEvent::Created(product) => {
                assert_eq!(product.id, ProductId::new(2));
                assert_eq!(product.name, "Book");
            }
            other => panic!("expected Created, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_delete_needs_only_id() {
        let event = LiveEvent::parse(r#"{"action":"delete","data":{"id":5}}"#).unwrap();
        assert_eq!(event, LiveEvent::Deleted(ProductId::new(5)));
    }

    #[test]
    fn test_parse_update_requires_full_record() {
        let result = LiveEvent::parse(r#"{"action":"update","data":{"id":5}}"#);
        assert!(matches!(result, Err(EventParseError::Json(_))));
    }

    #[test]
    fn test_parse_unknown_action() {
        let result = LiveEvent::parse(r#"{"action":"archive","data":{"id":5}}"#);
        assert!(matches!(result, Err(EventParseError::UnknownAction(a)) if a == "archive"));
    }

    #[test]
    fn test_parse_missing_data() {
        let result = LiveEvent::parse(r#"{"action":"delete"}"#);
        assert!(matches!(
            result,
            Err(EventParseError::MissingData { action: "delete" })
        ));
    }

    #[test]
    fn test_parse_untagged_and_garbage() {
        assert!(matches!(
            LiveEvent::parse(r#"{"hello":"world"}"#),
            Err(EventParseError::Untagged)
        ));
        assert!(matches!(
            LiveEvent::parse("not json"),
            Err(EventParseError::Json(_))
        ));
        assert!(matches!(
            LiveEvent::parse(r#"{"type":"ping"}"#),
            Err(EventParseError::UnknownType(t)) if t == "ping"
        ));
    }
}
