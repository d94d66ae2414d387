//! Outgoing UI message-stream events.
//!
//! These types serialize to exactly the wire shapes the browser
//! consumes: a `"type"` tag plus a kind-specific payload. Textual
//! events mirror upstream chunks; the `data-*` events are derived by
//! the relay.

use crate::error::EventError;
use crate::types::ids::SegmentId;
use crate::JsonValue;
use serde::{Deserialize, Serialize};

/// Lifecycle phase carried by a `data-status` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusPhase {
    Starting,
    Processing,
    Parsing,
    Complete,
    Error,
}

/// Payload of a `data-status` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusData {
    pub phase: StatusPhase,
    pub message: String,
}

/// One structured record of a derived result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub name: String,
    pub quantity: u32,
}

/// Payload of a `data-parts` event: the subject, its records, and the
/// record count. `total` is always `parts.len()`, including zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartsData {
    pub equipment: String,
    pub parts: Vec<Part>,
    pub total: usize,
}

/// Rendering hint for the client's result view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(rename = "type")]
    pub kind: LayoutKind,
    pub columns: u32,
    pub rows: u32,
}

impl Layout {
    /// A grid layout with the given dimensions.
    pub fn grid(columns: u32, rows: u32) -> Self {
        Self {
            kind: LayoutKind::Grid,
            columns,
            rows,
        }
    }
}

/// Supported layout families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    Grid,
}

/// Payload of a `data-layout` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutData {
    pub layout: Layout,
}

/// One event on the client-facing UI message stream.
///
/// Serialized with an internal `"type"` tag; the `data-*` variants
/// carry their payload under a `data` field, matching the stream the
/// browser renders. [`UiEvent::Raw`] holds pass-through values whose
/// kind the relay does not model — its type tag lives inside the
/// payload and is checked by [`UiEvent::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum UiEvent {
    TextStart {
        id: SegmentId,
    },
    TextDelta {
        id: SegmentId,
        delta: String,
    },
    TextEnd {
        id: SegmentId,
    },
    #[serde(rename = "data-status")]
    Status { data: StatusData },
    #[serde(rename = "data-layout")]
    Layout { id: SegmentId, data: LayoutData },
    #[serde(rename = "data-parts")]
    Parts { data: PartsData },
    #[serde(untagged)]
    Raw(JsonValue),
}

impl UiEvent {
    /// Builds a `data-status` event.
    pub fn status(phase: StatusPhase, message: impl Into<String>) -> Self {
        UiEvent::Status {
            data: StatusData {
                phase,
                message: message.into(),
            },
        }
    }

    /// The event's type tag, or `None` when a raw event carries no
    /// usable tag.
    pub fn event_type(&self) -> Option<&str> {
        match self {
            UiEvent::TextStart { .. } => Some("text-start"),
            UiEvent::TextDelta { .. } => Some("text-delta"),
            UiEvent::TextEnd { .. } => Some("text-end"),
            UiEvent::Status { .. } => Some("data-status"),
            UiEvent::Layout { .. } => Some("data-layout"),
            UiEvent::Parts { .. } => Some("data-parts"),
            UiEvent::Raw(value) => value
                .get("type")
                .and_then(JsonValue::as_str)
                .filter(|tag| !tag.is_empty()),
        }
    }

    /// Checks the invariant that every written event carries a
    /// non-empty string type. Only [`UiEvent::Raw`] can fail this; the
    /// typed variants are valid by construction.
    pub fn validate(&self) -> Result<(), EventError> {
        self.event_type().map(|_| ()).ok_or(EventError::MissingType)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_events_share_the_wire_shape() {
        let event = UiEvent::TextDelta {
            id: SegmentId::new("a"),
            delta: "hi".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&event).expect("serialize"),
            json!({"type": "text-delta", "id": "a", "delta": "hi"})
        );
    }

    #[test]
    fn status_event_wire_shape() {
        let event = UiEvent::status(StatusPhase::Complete, "Found 8 parts for engine");
        assert_eq!(
            serde_json::to_value(&event).expect("serialize"),
            json!({
                "type": "data-status",
                "data": {"phase": "Complete", "message": "Found 8 parts for engine"},
            })
        );
    }

    #[test]
    fn layout_event_wire_shape() {
        let event = UiEvent::Layout {
            id: SegmentId::layout_hint(),
            data: LayoutData {
                layout: Layout::grid(2, 2),
            },
        };
        assert_eq!(
            serde_json::to_value(&event).expect("serialize"),
            json!({
                "type": "data-layout",
                "id": "layout-1",
                "data": {"layout": {"type": "grid", "columns": 2, "rows": 2}},
            })
        );
    }

    #[test]
    fn parts_event_wire_shape() {
        let event = UiEvent::Parts {
            data: PartsData {
                equipment: "engine".to_string(),
                parts: vec![Part {
                    name: "Piston".to_string(),
                    quantity: 4,
                }],
                total: 1,
            },
        };
        assert_eq!(
            serde_json::to_value(&event).expect("serialize"),
            json!({
                "type": "data-parts",
                "data": {
                    "equipment": "engine",
                    "parts": [{"name": "Piston", "quantity": 4}],
                    "total": 1,
                },
            })
        );
    }

    #[test]
    fn raw_events_serialize_verbatim() {
        let value = json!({"type": "data-weather", "data": {"high": 21}});
        let event = UiEvent::Raw(value.clone());
        assert_eq!(serde_json::to_value(&event).expect("serialize"), value);
        assert_eq!(event.event_type(), Some("data-weather"));
        assert!(event.validate().is_ok());
    }

    #[test]
    fn raw_event_without_type_fails_validation() {
        assert!(UiEvent::Raw(json!({"data": 1})).validate().is_err());
        assert!(UiEvent::Raw(json!({"type": ""})).validate().is_err());
        assert!(UiEvent::Raw(json!({"type": 9})).validate().is_err());
    }

    #[test]
    fn round_trips_through_the_tagged_representation() {
        let event = UiEvent::TextStart {
            id: SegmentId::new("text-0"),
        };
        let json = serde_json::to_string(&event).expect("serialize");
        let back: UiEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, event);
    }
}
