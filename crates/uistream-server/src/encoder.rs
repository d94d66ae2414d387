//! Server-Sent Events encoding of outgoing UI events.
//!
//! Each event is framed as specified by the
//! [W3C Server-Sent Events specification](https://html.spec.whatwg.org/multipage/server-sent-events.html):
//!
//! ```text
//! data: {"type":"text-delta","id":"text-0","delta":"..."}\n\n
//! ```
//!
//! Multi-line data is handled by prefixing each line with `data: `.

use crate::error::{EncodeError, EncodeResult};
use bytes::Bytes;
use uistream_core::UiEvent;

/// Content type of the streamed response body.
pub const SSE_CONTENT_TYPE: &str = "text/event-stream";

/// Marker header identifying the body as a UI message stream.
pub const UI_STREAM_HEADER_NAME: &str = "x-ui-message-stream";

/// Current UI message-stream protocol version.
pub const UI_STREAM_HEADER_VALUE: &str = "v1";

/// Maximum event size (1 MB).
///
/// Events larger than this will be rejected to prevent memory issues.
const MAX_EVENT_SIZE: usize = 1024 * 1024;

/// Encode one event to SSE format.
///
/// # Errors
///
/// Returns [`EncodeError::Json`] if JSON serialization fails.
/// Returns [`EncodeError::EventTooLarge`] if the event exceeds 1 MB.
pub fn encode_sse(event: &UiEvent) -> EncodeResult<Bytes> {
    let json = serde_json::to_string(event).map_err(|e| EncodeError::Json {
        event_type: event.event_type().unwrap_or("unknown").to_string(),
        source: e,
    })?;

    if json.len() > MAX_EVENT_SIZE {
        return Err(EncodeError::EventTooLarge {
            size: json.len(),
            max: MAX_EVENT_SIZE,
        });
    }

    // SSE format: "data: {json}\n\n"
    let capacity = 6 + json.len() + 2;
    let mut output = String::with_capacity(capacity);

    // serde_json::to_string produces single-line output, but guard
    // multi-line payloads anyway by prefixing each line.
    if json.contains('\n') {
        for line in json.lines() {
            output.push_str("data: ");
            output.push_str(line);
            output.push('\n');
        }
        output.push('\n');
    } else {
        output.push_str("data: ");
        output.push_str(&json);
        output.push_str("\n\n");
    }

    Ok(Bytes::from(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uistream_core::{Part, PartsData, SegmentId, StatusPhase};

    #[test]
    fn encode_text_delta() {
        let event = UiEvent::TextDelta {
            id: SegmentId::new("text-0"),
            delta: "Hello, world!".to_string(),
        };

        let bytes = encode_sse(&event).expect("encoding should succeed");
        let s = std::str::from_utf8(&bytes).expect("valid UTF-8");

        assert!(s.starts_with("data: "));
        assert!(s.ends_with("\n\n"));
        assert!(s.contains("\"type\":\"text-delta\""));
        assert!(s.contains("Hello, world!"));
    }

    #[test]
    fn encode_status_event() {
        let event = UiEvent::status(StatusPhase::Error, "Error: model backend failed");

        let bytes = encode_sse(&event).expect("encoding should succeed");
        let s = std::str::from_utf8(&bytes).expect("valid UTF-8");

        assert!(s.contains("\"type\":\"data-status\""));
        assert!(s.contains("\"phase\":\"Error\""));
        assert!(s.contains("model backend failed"));
    }

    #[test]
    fn encode_parts_event() {
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

        let bytes = encode_sse(&event).expect("encoding should succeed");
        let s = std::str::from_utf8(&bytes).expect("valid UTF-8");

        assert!(s.contains("\"type\":\"data-parts\""));
        assert!(s.contains("\"total\":1"));
    }

    #[test]
    fn encode_unicode_content() {
        let event = UiEvent::TextDelta {
            id: SegmentId::new("text-0"),
            delta: "Hello, 世界! 🌍".to_string(),
        };

        let bytes = encode_sse(&event).expect("encoding should succeed");
        let s = std::str::from_utf8(&bytes).expect("valid UTF-8");

        assert!(s.contains("世界") || s.contains("\\u"));
    }

    #[test]
    fn encode_special_characters() {
        let event = UiEvent::TextDelta {
            id: SegmentId::new("text-0"),
            delta: "Line1\nLine2\tTabbed\"Quoted\"".to_string(),
        };

        let bytes = encode_sse(&event).expect("encoding should succeed");
        let s = std::str::from_utf8(&bytes).expect("valid UTF-8");

        // JSON escapes the newline, so the frame itself stays single-line.
        assert!(s.contains("\\n"));
        assert_eq!(s.matches("data: ").count(), 1);
    }

    #[test]
    fn sse_format_is_parseable() {
        let event = UiEvent::Raw(json!({"type": "data-weather", "data": {"high": 21}}));

        let bytes = encode_sse(&event).expect("encoding should succeed");
        let s = std::str::from_utf8(&bytes).expect("valid UTF-8");

        assert!(s.starts_with("data: {"));
        assert!(s.ends_with("}\n\n"));

        let json_str = s.trim_start_matches("data: ").trim_end();
        let value: serde_json::Value =
            serde_json::from_str(json_str).expect("should be valid JSON");
        assert_eq!(value["type"], "data-weather");
    }

    #[test]
    fn oversized_events_are_rejected() {
        let event = UiEvent::TextDelta {
            id: SegmentId::new("text-0"),
            delta: "x".repeat(MAX_EVENT_SIZE + 1),
        };

        let err = encode_sse(&event).expect_err("should exceed the size cap");
        assert!(matches!(err, EncodeError::EventTooLarge { .. }));
    }
}
