//! Upstream chunk model.
//!
//! Agent SDKs emit loosely-typed values; [`Chunk::from_value`] is the
//! single place where those values are validated and classified by
//! their `"type"` tag. Anything that fails validation here is reported
//! as a [`ChunkError`] and skipped by the relay — a malformed chunk
//! never terminates a stream.

use crate::error::ChunkError;
use crate::types::ids::SegmentId;
use crate::JsonValue;

/// One unit of an upstream agent's incremental output.
///
/// Kinds the relay does not recognize are preserved as [`Chunk::Other`]
/// with their original payload so they can be passed through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    /// Opens a textual segment.
    TextStart {
        /// Segment correlation id, if the upstream assigned one.
        id: Option<SegmentId>,
    },
    /// A fragment of streamed text.
    TextDelta {
        id: Option<SegmentId>,
        /// `None` when the upstream sent a null or missing text field;
        /// such a chunk is skipped rather than emitted as an empty delta.
        text: Option<String>,
    },
    /// Closes a textual segment.
    TextEnd { id: Option<SegmentId> },
    /// A tool invocation announced by the agent. Kept whole for
    /// pass-through; the relay never inspects its arguments.
    ToolCall {
        /// The original chunk object.
        payload: JsonValue,
    },
    /// A tool's structured result — the trigger for derived events.
    ToolResult {
        /// The subject the result applies to (the tool's input), when
        /// the upstream provided it as a string.
        input: Option<String>,
        /// The raw structured output; schema validation happens at the
        /// derivation boundary, not here.
        output: Option<JsonValue>,
    },
    /// Pre-shaped UI data emitted by a tool, re-tagged by the relay.
    ToolOutput { output: Option<JsonValue> },
    /// Any recognized-as-a-chunk value with an unknown kind tag.
    Other {
        kind: String,
        /// The original chunk object.
        payload: JsonValue,
    },
}

impl Chunk {
    /// Parses a chunk from the loosely-typed value an agent SDK emits.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError`] when the value is not an object, has no
    /// non-empty string `"type"`, or a recognized kind carries a field
    /// of the wrong shape.
    pub fn from_value(value: JsonValue) -> Result<Self, ChunkError> {
        let object = value.as_object().ok_or(ChunkError::NotAnObject)?;
        let kind = object
            .get("type")
            .and_then(JsonValue::as_str)
            .filter(|kind| !kind.is_empty())
            .ok_or(ChunkError::MissingKind)?;

        match kind {
            "text-start" => Ok(Chunk::TextStart {
                id: segment_id(object, "text-start")?,
            }),
            "text-delta" => Ok(Chunk::TextDelta {
                id: segment_id(object, "text-delta")?,
                text: string_field(object, "text-delta", "text")?,
            }),
            "text-end" => Ok(Chunk::TextEnd {
                id: segment_id(object, "text-end")?,
            }),
            "tool-call" => Ok(Chunk::ToolCall {
                payload: value.clone(),
            }),
            "tool-result" => Ok(Chunk::ToolResult {
                // Non-string inputs fall back to the turn's subject hint
                // downstream instead of failing the chunk.
                input: object
                    .get("input")
                    .and_then(JsonValue::as_str)
                    .map(str::to_string),
                output: non_null(object.get("output")),
            }),
            "tool-output" => Ok(Chunk::ToolOutput {
                output: non_null(object.get("output")),
            }),
            other => Ok(Chunk::Other {
                kind: other.to_string(),
                payload: value.clone(),
            }),
        }
    }

    /// The chunk's kind tag.
    pub fn kind(&self) -> &str {
        match self {
            Chunk::TextStart { .. } => "text-start",
            Chunk::TextDelta { .. } => "text-delta",
            Chunk::TextEnd { .. } => "text-end",
            Chunk::ToolCall { .. } => "tool-call",
            Chunk::ToolResult { .. } => "tool-result",
            Chunk::ToolOutput { .. } => "tool-output",
            Chunk::Other { kind, .. } => kind,
        }
    }
}

fn segment_id(
    object: &serde_json::Map<String, JsonValue>,
    kind: &'static str,
) -> Result<Option<SegmentId>, ChunkError> {
    Ok(string_field(object, kind, "id")?.map(SegmentId::from))
}

/// Extracts an optional string field: missing and null both mean
/// "absent"; any other non-string shape is a validation error.
fn string_field(
    object: &serde_json::Map<String, JsonValue>,
    kind: &'static str,
    field: &'static str,
) -> Result<Option<String>, ChunkError> {
    match object.get(field) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ChunkError::InvalidField { kind, field }),
    }
}

fn non_null(value: Option<&JsonValue>) -> Option<JsonValue> {
    match value {
        None | Some(JsonValue::Null) => None,
        Some(value) => Some(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_text_delta() {
        let chunk = Chunk::from_value(json!({"type": "text-delta", "id": "a", "text": "hi"}))
            .expect("valid chunk");
        assert_eq!(
            chunk,
            Chunk::TextDelta {
                id: Some(SegmentId::new("a")),
                text: Some("hi".to_string()),
            }
        );
    }

    #[test]
    fn null_text_parses_as_absent() {
        let chunk = Chunk::from_value(json!({"type": "text-delta", "id": "a", "text": null}))
            .expect("valid chunk");
        assert_eq!(
            chunk,
            Chunk::TextDelta {
                id: Some(SegmentId::new("a")),
                text: None,
            }
        );
    }

    #[test]
    fn non_string_text_is_invalid() {
        let err = Chunk::from_value(json!({"type": "text-delta", "text": 42}))
            .expect_err("should reject");
        assert_eq!(
            err,
            ChunkError::InvalidField {
                kind: "text-delta",
                field: "text",
            }
        );
    }

    #[test]
    fn missing_kind_is_rejected() {
        assert_eq!(
            Chunk::from_value(json!({"text": "hi"})),
            Err(ChunkError::MissingKind)
        );
        assert_eq!(
            Chunk::from_value(json!({"type": "", "text": "hi"})),
            Err(ChunkError::MissingKind)
        );
        assert_eq!(
            Chunk::from_value(json!({"type": 7})),
            Err(ChunkError::MissingKind)
        );
        assert_eq!(Chunk::from_value(json!("text")), Err(ChunkError::NotAnObject));
    }

    #[test]
    fn tool_result_keeps_raw_output() {
        let chunk = Chunk::from_value(json!({
            "type": "tool-result",
            "input": "engine",
            "output": {"parts": [{"name": "Piston", "quantity": 4}]},
        }))
        .expect("valid chunk");

        match chunk {
            Chunk::ToolResult { input, output } => {
                assert_eq!(input.as_deref(), Some("engine"));
                assert_eq!(output.expect("output")["parts"][0]["name"], "Piston");
            }
            other => panic!("unexpected chunk: {other:?}"),
        }
    }

    #[test]
    fn tool_result_with_non_string_input_falls_back() {
        let chunk = Chunk::from_value(json!({
            "type": "tool-result",
            "input": {"equipment": "engine"},
            "output": null,
        }))
        .expect("valid chunk");
        assert_eq!(
            chunk,
            Chunk::ToolResult {
                input: None,
                output: None,
            }
        );
    }

    #[test]
    fn unknown_kind_is_preserved() {
        let value = json!({"type": "reasoning-delta", "text": "hmm"});
        let chunk = Chunk::from_value(value.clone()).expect("valid chunk");
        assert_eq!(
            chunk,
            Chunk::Other {
                kind: "reasoning-delta".to_string(),
                payload: value,
            }
        );
        assert_eq!(chunk.kind(), "reasoning-delta");
    }
}
