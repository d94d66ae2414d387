//! Derived-event synthesis.
//!
//! A result-bearing chunk does not pass through; its structured payload
//! is expanded into a fixed, ordered block of UI events: a processing
//! status, a layout hint, a parsing status, the domain-data event, and
//! a completion status templated with the record count and subject.

use tracing::debug;
use uistream_core::{JsonValue, Layout, LayoutData, Part, PartsData, SegmentId, StatusPhase, UiEvent};

pub(crate) const PROCESSING_MESSAGE: &str = "Generating parts inventory...";
pub(crate) const PARSING_MESSAGE: &str = "Formatting parts list...";

/// The structured payload extracted from a result-bearing chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPayload {
    /// The subject the records apply to.
    pub subject: String,
    /// The extracted records. May be empty; an empty list still yields
    /// a domain-data event with `total == 0`.
    pub parts: Vec<Part>,
}

impl ResultPayload {
    /// Extract a payload from a tool result's raw fields.
    ///
    /// Returns `None` when the output is absent or its `parts` field
    /// does not match the record schema - the chunk then contributes no
    /// derived events. The subject falls back to the turn's subject
    /// hint when the tool input was not a usable string.
    pub fn extract(
        input: Option<&str>,
        output: Option<&JsonValue>,
        subject_hint: &str,
    ) -> Option<Self> {
        let output = output?;
        let parts_value = output.get("parts")?;
        let parts: Vec<Part> = match serde_json::from_value(parts_value.clone()) {
            Ok(parts) => parts,
            Err(err) => {
                debug!(error = %err, "tool result parts did not match the record schema");
                return None;
            }
        };

        let subject = input
            .filter(|input| !input.is_empty())
            .unwrap_or(subject_hint)
            .to_string();

        Some(Self { subject, parts })
    }

    /// Expand the payload into the fixed derived-event block.
    #[must_use]
    pub fn into_events(self, layout: Layout, layout_id: SegmentId) -> Vec<UiEvent> {
        let total = self.parts.len();
        let complete = format!("Found {} parts for {}", total, self.subject);

        vec![
            UiEvent::status(StatusPhase::Processing, PROCESSING_MESSAGE),
            UiEvent::Layout {
                id: layout_id,
                data: LayoutData { layout },
            },
            UiEvent::status(StatusPhase::Parsing, PARSING_MESSAGE),
            UiEvent::Parts {
                data: PartsData {
                    equipment: self.subject,
                    parts: self.parts,
                    total,
                },
            },
            UiEvent::status(StatusPhase::Complete, complete),
        ]
    }
}
