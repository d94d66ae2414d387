//! The chunk relay engine.
//!
//! One [`Relay`] run consumes one upstream [`ChunkStream`] and writes
//! one turn's worth of [`UiEvent`]s to an [`EventSink`]. Processing is
//! strictly sequential: the relay suspends on the next chunk and on
//! each sink write, and never reorders output.
//!
//! Failure policy, per chunk: malformed or unexpected chunks are
//! logged and skipped, never fatal. Failure policy, per turn: an
//! upstream error item (or a stall past the configured timeout) is
//! surfaced as exactly one terminal `Error` status, after which the
//! stream ends cleanly. A permanently closed sink - the client went
//! away - stops the relay early without error, dropping the upstream
//! stream so its resources are released.

use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, warn};
use uistream_core::{Chunk, JsonValue, Layout, SegmentId, StatusPhase, UiEvent};

use crate::context::RunContext;
use crate::derive::ResultPayload;
use crate::error::{SinkError, SourceError};
use crate::sink::EventSink;
use crate::source::ChunkStream;

/// Status message emitted when a turn ends without any result-bearing
/// chunk having been observed.
pub(crate) const FALLBACK_COMPLETE_MESSAGE: &str = "Analysis completed successfully!";

/// Event type assigned to re-tagged tool output that carries no type of
/// its own.
const DEFAULT_TOOL_OUTPUT_TYPE: &str = "data-tool-output";

/// What to do with chunk kinds the relay does not model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownChunkPolicy {
    /// Forward the original chunk object unchanged (forward
    /// compatibility with newer upstream SDKs).
    #[default]
    PassThrough,
    /// Silently drop unmodeled kinds.
    Drop,
}

/// Per-turn relay configuration.
///
/// One config parameterizes every chat-style route; the routes differ
/// only in the values they set here, not in relay code.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Policy for `tool-call` and unknown chunk kinds.
    pub unknown_chunks: UnknownChunkPolicy,
    /// Subject used for derived events when the tool result carries no
    /// usable input.
    pub subject_hint: String,
    /// Placeholder id assigned to textual chunks that arrive without
    /// one, so their deltas coalesce into a single segment.
    pub text_fallback_id: SegmentId,
    /// Layout advertised ahead of the domain-data event.
    pub layout: Layout,
    /// Correlation id of the layout hint event.
    pub layout_id: SegmentId,
    /// Maximum time to wait for the next chunk before treating the
    /// source as failed. `None` (the default) waits indefinitely.
    pub stall_timeout: Option<Duration>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            unknown_chunks: UnknownChunkPolicy::default(),
            subject_hint: "engine".to_string(),
            text_fallback_id: SegmentId::text_fallback(),
            layout: Layout::grid(2, 2),
            layout_id: SegmentId::layout_hint(),
            stall_timeout: None,
        }
    }
}

impl RelayConfig {
    /// Set the subject used when a tool result has no usable input.
    #[must_use]
    pub fn with_subject_hint(mut self, subject: impl Into<String>) -> Self {
        self.subject_hint = subject.into();
        self
    }

    /// Set the policy for unmodeled chunk kinds.
    #[must_use]
    pub fn with_unknown_chunks(mut self, policy: UnknownChunkPolicy) -> Self {
        self.unknown_chunks = policy;
        self
    }

    /// Bound how long the relay waits for each chunk.
    #[must_use]
    pub fn with_stall_timeout(mut self, timeout: Duration) -> Self {
        self.stall_timeout = Some(timeout);
        self
    }
}

/// How a relay run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The source was consumed to exhaustion.
    Completed,
    /// An upstream error item terminated the turn.
    SourceFailed,
    /// No chunk arrived within the stall timeout.
    Stalled,
    /// The sink closed permanently (client disconnect).
    SinkClosed,
    /// The run context was cancelled.
    Cancelled,
}

/// Accounting for one relay run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySummary {
    /// How the run ended.
    pub outcome: RelayOutcome,
    /// Chunks received from the source (valid or not).
    pub chunks: usize,
    /// Chunks that produced no output (malformed, absent payload,
    /// duplicate result, dropped by policy).
    pub skipped: usize,
    /// Events successfully written to the sink.
    pub emitted: usize,
    /// Whether a result-bearing chunk was observed this turn.
    pub derived: bool,
}

/// Relay-local state, owned by exactly one run.
#[derive(Debug, Default)]
struct RelayState {
    /// Set on the first result-bearing chunk; later ones are ignored.
    derived_seen: bool,
}

enum Step {
    Item(Result<JsonValue, SourceError>),
    End,
    Stalled(Duration),
}

enum WriteOutcome {
    Written,
    Dropped,
    Closed,
}

/// The stream-transformation engine.
#[derive(Debug, Clone, Default)]
pub struct Relay {
    config: RelayConfig,
}

impl Relay {
    /// Create a relay with the given configuration.
    #[must_use]
    pub fn new(config: RelayConfig) -> Self {
        Self { config }
    }

    /// The relay's configuration.
    #[must_use]
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Consume `chunks` to exhaustion (or failure), writing the
    /// resulting events to `sink`.
    ///
    /// This never returns an error: every failure mode is either
    /// recovered locally or folded into the returned summary, and the
    /// client-visible stream always ends with a well-formed terminal
    /// event when one is due.
    pub async fn run<S: EventSink>(
        &self,
        mut chunks: ChunkStream,
        sink: &mut S,
        ctx: &RunContext,
    ) -> RelaySummary {
        let mut state = RelayState::default();
        let mut summary = RelaySummary {
            outcome: RelayOutcome::Completed,
            chunks: 0,
            skipped: 0,
            emitted: 0,
            derived: false,
        };

        loop {
            let step = tokio::select! {
                _ = ctx.cancelled() => {
                    debug!(turn_id = %ctx.turn_id(), "run cancelled; stopping relay");
                    summary.outcome = RelayOutcome::Cancelled;
                    summary.derived = state.derived_seen;
                    return summary;
                }
                step = next_chunk(&mut chunks, self.config.stall_timeout) => step,
            };

            let item = match step {
                Step::End => break,
                Step::Stalled(limit) => {
                    let err = SourceError::Stalled {
                        waited_ms: limit.as_millis() as u64,
                    };
                    warn!(turn_id = %ctx.turn_id(), error = %err, "source stalled");
                    summary.outcome = match self.emit_terminal_error(sink, &err, &mut summary).await
                    {
                        WriteOutcome::Closed => RelayOutcome::SinkClosed,
                        _ => RelayOutcome::Stalled,
                    };
                    summary.derived = state.derived_seen;
                    return summary;
                }
                Step::Item(item) => item,
            };

            let value = match item {
                Ok(value) => value,
                Err(err) => {
                    warn!(turn_id = %ctx.turn_id(), error = %err, "source stream failed");
                    summary.outcome = match self.emit_terminal_error(sink, &err, &mut summary).await
                    {
                        WriteOutcome::Closed => RelayOutcome::SinkClosed,
                        _ => RelayOutcome::SourceFailed,
                    };
                    summary.derived = state.derived_seen;
                    return summary;
                }
            };

            summary.chunks += 1;
            let events = self.classify(value, &mut state, &mut summary);
            for event in events {
                match write_event(sink, event).await {
                    WriteOutcome::Written => summary.emitted += 1,
                    WriteOutcome::Dropped => {}
                    WriteOutcome::Closed => {
                        summary.outcome = RelayOutcome::SinkClosed;
                        summary.derived = state.derived_seen;
                        return summary;
                    }
                }
            }
        }

        // The client must observe a terminal status exactly once per
        // turn; a turn that never saw a result-bearing chunk gets the
        // fallback completion.
        if !state.derived_seen {
            let fallback = UiEvent::status(StatusPhase::Complete, FALLBACK_COMPLETE_MESSAGE);
            match write_event(sink, fallback).await {
                WriteOutcome::Written => summary.emitted += 1,
                WriteOutcome::Dropped => {}
                WriteOutcome::Closed => summary.outcome = RelayOutcome::SinkClosed,
            }
        }

        summary.derived = state.derived_seen;
        summary
    }

    /// Classify one raw chunk into zero or more outgoing events.
    fn classify(
        &self,
        value: JsonValue,
        state: &mut RelayState,
        summary: &mut RelaySummary,
    ) -> Vec<UiEvent> {
        let chunk = match Chunk::from_value(value) {
            Ok(chunk) => chunk,
            Err(err) => {
                warn!(error = %err, "skipping malformed chunk");
                summary.skipped += 1;
                return Vec::new();
            }
        };

        match chunk {
            Chunk::TextStart { id } => vec![UiEvent::TextStart {
                id: self.segment_id(id),
            }],
            Chunk::TextDelta {
                id,
                text: Some(delta),
            } => vec![UiEvent::TextDelta {
                id: self.segment_id(id),
                delta,
            }],
            Chunk::TextDelta { text: None, .. } => {
                debug!("skipping text-delta with absent text");
                summary.skipped += 1;
                Vec::new()
            }
            Chunk::TextEnd { id } => vec![UiEvent::TextEnd {
                id: self.segment_id(id),
            }],
            Chunk::ToolResult { input, output } => {
                if state.derived_seen {
                    debug!("ignoring repeated tool-result within one turn");
                    summary.skipped += 1;
                    return Vec::new();
                }
                state.derived_seen = true;
                match ResultPayload::extract(
                    input.as_deref(),
                    output.as_ref(),
                    &self.config.subject_hint,
                ) {
                    Some(payload) => payload
                        .into_events(self.config.layout.clone(), self.config.layout_id.clone()),
                    None => {
                        debug!("tool-result without structured payload; nothing derived");
                        summary.skipped += 1;
                        Vec::new()
                    }
                }
            }
            Chunk::ToolOutput { output } => match retag_tool_output(output) {
                Some(event) => vec![event],
                None => {
                    debug!("skipping tool-output without an object payload");
                    summary.skipped += 1;
                    Vec::new()
                }
            },
            Chunk::ToolCall { payload } | Chunk::Other { payload, .. } => {
                match self.config.unknown_chunks {
                    UnknownChunkPolicy::PassThrough => vec![UiEvent::Raw(payload)],
                    UnknownChunkPolicy::Drop => {
                        summary.skipped += 1;
                        Vec::new()
                    }
                }
            }
        }
    }

    fn segment_id(&self, id: Option<SegmentId>) -> SegmentId {
        id.unwrap_or_else(|| self.config.text_fallback_id.clone())
    }

    /// Emit the single terminal `Error` status for an upstream failure.
    async fn emit_terminal_error<S: EventSink>(
        &self,
        sink: &mut S,
        err: &SourceError,
        summary: &mut RelaySummary,
    ) -> WriteOutcome {
        let event = UiEvent::status(StatusPhase::Error, format!("Error: {err}"));
        let outcome = write_event(sink, event).await;
        if matches!(outcome, WriteOutcome::Written) {
            summary.emitted += 1;
        }
        outcome
    }
}

/// Re-tag pre-shaped tool output: the output object's own `type` (or a
/// default) becomes the event type, the remaining fields become `data`.
fn retag_tool_output(output: Option<JsonValue>) -> Option<UiEvent> {
    let JsonValue::Object(mut fields) = output? else {
        return None;
    };

    let event_type = match fields.remove("type") {
        Some(JsonValue::String(tag)) if !tag.is_empty() => tag,
        _ => DEFAULT_TOOL_OUTPUT_TYPE.to_string(),
    };

    Some(UiEvent::Raw(serde_json::json!({
        "type": event_type,
        "data": JsonValue::Object(fields),
    })))
}

async fn next_chunk(chunks: &mut ChunkStream, stall: Option<Duration>) -> Step {
    match stall {
        Some(limit) => match tokio::time::timeout(limit, chunks.next()).await {
            Ok(Some(item)) => Step::Item(item),
            Ok(None) => Step::End,
            Err(_) => Step::Stalled(limit),
        },
        None => match chunks.next().await {
            Some(item) => Step::Item(item),
            None => Step::End,
        },
    }
}

async fn write_event<S: EventSink>(sink: &mut S, event: UiEvent) -> WriteOutcome {
    match sink.send(event).await {
        Ok(()) => WriteOutcome::Written,
        Err(SinkError::Rejected { reason }) => {
            warn!(%reason, "sink rejected event; continuing with the next one");
            WriteOutcome::Dropped
        }
        Err(SinkError::Closed) => {
            debug!("sink permanently closed; stopping relay early");
            WriteOutcome::Closed
        }
    }
}
