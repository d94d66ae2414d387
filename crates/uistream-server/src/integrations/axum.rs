//! Axum web framework integration for the relay.
//!
//! This module provides seamless integration with the [Axum](https://docs.rs/axum)
//! web framework, including:
//!
//! - Streaming chat routes backed by the relay engine
//! - A voice route forwarding synthesized audio
//! - Request body parsing with JSON error responses
//! - Health check endpoint
//! - Router builder for easy setup
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use uistream_server::integrations::axum::RelayRouter;
//! use uistream_server::prelude::*;
//! use std::sync::Arc;
//!
//! # struct MySource;
//! # #[async_trait]
//! # impl ChunkSource for MySource {
//! #     async fn open(&self, _: SourceRequest, _: RunContext)
//! #         -> SourceResult<ChunkStream> { todo!() }
//! # }
//! #[tokio::main]
//! async fn main() {
//!     let source: Arc<dyn ChunkSource> = Arc::new(MySource);
//!
//!     let app = RelayRouter::new(source).into_router();
//!
//!     // Run with axum server...
//! }
//! ```
//!
//! # Endpoints
//!
//! - `POST /api/parts` - subject-focused turn with a Starting preamble
//! - `POST /api/chat` - conversational turn over the full history
//! - `POST /api/tts` - synthesized speech for a text
//! - `GET /health` - health check
//!
//! Mid-stream failures never surface as transport faults: the response
//! body always ends cleanly after the relay's terminal event.

use crate::context::RunContext;
use crate::encoder::{
    encode_sse, SSE_CONTENT_TYPE, UI_STREAM_HEADER_NAME, UI_STREAM_HEADER_VALUE,
};
use crate::relay::{Relay, RelayConfig};
use crate::sink::{ChannelSink, EventSink};
use crate::source::{ChunkSource, ChunkStream, HealthStatus, SourceRequest};
use crate::speech::SpeechSynthesizer;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};
use uistream_core::{ConversationMessage, JsonValue, StatusPhase, UiEvent};

/// Status message written ahead of the relay on the parts route.
const STARTING_MESSAGE: &str = "Initializing parts analysis...";

/// Maximum accepted request body size (10 MB).
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Events buffered between the relay task and the response body.
const STREAM_BUFFER: usize = 32;

/// Shared state passed to all handlers.
///
/// Collaborators are injected here; handlers never look anything up by
/// name.
#[derive(Clone)]
pub struct AppState {
    source: Arc<dyn ChunkSource>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
    config: RelayConfig,
}

impl AppState {
    /// Create state with the given chunk source and a default relay
    /// configuration.
    #[must_use]
    pub fn new(source: Arc<dyn ChunkSource>) -> Self {
        Self {
            source,
            speech: None,
            config: RelayConfig::default(),
        }
    }

    /// Get a reference to the chunk source.
    #[must_use]
    pub fn source(&self) -> &Arc<dyn ChunkSource> {
        &self.source
    }
}

/// Router builder for the relay's HTTP surface.
///
/// # Example
///
/// ```rust,no_run
/// # use uistream_server::integrations::axum::RelayRouter;
/// # use uistream_server::prelude::*;
/// # use std::sync::Arc;
/// # struct MySource;
/// # #[async_trait]
/// # impl ChunkSource for MySource {
/// #     async fn open(&self, _: SourceRequest, _: RunContext)
/// #         -> SourceResult<ChunkStream> { todo!() }
/// # }
/// # let source: Arc<dyn ChunkSource> = Arc::new(MySource);
/// let router = RelayRouter::new(source)
///     .with_path_prefix("/api/v1")
///     .into_router();
/// ```
pub struct RelayRouter {
    state: AppState,
    path_prefix: String,
}

impl RelayRouter {
    /// Create a new router builder around a chunk source.
    #[must_use]
    pub fn new(source: Arc<dyn ChunkSource>) -> Self {
        Self {
            state: AppState::new(source),
            path_prefix: String::new(),
        }
    }

    /// Attach a speech synthesizer, enabling the tts route.
    #[must_use]
    pub fn with_speech(mut self, speech: Arc<dyn SpeechSynthesizer>) -> Self {
        self.state.speech = Some(speech);
        self
    }

    /// Override the relay configuration used by the chat-style routes.
    ///
    /// The subject hint is still replaced per request from the
    /// conversation body.
    #[must_use]
    pub fn with_config(mut self, config: RelayConfig) -> Self {
        self.state.config = config;
        self
    }

    /// Set a path prefix for all routes.
    ///
    /// The prefix should start with `/` and not end with `/`.
    #[must_use]
    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = prefix.into();
        self
    }

    /// Build the Axum router with all endpoints configured.
    pub fn into_router(self) -> Router {
        let prefix = self.path_prefix;
        let route = |path: &str| format!("{prefix}{path}");

        Router::new()
            .route(&route("/api/parts"), post(parts_handler))
            .route(&route("/api/chat"), post(chat_handler))
            .route(&route("/api/tts"), post(tts_handler))
            .route(&route("/health"), get(health_handler))
            .with_state(self.state)
    }
}

/// Body of the chat-style routes.
#[derive(Debug, Deserialize)]
struct ChatRequest {
    messages: Vec<ConversationMessage>,
}

/// Body of the tts route. `text` stays loosely typed so the handler can
/// distinguish "missing" from "not a string".
#[derive(Debug, Deserialize)]
struct TtsRequest {
    #[serde(default)]
    text: Option<JsonValue>,
}

/// Handler for the parts route.
///
/// Streams a subject-focused turn: one `Starting` status, then the
/// relay's output for a source opened on the latest user prompt.
pub async fn parts_handler(State(state): State<AppState>, request: Request) -> Response {
    let chat: ChatRequest = match parse_body(request).await {
        Ok(chat) => chat,
        Err(response) => return response,
    };

    let subject = latest_subject(&chat.messages, &state.config.subject_hint);
    let config = state.config.clone().with_subject_hint(subject.clone());

    let ctx = RunContext::new();
    let chunks = match state
        .source
        .open(SourceRequest::subject(subject), ctx.clone())
        .await
    {
        Ok(chunks) => chunks,
        Err(err) => {
            warn!(turn_id = %ctx.turn_id(), error = %err, "source refused to open a stream");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                Some(err.to_string()),
            );
        }
    };

    let starting = UiEvent::status(StatusPhase::Starting, STARTING_MESSAGE);
    stream_response(chunks, config, ctx, Some(starting))
}

/// Handler for the chat route.
///
/// Same streaming shape as the parts route, without the Starting
/// preamble, with the full conversation history forwarded upstream.
pub async fn chat_handler(State(state): State<AppState>, request: Request) -> Response {
    let chat: ChatRequest = match parse_body(request).await {
        Ok(chat) => chat,
        Err(response) => return response,
    };

    let subject = latest_subject(&chat.messages, &state.config.subject_hint);
    let config = state.config.clone().with_subject_hint(subject);

    let ctx = RunContext::new();
    let chunks = match state
        .source
        .open(SourceRequest::from_messages(chat.messages), ctx.clone())
        .await
    {
        Ok(chunks) => chunks,
        Err(err) => {
            warn!(turn_id = %ctx.turn_id(), error = %err, "source refused to open a stream");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                Some(err.to_string()),
            );
        }
    };

    stream_response(chunks, config, ctx, None)
}

/// Handler for the tts route.
///
/// Validates the text, then forwards the synthesizer's audio bytes with
/// `audio/mpeg` framing and a `X-Generated-Text-Length` header.
///
/// # Panics
///
/// Panics only if the HTTP response builder rejects its statically
/// valid headers, which does not occur.
pub async fn tts_handler(State(state): State<AppState>, request: Request) -> Response {
    let tts: TtsRequest = match parse_body(request).await {
        Ok(tts) => tts,
        Err(response) => return response,
    };

    let text = match tts.text {
        Some(JsonValue::String(text)) if !text.trim().is_empty() => text,
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Text is required and must be a non-empty string",
                None,
            );
        }
    };

    let Some(speech) = state.speech.clone() else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "speech synthesizer not configured",
            None,
        );
    };

    let audio = match speech.speak(&text).await {
        Ok(audio) => audio,
        Err(err) => {
            warn!(error = %err, "speech synthesis failed to start");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error during text-to-speech conversion",
                Some(err.to_string()),
            );
        }
    };

    // A mid-stream synthesis failure has no in-band error framing, so
    // the body simply ends at the last good byte.
    let body_stream = audio.scan((), |_, item| {
        futures::future::ready(match item {
            Ok(bytes) => Some(Ok::<_, Infallible>(bytes)),
            Err(err) => {
                warn!(error = %err, "audio stream failed mid-response");
                None
            }
        })
    });

    let text_length = http::HeaderValue::from(text.chars().count() as u64);
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "audio/mpeg")
        .header(CACHE_CONTROL, "no-cache")
        .header("X-Generated-Text-Length", text_length)
        .body(Body::from_stream(body_stream))
        .expect("response builder should not fail with valid inputs")
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Health status string.
    pub status: String,
    /// Chunk source name.
    pub source: String,
    /// Optional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Handler for the health check endpoint.
///
/// Returns the chunk source's health status as JSON.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.source.health().await {
        Ok(status) => {
            let (status_str, details) = match status {
                HealthStatus::Healthy => ("healthy", None),
                HealthStatus::Degraded { reason } => ("degraded", Some(reason)),
                HealthStatus::Unhealthy { reason } => ("unhealthy", Some(reason)),
            };

            let response = HealthResponse {
                status: status_str.to_string(),
                source: state.source.name().to_string(),
                details,
            };

            let status_code = if response.status == "unhealthy" {
                StatusCode::SERVICE_UNAVAILABLE
            } else {
                StatusCode::OK
            };

            (status_code, Json(response))
        }
        Err(e) => {
            let response = HealthResponse {
                status: "error".to_string(),
                source: state.source.name().to_string(),
                details: Some(e.to_string()),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response))
        }
    }
}

/// Read and deserialize a JSON request body, mapping failures to the
/// JSON error responses of the route contract.
async fn parse_body<T: serde::de::DeserializeOwned>(request: Request) -> Result<T, Response> {
    let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|e| {
            error_response(
                StatusCode::BAD_REQUEST,
                "failed to read request body",
                Some(e.to_string()),
            )
        })?;

    serde_json::from_slice(&bytes).map_err(|e| {
        error_response(
            StatusCode::BAD_REQUEST,
            "invalid request body",
            Some(e.to_string()),
        )
    })
}

/// The subject of a turn: the latest user message's content, else the
/// configured default.
fn latest_subject(messages: &[ConversationMessage], default: &str) -> String {
    messages
        .iter()
        .rev()
        .find(|message| message.role == uistream_core::Role::User)
        .map(|message| message.content.as_str())
        .filter(|content| !content.trim().is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Drive the relay in a background task and stream its events as the
/// response body.
///
/// The response is always 200 with a cleanly terminated SSE body; by
/// the time this is called every request-level failure has already been
/// turned into a JSON error response.
///
/// # Panics
///
/// Panics only if the HTTP response builder rejects its statically
/// valid headers, which does not occur.
fn stream_response(
    chunks: ChunkStream,
    config: RelayConfig,
    ctx: RunContext,
    preamble: Option<UiEvent>,
) -> Response {
    let (tx, rx) = mpsc::channel(STREAM_BUFFER);

    let relay = Relay::new(config);
    let relay_ctx = ctx.clone();
    tokio::spawn(async move {
        let turn_id = relay_ctx.turn_id();
        let mut sink = ChannelSink::new(tx);

        if let Some(event) = preamble {
            if sink.send(event).await.is_err() {
                debug!(%turn_id, "client went away before streaming started");
                return;
            }
        }

        let summary = relay.run(chunks, &mut sink, &relay_ctx).await;
        debug!(
            %turn_id,
            outcome = ?summary.outcome,
            chunks = summary.chunks,
            emitted = summary.emitted,
            skipped = summary.skipped,
            "turn finished"
        );
    });

    // Dropping the response body - the client went away, or the stream
    // was consumed - cancels the run context, so the relay stops
    // awaiting chunks promptly instead of discovering the closure at
    // its next write.
    let events = CancelOnDrop {
        inner: ReceiverStream::new(rx),
        ctx,
    };

    let body_stream = events.map(|event| {
        let bytes = match encode_sse(&event) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, "failed to encode event; substituting an error status");
                let fallback = UiEvent::status(StatusPhase::Error, format!("Error: {err}"));
                encode_sse(&fallback).unwrap_or_else(|_| {
                    Bytes::from_static(
                        b"data: {\"type\":\"data-status\",\"data\":{\"phase\":\"Error\",\"message\":\"encoding failed\"}}\n\n",
                    )
                })
            }
        };
        Ok::<_, Infallible>(bytes)
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, SSE_CONTENT_TYPE)
        .header(CACHE_CONTROL, "no-cache")
        .header(UI_STREAM_HEADER_NAME, UI_STREAM_HEADER_VALUE)
        .body(Body::from_stream(body_stream))
        .expect("response builder should not fail with valid inputs")
}

/// Stream wrapper that cancels a run context when dropped.
///
/// The HTTP server drops the response body on client disconnect; the
/// `Drop` impl turns that into cooperative cancellation of the relay.
struct CancelOnDrop<S> {
    inner: S,
    ctx: RunContext,
}

impl<S: futures::Stream + Unpin> futures::Stream for CancelOnDrop<S> {
    type Item = S::Item;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<S::Item>> {
        std::pin::Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl<S> Drop for CancelOnDrop<S> {
    fn drop(&mut self) {
        self.ctx.cancel();
    }
}

/// Create a JSON error response with the given status code and message.
fn error_response(status: StatusCode, message: &str, details: Option<String>) -> Response {
    let mut body = serde_json::json!({ "error": message });
    if let Some(details) = details {
        body["details"] = JsonValue::String(details);
    }

    let escaped = message.replace('"', "\\\"");
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap_or_else(
            |_| format!("{{\"error\":\"{escaped}\"}}"),
        )))
        .expect("response builder should not fail with valid inputs")
}
