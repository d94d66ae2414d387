//! Server-side relay turning agent chunk streams into UI message
//! streams.
//!
//! This crate hosts the deterministic half of a chat-style route: given
//! an asynchronous source of loosely-typed agent chunks, it classifies
//! each one, derives the custom `data-*` events a client renders, and
//! forwards everything - in order, exactly once each - to an outgoing
//! event sink.
//!
//! # Architecture
//!
//! The crate is built around three abstractions:
//!
//! 1. **[`ChunkSource`]** trait - the injected upstream; implementors
//!    wrap an agent SDK or model gateway and return a [`ChunkStream`]
//! 2. **[`Relay`]** - the stream-transformation engine with its
//!    per-turn [`RelayConfig`] and idempotence guarantees
//! 3. **[`EventSink`]** - the write-append output; a channel-backed
//!    sink feeds the HTTP response body
//!
//! # Quick Start
//!
//! ```rust
//! use uistream_server::{BufferSink, Relay, RelayConfig, RunContext};
//! use futures::stream;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let relay = Relay::new(RelayConfig::default().with_subject_hint("engine"));
//! let chunks = Box::pin(stream::iter(vec![
//!     Ok(json!({"type": "text-delta", "id": "a", "text": "hi"})),
//! ]));
//!
//! let mut sink = BufferSink::new();
//! let summary = relay.run(chunks, &mut sink, &RunContext::new()).await;
//! assert_eq!(summary.emitted, 2); // the delta plus a fallback completion
//! # }
//! ```
//!
//! # Framework Integration
//!
//! With the `axum-integration` feature (enabled by default) the relay
//! mounts as a set of streaming HTTP routes:
//!
//! ```rust,ignore
//! use uistream_server::integrations::axum::RelayRouter;
//!
//! let app = RelayRouter::new(source).into_router();
//! ```
//!
//! # Error Handling
//!
//! All operations use structured error types from the [`error`] module.
//! Per-chunk failures are recovered inside the relay; only request- and
//! turn-level failures surface to callers.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod context;
pub mod derive;
pub mod encoder;
pub mod error;
pub mod relay;
pub mod sink;
pub mod source;
pub mod speech;

#[cfg(feature = "axum-integration")]
pub mod integrations;

// Re-export the primary surface for convenience
pub use context::RunContext;
pub use derive::ResultPayload;
pub use encoder::{encode_sse, SSE_CONTENT_TYPE, UI_STREAM_HEADER_NAME, UI_STREAM_HEADER_VALUE};
pub use error::{
    EncodeError, EncodeResult, RelayError, RelayResult, SinkError, SourceError, SourceResult,
};
pub use relay::{Relay, RelayConfig, RelayOutcome, RelaySummary, UnknownChunkPolicy};
pub use sink::{BufferSink, ChannelSink, EventSink};
pub use source::{ChunkSource, ChunkStream, HealthStatus, SourceRequest};
pub use speech::{AudioStream, SpeechSynthesizer};

// Re-export the entire core crate for full access
pub use uistream_core;

// Re-export commonly used core types for convenience
pub use uistream_core::{Chunk, ConversationMessage, SegmentId, StatusPhase, TurnId, UiEvent};

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use uistream_server::prelude::*;
/// ```
pub mod prelude {
    pub use crate::context::RunContext;
    pub use crate::error::{RelayError, SinkError, SourceError, SourceResult};
    pub use crate::relay::{Relay, RelayConfig, RelayOutcome, UnknownChunkPolicy};
    pub use crate::sink::{BufferSink, ChannelSink, EventSink};
    pub use crate::source::{ChunkSource, ChunkStream, HealthStatus, SourceRequest};
    pub use crate::speech::{AudioStream, SpeechSynthesizer};

    pub use uistream_core::{
        Chunk, ConversationMessage, JsonValue, SegmentId, StatusPhase, UiEvent,
    };

    pub use async_trait::async_trait;
    pub use futures::stream::BoxStream;
}
