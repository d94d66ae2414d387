//! Upstream chunk source abstraction.
//!
//! The relay never looks an agent up by name or registry; it is handed
//! a ready [`ChunkStream`] opened from an injected [`ChunkSource`].
//! Implementations wrap whatever produces chunks - an agent SDK, a
//! model gateway, or a scripted fixture in tests.

use crate::context::RunContext;
use crate::error::SourceResult;
use async_trait::async_trait;
use futures::stream::BoxStream;
use uistream_core::{ConversationMessage, JsonValue, Role};

/// A finite, single-consumer stream of loosely-typed chunks.
///
/// `Ok` items are the raw values an agent SDK emits (validated later by
/// the relay); an `Err` item is a stream-level failure and terminates
/// the turn with one `Error` status.
pub type ChunkStream = BoxStream<'static, SourceResult<JsonValue>>;

/// Input for opening a chunk stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRequest {
    /// Conversation history, oldest first.
    pub messages: Vec<ConversationMessage>,
}

impl SourceRequest {
    /// Build a request from a conversation history.
    #[must_use]
    pub fn from_messages(messages: Vec<ConversationMessage>) -> Self {
        Self { messages }
    }

    /// Build a request from a bare subject string (the single-prompt
    /// variant of the HTTP contract).
    #[must_use]
    pub fn subject(subject: impl Into<String>) -> Self {
        Self {
            messages: vec![ConversationMessage::user(subject)],
        }
    }

    /// The content of the most recent user message, if any.
    #[must_use]
    pub fn latest_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|message| message.role == Role::User)
            .map(|message| message.content.as_str())
    }
}

/// Core trait for upstream chunk producers.
///
/// # Errors
///
/// `open` fails only for request-level problems (backend unreachable,
/// bad input) - those become a JSON error response, never a stream.
/// Once a stream is returned, failures travel through its items.
#[async_trait]
pub trait ChunkSource: Send + Sync {
    /// Open a chunk stream for one turn.
    ///
    /// Implementations should watch `ctx` for cancellation and release
    /// their resources when the returned stream is dropped.
    async fn open(&self, request: SourceRequest, ctx: RunContext) -> SourceResult<ChunkStream>;

    /// Health check for load balancer probes.
    ///
    /// The default implementation always returns `Healthy`.
    async fn health(&self) -> SourceResult<HealthStatus> {
        Ok(HealthStatus::Healthy)
    }

    /// Source name for logging and the health endpoint.
    fn name(&self) -> &'static str {
        "source"
    }
}

/// Health check status returned by source health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Source is fully operational.
    Healthy,
    /// Source is operational but experiencing issues.
    Degraded {
        /// Human-readable reason for degraded status.
        reason: String,
    },
    /// Source cannot handle requests.
    Unhealthy {
        /// Human-readable reason for unhealthy status.
        reason: String,
    },
}

impl HealthStatus {
    /// Check if the status indicates the source can handle requests.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy | Self::Degraded { .. })
    }

    /// Create a degraded status with the given reason.
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self::Degraded {
            reason: reason.into(),
        }
    }

    /// Create an unhealthy status with the given reason.
    pub fn unhealthy(reason: impl Into<String>) -> Self {
        Self::Unhealthy {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded { reason } => write!(f, "degraded: {reason}"),
            Self::Unhealthy { reason } => write!(f, "unhealthy: {reason}"),
        }
    }
}

/// Allow `Arc<dyn ChunkSource>` style indirection without re-wrapping.
#[async_trait]
impl<T: ChunkSource + ?Sized> ChunkSource for std::sync::Arc<T> {
    async fn open(&self, request: SourceRequest, ctx: RunContext) -> SourceResult<ChunkStream> {
        (**self).open(request, ctx).await
    }

    async fn health(&self) -> SourceResult<HealthStatus> {
        (**self).health().await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
