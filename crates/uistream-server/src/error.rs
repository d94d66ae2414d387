//! Error types for the relay and its host surface.
//!
//! The taxonomy mirrors the failure policy of the relay:
//!
//! - Malformed chunks and transient sink rejections are recovered
//!   locally (logged and skipped) and never appear here.
//! - Upstream stream failures become exactly one terminal `Error`
//!   status on the outgoing stream; the variants below describe them.
//! - Request-level failures surface as non-2xx JSON responses before
//!   any stream is opened.
//!
//! No panics in library code - all failures return `Result`.

use thiserror::Error;

/// Top-level errors from relay plumbing.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RelayError {
    /// The run was cancelled via its context or a client disconnect.
    #[error("run aborted: {reason}")]
    Aborted {
        /// Human-readable reason for the abort.
        reason: String,
    },

    /// The upstream chunk source failed.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// The outgoing sink failed permanently.
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// Event encoding failed.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodeError),

    /// Custom error from embedding code.
    #[error("{message}")]
    Custom {
        /// Error message.
        message: String,
        /// Optional source error for chaining.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl RelayError {
    /// Create a custom error with a message.
    #[must_use]
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
            source: None,
        }
    }

    /// Check if this error represents a cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}

/// Failures of the upstream chunk source.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SourceError {
    /// The source refused to open a stream (request-level failure).
    #[error("source unavailable: {reason}")]
    Unavailable {
        /// Why the source could not start.
        reason: String,
    },

    /// The source failed mid-stream, after emitting zero or more chunks.
    #[error("source stream failed: {message}")]
    Stream {
        /// Best-effort description of the upstream failure.
        message: String,
    },

    /// No chunk arrived within the configured stall timeout.
    #[error("source stalled: no chunk within {waited_ms}ms")]
    Stalled {
        /// How long the relay waited, in milliseconds.
        waited_ms: u64,
    },
}

impl SourceError {
    /// Create a request-level unavailability error.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Create a mid-stream failure.
    #[must_use]
    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream {
            message: message.into(),
        }
    }
}

/// Failures of the outgoing event sink.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SinkError {
    /// The sink is permanently closed (client disconnected). The relay
    /// stops early without treating this as an error of its own.
    #[error("sink closed")]
    Closed,

    /// A single write was rejected; later writes may still succeed.
    #[error("sink rejected write: {reason}")]
    Rejected {
        /// Why the write was rejected.
        reason: String,
    },
}

/// Errors during event encoding.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EncodeError {
    /// JSON serialization failed.
    #[error("JSON serialization failed for {event_type}: {source}")]
    Json {
        /// The event type being serialized.
        event_type: String,
        /// The underlying `serde_json` error.
        #[source]
        source: serde_json::Error,
    },

    /// Event data exceeds maximum allowed size.
    #[error("event exceeds max size: {size} bytes > {max} bytes limit")]
    EventTooLarge {
        /// Actual size in bytes.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },
}

/// Result type alias for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;

/// Result type alias for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type alias for encoding operations.
pub type EncodeResult<T> = Result<T, EncodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_error_is_cancelled() {
        let err = RelayError::Aborted {
            reason: "client disconnect".into(),
        };
        assert!(err.is_cancelled());

        let err = RelayError::custom("other error");
        assert!(!err.is_cancelled());
    }

    #[test]
    fn source_errors_convert_into_relay_errors() {
        let err: RelayError = SourceError::stream("model backend failed").into();
        assert!(matches!(err, RelayError::Source(_)));
    }

    #[test]
    fn error_display_messages() {
        assert_eq!(
            SourceError::Stalled { waited_ms: 30_000 }.to_string(),
            "source stalled: no chunk within 30000ms"
        );
        assert_eq!(SinkError::Closed.to_string(), "sink closed");
        assert_eq!(
            EncodeError::EventTooLarge {
                size: 2_000_000,
                max: 1_048_576,
            }
            .to_string(),
            "event exceeds max size: 2000000 bytes > 1048576 bytes limit"
        );
    }
}
