use thiserror::Error;

/// Validation errors raised while parsing an upstream chunk.
///
/// A chunk that fails validation is skipped by the relay, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ChunkError {
    /// The chunk value is not a JSON object.
    #[error("chunk is not a JSON object")]
    NotAnObject,

    /// The chunk has no usable kind tag.
    #[error("chunk has a missing, empty, or non-string 'type' field")]
    MissingKind,

    /// A recognized kind carried a field of the wrong shape.
    #[error("chunk of kind '{kind}' has an invalid '{field}' field")]
    InvalidField {
        /// The chunk kind being parsed.
        kind: &'static str,
        /// The offending field name.
        field: &'static str,
    },
}

/// Validation errors for outgoing UI events.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EventError {
    /// Every event written to the client stream must carry a non-empty
    /// string type tag.
    #[error("event type must be a non-empty string")]
    MissingType,
}
