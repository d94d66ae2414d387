//! Core type library for the uistream wire contract.
//!
//! This crate defines the two halves of the relay boundary:
//!
//! - [`Chunk`] — one unit of an upstream agent's incremental output,
//!   parsed from the loosely-typed values agent SDKs emit.
//! - [`UiEvent`] — one event on the client-facing UI message stream,
//!   serialized exactly as the browser consumes it.
//!
//! The types here are deliberately free of transport and runtime
//! concerns; the relay engine and HTTP surface live in
//! `uistream-server`.

pub mod chunk;
pub mod error;
pub mod event;
pub mod types;

pub use chunk::Chunk;
pub use error::{ChunkError, EventError};
pub use event::{Layout, LayoutData, Part, PartsData, StatusData, StatusPhase, UiEvent};
pub use types::ids::{SegmentId, TurnId};
pub use types::message::{ConversationMessage, Role};

/// Re-export to ensure the same type is used
pub use serde_json::Value as JsonValue;
