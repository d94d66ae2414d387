//! Web framework integrations for serving the relay.
//!
//! This module provides ready-to-use integrations with popular Rust web
//! frameworks, handling HTTP request/response formatting and SSE
//! streaming.
//!
//! # Available Integrations
//!
//! - `axum` (requires `axum-integration` feature) - Integration with the Axum framework

#[cfg(feature = "axum-integration")]
pub mod axum;
