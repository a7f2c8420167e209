//! Error types for the generative-AI API client.
//!
//! # Design
//! `StreamInterrupted` gets a dedicated variant because callers frequently
//! distinguish "the connection dropped mid-stream" (segments already
//! delivered remain valid) from a call that failed outright. Non-success
//! statuses land in `HttpStatus` with the raw status code and body for
//! debugging. The client performs no internal retry; every error surfaces
//! at the call site.

use thiserror::Error;

/// Errors returned by `ApiClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be built from the given inputs.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The server returned a non-success status.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The connection could not be established or the request could not be
    /// sent, including transport-level timeouts.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The connection dropped while waiting for the next segment of a
    /// streamed response.
    #[error("stream interrupted: {0}")]
    StreamInterrupted(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}
