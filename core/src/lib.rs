//! API client core for a remote generative-AI service.
//!
//! # Overview
//! A thin pass-through over an HTTP transport: the client builds an
//! immutable request descriptor per call and delegates to the transport,
//! with blocking and suspending variants of both the non-streaming and the
//! streaming call paths. There is no internal retry, batching, or caching.
//!
//! # Design
//! - `ApiClient` holds only an API key, a base URL, and a transport.
//! - The transport is an injectable trait so tests substitute a recording
//!   fake; `HttpTransport` is the production implementation.
//! - Streamed responses come back as one of two distinct single-pass
//!   sequences: `SegmentIter` (blocks per segment) and `SegmentStream`
//!   (suspends per segment). Dropping either releases the connection.
//! - Integration tests run against the mock-server crate over real HTTP.

pub mod client;
pub mod error;
pub mod http;
pub mod stream;
pub mod transport;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use http::{HttpMethod, HttpOptions, HttpRequest};
pub use stream::{SegmentIter, SegmentStream};
pub use transport::{AsyncTransportReply, HttpTransport, Transport, TransportReply};
