//! Plain-data request descriptor types.
//!
//! # Design
//! `HttpRequest` describes a fully built API call as plain data. The client
//! builds one descriptor per call and hands it to the transport; it is never
//! mutated after construction and carries no connection state. Descriptors
//! derive `PartialEq` so two calls built from identical inputs compare equal.

use std::time::Duration;

use serde_json::Value;

/// HTTP method for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An API request described as plain data.
///
/// Built by [`crate::ApiClient::build_request`] and consumed by a
/// [`crate::Transport`]. `url` is the absolute URL (base URL already joined);
/// `headers` include the auth and content-type headers plus any per-call
/// extras.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Option<Duration>,
}

/// Optional per-call configuration.
///
/// Extra headers are appended after the client's default headers; a later
/// entry with the same name wins at the transport level.
#[derive(Debug, Clone, Default)]
pub struct HttpOptions {
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}
