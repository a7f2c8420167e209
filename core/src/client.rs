//! Client for the generative-AI HTTP API.
//!
//! # Design
//! `ApiClient` holds only long-lived configuration (API key, base URL) and
//! an injectable transport. Each call builds a fresh immutable
//! `HttpRequest`, hands it to the transport with the stream flag, and
//! returns the payload or segment sequence. Calls share no mutable state,
//! so concurrent calls need no coordination: N concurrent suspending calls
//! against a uniform-latency transport complete in about one latency unit.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpOptions, HttpRequest};
use crate::stream::{SegmentIter, SegmentStream};
use crate::transport::{HttpTransport, Transport};

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable for the API key.
const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Client for the generative-AI API.
///
/// Exposes four call operations: blocking and suspending, each with a
/// non-streaming and a streaming variant. All four build the same request
/// descriptor and differ only in how they wait on the transport.
#[derive(Clone)]
pub struct ApiClient {
    api_key: String,
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_key", &self.api_key)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client using the default HTTP transport and base URL.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ApiError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ApiError::InvalidRequest("API key is required".to_string()));
        }
        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            transport: Arc::new(HttpTransport::new()?),
        })
    }

    /// Create a client using the GEMINI_API_KEY environment variable.
    pub fn from_env() -> Result<Self, ApiError> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| {
            ApiError::InvalidRequest(format!("missing {API_KEY_ENV} environment variable"))
        })?;
        Self::new(api_key)
    }

    /// Override the base URL. A trailing slash is stripped.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Substitute the transport, e.g. a recording fake in tests.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Build the immutable request descriptor for one call.
    ///
    /// Pure apart from reading client configuration: joins `path` onto the
    /// base URL, attaches the auth and content-type headers, then appends
    /// any per-call headers and timeout from `options`. `path` must be
    /// relative and free of whitespace and control characters.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        options: Option<&HttpOptions>,
    ) -> Result<HttpRequest, ApiError> {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Err(ApiError::InvalidRequest("path must not be empty".to_string()));
        }
        if path.contains("://") {
            return Err(ApiError::InvalidRequest(
                "path must be relative to the base URL".to_string(),
            ));
        }
        if path.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ApiError::InvalidRequest(format!(
                "path contains whitespace or control characters: {path:?}"
            )));
        }

        let mut headers = vec![
            ("x-goog-api-key".to_string(), self.api_key.clone()),
            ("content-type".to_string(), "application/json".to_string()),
        ];
        let mut timeout = None;
        if let Some(options) = options {
            headers.extend(options.headers.iter().cloned());
            timeout = options.timeout;
        }

        Ok(HttpRequest {
            method,
            url: format!("{}/{}", self.base_url, path),
            headers,
            body,
            timeout,
        })
    }

    /// Perform a call, blocking until the full payload is available.
    pub fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        options: Option<&HttpOptions>,
    ) -> Result<Value, ApiError> {
        let request = self.build_request(method, path, body, options)?;
        debug!(method = request.method.as_str(), url = %request.url, "blocking request");
        self.transport.send(&request, false)?.into_payload()
    }

    /// Perform a streamed call. The returned sequence blocks per segment,
    /// not for the whole response.
    pub fn request_streamed(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        options: Option<&HttpOptions>,
    ) -> Result<SegmentIter, ApiError> {
        let request = self.build_request(method, path, body, options)?;
        debug!(method = request.method.as_str(), url = %request.url, "blocking streamed request");
        self.transport.send(&request, true)?.into_segments()
    }

    /// Perform a call, suspending until the full payload is available.
    pub async fn async_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        options: Option<&HttpOptions>,
    ) -> Result<Value, ApiError> {
        let request = self.build_request(method, path, body, options)?;
        debug!(method = request.method.as_str(), url = %request.url, "suspending request");
        self.transport
            .send_async(&request, false)
            .await?
            .into_payload()
    }

    /// Perform a streamed call. Each `next` on the returned sequence is a
    /// suspension point.
    pub async fn async_request_streamed(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        options: Option<&HttpOptions>,
    ) -> Result<SegmentStream, ApiError> {
        let request = self.build_request(method, path, body, options)?;
        debug!(method = request.method.as_str(), url = %request.url, "suspending streamed request");
        self.transport
            .send_async(&request, true)
            .await?
            .into_segments()
    }
}
