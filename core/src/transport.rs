//! Transport boundary and its default HTTP implementation.
//!
//! # Design
//! `Transport` is the injectable seam between the client and the network:
//! one object carries both the blocking and the suspending send operation,
//! mirroring the two call paths of the client. Tests substitute a recording
//! fake; production uses [`HttpTransport`] (ureq for the blocking path,
//! reqwest for the suspending path). Streamed response bodies are
//! newline-delimited JSON; blank lines are skipped.

use std::io::{BufRead, BufReader};

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde_json::Value;
use tracing::trace;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::stream::{SegmentIter, SegmentStream};

/// What a blocking send produced: a direct payload, or a segment sequence
/// when the stream flag was set.
pub enum TransportReply {
    Payload(Value),
    Segments(SegmentIter),
}

impl TransportReply {
    pub fn into_payload(self) -> Result<Value, ApiError> {
        match self {
            TransportReply::Payload(value) => Ok(value),
            TransportReply::Segments(_) => Err(ApiError::Transport(
                "transport returned a stream for a non-streaming request".to_string(),
            )),
        }
    }

    pub fn into_segments(self) -> Result<SegmentIter, ApiError> {
        match self {
            TransportReply::Segments(segments) => Ok(segments),
            TransportReply::Payload(_) => Err(ApiError::Transport(
                "transport returned a payload for a streaming request".to_string(),
            )),
        }
    }
}

/// What a suspending send produced. Same shape as [`TransportReply`] with a
/// suspending segment sequence.
pub enum AsyncTransportReply {
    Payload(Value),
    Segments(SegmentStream),
}

impl AsyncTransportReply {
    pub fn into_payload(self) -> Result<Value, ApiError> {
        match self {
            AsyncTransportReply::Payload(value) => Ok(value),
            AsyncTransportReply::Segments(_) => Err(ApiError::Transport(
                "transport returned a stream for a non-streaming request".to_string(),
            )),
        }
    }

    pub fn into_segments(self) -> Result<SegmentStream, ApiError> {
        match self {
            AsyncTransportReply::Segments(segments) => Ok(segments),
            AsyncTransportReply::Payload(_) => Err(ApiError::Transport(
                "transport returned a payload for a streaming request".to_string(),
            )),
        }
    }
}

/// Boundary between the client and the network.
///
/// `stream` selects between a direct payload and a lazy segment sequence.
/// Implementations must not retry; errors propagate to the caller as-is.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute `request` on the calling thread, blocking until the response
    /// status and headers are available.
    fn send(&self, request: &HttpRequest, stream: bool) -> Result<TransportReply, ApiError>;

    /// Execute `request` without blocking, suspending until the response
    /// status and headers are available.
    async fn send_async(
        &self,
        request: &HttpRequest,
        stream: bool,
    ) -> Result<AsyncTransportReply, ApiError>;
}

/// Default transport over real HTTP.
///
/// Holds one ureq agent for blocking calls and one reqwest client for
/// suspending calls; both are cheap to clone and safe to share across
/// concurrent calls.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, ApiError> {
        // Non-2xx statuses are data, not errors; status interpretation
        // belongs to this layer, not to ureq.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self { agent, client })
    }
}

/// Apply headers and the per-call timeout to a ureq request builder.
fn prepare<B>(mut builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(timeout) = request.timeout {
        builder = builder.config().timeout_global(Some(timeout)).build();
    }
    builder
}

#[async_trait]
impl Transport for HttpTransport {
    fn send(&self, request: &HttpRequest, stream: bool) -> Result<TransportReply, ApiError> {
        let body = match &request.body {
            Some(body) => {
                Some(serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?)
            }
            None => None,
        };

        let result = match (&request.method, body) {
            (HttpMethod::Get, _) => prepare(self.agent.get(&request.url), request).call(),
            (HttpMethod::Delete, _) => prepare(self.agent.delete(&request.url), request).call(),
            (HttpMethod::Post, Some(body)) => {
                prepare(self.agent.post(&request.url), request).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => prepare(self.agent.post(&request.url), request).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                prepare(self.agent.put(&request.url), request).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => prepare(self.agent.put(&request.url), request).send_empty(),
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.body_mut().read_to_string().unwrap_or_default();
            return Err(ApiError::HttpStatus { status, body });
        }

        if stream {
            let reader = BufReader::new(response.into_body().into_reader());
            let segments = reader.lines().filter_map(|line| match line {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        None
                    } else {
                        trace!(len = line.len(), "segment received");
                        Some(Ok(line))
                    }
                }
                Err(e) => Some(Err(ApiError::StreamInterrupted(e.to_string()))),
            });
            Ok(TransportReply::Segments(SegmentIter::new(segments)))
        } else {
            let text = response
                .body_mut()
                .read_to_string()
                .map_err(|e| ApiError::Transport(e.to_string()))?;
            let payload =
                serde_json::from_str(&text).map_err(|e| ApiError::Deserialization(e.to_string()))?;
            Ok(TransportReply::Payload(payload))
        }
    }

    async fn send_async(
        &self,
        request: &HttpRequest,
        stream: bool,
    ) -> Result<AsyncTransportReply, ApiError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        if stream {
            let segments = decode_segments(response.bytes_stream());
            Ok(AsyncTransportReply::Segments(SegmentStream::new(segments)))
        } else {
            let payload = response
                .json()
                .await
                .map_err(|e| ApiError::Deserialization(e.to_string()))?;
            Ok(AsyncTransportReply::Payload(payload))
        }
    }
}

/// Split a byte stream into newline-delimited segments, skipping blank
/// lines. A trailing unterminated line is yielded as a final segment.
fn decode_segments<S>(bytes: S) -> impl Stream<Item = Result<String, ApiError>> + Send
where
    S: Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
{
    async_stream::try_stream! {
        let mut bytes = Box::pin(bytes);
        let mut buf: Vec<u8> = Vec::new();
        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(|e| ApiError::StreamInterrupted(e.to_string()))?;
            buf.extend_from_slice(&chunk);
            while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buf.drain(..=pos).collect();
                let line = String::from_utf8_lossy(&line).trim().to_string();
                if !line.is_empty() {
                    trace!(len = line.len(), "segment received");
                    yield line;
                }
            }
        }
        let tail = String::from_utf8_lossy(&buf).trim().to_string();
        if !tail.is_empty() {
            yield tail;
        }
    }
}
