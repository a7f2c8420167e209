//! Round-trip tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises the default
//! `HttpTransport` over real HTTP: blocking and suspending, streaming and
//! non-streaming, success and error statuses. Validates that request
//! building, auth headers, and segment decoding work end-to-end with an
//! actual server.

use futures::StreamExt;
use serde_json::{json, Value};

use genai_core::{ApiClient, ApiError, HttpMethod};

const API_KEY: &str = "test-api-key";

fn prompt_body(prompt: &str) -> Value {
    json!({"contents": [{"parts": [{"text": prompt}]}]})
}

fn chunk_text(segment: &str) -> String {
    let chunk: Value = serde_json::from_str(segment).expect("segment is JSON");
    chunk["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .expect("chunk carries text")
        .to_string()
}

/// Start the mock server on a random port from a dedicated thread, so
/// blocking tests need no runtime of their own.
fn start_server() -> std::net::SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, API_KEY.to_string()).await
        })
        .unwrap();
    });

    addr
}

#[test]
fn blocking_round_trip() {
    let addr = start_server();
    let client = ApiClient::new(API_KEY)
        .unwrap()
        .with_base_url(&format!("http://{addr}/v1beta"));

    // Step 1: non-streaming call returns the full payload.
    let payload = client
        .request(
            HttpMethod::Post,
            "models/gemini-pro:generateContent",
            Some(prompt_body("hello")),
            None,
        )
        .unwrap();
    assert_eq!(
        payload["candidates"][0]["content"]["parts"][0]["text"],
        "echo: hello"
    );

    // Step 2: streaming call yields three ordered segments.
    let segments: Vec<String> = client
        .request_streamed(
            HttpMethod::Post,
            "models/gemini-pro:streamGenerateContent",
            Some(prompt_body("hello")),
            None,
        )
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    let texts: Vec<String> = segments.iter().map(|s| chunk_text(s)).collect();
    assert_eq!(texts, vec!["echo", ": ", "hello"]);

    // Step 3: unknown model surfaces the 404 status.
    let err = client
        .request(
            HttpMethod::Post,
            "models/unknown:generateContent",
            Some(prompt_body("x")),
            None,
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::HttpStatus { status: 404, .. }));

    // Step 4: wrong credential surfaces the 401 status.
    let unauthorized = ApiClient::new("wrong-key")
        .unwrap()
        .with_base_url(&format!("http://{addr}/v1beta"));
    let err = unauthorized
        .request(
            HttpMethod::Post,
            "models/gemini-pro:generateContent",
            Some(prompt_body("x")),
            None,
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::HttpStatus { status: 401, .. }));
}

#[tokio::test]
async fn async_round_trip() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener, API_KEY.to_string()));

    let client = ApiClient::new(API_KEY)
        .unwrap()
        .with_base_url(&format!("http://{addr}/v1beta"));

    let payload = client
        .async_request(
            HttpMethod::Post,
            "models/gemini-pro:generateContent",
            Some(prompt_body("hello")),
            None,
        )
        .await
        .unwrap();
    assert_eq!(
        payload["candidates"][0]["content"]["parts"][0]["text"],
        "echo: hello"
    );

    let mut stream = client
        .async_request_streamed(
            HttpMethod::Post,
            "models/gemini-pro:streamGenerateContent",
            Some(prompt_body("hello")),
            None,
        )
        .await
        .unwrap();
    let mut texts = Vec::new();
    while let Some(segment) = stream.next().await {
        texts.push(chunk_text(&segment.unwrap()));
    }
    assert_eq!(texts, vec!["echo", ": ", "hello"]);
}

#[tokio::test]
async fn connection_failure_is_a_transport_error() {
    // Port 1 is never listening.
    let client = ApiClient::new(API_KEY)
        .unwrap()
        .with_base_url("http://127.0.0.1:1/v1beta");
    let err = client
        .async_request(
            HttpMethod::Post,
            "models/gemini-pro:generateContent",
            Some(prompt_body("x")),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}
