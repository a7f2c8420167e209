use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// The single model this mock knows about.
pub const KNOWN_MODEL: &str = "gemini-pro";

/// Delay between streamed chunks, so stream consumers observe laziness.
const CHUNK_DELAY: Duration = Duration::from_millis(25);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Candidate {
    pub content: Content,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerateContentResponse {
    pub candidates: Vec<Candidate>,
}

struct AppState {
    api_key: String,
}

pub fn app(api_key: impl Into<String>) -> Router {
    let state = Arc::new(AppState {
        api_key: api_key.into(),
    });
    Router::new()
        .route("/v1beta/models/{model_action}", post(generate))
        .with_state(state)
}

pub async fn run(listener: TcpListener, api_key: String) -> Result<(), std::io::Error> {
    axum::serve(listener, app(api_key)).await
}

/// Wrap `text` in the response envelope the real API uses.
fn candidate_response(text: &str) -> GenerateContentResponse {
    GenerateContentResponse {
        candidates: vec![Candidate {
            content: Content {
                parts: vec![Part {
                    text: text.to_string(),
                }],
            },
        }],
    }
}

/// Both generate actions share one route because the model and the action
/// live in a single path segment ("gemini-pro:generateContent").
async fn generate(
    State(state): State<Arc<AppState>>,
    Path(model_action): Path<String>,
    headers: HeaderMap,
    Json(request): Json<GenerateContentRequest>,
) -> Result<Response, StatusCode> {
    let presented = headers.get("x-goog-api-key").and_then(|v| v.to_str().ok());
    if presented != Some(state.api_key.as_str()) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let (model, action) = model_action.split_once(':').ok_or(StatusCode::NOT_FOUND)?;
    if model != KNOWN_MODEL {
        return Err(StatusCode::NOT_FOUND);
    }

    let prompt = request
        .contents
        .first()
        .and_then(|c| c.parts.first())
        .map(|p| p.text.clone())
        .unwrap_or_default();

    match action {
        "generateContent" => Ok(Json(candidate_response(&format!("echo: {prompt}"))).into_response()),
        "streamGenerateContent" => {
            let chunks = vec!["echo".to_string(), ": ".to_string(), prompt];
            let body = futures::stream::iter(chunks).then(|text| async move {
                tokio::time::sleep(CHUNK_DELAY).await;
                let line = serde_json::to_string(&candidate_response(&text))
                    .expect("response serializes");
                Ok::<_, Infallible>(format!("{line}\n"))
            });
            Ok((
                [(header::CONTENT_TYPE, "application/x-ndjson")],
                Body::from_stream(body),
            )
                .into_response())
        }
        _ => Err(StatusCode::NOT_FOUND),
    }
}
