//! Drives `GeminiClient` against an in-process axum server standing in for
//! the Gemini endpoint.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use creaition_gemini::{GeminiClient, GeminiConfig, GeminiError, GenerativeModel, ReferenceImage};
use serde_json::{json, Value};

/// Spawn a server answering every `generateContent` call with the next
/// scripted response. Returns the base URL and the request counter.
async fn spawn_fake_gemini(script: Vec<(StatusCode, Value)>) -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let state = (Arc::new(script), Arc::clone(&calls));

    async fn handler(
        State((script, calls)): State<(Arc<Vec<(StatusCode, Value)>>, Arc<AtomicUsize>)>,
        Json(_body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        let (status, body) = script[n.min(script.len() - 1)].clone();
        (status, Json(body))
    }

    let app = Router::new()
        .route("/v1beta/models/{model}", post(handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), calls)
}

fn client_for(base_url: String, max_attempts: usize) -> GeminiClient {
    let mut config = GeminiConfig::new("test-key");
    config.base_url = base_url;
    config.timeout = Duration::from_secs(5);
    config.max_attempts = max_attempts;
    GeminiClient::new(config)
}

fn text_response(text: &str) -> Value {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
}

#[tokio::test]
async fn generate_text_returns_candidate_text() {
    let (base, calls) = spawn_fake_gemini(vec![(StatusCode::OK, text_response("Once upon"))]).await;
    let client = client_for(base, 2);

    let text = client
        .generate_text("tell me", &[ReferenceImage::new("image/png", vec![1])])
        .await
        .unwrap();

    assert_eq!(text, "Once upon");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn transient_status_is_retried() {
    let (base, calls) = spawn_fake_gemini(vec![
        (StatusCode::SERVICE_UNAVAILABLE, json!({ "error": "busy" })),
        (StatusCode::OK, text_response("recovered")),
    ])
    .await;
    let client = client_for(base, 2);

    let text = client.generate_text("again", &[]).await.unwrap();

    assert_eq!(text, "recovered");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let (base, calls) = spawn_fake_gemini(vec![(
        StatusCode::BAD_REQUEST,
        json!({ "error": { "message": "bad prompt" } }),
    )])
    .await;
    let client = client_for(base, 3);

    let err = client.generate_text("oops", &[]).await.unwrap_err();

    match err {
        GeminiError::Api { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("bad prompt"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn generate_image_decodes_inline_data() {
    let (base, _) = spawn_fake_gemini(vec![(
        StatusCode::OK,
        json!({ "candidates": [{ "content": { "parts": [
            { "text": "Scene 1" },
            { "inlineData": { "mimeType": "image/png", "data": "AQID" } }
        ]}}]}),
    )])
    .await;
    let client = client_for(base, 1);

    let image = client.generate_image("draw", &[]).await.unwrap().unwrap();
    assert_eq!(image.mime_type, "image/png");
    assert_eq!(image.data, vec![1, 2, 3]);
}

#[tokio::test]
async fn generate_image_without_image_part_is_none() {
    let (base, _) = spawn_fake_gemini(vec![(StatusCode::OK, text_response("no image, sorry"))]).await;
    let client = client_for(base, 1);

    assert!(client.generate_image("draw", &[]).await.unwrap().is_none());
}
