#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use creaition_api::config::{ServerConfig, DEFAULT_MAX_UPLOAD_BYTES};
use creaition_api::router::build_app_router;
use creaition_api::state::AppState;
use creaition_db::models::user::{CreateUser, User};
use creaition_db::repositories::UserRepo;
use creaition_gemini::{GeminiError, GenerativeModel, InlineImage, ReferenceImage};
use creaition_storage::LocalStore;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
    }
}

/// The application plus the temporary directory backing its local store.
pub struct TestApp {
    pub router: Router,
    pub assets: TempDir,
}

/// Full application router without a generative model.
pub fn build_test_app(pool: PgPool) -> TestApp {
    build_app(pool, None)
}

/// Full application router answering model calls with `model`.
pub fn build_test_app_with_model(pool: PgPool, model: Arc<FakeModel>) -> TestApp {
    build_app(pool, Some(model))
}

fn build_app(pool: PgPool, model: Option<Arc<FakeModel>>) -> TestApp {
    let assets = tempfile::tempdir().unwrap();
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        model: model.map(|m| m as Arc<dyn GenerativeModel>),
        store: Arc::new(LocalStore::new(assets.path(), "/assets")),
        assets_dir: Some(assets.path().to_path_buf()),
    };
    TestApp {
        router: build_app_router(state, &config),
        assets,
    }
}

// ---------------------------------------------------------------------------
// Fake model
// ---------------------------------------------------------------------------

/// Generative model answering text calls from a queue and image calls with
/// a fixed PNG (or nothing).
pub struct FakeModel {
    texts: Mutex<VecDeque<String>>,
    image: Option<Vec<u8>>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeModel {
    pub fn new(texts: &[&str], with_images: bool) -> Arc<Self> {
        Arc::new(Self {
            texts: Mutex::new(texts.iter().map(|t| t.to_string()).collect()),
            image: with_images.then(png_bytes),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for FakeModel {
    async fn generate_text(
        &self,
        prompt: &str,
        _images: &[ReferenceImage],
    ) -> Result<String, GeminiError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.texts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GeminiError::Api {
                status: 500,
                body: "no scripted answer".to_string(),
            })
    }

    async fn generate_image(
        &self,
        prompt: &str,
        _images: &[ReferenceImage],
    ) -> Result<Option<InlineImage>, GeminiError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.image.clone().map(|data| InlineImage {
            mime_type: "image/png".to_string(),
            data,
        }))
    }
}

/// A valid 2x2 PNG.
pub fn png_bytes() -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(image::RgbImage::new(2, 2))
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

pub async fn seed_user(pool: &PgPool, email: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            username: email.split('@').next().unwrap().to_string(),
            email: email.to_string(),
            credits: None,
        },
    )
    .await
    .unwrap()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn json_request(
    app: &Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response {
    json_request(app, Method::POST, uri, body).await
}

pub async fn put_json(app: &Router, uri: &str, body: serde_json::Value) -> Response {
    json_request(app, Method::PUT, uri, body).await
}

pub async fn post_empty(app: &Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// File part of a multipart request.
pub struct FilePart<'a> {
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub bytes: Vec<u8>,
}

const BOUNDARY: &str = "creaition-test-boundary";

pub async fn post_multipart(
    app: &Router,
    uri: &str,
    fields: &[(&str, &str)],
    file: Option<FilePart<'_>>,
) -> Response {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(file) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.file_name, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(&file.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
