use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use creaition_core::error::CoreError;
use creaition_gemini::GeminiError;
use creaition_pipeline::PipelineError;
use creaition_storage::StorageError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps the error enums of the other crates and adds HTTP-specific
/// variants. Every variant renders as
/// `{"success": false, "message": ..., "code": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `creaition_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The generative model call failed.
    #[error("Model error: {0}")]
    Gemini(#[from] GeminiError),

    /// A generation step could not produce a result.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// The blob store rejected an upload or download.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Request body failed `validator` rules.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// A lookup by something other than an id found nothing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An extractor rejected the request (malformed JSON, path or query).
    #[error("Rejected request: {message}")]
    Rejected { status: StatusCode, message: String },
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unavailable(msg) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    msg.clone(),
                ),
                CoreError::Upstream(msg) => {
                    tracing::warn!(error = %msg, "Upstream failure");
                    (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg.clone())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- Collaborator errors ---
            AppError::Gemini(err) => classify_model_error(err),
            AppError::Pipeline(PipelineError::Model(err)) => classify_model_error(err),
            AppError::Pipeline(err @ PipelineError::NoStory) => {
                tracing::warn!(error = %err, "Narrative generation produced no story");
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", err.to_string())
            }
            AppError::Storage(err) => classify_storage_error(err),

            // --- HTTP-specific errors ---
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                errors.to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Rejected { status, message } => {
                let code = match *status {
                    StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
                    StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
                    _ => "BAD_REQUEST",
                };
                (*status, code, message.clone())
            }
        };

        let body = json!({
            "success": false,
            "message": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}

/// Model failures are reported as 502 without the upstream body.
fn classify_model_error(err: &GeminiError) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %err, "Generative model call failed");
    let message = match err {
        GeminiError::Api { status, .. } => {
            format!("The AI service rejected the request (status {status})")
        }
        GeminiError::Request(_) => "The AI service could not be reached".to_string(),
        GeminiError::Decode(_) => "The AI service returned an unreadable response".to_string(),
    };
    (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", message)
}

fn classify_storage_error(err: &StorageError) -> (StatusCode, &'static str, String) {
    match err {
        StorageError::InvalidLocation(msg) => {
            (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone())
        }
        StorageError::TooLarge { .. } => (
            StatusCode::PAYLOAD_TOO_LARGE,
            "PAYLOAD_TOO_LARGE",
            err.to_string(),
        ),
        StorageError::Io(io) => {
            tracing::error!(error = %io, "Local storage failure");
            internal()
        }
        StorageError::Request(_) | StorageError::Api { .. } => {
            tracing::error!(error = %err, "Blob store request failed");
            (
                StatusCode::BAD_GATEWAY,
                "STORAGE_ERROR",
                "The file storage service request failed".to_string(),
            )
        }
    }
}
