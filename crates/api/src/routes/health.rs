use axum::extract::State;
use axum::{routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `healthy`, or `degraded` when the database is unreachable.
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub services: ServiceStatus,
}

/// Which collaborators are usable right now.
#[derive(Serialize)]
pub struct ServiceStatus {
    pub database: bool,
    pub gemini: bool,
    pub storage: &'static str,
}

impl ServiceStatus {
    pub async fn probe(state: &AppState) -> Self {
        Self {
            database: creaition_db::health_check(&state.pool).await.is_ok(),
            gemini: state.model_available(),
            storage: state.store.backend_name(),
        }
    }
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let services = ServiceStatus::probe(&state).await;
    let status = if services.database { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status,
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
        services,
    })
}

/// Mount health check routes (root level, not under `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
