use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::routes::health::ServiceStatus;
use crate::state::AppState;

/// Public endpoints listed by `GET /`.
pub const ENDPOINTS: &[&str] = &[
    "/api/stories/generate",
    "/api/stories/generate-story",
    "/api/stories/generate-images",
    "/api/stories/{story_id}",
    "/api/stories/{story_id}/characters",
    "/api/stories/{story_id}/cover",
    "/api/characters/upload",
    "/api/demo/titles",
    "/api/demo/clear-titles",
    "/api/user/stories",
    "/api/users/email/{email}",
    "/api/users/create",
    "/api/users/email/{email}/credits",
    "/health",
];

#[derive(Serialize)]
pub struct InfoResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub services: ServiceStatus,
    pub endpoints: &'static [&'static str],
}

/// GET /
async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "CreAItion API",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        services: ServiceStatus::probe(&state).await,
        endpoints: ENDPOINTS,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(info))
}
