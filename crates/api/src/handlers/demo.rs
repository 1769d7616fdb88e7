//! Demo helpers for the title registry.

use axum::extract::State;
use axum::Json;
use creaition_db::repositories::StoryRepo;
use serde::Serialize;

use crate::error::AppResult;
use crate::response::Success;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TitleList {
    pub titles: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct TitlesCleared {
    pub message: &'static str,
    pub deleted_count: u64,
}

/// GET /api/demo/titles
pub async fn list_titles(State(state): State<AppState>) -> AppResult<Json<Success<TitleList>>> {
    let titles = StoryRepo::list_titles(&state.pool).await?;
    let count = titles.len();
    Ok(Json(Success::new(TitleList { titles, count })))
}

/// POST /api/demo/clear-titles
///
/// Deletes every story; characters and scenes go with them.
pub async fn clear_titles(
    State(state): State<AppState>,
) -> AppResult<Json<Success<TitlesCleared>>> {
    let deleted_count = StoryRepo::delete_all(&state.pool).await?;
    tracing::warn!(deleted_count, "All stories cleared");
    Ok(Json(Success::new(TitlesCleared {
        message: "All story titles cleared from database",
        deleted_count,
    })))
}
