use axum::routing::{get, post};
use axum::Router;

use crate::handlers::demo;
use crate::state::AppState;

/// Routes mounted at `/demo`.
///
/// ```text
/// GET    /titles          -> list_titles
/// POST   /clear-titles    -> clear_titles
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/titles", get(demo::list_titles))
        .route("/clear-titles", post(demo::clear_titles))
}
