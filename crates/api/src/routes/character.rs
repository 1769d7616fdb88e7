use axum::routing::post;
use axum::Router;

use crate::handlers::character;
use crate::state::AppState;

/// Routes mounted at `/characters`.
///
/// ```text
/// POST   /upload      -> upload (multipart: file, name, description)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/upload", post(character::upload))
}
