//! Route definitions for the `/stories` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::story;
use crate::state::AppState;

/// Routes mounted at `/stories`.
///
/// ```text
/// POST   /generate                 -> create
/// POST   /generate-story           -> generate_story
/// POST   /generate-images          -> generate_images
/// GET    /{id}                     -> get_by_id
/// PUT    /{id}                     -> update
/// POST   /{id}/characters          -> save_characters
/// POST   /{id}/cover               -> upload_cover
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(story::create))
        .route("/generate-story", post(story::generate_story))
        .route("/generate-images", post(story::generate_images))
        .route("/{id}", get(story::get_by_id).put(story::update))
        .route("/{id}/characters", post(story::save_characters))
        .route("/{id}/cover", post(story::upload_cover))
}
