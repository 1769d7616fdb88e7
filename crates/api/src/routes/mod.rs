pub mod character;
pub mod demo;
pub mod health;
pub mod info;
pub mod story;
pub mod user;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /stories/...            story creation, generation, details, cover, characters
/// /characters/upload      character image upload
/// /demo/...               title listing and reset
/// /user/stories           a user's stories
/// /users/...              user lookup, creation, credits
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/stories", story::router())
        .nest("/characters", character::router())
        .nest("/demo", demo::router())
        .merge(user::router())
}
