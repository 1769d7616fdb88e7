use axum::routing::{get, post};
use axum::Router;

use crate::handlers::user;
use crate::state::AppState;

/// User routes, merged at the `/api` root.
///
/// ```text
/// GET    /user/stories?user_email=|user_id=    -> list_stories
/// GET    /users/email/{email}                  -> get_by_email
/// POST   /users/create                         -> create
/// POST   /users/email/{email}/credits          -> update_credits
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/stories", get(user::list_stories))
        .route("/users/email/{email}", get(user::get_by_email))
        .route("/users/create", post(user::create))
        .route("/users/email/{email}/credits", post(user::update_credits))
}
