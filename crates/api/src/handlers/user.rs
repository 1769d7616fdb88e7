//! Handlers for users and their stories.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use creaition_core::error::CoreError;
use creaition_core::story::StoryStatus;
use creaition_core::types::{DbId, Timestamp};
use creaition_db::models::story::Story;
use creaition_db::models::user::{CreateUser, User, DEFAULT_CREDITS};
use creaition_db::repositories::{StoryRepo, UserRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::response::{Message, Success};
use crate::state::AppState;

/// 404 for a user looked up by email.
pub fn user_not_found(email: &str) -> AppError {
    AppError::NotFound(format!("User with email '{}' not found", email.trim()))
}

/// Resolve a user by email, 404 when unknown.
pub async fn require_user_by_email(state: &AppState, email: &str) -> AppResult<User> {
    UserRepo::find_by_email(&state.pool, email)
        .await?
        .ok_or_else(|| user_not_found(email))
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// GET /api/users/email/{email}
pub async fn get_by_email(
    State(state): State<AppState>,
    AppPath(email): AppPath<String>,
) -> AppResult<Json<Success<UserPayload>>> {
    let user = require_user_by_email(&state, &email).await?;
    Ok(Json(Success::new(UserPayload { user, message: None })))
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Username must be 1-100 characters"))]
    pub username: String,
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[validate(range(min = 0, message = "Credits cannot be negative"))]
    pub credits: Option<i32>,
}

/// POST /api/users/create
///
/// Idempotent on email: an existing user is returned unchanged with
/// `"message": "User already exists"` and status 200.
pub async fn create(
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<Success<UserPayload>>)> {
    input.validate()?;

    if let Some(user) = UserRepo::find_by_email(&state.pool, &input.email).await? {
        return Ok((
            StatusCode::OK,
            Json(Success::new(UserPayload {
                user,
                message: Some("User already exists"),
            })),
        ));
    }

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: input.username.trim().to_string(),
            email: input.email.trim().to_string(),
            credits: Some(input.credits.unwrap_or(DEFAULT_CREDITS)),
        },
    )
    .await?;
    tracing::info!(user_id = %user.id, "User created");

    Ok((
        StatusCode::CREATED,
        Json(Success::new(UserPayload { user, message: None })),
    ))
}

// ---------------------------------------------------------------------------
// Credits
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCreditsRequest {
    #[validate(range(min = 0, message = "Credits cannot be negative"))]
    pub credits: i32,
}

/// POST /api/users/email/{email}/credits
pub async fn update_credits(
    State(state): State<AppState>,
    AppPath(email): AppPath<String>,
    AppJson(input): AppJson<UpdateCreditsRequest>,
) -> AppResult<Json<Success<Message>>> {
    input.validate()?;
    let updated = UserRepo::update_credits_by_email(&state.pool, &email, input.credits).await?;
    if !updated {
        return Err(user_not_found(&email));
    }
    Ok(Json(Message::new("Credits updated successfully")))
}

// ---------------------------------------------------------------------------
// Stories of a user
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct UserStoriesQuery {
    pub user_email: Option<String>,
    pub user_id: Option<DbId>,
}

/// Story row as listed on a user's shelf.
#[derive(Debug, Serialize)]
pub struct StorySummary {
    pub id: DbId,
    pub title: String,
    pub status: StoryStatus,
    pub nb_scenes: i32,
    pub nb_chars: i32,
    pub story_mode: String,
    pub cover_image_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Story> for StorySummary {
    /// A story with written text is shown as completed, anything else as
    /// created.
    fn from(story: Story) -> Self {
        let status = if story.has_future_story() {
            StoryStatus::Completed
        } else {
            StoryStatus::Created
        };
        Self {
            id: story.id,
            title: story.title,
            status,
            nb_scenes: story.nb_scenes,
            nb_chars: story.nb_chars,
            story_mode: story.story_mode,
            cover_image_url: story.cover_image_url,
            created_at: story.created_at,
            updated_at: story.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserStories {
    pub stories: Vec<StorySummary>,
}

/// GET /api/user/stories?user_email=...|user_id=...
///
/// `user_email` wins when both are given.
pub async fn list_stories(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<UserStoriesQuery>,
) -> AppResult<Json<Success<UserStories>>> {
    let email = query
        .user_email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());

    let user = match (email, query.user_id) {
        (Some(email), _) => require_user_by_email(&state, email).await?,
        (None, Some(id)) => UserRepo::find_by_id(&state.pool, id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?,
        (None, None) => {
            return Err(AppError::BadRequest(
                "Either user_email or user_id is required".to_string(),
            ))
        }
    };

    let stories = StoryRepo::list_by_user(&state.pool, user.id)
        .await?
        .into_iter()
        .map(StorySummary::from)
        .collect();
    Ok(Json(Success::new(UserStories { stories })))
}
