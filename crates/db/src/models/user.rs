//! User entity model and DTOs.

use creaition_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// New accounts start with this many credits.
pub const DEFAULT_CREDITS: i32 = 999;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub credits: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    /// Defaults to [`DEFAULT_CREDITS`] if omitted.
    pub credits: Option<i32>,
}

/// DTO for updating a user. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub credits: Option<i32>,
}
