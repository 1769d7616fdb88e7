//! Character entity model and DTOs.

use creaition_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `user_characters` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Character {
    pub id: DbId,
    pub story_id: DbId,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub image_name: Option<String>,
    /// Free-text analysis written by the narrative step.
    pub analysis: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a character under a story.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCharacter {
    pub story_id: DbId,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub image_name: Option<String>,
}

/// DTO for replacing a character's user-editable fields.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCharacter {
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub image_name: Option<String>,
}
