//! Story entity model and DTOs.

use creaition_core::story::StoryStatus;
use creaition_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `stories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Story {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub title: String,
    pub nb_scenes: i32,
    pub nb_chars: i32,
    pub story_mode: String,
    pub cover_image_url: Option<String>,
    pub cover_image_name: Option<String>,
    pub background_story: String,
    pub future_story: String,
    pub scenes_paragraph: String,
    /// One of `created`, `story_generated`, `completed`.
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Story {
    /// Parsed lifecycle status. Unknown values read as `Created`.
    pub fn status(&self) -> StoryStatus {
        self.status.parse().unwrap_or(StoryStatus::Created)
    }

    /// Whether the narrative step has produced a future story.
    pub fn has_future_story(&self) -> bool {
        !self.future_story.trim().is_empty()
    }
}

/// DTO for creating a new story record.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStory {
    pub user_id: Option<DbId>,
    pub title: String,
    pub nb_scenes: i32,
    pub nb_chars: i32,
    pub story_mode: String,
    pub cover_image_url: Option<String>,
    pub cover_image_name: Option<String>,
    pub background_story: Option<String>,
}

/// DTO for editing story details.
///
/// `background_story` is only written when `Some`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStory {
    pub title: String,
    pub nb_scenes: i32,
    pub nb_chars: i32,
    pub story_mode: String,
    pub cover_image_url: Option<String>,
    pub cover_image_name: Option<String>,
    pub background_story: Option<String>,
}

/// Output of the narrative step persisted onto the story.
#[derive(Debug, Clone)]
pub struct GeneratedStory {
    pub background_story: String,
    pub future_story: String,
    pub scenes_paragraph: String,
}
