//! Scene entity model and DTOs.

use creaition_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `scenes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Scene {
    pub id: DbId,
    pub story_id: DbId,
    /// 1-based position within the story.
    pub scene_number: i32,
    pub title: String,
    pub narrative_text: String,
    pub paragraph: String,
    pub image_prompt: String,
    pub image_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a scene.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateScene {
    pub scene_number: i32,
    pub title: String,
    pub narrative_text: String,
    pub paragraph: String,
    pub image_prompt: String,
    pub image_url: Option<String>,
}
