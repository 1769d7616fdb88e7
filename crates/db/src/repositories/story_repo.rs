//! Repository for the `stories` table.

use creaition_core::story::StoryStatus;
use creaition_core::types::DbId;
use sqlx::PgPool;

use crate::models::story::{CreateStory, GeneratedStory, Story, UpdateStory};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, title, nb_scenes, nb_chars, story_mode, \
     cover_image_url, cover_image_name, background_story, future_story, \
     scenes_paragraph, status, created_at, updated_at";

/// Provides CRUD operations for stories plus lifecycle transitions.
pub struct StoryRepo;

impl StoryRepo {
    /// Insert a new story with status `created`, returning the row.
    pub async fn create(pool: &PgPool, input: &CreateStory) -> Result<Story, sqlx::Error> {
        let query = format!(
            "INSERT INTO stories
                (user_id, title, nb_scenes, nb_chars, story_mode,
                 cover_image_url, cover_image_name, background_story, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, ''), $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Story>(&query)
            .bind(input.user_id)
            .bind(&input.title)
            .bind(input.nb_scenes)
            .bind(input.nb_chars)
            .bind(&input.story_mode)
            .bind(&input.cover_image_url)
            .bind(&input.cover_image_name)
            .bind(&input.background_story)
            .bind(StoryStatus::Created.as_str())
            .fetch_one(pool)
            .await
    }

    /// Find a story by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Story>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stories WHERE id = $1");
        sqlx::query_as::<_, Story>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's stories, newest first.
    pub async fn list_by_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Story>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM stories WHERE user_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Story>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// List every story, newest first.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Story>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stories ORDER BY created_at DESC");
        sqlx::query_as::<_, Story>(&query).fetch_all(pool).await
    }

    /// All story titles, lower-cased and de-duplicated.
    pub async fn list_titles(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT LOWER(title) FROM stories ORDER BY LOWER(title)",
        )
        .fetch_all(pool)
        .await
    }

    /// Replace a story's details. `background_story` and the cover fields
    /// are kept when `None`.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateStory,
    ) -> Result<Option<Story>, sqlx::Error> {
        let query = format!(
            "UPDATE stories SET
                title = $2,
                nb_scenes = $3,
                nb_chars = $4,
                story_mode = $5,
                cover_image_url = COALESCE($6, cover_image_url),
                cover_image_name = COALESCE($7, cover_image_name),
                background_story = COALESCE($8, background_story)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Story>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(input.nb_scenes)
            .bind(input.nb_chars)
            .bind(&input.story_mode)
            .bind(&input.cover_image_url)
            .bind(&input.cover_image_name)
            .bind(&input.background_story)
            .fetch_optional(pool)
            .await
    }

    /// Set only the cover image reference.
    pub async fn update_cover(
        pool: &PgPool,
        id: DbId,
        cover_image_url: &str,
        cover_image_name: &str,
    ) -> Result<Option<Story>, sqlx::Error> {
        let query = format!(
            "UPDATE stories SET cover_image_url = $2, cover_image_name = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Story>(&query)
            .bind(id)
            .bind(cover_image_url)
            .bind(cover_image_name)
            .fetch_optional(pool)
            .await
    }

    /// Store the narrative output and move the story to `story_generated`.
    pub async fn set_generated_story(
        pool: &PgPool,
        id: DbId,
        generated: &GeneratedStory,
    ) -> Result<Option<Story>, sqlx::Error> {
        let query = format!(
            "UPDATE stories SET
                background_story = $2,
                future_story = $3,
                scenes_paragraph = $4,
                status = $5
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Story>(&query)
            .bind(id)
            .bind(&generated.background_story)
            .bind(&generated.future_story)
            .bind(&generated.scenes_paragraph)
            .bind(StoryStatus::StoryGenerated.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Move the story to `completed`. Returns `true` if a row was updated.
    pub async fn mark_completed(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE stories SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(StoryStatus::Completed.as_str())
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every story (characters and scenes cascade). Returns the count.
    pub async fn delete_all(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM stories").execute(pool).await?;
        Ok(result.rows_affected())
    }
}
