//! Repository for the `user_characters` table.

use creaition_core::types::DbId;
use sqlx::PgPool;

use crate::models::character::{Character, CreateCharacter, UpdateCharacter};

const COLUMNS: &str = "id, story_id, name, description, image_url, image_name, \
     analysis, created_at, updated_at";

/// Provides CRUD operations for story characters.
pub struct CharacterRepo;

impl CharacterRepo {
    /// Insert a new character, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateCharacter) -> Result<Character, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_characters (story_id, name, description, image_url, image_name)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(input.story_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.image_url)
            .bind(&input.image_name)
            .fetch_one(pool)
            .await
    }

    /// Replace a character's editable fields. Returns `None` if missing.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCharacter,
    ) -> Result<Option<Character>, sqlx::Error> {
        let query = format!(
            "UPDATE user_characters SET
                name = $2,
                description = $3,
                image_url = $4,
                image_name = $5
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.image_url)
            .bind(&input.image_name)
            .fetch_optional(pool)
            .await
    }

    /// Write several analyses in one transaction. Returns rows updated.
    pub async fn update_analyses(
        pool: &PgPool,
        analyses: &[(DbId, String)],
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut updated = 0;
        for (id, analysis) in analyses {
            let result = sqlx::query("UPDATE user_characters SET analysis = $2 WHERE id = $1")
                .bind(id)
                .bind(analysis)
                .execute(&mut *tx)
                .await?;
            updated += result.rows_affected();
        }
        tx.commit().await?;
        Ok(updated)
    }

    /// List a story's characters in creation order.
    pub async fn list_by_story(
        pool: &PgPool,
        story_id: DbId,
    ) -> Result<Vec<Character>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_characters
             WHERE story_id = $1
             ORDER BY created_at ASC, name ASC"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(story_id)
            .fetch_all(pool)
            .await
    }

    /// Find a character of a story by its exact name.
    pub async fn find_by_story_and_name(
        pool: &PgPool,
        story_id: DbId,
        name: &str,
    ) -> Result<Option<Character>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_characters WHERE story_id = $1 AND name = $2"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(story_id)
            .bind(name)
            .fetch_optional(pool)
            .await
    }
}
