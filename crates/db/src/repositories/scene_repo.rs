//! Repository for the `scenes` table.

use creaition_core::types::DbId;
use sqlx::PgPool;

use crate::models::scene::{CreateScene, Scene};

const COLUMNS: &str = "id, story_id, scene_number, title, narrative_text, paragraph, \
     image_prompt, image_url, created_at, updated_at";

/// Provides CRUD operations for story scenes.
pub struct SceneRepo;

impl SceneRepo {
    /// Insert one scene, returning the created row.
    pub async fn create(
        pool: &PgPool,
        story_id: DbId,
        input: &CreateScene,
    ) -> Result<Scene, sqlx::Error> {
        let query = format!(
            "INSERT INTO scenes
                (story_id, scene_number, title, narrative_text, paragraph, image_prompt, image_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Scene>(&query)
            .bind(story_id)
            .bind(input.scene_number)
            .bind(&input.title)
            .bind(&input.narrative_text)
            .bind(&input.paragraph)
            .bind(&input.image_prompt)
            .bind(&input.image_url)
            .fetch_one(pool)
            .await
    }

    /// List a story's scenes ordered by `scene_number`.
    pub async fn list_by_story(pool: &PgPool, story_id: DbId) -> Result<Vec<Scene>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM scenes WHERE story_id = $1 ORDER BY scene_number ASC"
        );
        sqlx::query_as::<_, Scene>(&query)
            .bind(story_id)
            .fetch_all(pool)
            .await
    }

    /// Replace all scenes of a story in one transaction.
    ///
    /// Regenerating a story discards the previous scene set.
    pub async fn replace_for_story(
        pool: &PgPool,
        story_id: DbId,
        scenes: &[CreateScene],
    ) -> Result<Vec<Scene>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM scenes WHERE story_id = $1")
            .bind(story_id)
            .execute(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO scenes
                (story_id, scene_number, title, narrative_text, paragraph, image_prompt, image_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        let mut created = Vec::with_capacity(scenes.len());
        for scene in scenes {
            let row = sqlx::query_as::<_, Scene>(&query)
                .bind(story_id)
                .bind(scene.scene_number)
                .bind(&scene.title)
                .bind(&scene.narrative_text)
                .bind(&scene.paragraph)
                .bind(&scene.image_prompt)
                .bind(&scene.image_url)
                .fetch_one(&mut *tx)
                .await?;
            created.push(row);
        }
        tx.commit().await?;
        Ok(created)
    }

    /// Set the generated image URL of a scene. Returns `true` if updated.
    pub async fn update_image(pool: &PgPool, id: DbId, image_url: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE scenes SET image_url = $2 WHERE id = $1")
            .bind(id)
            .bind(image_url)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Overwrite the title, image prompt and paragraph of a scene.
    pub async fn update_prompt(
        pool: &PgPool,
        id: DbId,
        title: &str,
        image_prompt: &str,
        paragraph: &str,
    ) -> Result<Option<Scene>, sqlx::Error> {
        let query = format!(
            "UPDATE scenes SET title = $2, image_prompt = $3, paragraph = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Scene>(&query)
            .bind(id)
            .bind(title)
            .bind(image_prompt)
            .bind(paragraph)
            .fetch_optional(pool)
            .await
    }
}
