//! Repository for the `users` table.

use creaition_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{CreateUser, UpdateUser, User, DEFAULT_CREDITS};

const COLUMNS: &str = "id, username, email, credits, created_at, updated_at";

/// Provides CRUD operations for users and their credit balance.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username, email, credits)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.username)
            .bind(&input.email)
            .bind(input.credits.unwrap_or(DEFAULT_CREDITS))
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email address (exact match after trimming).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email.trim())
            .fetch_optional(pool)
            .await
    }

    /// Update a user. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                credits = COALESCE($4, credits)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&input.username)
            .bind(&input.email)
            .bind(input.credits)
            .fetch_optional(pool)
            .await
    }

    /// Set the credit balance of the user with `email`.
    ///
    /// Returns `true` if a row was updated.
    pub async fn update_credits_by_email(
        pool: &PgPool,
        email: &str,
        credits: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET credits = $2 WHERE email = $1")
            .bind(email.trim())
            .bind(credits)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
