//! Repository for the `users` table.

use fiberdesk_core::roles::Role;
use fiberdesk_core::types::{DbId, TelegramId};
use sqlx::PgPool;

use crate::models::user::{CreateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, telegram_id, full_name, phone, role, language, is_active, created_at, updated_at";

/// Provides directory lookups for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (telegram_id, full_name, phone, role, language) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(input.telegram_id)
            .bind(&input.full_name)
            .bind(&input.phone)
            .bind(input.role.as_str())
            .bind(&input.language)
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

    /// Find a user by Telegram chat ID.
    pub async fn find_by_telegram_id(
        pool: &PgPool,
        telegram_id: TelegramId,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE telegram_id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(telegram_id)
            .fetch_optional(pool)
            .await
    }

    /// List active users holding a role who can actually be reached
    /// (registered delivery handle), ordered by ID ascending.
    pub async fn list_notifiable_by_role(
        pool: &PgPool,
        role: Role,
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users \
             WHERE role = $1 AND is_active = true AND telegram_id IS NOT NULL \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(role.as_str())
            .fetch_all(pool)
            .await
    }

    /// Deactivate a user. Returns `false` if no row matched.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET is_active = false, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
