//! User entity model.

use fiberdesk_core::i18n::Lang;
use fiberdesk_core::roles::Role;
use fiberdesk_core::types::{DbId, TelegramId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use super::parse_column;

/// A row from the `users` table.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: DbId,
    /// Message delivery handle; users without one are never notified.
    pub telegram_id: Option<TelegramId>,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
    /// Interface language code (`uz`/`ru`); anything else falls back to
    /// Uzbek at lookup time.
    pub language: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// The user's interface language, defaulting to Uzbek.
    pub fn lang(&self) -> Lang {
        Lang::from_code(&self.language)
    }
}

impl FromRow<'_, PgRow> for User {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            telegram_id: row.try_get("telegram_id")?,
            full_name: row.try_get("full_name")?,
            phone: row.try_get("phone")?,
            role: parse_column(row, "role")?,
            language: row.try_get("language")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// DTO for inserting a user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub telegram_id: Option<TelegramId>,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "uz".to_string()
}
