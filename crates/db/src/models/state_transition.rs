//! State transition log entity model.

use fiberdesk_core::roles::Role;
use fiberdesk_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use super::{parse_column, parse_column_opt};

/// An append-only row from the `state_transitions` table.
///
/// `from_role` is `None` only for the initial transition written at
/// request creation.
#[derive(Debug, Clone, Serialize)]
pub struct StateTransition {
    pub id: DbId,
    pub request_id: DbId,
    pub from_role: Option<Role>,
    pub to_role: Role,
    pub actor_id: DbId,
    pub action: String,
    pub comment: Option<String>,
    pub created_at: Timestamp,
}

impl FromRow<'_, PgRow> for StateTransition {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            request_id: row.try_get("request_id")?,
            from_role: parse_column_opt(row, "from_role")?,
            to_role: parse_column(row, "to_role")?,
            actor_id: row.try_get("actor_id")?,
            action: row.try_get("action")?,
            comment: row.try_get("comment")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
