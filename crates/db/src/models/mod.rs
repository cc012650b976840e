//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//!
//! Enum-typed columns (`role`, `workflow_type`, `status`, `priority`)
//! are stored as TEXT and decoded into their `fiberdesk-core` enums at
//! row-mapping time; a value the core does not know is surfaced as a
//! column-decode error rather than silently passed through.

use std::str::FromStr;

use sqlx::postgres::PgRow;
use sqlx::Row;

pub mod access_log;
pub mod pending_notification;
pub mod service_request;
pub mod state_transition;
pub mod user;

/// Decode a TEXT column into a core enum via its `FromStr` impl.
pub(crate) fn parse_column<T>(row: &PgRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>().map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

/// Decode a nullable TEXT column into an optional core enum.
pub(crate) fn parse_column_opt<T>(row: &PgRow, column: &str) -> Result<Option<T>, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| {
        s.parse::<T>().map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
    })
    .transpose()
}
