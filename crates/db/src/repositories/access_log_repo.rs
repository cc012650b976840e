//! Repository for the append-only `access_control_logs` table.

use sqlx::PgPool;

use crate::models::access_log::{AccessLogEntry, AccessLogQuery, CreateAccessLog};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, role, action, resource, granted, reason, created_at";

/// Provides insert and query operations for access-control audit rows.
pub struct AccessLogRepo;

impl AccessLogRepo {
    /// Append an audit row.
    pub async fn insert(pool: &PgPool, entry: &CreateAccessLog) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO access_control_logs (user_id, role, action, resource, granted, reason) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(entry.user_id)
        .bind(&entry.role)
        .bind(&entry.action)
        .bind(&entry.resource)
        .bind(entry.granted)
        .bind(&entry.reason)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Query audit rows with filtering and pagination, newest first.
    pub async fn query(
        pool: &PgPool,
        params: &AccessLogQuery,
    ) -> Result<Vec<AccessLogEntry>, sqlx::Error> {
        let limit = params.limit.unwrap_or(50).min(500);
        let offset = params.offset.unwrap_or(0);

        let mut conditions: Vec<String> = Vec::new();
        let mut bind_idx = 1u32;

        if params.user_id.is_some() {
            conditions.push(format!("user_id = ${bind_idx}"));
            bind_idx += 1;
        }
        if params.granted.is_some() {
            conditions.push(format!("granted = ${bind_idx}"));
            bind_idx += 1;
        }
        if params.since.is_some() {
            conditions.push(format!("created_at >= ${bind_idx}"));
            bind_idx += 1;
        }
        if params.until.is_some() {
            conditions.push(format!("created_at <= ${bind_idx}"));
            bind_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let query = format!(
            "SELECT {COLUMNS} FROM access_control_logs {where_clause} \
             ORDER BY created_at DESC, id DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );

        let mut q = sqlx::query_as::<_, AccessLogEntry>(&query);
        if let Some(user_id) = params.user_id {
            q = q.bind(user_id);
        }
        if let Some(granted) = params.granted {
            q = q.bind(granted);
        }
        if let Some(since) = params.since {
            q = q.bind(since);
        }
        if let Some(until) = params.until {
            q = q.bind(until);
        }
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Delete audit rows older than the retention window. Returns the
    /// number of rows removed.
    pub async fn cleanup(pool: &PgPool, older_than_days: i32) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM access_control_logs \
             WHERE created_at < NOW() - make_interval(days => $1)",
        )
        .bind(older_than_days)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
