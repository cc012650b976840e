//! Access-control audit log entity models.
//!
//! Write-only from the evaluator's point of view; the query surface
//! exists for back-office tooling, never for the decision logic.

use fiberdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `access_control_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AccessLogEntry {
    pub id: DbId,
    pub user_id: DbId,
    pub role: String,
    pub action: String,
    pub resource: String,
    pub granted: bool,
    pub reason: String,
    pub created_at: Timestamp,
}

/// DTO for inserting an audit row.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccessLog {
    pub user_id: DbId,
    pub role: String,
    pub action: String,
    pub resource: String,
    pub granted: bool,
    pub reason: String,
}

/// Filter parameters for the audit query surface.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessLogQuery {
    pub user_id: Option<DbId>,
    pub granted: Option<bool>,
    pub since: Option<Timestamp>,
    pub until: Option<Timestamp>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
