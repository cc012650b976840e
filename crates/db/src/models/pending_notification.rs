//! Pending notification entity models.

use fiberdesk_core::request::{Priority, RequestStatus, WorkflowType};
use fiberdesk_core::roles::Role;
use fiberdesk_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use super::parse_column;

/// A row from the `pending_notifications` table.
///
/// One row is created per (user, request) notification event; delivery
/// aggregation happens at read time, not at insert time.
#[derive(Debug, Clone, Serialize)]
pub struct PendingNotification {
    pub id: DbId,
    pub user_id: DbId,
    pub request_id: DbId,
    pub workflow_type: WorkflowType,
    pub role: Role,
    pub is_handled: bool,
    pub handled_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl FromRow<'_, PgRow> for PendingNotification {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            request_id: row.try_get("request_id")?,
            workflow_type: parse_column(row, "workflow_type")?,
            role: parse_column(row, "role")?,
            is_handled: row.try_get("is_handled")?,
            handled_at: row.try_get("handled_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// An unhandled notification joined with the current state of its
/// request, as returned by the pending listing.
#[derive(Debug, Clone, Serialize)]
pub struct PendingNotificationDetail {
    pub id: DbId,
    pub user_id: DbId,
    pub request_id: DbId,
    pub workflow_type: WorkflowType,
    pub role: Role,
    pub created_at: Timestamp,
    pub description: String,
    pub priority: Priority,
    pub status: RequestStatus,
}

impl FromRow<'_, PgRow> for PendingNotificationDetail {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            request_id: row.try_get("request_id")?,
            workflow_type: parse_column(row, "workflow_type")?,
            role: parse_column(row, "role")?,
            created_at: row.try_get("created_at")?,
            description: row.try_get("description")?,
            priority: parse_column(row, "priority")?,
            status: parse_column(row, "status")?,
        })
    }
}
