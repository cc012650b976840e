//! Repository for the `pending_notifications` table.

use fiberdesk_core::request::WorkflowType;
use fiberdesk_core::roles::Role;
use fiberdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::pending_notification::{PendingNotification, PendingNotificationDetail};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, user_id, request_id, workflow_type, role, is_handled, handled_at, created_at";

/// Provides CRUD operations for pending notifications.
pub struct PendingNotificationRepo;

impl PendingNotificationRepo {
    /// Record a notification event for a user, returning the generated ID.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        request_id: DbId,
        workflow_type: WorkflowType,
        role: Role,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO pending_notifications (user_id, request_id, workflow_type, role) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(user_id)
        .bind(request_id)
        .bind(workflow_type.as_str())
        .bind(role.as_str())
        .fetch_one(pool)
        .await
    }

    /// Mark the user's notifications for a request as handled.
    ///
    /// Idempotent: returns `true` when a matching notification exists,
    /// whether it was flipped now or had been handled earlier; `false`
    /// only when the user has no notification for that request.
    pub async fn mark_handled(
        pool: &PgPool,
        user_id: DbId,
        request_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE pending_notifications \
             SET is_handled = true, handled_at = NOW() \
             WHERE user_id = $1 AND request_id = $2 AND is_handled = false",
        )
        .bind(user_id)
        .bind(request_id)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // Second call on an already-handled notification is a no-op.
        let exists: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM pending_notifications \
             WHERE user_id = $1 AND request_id = $2 LIMIT 1",
        )
        .bind(user_id)
        .bind(request_id)
        .fetch_optional(pool)
        .await?;
        Ok(exists.is_some())
    }

    /// List a user's unhandled notifications joined with the current
    /// request description/priority/status, newest first.
    pub async fn list_unhandled(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<PendingNotificationDetail>, sqlx::Error> {
        sqlx::query_as::<_, PendingNotificationDetail>(
            "SELECT n.id, n.user_id, n.request_id, n.workflow_type, n.role, n.created_at, \
                    r.description, r.priority, r.status \
             FROM pending_notifications n \
             JOIN service_requests r ON r.id = n.request_id \
             WHERE n.user_id = $1 AND n.is_handled = false \
             ORDER BY n.created_at DESC, n.id DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Count a user's unhandled notifications.
    pub async fn unhandled_count(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pending_notifications \
             WHERE user_id = $1 AND is_handled = false",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }

    /// Find a notification row by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PendingNotification>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pending_notifications WHERE id = $1");
        sqlx::query_as::<_, PendingNotification>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Delete handled notifications older than the retention window.
    /// Returns the number of rows removed.
    pub async fn cleanup_handled(pool: &PgPool, older_than_days: i32) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM pending_notifications \
             WHERE is_handled = true AND handled_at < NOW() - make_interval(days => $1)",
        )
        .bind(older_than_days)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
