//! Repository for the append-only `state_transitions` table.

use fiberdesk_core::roles::Role;
use fiberdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::state_transition::StateTransition;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, request_id, from_role, to_role, actor_id, action, comment, created_at";

/// Shared INSERT statement; also executed inside the transfer
/// transaction in `service_request_repo` so the two paths cannot drift.
pub(crate) const INSERT_SQL: &str = "INSERT INTO state_transitions \
     (request_id, from_role, to_role, actor_id, action, comment) \
     VALUES ($1, $2, $3, $4, $5, $6)";

/// Provides insert and read operations for state transitions. Rows are
/// never updated or deleted outside retention cleanup.
pub struct StateTransitionRepo;

impl StateTransitionRepo {
    /// Append a transition row. `from_role` is `None` only for the
    /// initial transition at request creation.
    pub async fn insert(
        pool: &PgPool,
        request_id: DbId,
        from_role: Option<Role>,
        to_role: Role,
        actor_id: DbId,
        action: &str,
        comment: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(INSERT_SQL)
            .bind(request_id)
            .bind(from_role.map(Role::as_str))
            .bind(to_role.as_str())
            .bind(actor_id)
            .bind(action)
            .bind(comment)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// List a request's transitions in chronological order.
    pub async fn list_for_request(
        pool: &PgPool,
        request_id: DbId,
    ) -> Result<Vec<StateTransition>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM state_transitions \
             WHERE request_id = $1 ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, StateTransition>(&query)
            .bind(request_id)
            .fetch_all(pool)
            .await
    }

    /// The most recent transition for a request, if any.
    pub async fn latest_for_request(
        pool: &PgPool,
        request_id: DbId,
    ) -> Result<Option<StateTransition>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM state_transitions \
             WHERE request_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1"
        );
        sqlx::query_as::<_, StateTransition>(&query)
            .bind(request_id)
            .fetch_optional(pool)
            .await
    }
}
