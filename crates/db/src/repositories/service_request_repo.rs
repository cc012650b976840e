//! Repository for the `service_requests` table.

use fiberdesk_core::request::{Priority, RequestStatus, WorkflowType};
use fiberdesk_core::roles::Role;
use fiberdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::service_request::{
    CreateServiceRequest, RequestFilter, RequestScope, ServiceRequest,
};
use crate::repositories::state_transition_repo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, workflow_type, client_id, role_current, status, priority, \
                       description, location, contact_phone, state_data, created_by_staff, \
                       creator_role, equipment_used, inventory_updated, completion_rating, \
                       feedback_comment, created_at, updated_at";

/// `ORDER BY` fragment: priority descending, then oldest first.
///
/// Priority is stored as TEXT, so the rank is computed inline; this must
/// stay in sync with `Priority::rank`.
const ORDER_BY_PRIORITY: &str = "ORDER BY CASE priority \
     WHEN 'urgent' THEN 3 WHEN 'high' THEN 2 WHEN 'medium' THEN 1 ELSE 0 END DESC, \
     created_at ASC";

/// Provides CRUD and transfer operations for service requests.
pub struct ServiceRequestRepo;

impl ServiceRequestRepo {
    /// Insert a new request, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateServiceRequest,
    ) -> Result<ServiceRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO service_requests \
             (workflow_type, client_id, role_current, status, priority, description, \
              location, contact_phone, state_data, created_by_staff, creator_role) \
             VALUES ($1, $2, $3, 'new', $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ServiceRequest>(&query)
            .bind(input.workflow_type.as_str())
            .bind(input.client_id)
            .bind(input.role_current.as_str())
            .bind(input.priority.as_str())
            .bind(&input.description)
            .bind(&input.location)
            .bind(&input.contact_phone)
            .bind(&input.state_data)
            .bind(input.created_by_staff)
            .bind(input.creator_role.map(Role::as_str))
            .fetch_one(pool)
            .await
    }

    /// Find a request by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ServiceRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM service_requests WHERE id = $1");
        sqlx::query_as::<_, ServiceRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List requests visible under the given scope and filters, ordered
    /// by priority descending then creation time ascending.
    pub async fn list_filtered(
        pool: &PgPool,
        filter: &RequestFilter,
    ) -> Result<Vec<ServiceRequest>, sqlx::Error> {
        let mut conditions: Vec<String> = Vec::new();
        let mut bind_idx = 1u32;

        // Scope clause first, then AND-ed filters. Binds are collected
        // in the same order the placeholders are emitted.
        let mut scope_client: Option<DbId> = None;
        let mut scope_role: Option<&'static str> = None;
        let mut scope_categories: Vec<&'static str> = Vec::new();

        match &filter.scope {
            RequestScope::All => {}
            RequestScope::Client(client_id) => {
                conditions.push(format!("client_id = ${bind_idx}"));
                bind_idx += 1;
                scope_client = Some(*client_id);
            }
            RequestScope::Staff { role, categories } => {
                let mut clause = format!("(role_current = ${bind_idx}");
                bind_idx += 1;
                scope_role = Some(role.as_str());
                if !categories.is_empty() {
                    let placeholders: Vec<String> = categories
                        .iter()
                        .map(|wt| {
                            scope_categories.push(wt.as_str());
                            let p = format!("${bind_idx}");
                            bind_idx += 1;
                            p
                        })
                        .collect();
                    clause.push_str(&format!(
                        " OR workflow_type IN ({})",
                        placeholders.join(", ")
                    ));
                }
                clause.push(')');
                conditions.push(clause);
            }
        }

        let status = filter.status.map(RequestStatus::as_str);
        if status.is_some() {
            conditions.push(format!("status = ${bind_idx}"));
            bind_idx += 1;
        }
        let workflow = filter.workflow.map(WorkflowType::as_str);
        if workflow.is_some() {
            conditions.push(format!("workflow_type = ${bind_idx}"));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let query =
            format!("SELECT {COLUMNS} FROM service_requests {where_clause} {ORDER_BY_PRIORITY}");

        let mut q = sqlx::query_as::<_, ServiceRequest>(&query);
        if let Some(client_id) = scope_client {
            q = q.bind(client_id);
        }
        if let Some(role) = scope_role {
            q = q.bind(role);
        }
        for category in scope_categories {
            q = q.bind(category);
        }
        if let Some(status) = status {
            q = q.bind(status);
        }
        if let Some(workflow) = workflow {
            q = q.bind(workflow);
        }
        q.fetch_all(pool).await
    }

    /// Count non-terminal requests currently assigned to a role.
    pub async fn count_open_by_role(pool: &PgPool, role: Role) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM service_requests \
             WHERE role_current = $1 AND status IN ('new', 'in_progress')",
        )
        .bind(role.as_str())
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }

    /// List non-terminal requests assigned to a role, priority first.
    pub async fn list_open_by_role(
        pool: &PgPool,
        role: Role,
    ) -> Result<Vec<ServiceRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM service_requests \
             WHERE role_current = $1 AND status IN ('new', 'in_progress') \
             {ORDER_BY_PRIORITY}"
        );
        sqlx::query_as::<_, ServiceRequest>(&query)
            .bind(role.as_str())
            .fetch_all(pool)
            .await
    }

    /// Hand a request from one role to the next and log the transition,
    /// atomically.
    ///
    /// The UPDATE is guarded on `role_current = from_role` and on the
    /// request being non-terminal; if another actor moved the request
    /// first, or it has been completed or cancelled, nothing is written
    /// and `false` is returned. Any failure rolls back both statements.
    pub async fn transfer(
        pool: &PgPool,
        request_id: DbId,
        from_role: Role,
        to_role: Role,
        actor_id: DbId,
        action: &str,
        comment: Option<&str>,
        state_patch: Option<&serde_json::Value>,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let patch = state_patch
            .cloned()
            .unwrap_or(serde_json::Value::Object(Default::default()));
        let updated = sqlx::query(
            "UPDATE service_requests \
             SET role_current = $2, status = 'in_progress', state_data = state_data || $4, \
                 updated_at = NOW() \
             WHERE id = $1 AND role_current = $3 \
               AND status NOT IN ('completed', 'cancelled')",
        )
        .bind(request_id)
        .bind(to_role.as_str())
        .bind(from_role.as_str())
        .bind(patch)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(state_transition_repo::INSERT_SQL)
            .bind(request_id)
            .bind(Some(from_role.as_str()))
            .bind(to_role.as_str())
            .bind(actor_id)
            .bind(action)
            .bind(comment)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Mark a request completed, with the client's rating and feedback
    /// when given.
    pub async fn complete(
        pool: &PgPool,
        request_id: DbId,
        rating: Option<i16>,
        feedback: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE service_requests \
             SET status = 'completed', completion_rating = $2, feedback_comment = $3, \
                 updated_at = NOW() \
             WHERE id = $1 AND status NOT IN ('completed', 'cancelled')",
        )
        .bind(request_id)
        .bind(rating)
        .bind(feedback)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Cancel a non-terminal request. No role transition is written.
    pub async fn cancel(pool: &PgPool, request_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE service_requests \
             SET status = 'cancelled', updated_at = NOW() \
             WHERE id = $1 AND status NOT IN ('completed', 'cancelled')",
        )
        .bind(request_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record the warehouse inventory update for a request.
    pub async fn set_inventory_updated(
        pool: &PgPool,
        request_id: DbId,
        equipment_used: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE service_requests \
             SET inventory_updated = true, equipment_used = COALESCE($2, equipment_used), \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(request_id)
        .bind(equipment_used)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Shallow-merge a JSON patch into the request's `state_data`.
    pub async fn merge_state_data(
        pool: &PgPool,
        request_id: DbId,
        patch: &serde_json::Value,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE service_requests \
             SET state_data = state_data || $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(request_id)
        .bind(patch)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
