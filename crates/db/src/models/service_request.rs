//! Service request entity model.

use fiberdesk_core::request::{Priority, RequestStatus, WorkflowType};
use fiberdesk_core::roles::Role;
use fiberdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use super::{parse_column, parse_column_opt};

/// A row from the `service_requests` table.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceRequest {
    pub id: DbId,
    pub workflow_type: WorkflowType,
    pub client_id: DbId,
    /// The single role presently responsible for acting on the request.
    pub role_current: Role,
    pub status: RequestStatus,
    pub priority: Priority,
    pub description: String,
    pub location: Option<String>,
    pub contact_phone: Option<String>,
    /// Opaque per-step payload; only specific keys are read by each
    /// component (e.g. `technician_id` after assignment).
    pub state_data: serde_json::Value,
    pub created_by_staff: bool,
    /// Role of the staff member who created the request on the client's
    /// behalf, when `created_by_staff` is set.
    pub creator_role: Option<Role>,
    pub equipment_used: Option<String>,
    pub inventory_updated: bool,
    pub completion_rating: Option<i16>,
    pub feedback_comment: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl FromRow<'_, PgRow> for ServiceRequest {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            workflow_type: parse_column(row, "workflow_type")?,
            client_id: row.try_get("client_id")?,
            role_current: parse_column(row, "role_current")?,
            status: parse_column(row, "status")?,
            priority: parse_column(row, "priority")?,
            description: row.try_get("description")?,
            location: row.try_get("location")?,
            contact_phone: row.try_get("contact_phone")?,
            state_data: row.try_get("state_data")?,
            created_by_staff: row.try_get("created_by_staff")?,
            creator_role: parse_column_opt(row, "creator_role")?,
            equipment_used: row.try_get("equipment_used")?,
            inventory_updated: row.try_get("inventory_updated")?,
            completion_rating: row.try_get("completion_rating")?,
            feedback_comment: row.try_get("feedback_comment")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// DTO for inserting a new service request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateServiceRequest {
    pub workflow_type: WorkflowType,
    pub client_id: DbId,
    pub role_current: Role,
    pub priority: Priority,
    pub description: String,
    pub location: Option<String>,
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub state_data: serde_json::Value,
    #[serde(default)]
    pub created_by_staff: bool,
    pub creator_role: Option<Role>,
}

/// Row-set scope for filtered request listings, derived from the
/// caller's role by the access evaluator.
#[derive(Debug, Clone)]
pub enum RequestScope {
    /// No restriction (admin).
    All,
    /// Only the client's own requests.
    Client(DbId),
    /// Assigned to the role, or within the role's category tags.
    Staff {
        role: Role,
        categories: Vec<WorkflowType>,
    },
}

/// Filter for request listings; `status`/`workflow` AND onto the scope.
#[derive(Debug, Clone)]
pub struct RequestFilter {
    pub scope: RequestScope,
    pub status: Option<RequestStatus>,
    pub workflow: Option<WorkflowType>,
}
