//! The access control evaluator.
//!
//! Combines the static role matrix (`fiberdesk_core::permissions`) with
//! the request-level rules: ownership for clients, assignment and
//! category tags for staff, blanket access for admins. Every decision is
//! written to `access_control_logs` fire-and-forget; the audit insert
//! never blocks or fails the check.
//!
//! All public methods are total. Storage failures deny (or return
//! empty) and are reported through `tracing::error!`.

use fiberdesk_core::audit::{self, reasons};
use fiberdesk_core::permissions::{permissions, RolePermissions, WorkflowAction};
use fiberdesk_core::request::{RequestStatus, WorkflowType};
use fiberdesk_core::roles::Role;
use fiberdesk_core::types::DbId;
use fiberdesk_db::models::access_log::CreateAccessLog;
use fiberdesk_db::models::service_request::{RequestFilter, RequestScope, ServiceRequest};
use fiberdesk_db::repositories::{AccessLogRepo, ServiceRequestRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The kind of request access being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    View,
    Modify,
}

impl AccessType {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessType::View => "view",
            AccessType::Modify => "modify",
        }
    }
}

/// The outcome of a permission check: a verdict plus the audited reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: &'static str,
}

impl AccessDecision {
    pub const fn allow(reason: &'static str) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    pub const fn deny(reason: &'static str) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

/// A user's effective permission set: the static matrix entry plus the
/// live open-assignment count when it could be read.
#[derive(Debug, Clone)]
pub struct UserPermissions {
    pub user_id: DbId,
    pub role: Role,
    pub permissions: &'static RolePermissions,
    /// Open requests currently assigned to the role; `None` for roles
    /// that hold no assignment queue or when the count query failed.
    pub open_assignments: Option<i64>,
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Evaluates (user, role, action, request) tuples against the matrix
/// and the request-level rules.
pub struct AccessControl {
    pool: PgPool,
}

impl AccessControl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Check whether a role may perform a workflow action, optionally
    /// against a concrete request. Audited.
    pub async fn validate_workflow_action(
        &self,
        user_id: DbId,
        role: Role,
        action: WorkflowAction,
        request_id: Option<DbId>,
    ) -> AccessDecision {
        let decision = self
            .evaluate_workflow_action(user_id, role, action, request_id)
            .await;
        self.audit(
            user_id,
            role,
            audit::workflow_action_str(action).to_string(),
            audit::action_resource(request_id),
            decision,
        );
        decision
    }

    async fn evaluate_workflow_action(
        &self,
        user_id: DbId,
        role: Role,
        action: WorkflowAction,
        request_id: Option<DbId>,
    ) -> AccessDecision {
        if !permissions(role).allows_action(action) {
            return AccessDecision::deny(reasons::ROLE_NOT_AUTHORIZED);
        }
        match request_id {
            None => AccessDecision::allow(reasons::ALLOWED),
            Some(id) => {
                self.evaluate_request_access(user_id, role, id, AccessType::Modify)
                    .await
            }
        }
    }

    /// Check whether a user may view or modify a specific request.
    /// Audited as `access:view` / `access:modify`.
    pub async fn validate_request_access(
        &self,
        user_id: DbId,
        role: Role,
        request_id: DbId,
        access_type: AccessType,
    ) -> AccessDecision {
        let decision = self
            .evaluate_request_access(user_id, role, request_id, access_type)
            .await;
        self.audit(
            user_id,
            role,
            audit::access_action(access_type.as_str()),
            audit::action_resource(Some(request_id)),
            decision,
        );
        decision
    }

    async fn evaluate_request_access(
        &self,
        user_id: DbId,
        role: Role,
        request_id: DbId,
        _access_type: AccessType,
    ) -> AccessDecision {
        let request = match ServiceRequestRepo::find_by_id(&self.pool, request_id).await {
            Ok(Some(request)) => request,
            Ok(None) => return AccessDecision::deny(reasons::REQUEST_NOT_FOUND),
            Err(e) => {
                tracing::error!(request_id, error = %e, "Failed to load request for access check");
                return AccessDecision::deny(reasons::STORAGE_ERROR);
            }
        };

        if role == Role::Admin {
            return AccessDecision::allow(reasons::ALLOWED);
        }
        if role == Role::Client {
            return if request.client_id == user_id {
                AccessDecision::allow(reasons::ALLOWED)
            } else {
                AccessDecision::deny(reasons::CLIENT_OWN_ONLY)
            };
        }

        let perms = permissions(role);
        if perms.has_all_requests() {
            return AccessDecision::allow(reasons::ALLOWED);
        }
        if request.role_current == role {
            return AccessDecision::allow(reasons::ASSIGNED_REQUEST);
        }
        let category_match = perms
            .request_access
            .iter()
            .any(|tag| tag.workflow_type() == Some(request.workflow_type));
        if category_match {
            return AccessDecision::allow(reasons::CATEGORY_MATCH);
        }
        AccessDecision::deny(reasons::NO_REQUEST_ACCESS)
    }

    /// List the requests visible to a user, with optional status and
    /// workflow filters, priority first. Storage failure yields an
    /// empty list.
    pub async fn get_filtered_requests(
        &self,
        user_id: DbId,
        role: Role,
        status: Option<RequestStatus>,
        workflow: Option<WorkflowType>,
    ) -> Vec<ServiceRequest> {
        let filter = RequestFilter {
            scope: scope_for(user_id, role),
            status,
            workflow,
        };
        match ServiceRequestRepo::list_filtered(&self.pool, &filter).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(user_id, role = %role, error = %e, "Failed to list requests");
                Vec::new()
            }
        }
    }

    /// The user's effective permission set, enriched with the role's
    /// live open-assignment count where that applies.
    pub async fn user_permissions(&self, user_id: DbId, role: Role) -> UserPermissions {
        let open_assignments = if role.is_notifiable() {
            match ServiceRequestRepo::count_open_by_role(&self.pool, role).await {
                Ok(count) => Some(count),
                Err(e) => {
                    tracing::warn!(user_id, role = %role, error = %e, "Assignment count unavailable");
                    None
                }
            }
        } else {
            None
        };
        UserPermissions {
            user_id,
            role,
            permissions: permissions(role),
            open_assignments,
        }
    }

    /// Append an audit row without blocking the caller. Insert failures
    /// are logged and swallowed.
    fn audit(
        &self,
        user_id: DbId,
        role: Role,
        action: String,
        resource: String,
        decision: AccessDecision,
    ) {
        let entry = CreateAccessLog {
            user_id,
            role: role.as_str().to_string(),
            action,
            resource,
            granted: decision.allowed,
            reason: decision.reason.to_string(),
        };
        let pool = self.pool.clone();
        tokio::spawn(async move {
            if let Err(e) = AccessLogRepo::insert(&pool, &entry).await {
                tracing::error!(user_id = entry.user_id, error = %e, "Failed to write access audit row");
            }
        });
    }
}

/// Map a (user, role) pair to its listing scope.
fn scope_for(user_id: DbId, role: Role) -> RequestScope {
    match role {
        Role::Admin => RequestScope::All,
        Role::Client => RequestScope::Client(user_id),
        staff => RequestScope::Staff {
            role: staff,
            categories: permissions(staff)
                .request_access
                .iter()
                .filter_map(|tag| tag.workflow_type())
                .collect(),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
