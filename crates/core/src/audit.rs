//! Access-control audit helpers.
//!
//! This module lives in `core` (zero internal deps) so both the
//! evaluator and any back-office tooling can format audit rows the same
//! way. The log itself is append-only and never read by the decision
//! logic.

use crate::permissions::WorkflowAction;
use crate::types::DbId;

/// Well-known deny/allow reasons recorded in `access_control_logs`.
///
/// The UI layer keys localized messages off the reason's category, never
/// its exact text, so these stay stable but human-readable.
pub mod reasons {
    pub const ALLOWED: &str = "allowed";
    pub const ROLE_NOT_AUTHORIZED: &str = "role not authorized for action";
    pub const REQUEST_NOT_FOUND: &str = "request not found";
    pub const CLIENT_OWN_ONLY: &str = "clients access only own requests";
    pub const ASSIGNED_REQUEST: &str = "assigned request";
    pub const CATEGORY_MATCH: &str = "category access";
    pub const NO_REQUEST_ACCESS: &str = "role has no access to this request";
    pub const INVALID_TRANSITION: &str = "transition not defined for workflow";
    pub const REQUEST_TERMINAL: &str = "request is in a terminal status";
    pub const ROLE_MISMATCH: &str = "from_role does not match current responsible role";
    pub const NOT_AN_INITIATOR: &str = "role may not initiate this workflow";
    pub const STORAGE_ERROR: &str = "storage error";
}

/// Canonical resource string for a workflow-action audit row.
///
/// `request:42` when a request is in scope, `workflow` for bare matrix
/// checks.
pub fn action_resource(request_id: Option<DbId>) -> String {
    match request_id {
        Some(id) => format!("request:{id}"),
        None => "workflow".to_string(),
    }
}

/// Canonical action string for an audit row, e.g. `"modify"` access
/// checks are logged as `access:modify`.
pub fn access_action(access_type: &str) -> String {
    format!("access:{access_type}")
}

/// Audit action string for a workflow action check.
pub fn workflow_action_str(action: WorkflowAction) -> &'static str {
    action.as_str()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
