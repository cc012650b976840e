//! The static role → permission matrix.
//!
//! [`permissions`] is a pure lookup: no request context, no I/O. The
//! request-level rules (ownership, assignment, category tags) are
//! evaluated on top of this matrix by the workflow crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::request::RequestCategory;
use crate::roles::Role;

/* --------------------------------------------------------------------------
Workflow actions
-------------------------------------------------------------------------- */

/// Every action a user can attempt against the workflow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    SubmitRequest,
    AssignToJuniorManager,
    ForwardToController,
    AssignToTechnician,
    CompleteWork,
    SendToWarehouse,
    UpdateInventory,
    CloseRequest,
    RateService,
    EscalateToSupervisor,
    ReturnToOperator,
    ResolveDirect,
    TransferRequest,
    CancelRequest,
}

/// All workflow actions.
pub const ALL_ACTIONS: &[WorkflowAction] = &[
    WorkflowAction::SubmitRequest,
    WorkflowAction::AssignToJuniorManager,
    WorkflowAction::ForwardToController,
    WorkflowAction::AssignToTechnician,
    WorkflowAction::CompleteWork,
    WorkflowAction::SendToWarehouse,
    WorkflowAction::UpdateInventory,
    WorkflowAction::CloseRequest,
    WorkflowAction::RateService,
    WorkflowAction::EscalateToSupervisor,
    WorkflowAction::ReturnToOperator,
    WorkflowAction::ResolveDirect,
    WorkflowAction::TransferRequest,
    WorkflowAction::CancelRequest,
];

impl WorkflowAction {
    /// The snake_case string form used in transition and audit rows.
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowAction::SubmitRequest => "submit_request",
            WorkflowAction::AssignToJuniorManager => "assign_to_junior_manager",
            WorkflowAction::ForwardToController => "forward_to_controller",
            WorkflowAction::AssignToTechnician => "assign_to_technician",
            WorkflowAction::CompleteWork => "complete_work",
            WorkflowAction::SendToWarehouse => "send_to_warehouse",
            WorkflowAction::UpdateInventory => "update_inventory",
            WorkflowAction::CloseRequest => "close_request",
            WorkflowAction::RateService => "rate_service",
            WorkflowAction::EscalateToSupervisor => "escalate_to_supervisor",
            WorkflowAction::ReturnToOperator => "return_to_operator",
            WorkflowAction::ResolveDirect => "resolve_direct",
            WorkflowAction::TransferRequest => "transfer_request",
            WorkflowAction::CancelRequest => "cancel_request",
        }
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_ACTIONS
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown workflow action '{s}'")))
    }
}

/* --------------------------------------------------------------------------
Role permissions
-------------------------------------------------------------------------- */

/// The static permission set attached to a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RolePermissions {
    /// Workflow actions this role may attempt.
    pub workflow_actions: &'static [WorkflowAction],
    /// Coarse request-access tags; an empty slice means "own requests
    /// only" (clients) or "assigned requests only".
    pub request_access: &'static [RequestCategory],
    pub can_create_requests: bool,
    pub can_view_all_requests: bool,
    pub can_assign_requests: bool,
    pub can_modify_others_requests: bool,
}

impl RolePermissions {
    /// Whether the matrix permits this action for the role.
    pub fn allows_action(&self, action: WorkflowAction) -> bool {
        self.workflow_actions.contains(&action)
    }

    /// Whether the role carries the blanket all-requests tag.
    pub fn has_all_requests(&self) -> bool {
        self.request_access.contains(&RequestCategory::AllRequests)
    }
}

const CLIENT: RolePermissions = RolePermissions {
    workflow_actions: &[
        WorkflowAction::SubmitRequest,
        WorkflowAction::RateService,
        WorkflowAction::CancelRequest,
    ],
    request_access: &[],
    can_create_requests: true,
    can_view_all_requests: false,
    can_assign_requests: false,
    can_modify_others_requests: false,
};

const MANAGER: RolePermissions = RolePermissions {
    workflow_actions: &[
        WorkflowAction::SubmitRequest,
        WorkflowAction::AssignToJuniorManager,
        WorkflowAction::TransferRequest,
        WorkflowAction::CancelRequest,
    ],
    request_access: &[RequestCategory::ConnectionRequests],
    can_create_requests: true,
    can_view_all_requests: false,
    can_assign_requests: true,
    can_modify_others_requests: true,
};

const JUNIOR_MANAGER: RolePermissions = RolePermissions {
    workflow_actions: &[WorkflowAction::ForwardToController],
    request_access: &[RequestCategory::ConnectionRequests],
    can_create_requests: false,
    can_view_all_requests: false,
    can_assign_requests: false,
    can_modify_others_requests: false,
};

const CONTROLLER: RolePermissions = RolePermissions {
    workflow_actions: &[
        WorkflowAction::AssignToTechnician,
        WorkflowAction::TransferRequest,
    ],
    request_access: &[
        RequestCategory::ConnectionRequests,
        RequestCategory::TechnicalRequests,
    ],
    can_create_requests: false,
    can_view_all_requests: false,
    can_assign_requests: true,
    can_modify_others_requests: false,
};

const TECHNICIAN: RolePermissions = RolePermissions {
    workflow_actions: &[WorkflowAction::CompleteWork, WorkflowAction::SendToWarehouse],
    request_access: &[RequestCategory::TechnicalRequests],
    can_create_requests: false,
    can_view_all_requests: false,
    can_assign_requests: false,
    can_modify_others_requests: false,
};

const WAREHOUSE: RolePermissions = RolePermissions {
    workflow_actions: &[WorkflowAction::UpdateInventory, WorkflowAction::CloseRequest],
    request_access: &[
        RequestCategory::ConnectionRequests,
        RequestCategory::TechnicalRequests,
    ],
    can_create_requests: false,
    can_view_all_requests: false,
    can_assign_requests: false,
    can_modify_others_requests: false,
};

const CALL_CENTER: RolePermissions = RolePermissions {
    workflow_actions: &[
        WorkflowAction::SubmitRequest,
        WorkflowAction::ResolveDirect,
        WorkflowAction::EscalateToSupervisor,
        WorkflowAction::CloseRequest,
    ],
    request_access: &[RequestCategory::CallCenterRequests],
    can_create_requests: true,
    can_view_all_requests: false,
    can_assign_requests: false,
    can_modify_others_requests: false,
};

const CALL_CENTER_SUPERVISOR: RolePermissions = RolePermissions {
    workflow_actions: &[
        WorkflowAction::ReturnToOperator,
        WorkflowAction::TransferRequest,
    ],
    request_access: &[RequestCategory::CallCenterRequests],
    can_create_requests: false,
    can_view_all_requests: false,
    can_assign_requests: true,
    can_modify_others_requests: false,
};

const ADMIN: RolePermissions = RolePermissions {
    workflow_actions: ALL_ACTIONS,
    request_access: &[RequestCategory::AllRequests],
    can_create_requests: true,
    can_view_all_requests: true,
    can_assign_requests: true,
    can_modify_others_requests: true,
};

/// Look up the static permission set for a role.
pub fn permissions(role: Role) -> &'static RolePermissions {
    match role {
        Role::Client => &CLIENT,
        Role::Manager => &MANAGER,
        Role::JuniorManager => &JUNIOR_MANAGER,
        Role::Controller => &CONTROLLER,
        Role::Technician => &TECHNICIAN,
        Role::Warehouse => &WAREHOUSE,
        Role::CallCenter => &CALL_CENTER,
        Role::CallCenterSupervisor => &CALL_CENTER_SUPERVISOR,
        Role::Admin => &ADMIN,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
