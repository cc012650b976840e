//! Workflow definition tables.
//!
//! Each workflow type is a linear role sequence with an action-driven
//! step table. `transition_workflow` resolves the next responsible role
//! through [`next_role`]; manual reassignment is validated against the
//! [`allowed_next_roles`] projection of the same table, so the two can
//! never disagree.
//!
//! Role sequences:
//!
//! - connection_request: client → manager → junior_manager → controller
//!   → technician → warehouse → client (completion/rating)
//! - technical_service: client → controller → technician → (optional)
//!   warehouse → client; the technician may complete directly
//! - call_center_direct: call_center → call_center_supervisor →
//!   call_center → client

use crate::permissions::WorkflowAction;
use crate::request::WorkflowType;
use crate::roles::Role;

/* --------------------------------------------------------------------------
Step table
-------------------------------------------------------------------------- */

/// One row of the workflow step table: performing `action` while
/// `role` is responsible hands the request to `next`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowStep {
    pub workflow: WorkflowType,
    pub role: Role,
    pub action: WorkflowAction,
    pub next: Role,
    /// Whether this step completes the request (terminal status).
    pub completes: bool,
}

const fn step(
    workflow: WorkflowType,
    role: Role,
    action: WorkflowAction,
    next: Role,
) -> WorkflowStep {
    WorkflowStep {
        workflow,
        role,
        action,
        next,
        completes: false,
    }
}

const fn terminal_step(
    workflow: WorkflowType,
    role: Role,
    action: WorkflowAction,
    next: Role,
) -> WorkflowStep {
    WorkflowStep {
        workflow,
        role,
        action,
        next,
        completes: true,
    }
}

/// The full step table across all workflows.
///
/// In-place actions (`update_inventory`, `cancel_request`) are
/// deliberately absent: they mutate request flags without moving
/// `role_current`, so the engine rejects them as transitions.
pub const STEPS: &[WorkflowStep] = &[
    // connection_request
    step(
        WorkflowType::ConnectionRequest,
        Role::Client,
        WorkflowAction::SubmitRequest,
        Role::Manager,
    ),
    step(
        WorkflowType::ConnectionRequest,
        Role::Manager,
        WorkflowAction::AssignToJuniorManager,
        Role::JuniorManager,
    ),
    step(
        WorkflowType::ConnectionRequest,
        Role::JuniorManager,
        WorkflowAction::ForwardToController,
        Role::Controller,
    ),
    step(
        WorkflowType::ConnectionRequest,
        Role::Controller,
        WorkflowAction::AssignToTechnician,
        Role::Technician,
    ),
    step(
        WorkflowType::ConnectionRequest,
        Role::Technician,
        WorkflowAction::SendToWarehouse,
        Role::Warehouse,
    ),
    step(
        WorkflowType::ConnectionRequest,
        Role::Warehouse,
        WorkflowAction::CloseRequest,
        Role::Client,
    ),
    terminal_step(
        WorkflowType::ConnectionRequest,
        Role::Client,
        WorkflowAction::RateService,
        Role::Client,
    ),
    // technical_service
    step(
        WorkflowType::TechnicalService,
        Role::Client,
        WorkflowAction::SubmitRequest,
        Role::Controller,
    ),
    step(
        WorkflowType::TechnicalService,
        Role::Controller,
        WorkflowAction::AssignToTechnician,
        Role::Technician,
    ),
    step(
        WorkflowType::TechnicalService,
        Role::Technician,
        WorkflowAction::SendToWarehouse,
        Role::Warehouse,
    ),
    step(
        WorkflowType::TechnicalService,
        Role::Technician,
        WorkflowAction::CompleteWork,
        Role::Client,
    ),
    step(
        WorkflowType::TechnicalService,
        Role::Warehouse,
        WorkflowAction::CloseRequest,
        Role::Client,
    ),
    terminal_step(
        WorkflowType::TechnicalService,
        Role::Client,
        WorkflowAction::RateService,
        Role::Client,
    ),
    // call_center_direct
    step(
        WorkflowType::CallCenterDirect,
        Role::CallCenter,
        WorkflowAction::SubmitRequest,
        Role::CallCenterSupervisor,
    ),
    step(
        WorkflowType::CallCenterDirect,
        Role::CallCenterSupervisor,
        WorkflowAction::ReturnToOperator,
        Role::CallCenter,
    ),
    step(
        WorkflowType::CallCenterDirect,
        Role::CallCenter,
        WorkflowAction::EscalateToSupervisor,
        Role::CallCenterSupervisor,
    ),
    step(
        WorkflowType::CallCenterDirect,
        Role::CallCenter,
        WorkflowAction::ResolveDirect,
        Role::Client,
    ),
    terminal_step(
        WorkflowType::CallCenterDirect,
        Role::Client,
        WorkflowAction::RateService,
        Role::Client,
    ),
];

/* --------------------------------------------------------------------------
Lookups
-------------------------------------------------------------------------- */

/// Roles allowed to initiate a workflow of the given type.
pub fn allowed_initiators(workflow: WorkflowType) -> &'static [Role] {
    match workflow {
        WorkflowType::ConnectionRequest => &[Role::Client, Role::Manager, Role::Admin],
        WorkflowType::TechnicalService => &[Role::Client, Role::CallCenter, Role::Admin],
        WorkflowType::CallCenterDirect => {
            &[Role::CallCenter, Role::CallCenterSupervisor, Role::Admin]
        }
    }
}

/// The role responsible for a freshly created request.
pub fn first_responsible_role(workflow: WorkflowType) -> Role {
    match workflow {
        WorkflowType::ConnectionRequest => Role::Manager,
        WorkflowType::TechnicalService => Role::Controller,
        WorkflowType::CallCenterDirect => Role::CallCenterSupervisor,
    }
}

/// The ordered role sequence of the workflow, used for the
/// `role_current`-membership invariant.
pub fn role_sequence(workflow: WorkflowType) -> &'static [Role] {
    match workflow {
        WorkflowType::ConnectionRequest => &[
            Role::Client,
            Role::Manager,
            Role::JuniorManager,
            Role::Controller,
            Role::Technician,
            Role::Warehouse,
        ],
        WorkflowType::TechnicalService => &[
            Role::Client,
            Role::Controller,
            Role::Technician,
            Role::Warehouse,
        ],
        WorkflowType::CallCenterDirect => &[
            Role::Client,
            Role::CallCenter,
            Role::CallCenterSupervisor,
        ],
    }
}

/// Whether a role participates in the workflow at all.
pub fn workflow_contains_role(workflow: WorkflowType, role: Role) -> bool {
    role_sequence(workflow).contains(&role)
}

/// Resolve the step for (workflow, current role, action), if defined.
pub fn find_step(
    workflow: WorkflowType,
    role: Role,
    action: WorkflowAction,
) -> Option<&'static WorkflowStep> {
    STEPS
        .iter()
        .find(|s| s.workflow == workflow && s.role == role && s.action == action)
}

/// The next responsible role for (workflow, current role, action), if
/// the step is defined.
pub fn next_role(workflow: WorkflowType, role: Role, action: WorkflowAction) -> Option<Role> {
    find_step(workflow, role, action).map(|s| s.next)
}

/// All roles reachable from `from` in one step of the workflow.
///
/// This is the `role_transitions` projection used by permission-transfer
/// validation; self-loops from terminal rating steps are excluded.
pub fn allowed_next_roles(workflow: WorkflowType, from: Role) -> Vec<Role> {
    let mut roles = Vec::new();
    for s in STEPS {
        if s.workflow == workflow && s.role == from && s.next != from && !roles.contains(&s.next) {
            roles.push(s.next);
        }
    }
    roles
}

/// Whether a direct `from` → `to` hand-off is listed in the workflow's
/// transition map.
pub fn is_valid_transition(workflow: WorkflowType, from: Role, to: Role) -> bool {
    allowed_next_roles(workflow, from).contains(&to)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ALL_WORKFLOW_TYPES;

    #[test]
    fn connection_request_follows_the_full_chain() {
        let wf = WorkflowType::ConnectionRequest;
        assert_eq!(
            next_role(wf, Role::Client, WorkflowAction::SubmitRequest),
            Some(Role::Manager)
        );
        assert_eq!(
            next_role(wf, Role::Manager, WorkflowAction::AssignToJuniorManager),
            Some(Role::JuniorManager)
        );
        assert_eq!(
            next_role(wf, Role::JuniorManager, WorkflowAction::ForwardToController),
            Some(Role::Controller)
        );
        assert_eq!(
            next_role(wf, Role::Controller, WorkflowAction::AssignToTechnician),
            Some(Role::Technician)
        );
        assert_eq!(
            next_role(wf, Role::Technician, WorkflowAction::SendToWarehouse),
            Some(Role::Warehouse)
        );
        assert_eq!(
            next_role(wf, Role::Warehouse, WorkflowAction::CloseRequest),
            Some(Role::Client)
        );
    }

    #[test]
    fn technician_may_complete_technical_service_directly() {
        let wf = WorkflowType::TechnicalService;
        assert_eq!(
            next_role(wf, Role::Technician, WorkflowAction::CompleteWork),
            Some(Role::Client)
        );
        assert_eq!(
            next_role(wf, Role::Technician, WorkflowAction::SendToWarehouse),
            Some(Role::Warehouse)
        );
    }

    #[test]
    fn undefined_steps_resolve_to_none() {
        // Warehouse never acts in call_center_direct.
        assert_eq!(
            next_role(
                WorkflowType::CallCenterDirect,
                Role::Warehouse,
                WorkflowAction::CloseRequest
            ),
            None
        );
        // update_inventory is an in-place action, not a transition.
        assert_eq!(
            next_role(
                WorkflowType::ConnectionRequest,
                Role::Warehouse,
                WorkflowAction::UpdateInventory
            ),
            None
        );
    }

    #[test]
    fn client_to_warehouse_is_not_a_valid_connection_transition() {
        assert!(!is_valid_transition(
            WorkflowType::ConnectionRequest,
            Role::Client,
            Role::Warehouse
        ));
    }

    #[test]
    fn transition_projection_agrees_with_step_table() {
        for s in STEPS {
            if s.next != s.role {
                assert!(
                    is_valid_transition(s.workflow, s.role, s.next),
                    "{:?}: {} -> {}",
                    s.workflow,
                    s.role,
                    s.next
                );
            }
        }
    }

    #[test]
    fn every_step_role_is_in_the_role_sequence() {
        // The role_current invariant: transitions can only ever produce
        // roles that belong to the workflow's sequence.
        for s in STEPS {
            assert!(
                workflow_contains_role(s.workflow, s.role),
                "{:?} missing {}",
                s.workflow,
                s.role
            );
            assert!(
                workflow_contains_role(s.workflow, s.next),
                "{:?} missing {}",
                s.workflow,
                s.next
            );
        }
    }

    #[test]
    fn first_responsible_role_is_in_sequence() {
        for wf in ALL_WORKFLOW_TYPES {
            assert!(workflow_contains_role(*wf, first_responsible_role(*wf)));
        }
    }

    #[test]
    fn initiators_include_the_client_for_client_facing_workflows() {
        assert!(allowed_initiators(WorkflowType::ConnectionRequest).contains(&Role::Client));
        assert!(allowed_initiators(WorkflowType::TechnicalService).contains(&Role::Client));
        assert!(!allowed_initiators(WorkflowType::CallCenterDirect).contains(&Role::Client));
    }

    #[test]
    fn admin_may_initiate_everything() {
        for wf in ALL_WORKFLOW_TYPES {
            assert!(allowed_initiators(*wf).contains(&Role::Admin));
        }
    }

    #[test]
    fn rating_step_is_terminal_in_every_workflow() {
        for wf in ALL_WORKFLOW_TYPES {
            let s = find_step(*wf, Role::Client, WorkflowAction::RateService).unwrap();
            assert!(s.completes);
            assert_eq!(s.next, Role::Client);
        }
    }

    #[test]
    fn rating_self_loop_is_not_a_transfer_target() {
        // allowed_next_roles excludes self-loops, so a manual transfer
        // client -> client is never valid.
        for wf in ALL_WORKFLOW_TYPES {
            assert!(!allowed_next_roles(*wf, Role::Client).contains(&Role::Client));
        }
    }
}
