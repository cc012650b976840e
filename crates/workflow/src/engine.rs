//! The workflow engine: request creation, step-table advancement and
//! manual permission transfer.
//!
//! Every state change runs through the access evaluator first, so the
//! audit trail covers denied attempts as well as successful ones. The
//! role hand-off itself (UPDATE `role_current` + transition INSERT) is
//! a single transaction in the repository layer; the engine never
//! leaves partial state behind.
//!
//! Public operations are total: denials and storage failures come back
//! as `None`/`false`/deny decisions, never as panics or raw errors.

use std::sync::Arc;

use fiberdesk_core::audit::reasons;
use fiberdesk_core::permissions::WorkflowAction;
use fiberdesk_core::request::{validate_description, validate_rating, Priority, WorkflowType};
use fiberdesk_core::roles::Role;
use fiberdesk_core::types::DbId;
use fiberdesk_core::workflow;
use fiberdesk_db::models::service_request::{CreateServiceRequest, ServiceRequest};
use fiberdesk_db::repositories::{ServiceRequestRepo, StateTransitionRepo, UserRepo};
use sqlx::PgPool;

use crate::access::{AccessControl, AccessDecision};
use crate::notify::NotificationDispatcher;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Input for creating a request. The actor is whoever submits it: the
/// client themselves, or a staff member acting on the client's behalf.
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub client_id: DbId,
    pub actor_id: DbId,
    pub actor_role: Role,
    pub priority: Priority,
    pub description: String,
    pub location: Option<String>,
    pub contact_phone: Option<String>,
}

/// Optional side-channel data carried by a transition: an audit
/// comment, a `state_data` patch (e.g. the assigned technician's id),
/// and the rating/feedback pair for the terminal step.
#[derive(Debug, Clone, Default)]
pub struct TransitionContext<'a> {
    pub comment: Option<&'a str>,
    pub state_patch: Option<serde_json::Value>,
    pub rating: Option<i16>,
    pub feedback: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Drives requests through their workflow's step table.
pub struct WorkflowEngine {
    pool: PgPool,
    access: AccessControl,
    dispatcher: Arc<NotificationDispatcher>,
}

impl WorkflowEngine {
    pub fn new(pool: PgPool, dispatcher: Arc<NotificationDispatcher>) -> Self {
        let access = AccessControl::new(pool.clone());
        Self {
            pool,
            access,
            dispatcher,
        }
    }

    /// The engine's evaluator, shared with callers that need standalone
    /// permission checks.
    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    /// Create a request and hand it to the workflow's first responsible
    /// role.
    ///
    /// Returns the new request id, or `None` when the actor may not
    /// initiate this workflow type, validation fails, or storage fails.
    /// No state is written on denial.
    pub async fn initiate_workflow(
        &self,
        workflow_type: WorkflowType,
        input: &NewRequest,
    ) -> Option<DbId> {
        if !workflow::allowed_initiators(workflow_type).contains(&input.actor_role) {
            tracing::warn!(
                actor_id = input.actor_id,
                actor_role = %input.actor_role,
                workflow = %workflow_type,
                reason = reasons::NOT_AN_INITIATOR,
                "Workflow initiation denied"
            );
            return None;
        }
        let decision = self
            .access
            .validate_workflow_action(
                input.actor_id,
                input.actor_role,
                WorkflowAction::SubmitRequest,
                None,
            )
            .await;
        if !decision.allowed {
            return None;
        }
        if let Err(e) = validate_description(&input.description) {
            tracing::warn!(actor_id = input.actor_id, error = %e, "Invalid request description");
            return None;
        }

        let responsible = workflow::first_responsible_role(workflow_type);
        let created_by_staff = input.actor_role != Role::Client;
        let create = CreateServiceRequest {
            workflow_type,
            client_id: input.client_id,
            role_current: responsible,
            priority: input.priority,
            description: input.description.clone(),
            location: input.location.clone(),
            contact_phone: input.contact_phone.clone(),
            state_data: serde_json::json!({}),
            created_by_staff,
            creator_role: created_by_staff.then_some(input.actor_role),
        };
        let request = match ServiceRequestRepo::create(&self.pool, &create).await {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(actor_id = input.actor_id, error = %e, "Failed to create request");
                return None;
            }
        };

        // Initial transition: from_role is NULL, to the first
        // responsible role.
        if let Err(e) = StateTransitionRepo::insert(
            &self.pool,
            request.id,
            None,
            responsible,
            input.actor_id,
            WorkflowAction::SubmitRequest.as_str(),
            None,
        )
        .await
        {
            tracing::error!(request_id = request.id, error = %e,
                "Failed to record initial transition");
        }

        if created_by_staff {
            self.dispatcher
                .send_staff_created_notifications(request.id, input.actor_id, input.client_id)
                .await;
        } else {
            self.dispatcher
                .send_assignment_notification(responsible, request.id, workflow_type)
                .await;
        }

        tracing::info!(
            request_id = request.id,
            workflow = %workflow_type,
            responsible = %responsible,
            created_by_staff,
            "Request created"
        );
        Some(request.id)
    }

    /// Advance a request through one step of its workflow.
    ///
    /// Resolves the step-table entry for (workflow, `role_current`,
    /// action); actions without an entry (in-place actions, wrong role,
    /// wrong workflow) are rejected. Terminal steps complete the
    /// request; all others transfer it and page the next role.
    pub async fn transition_workflow(
        &self,
        request_id: DbId,
        action: WorkflowAction,
        actor_id: DbId,
        actor_role: Role,
        ctx: &TransitionContext<'_>,
    ) -> bool {
        let Some(request) = self.load_request(request_id).await else {
            return false;
        };
        if request.status.is_terminal() {
            tracing::warn!(request_id, status = %request.status, "Transition on terminal request");
            return false;
        }
        let Some(step) = workflow::find_step(request.workflow_type, request.role_current, action)
        else {
            tracing::warn!(
                request_id,
                role_current = %request.role_current,
                action = %action,
                reason = reasons::INVALID_TRANSITION,
                "No step defined"
            );
            return false;
        };
        // Only the responsible role itself (or an admin) may act on the
        // step; other roles holding the action in their matrix still
        // cannot move someone else's request.
        if actor_role != step.role && actor_role != Role::Admin {
            tracing::warn!(request_id, actor_role = %actor_role, step_role = %step.role,
                "Actor role does not hold the current step");
            return false;
        }
        let decision = self
            .access
            .validate_workflow_action(actor_id, actor_role, action, Some(request_id))
            .await;
        if !decision.allowed {
            return false;
        }

        if step.completes {
            return self.complete_request(&request, actor_id, ctx).await;
        }

        let transferred = match ServiceRequestRepo::transfer(
            &self.pool,
            request_id,
            request.role_current,
            step.next,
            actor_id,
            action.as_str(),
            ctx.comment,
            ctx.state_patch.as_ref(),
        )
        .await
        {
            Ok(done) => done,
            Err(e) => {
                tracing::error!(request_id, error = %e, "Transition transaction failed");
                return false;
            }
        };
        if !transferred {
            // Another actor moved the request first.
            tracing::warn!(request_id, expected_role = %request.role_current,
                "Transition lost the race on role_current");
            return false;
        }

        self.dispatcher
            .send_assignment_notification(step.next, request_id, request.workflow_type)
            .await;
        tracing::info!(request_id, action = %action, from = %request.role_current,
            to = %step.next, "Request transitioned");
        true
    }

    /// Validate a manual role hand-off without performing it.
    ///
    /// Checks, in order: the request exists; it is not terminal;
    /// `from_role` matches the request's current responsible role; the
    /// hand-off is listed in the workflow's transition map; the actor
    /// holds TransferRequest for this request.
    pub async fn validate_permission_transfer(
        &self,
        request_id: DbId,
        from_role: Role,
        to_role: Role,
        actor_id: DbId,
        actor_role: Role,
    ) -> AccessDecision {
        let request = match ServiceRequestRepo::find_by_id(&self.pool, request_id).await {
            Ok(Some(request)) => request,
            Ok(None) => return AccessDecision::deny(reasons::REQUEST_NOT_FOUND),
            Err(e) => {
                tracing::error!(request_id, error = %e, "Failed to load request for transfer check");
                return AccessDecision::deny(reasons::STORAGE_ERROR);
            }
        };
        if request.status.is_terminal() {
            return AccessDecision::deny(reasons::REQUEST_TERMINAL);
        }
        if request.role_current != from_role {
            return AccessDecision::deny(reasons::ROLE_MISMATCH);
        }
        if !workflow::is_valid_transition(request.workflow_type, from_role, to_role) {
            return AccessDecision::deny(reasons::INVALID_TRANSITION);
        }
        self.access
            .validate_workflow_action(
                actor_id,
                actor_role,
                WorkflowAction::TransferRequest,
                Some(request_id),
            )
            .await
    }

    /// Perform a validated manual role hand-off. The actor's role is
    /// resolved from the user directory; the UPDATE and the transition
    /// INSERT share one transaction.
    pub async fn transfer_request_permissions(
        &self,
        request_id: DbId,
        from_role: Role,
        to_role: Role,
        actor_id: DbId,
    ) -> bool {
        let actor_role = match UserRepo::find_by_id(&self.pool, actor_id).await {
            Ok(Some(user)) => user.role,
            Ok(None) => {
                tracing::warn!(actor_id, "Transfer attempted by unknown actor");
                return false;
            }
            Err(e) => {
                tracing::error!(actor_id, error = %e, "Failed to resolve transfer actor");
                return false;
            }
        };
        let decision = self
            .validate_permission_transfer(request_id, from_role, to_role, actor_id, actor_role)
            .await;
        if !decision.allowed {
            tracing::warn!(request_id, actor_id, reason = decision.reason, "Transfer denied");
            return false;
        }

        let transferred = match ServiceRequestRepo::transfer(
            &self.pool,
            request_id,
            from_role,
            to_role,
            actor_id,
            WorkflowAction::TransferRequest.as_str(),
            None,
            None,
        )
        .await
        {
            Ok(done) => done,
            Err(e) => {
                tracing::error!(request_id, error = %e, "Transfer transaction failed");
                return false;
            }
        };
        if !transferred {
            return false;
        }

        if let Some(request) = self.load_request(request_id).await {
            self.dispatcher
                .send_assignment_notification(to_role, request_id, request.workflow_type)
                .await;
        }
        tracing::info!(request_id, from = %from_role, to = %to_role, actor_id,
            "Request transferred");
        true
    }

    /// Cancel a request in place: no role transition, status becomes
    /// Cancelled. Clients may cancel their own requests; managers and
    /// admins per their matrix.
    pub async fn cancel_request(&self, request_id: DbId, actor_id: DbId, actor_role: Role) -> bool {
        let decision = self
            .access
            .validate_workflow_action(
                actor_id,
                actor_role,
                WorkflowAction::CancelRequest,
                Some(request_id),
            )
            .await;
        if !decision.allowed {
            return false;
        }
        match ServiceRequestRepo::cancel(&self.pool, request_id).await {
            Ok(cancelled) => {
                if cancelled {
                    tracing::info!(request_id, actor_id, "Request cancelled");
                }
                cancelled
            }
            Err(e) => {
                tracing::error!(request_id, error = %e, "Cancellation failed");
                false
            }
        }
    }

    /// Record the warehouse inventory update in place; `role_current`
    /// does not move.
    pub async fn update_inventory(
        &self,
        request_id: DbId,
        actor_id: DbId,
        actor_role: Role,
        equipment_used: Option<&str>,
    ) -> bool {
        let decision = self
            .access
            .validate_workflow_action(
                actor_id,
                actor_role,
                WorkflowAction::UpdateInventory,
                Some(request_id),
            )
            .await;
        if !decision.allowed {
            return false;
        }
        match ServiceRequestRepo::set_inventory_updated(&self.pool, request_id, equipment_used)
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                tracing::error!(request_id, error = %e, "Inventory update failed");
                false
            }
        }
    }

    // -- internals ---------------------------------------------------------

    /// Terminal step: validate the rating when present, set status
    /// Completed with rating/feedback. No transition row and no
    /// follow-up notification.
    async fn complete_request(
        &self,
        request: &ServiceRequest,
        actor_id: DbId,
        ctx: &TransitionContext<'_>,
    ) -> bool {
        if let Some(rating) = ctx.rating {
            if let Err(e) = validate_rating(rating) {
                tracing::warn!(request_id = request.id, actor_id, error = %e, "Invalid rating");
                return false;
            }
        }
        match ServiceRequestRepo::complete(&self.pool, request.id, ctx.rating, ctx.feedback).await {
            Ok(completed) => {
                if completed {
                    tracing::info!(request_id = request.id, rating = ?ctx.rating,
                        "Request completed");
                }
                completed
            }
            Err(e) => {
                tracing::error!(request_id = request.id, error = %e, "Completion failed");
                false
            }
        }
    }

    async fn load_request(&self, request_id: DbId) -> Option<ServiceRequest> {
        match ServiceRequestRepo::find_by_id(&self.pool, request_id).await {
            Ok(Some(request)) => Some(request),
            Ok(None) => {
                tracing::warn!(request_id, reason = reasons::REQUEST_NOT_FOUND,
                    "Request lookup failed");
                None
            }
            Err(e) => {
                tracing::error!(request_id, error = %e, "Failed to load request");
                None
            }
        }
    }
}
