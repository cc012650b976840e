//! End-to-end workflow tests against a real database with an in-memory
//! delivery channel:
//! - Full connection-request lifecycle through all six roles
//! - Technical service with direct technician completion
//! - Call-center flow including the staff-created fan-out
//! - Manual permission transfer validation and execution
//! - Notification fan-out, the aggregated reply view, denials

use std::sync::Arc;

use fiberdesk_core::permissions::WorkflowAction;
use fiberdesk_core::request::{Priority, RequestStatus, WorkflowType};
use fiberdesk_core::roles::Role;
use fiberdesk_db::models::user::{CreateUser, User};
use fiberdesk_db::repositories::{
    PendingNotificationRepo, ServiceRequestRepo, StateTransitionRepo, UserRepo,
};
use fiberdesk_workflow::{
    MockDelivery, NewRequest, NotificationDispatcher, TransitionContext, WorkflowEngine,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    engine: WorkflowEngine,
    dispatcher: Arc<NotificationDispatcher>,
    channel: Arc<MockDelivery>,
}

fn harness(pool: &PgPool) -> Harness {
    let channel = Arc::new(MockDelivery::new());
    let dispatcher = Arc::new(NotificationDispatcher::new(pool.clone(), channel.clone()));
    let engine = WorkflowEngine::new(pool.clone(), dispatcher.clone());
    Harness {
        engine,
        dispatcher,
        channel,
    }
}

async fn seed(pool: &PgPool, name: &str, role: Role, telegram_id: i64) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            telegram_id: Some(telegram_id),
            full_name: name.to_string(),
            phone: None,
            role,
            language: "uz".to_string(),
        },
    )
    .await
    .unwrap()
}

fn submission(client: &User, actor: &User, description: &str) -> NewRequest {
    NewRequest {
        client_id: client.id,
        actor_id: actor.id,
        actor_role: actor.role,
        priority: Priority::Medium,
        description: description.to_string(),
        location: Some("Chilonzor 9".to_string()),
        contact_phone: None,
    }
}

async fn role_of(pool: &PgPool, request_id: i64) -> (Role, RequestStatus) {
    let request = ServiceRequestRepo::find_by_id(pool, request_id)
        .await
        .unwrap()
        .unwrap();
    (request.role_current, request.status)
}

// ---------------------------------------------------------------------------
// Test: full connection-request lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_connection_request_full_lifecycle(pool: PgPool) {
    let h = harness(&pool);
    let client = seed(&pool, "Client", Role::Client, 1).await;
    let manager = seed(&pool, "Manager", Role::Manager, 2).await;
    let junior = seed(&pool, "Junior", Role::JuniorManager, 3).await;
    let controller = seed(&pool, "Controller", Role::Controller, 4).await;
    let technician = seed(&pool, "Technician", Role::Technician, 5).await;
    let warehouse = seed(&pool, "Warehouse", Role::Warehouse, 6).await;

    let request_id = h
        .engine
        .initiate_workflow(
            WorkflowType::ConnectionRequest,
            &submission(&client, &client, "new fiber line"),
        )
        .await
        .unwrap();
    assert_eq!(role_of(&pool, request_id).await.0, Role::Manager);
    // The manager pool was paged once.
    assert_eq!(h.channel.sent_to(2).len(), 1);

    let ctx = TransitionContext::default();
    assert!(
        h.engine
            .transition_workflow(
                request_id,
                WorkflowAction::AssignToJuniorManager,
                manager.id,
                Role::Manager,
                &ctx,
            )
            .await
    );
    assert_eq!(role_of(&pool, request_id).await.0, Role::JuniorManager);
    assert_eq!(h.channel.sent_to(3).len(), 1);

    assert!(
        h.engine
            .transition_workflow(
                request_id,
                WorkflowAction::ForwardToController,
                junior.id,
                Role::JuniorManager,
                &ctx,
            )
            .await
    );

    let assign_ctx = TransitionContext {
        state_patch: Some(serde_json::json!({ "technician_id": technician.id })),
        ..Default::default()
    };
    assert!(
        h.engine
            .transition_workflow(
                request_id,
                WorkflowAction::AssignToTechnician,
                controller.id,
                Role::Controller,
                &assign_ctx,
            )
            .await
    );
    let request = ServiceRequestRepo::find_by_id(&pool, request_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(request.role_current, Role::Technician);
    assert_eq!(request.state_data["technician_id"], technician.id);

    assert!(
        h.engine
            .transition_workflow(
                request_id,
                WorkflowAction::SendToWarehouse,
                technician.id,
                Role::Technician,
                &ctx,
            )
            .await
    );
    // Warehouse records the inventory in place before closing.
    assert!(
        h.engine
            .update_inventory(request_id, warehouse.id, Role::Warehouse, Some("50m cable"))
            .await
    );
    assert_eq!(role_of(&pool, request_id).await.0, Role::Warehouse);

    assert!(
        h.engine
            .transition_workflow(
                request_id,
                WorkflowAction::CloseRequest,
                warehouse.id,
                Role::Warehouse,
                &ctx,
            )
            .await
    );
    let (role, status) = role_of(&pool, request_id).await;
    assert_eq!(role, Role::Client);
    assert_eq!(status, RequestStatus::InProgress);

    // Terminal rating step completes the request without a transition.
    let rate_ctx = TransitionContext {
        rating: Some(4),
        feedback: Some("quick install"),
        ..Default::default()
    };
    assert!(
        h.engine
            .transition_workflow(
                request_id,
                WorkflowAction::RateService,
                client.id,
                Role::Client,
                &rate_ctx,
            )
            .await
    );
    let request = ServiceRequestRepo::find_by_id(&pool, request_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(request.status, RequestStatus::Completed);
    assert_eq!(request.completion_rating, Some(4));
    assert_eq!(request.feedback_comment.as_deref(), Some("quick install"));

    // Initial submission plus five role hand-offs; rating adds none.
    let transitions = StateTransitionRepo::list_for_request(&pool, request_id)
        .await
        .unwrap();
    assert_eq!(transitions.len(), 6);
    assert_eq!(transitions[0].from_role, None);
    assert_eq!(transitions[0].to_role, Role::Manager);
    assert_eq!(transitions[5].to_role, Role::Client);

    // No further transitions on a completed request.
    assert!(
        !h.engine
            .transition_workflow(
                request_id,
                WorkflowAction::RateService,
                client.id,
                Role::Client,
                &rate_ctx,
            )
            .await
    );
}

// ---------------------------------------------------------------------------
// Test: step table rejects out-of-order and wrong-role attempts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_out_of_order_actions_are_rejected(pool: PgPool) {
    let h = harness(&pool);
    let client = seed(&pool, "Client", Role::Client, 1).await;
    seed(&pool, "Manager", Role::Manager, 2).await;
    let technician = seed(&pool, "Technician", Role::Technician, 5).await;
    let junior = seed(&pool, "Junior", Role::JuniorManager, 3).await;

    let request_id = h
        .engine
        .initiate_workflow(
            WorkflowType::ConnectionRequest,
            &submission(&client, &client, "new fiber line"),
        )
        .await
        .unwrap();

    let ctx = TransitionContext::default();
    // No step for (connection, manager, CompleteWork).
    assert!(
        !h.engine
            .transition_workflow(
                request_id,
                WorkflowAction::CompleteWork,
                technician.id,
                Role::Technician,
                &ctx,
            )
            .await
    );
    // Rating before closure: role_current is manager, no step matches.
    assert!(
        !h.engine
            .transition_workflow(
                request_id,
                WorkflowAction::RateService,
                client.id,
                Role::Client,
                &ctx,
            )
            .await
    );
    // The junior manager holds the action but not the current step.
    assert!(
        !h.engine
            .transition_workflow(
                request_id,
                WorkflowAction::AssignToJuniorManager,
                junior.id,
                Role::JuniorManager,
                &ctx,
            )
            .await
    );
    // Nothing moved.
    assert_eq!(role_of(&pool, request_id).await.0, Role::Manager);
}

// ---------------------------------------------------------------------------
// Test: technical service, direct completion path
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_technical_service_direct_completion(pool: PgPool) {
    let h = harness(&pool);
    let client = seed(&pool, "Client", Role::Client, 1).await;
    let controller = seed(&pool, "Controller", Role::Controller, 4).await;
    let technician = seed(&pool, "Technician", Role::Technician, 5).await;

    let request_id = h
        .engine
        .initiate_workflow(
            WorkflowType::TechnicalService,
            &submission(&client, &client, "no internet since morning"),
        )
        .await
        .unwrap();
    assert_eq!(role_of(&pool, request_id).await.0, Role::Controller);
    assert_eq!(h.channel.sent_to(4).len(), 1);

    let ctx = TransitionContext::default();
    assert!(
        h.engine
            .transition_workflow(
                request_id,
                WorkflowAction::AssignToTechnician,
                controller.id,
                Role::Controller,
                &ctx,
            )
            .await
    );
    // The technician completes directly, skipping the warehouse.
    assert!(
        h.engine
            .transition_workflow(
                request_id,
                WorkflowAction::CompleteWork,
                technician.id,
                Role::Technician,
                &ctx,
            )
            .await
    );
    let (role, status) = role_of(&pool, request_id).await;
    assert_eq!(role, Role::Client);
    assert_eq!(status, RequestStatus::InProgress);

    assert!(
        h.engine
            .transition_workflow(
                request_id,
                WorkflowAction::RateService,
                client.id,
                Role::Client,
                &TransitionContext {
                    rating: Some(5),
                    ..Default::default()
                },
            )
            .await
    );
    assert_eq!(role_of(&pool, request_id).await.1, RequestStatus::Completed);

    // An out-of-range rating never completes.
    let other = h
        .engine
        .initiate_workflow(
            WorkflowType::TechnicalService,
            &submission(&client, &client, "tv channels missing"),
        )
        .await
        .unwrap();
    h.engine
        .transition_workflow(
            other,
            WorkflowAction::AssignToTechnician,
            controller.id,
            Role::Controller,
            &ctx,
        )
        .await;
    h.engine
        .transition_workflow(
            other,
            WorkflowAction::CompleteWork,
            technician.id,
            Role::Technician,
            &ctx,
        )
        .await;
    assert!(
        !h.engine
            .transition_workflow(
                other,
                WorkflowAction::RateService,
                client.id,
                Role::Client,
                &TransitionContext {
                    rating: Some(9),
                    ..Default::default()
                },
            )
            .await
    );
    assert_eq!(role_of(&pool, other).await.1, RequestStatus::InProgress);
}

// ---------------------------------------------------------------------------
// Test: call-center flow with the staff-created fan-out
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_call_center_staff_created_flow(pool: PgPool) {
    let h = harness(&pool);
    let client = seed(&pool, "Client", Role::Client, 1).await;
    let operator = seed(&pool, "Operator", Role::CallCenter, 7).await;
    let supervisor = seed(&pool, "Supervisor", Role::CallCenterSupervisor, 8).await;

    let request_id = h
        .engine
        .initiate_workflow(
            WorkflowType::CallCenterDirect,
            &submission(&client, &operator, "billing complaint"),
        )
        .await
        .unwrap();

    let request = ServiceRequestRepo::find_by_id(&pool, request_id)
        .await
        .unwrap()
        .unwrap();
    assert!(request.created_by_staff);
    assert_eq!(request.creator_role, Some(Role::CallCenter));
    assert_eq!(request.role_current, Role::CallCenterSupervisor);

    // Three independent messages: client notice, creator confirmation,
    // supervisor pool dispatch.
    assert_eq!(h.channel.sent_to(1).len(), 1);
    assert_eq!(h.channel.sent_to(7).len(), 1);
    assert_eq!(h.channel.sent_to(8).len(), 1);

    let ctx = TransitionContext::default();
    assert!(
        h.engine
            .transition_workflow(
                request_id,
                WorkflowAction::ReturnToOperator,
                supervisor.id,
                Role::CallCenterSupervisor,
                &ctx,
            )
            .await
    );
    assert_eq!(role_of(&pool, request_id).await.0, Role::CallCenter);
    // The operator pool was paged on the hand-back.
    assert_eq!(h.channel.sent_to(7).len(), 2);

    assert!(
        h.engine
            .transition_workflow(
                request_id,
                WorkflowAction::ResolveDirect,
                operator.id,
                Role::CallCenter,
                &ctx,
            )
            .await
    );
    assert_eq!(role_of(&pool, request_id).await.0, Role::Client);
}

// ---------------------------------------------------------------------------
// Test: manual permission transfer
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_permission_transfer_validation(pool: PgPool) {
    let h = harness(&pool);
    let client = seed(&pool, "Client", Role::Client, 1).await;
    let manager = seed(&pool, "Manager", Role::Manager, 2).await;
    seed(&pool, "Junior", Role::JuniorManager, 3).await;
    let technician = seed(&pool, "Technician", Role::Technician, 5).await;

    let request_id = h
        .engine
        .initiate_workflow(
            WorkflowType::ConnectionRequest,
            &submission(&client, &client, "new fiber line"),
        )
        .await
        .unwrap();

    // from_role must match role_current.
    let decision = h
        .engine
        .validate_permission_transfer(
            request_id,
            Role::Controller,
            Role::Technician,
            manager.id,
            Role::Manager,
        )
        .await;
    assert!(!decision.allowed);
    assert_eq!(
        decision.reason,
        "from_role does not match current responsible role"
    );

    // manager -> warehouse is not in the connection transition map.
    let decision = h
        .engine
        .validate_permission_transfer(
            request_id,
            Role::Manager,
            Role::Warehouse,
            manager.id,
            Role::Manager,
        )
        .await;
    assert!(!decision.allowed);
    assert_eq!(decision.reason, "transition not defined for workflow");

    // Technicians do not hold TransferRequest.
    let decision = h
        .engine
        .validate_permission_transfer(
            request_id,
            Role::Manager,
            Role::JuniorManager,
            technician.id,
            Role::Technician,
        )
        .await;
    assert!(!decision.allowed);

    // A valid transfer moves the role and logs the hand-off.
    assert!(
        h.engine
            .transfer_request_permissions(request_id, Role::Manager, Role::JuniorManager, manager.id)
            .await
    );
    assert_eq!(role_of(&pool, request_id).await.0, Role::JuniorManager);
    let last = StateTransitionRepo::latest_for_request(&pool, request_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(last.action, "transfer_request");
    assert_eq!(last.from_role, Some(Role::Manager));
    assert_eq!(last.to_role, Role::JuniorManager);

    // Repeating the same transfer fails: role_current has moved on.
    assert!(
        !h.engine
            .transfer_request_permissions(request_id, Role::Manager, Role::JuniorManager, manager.id)
            .await
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_transfer_cannot_reopen_terminal_requests(pool: PgPool) {
    let h = harness(&pool);
    let client = seed(&pool, "Client", Role::Client, 1).await;
    let manager = seed(&pool, "Manager", Role::Manager, 2).await;
    seed(&pool, "Junior", Role::JuniorManager, 3).await;

    // A cancelled request still sits with the manager role, and
    // manager -> junior_manager is a mapped transition; the hand-off
    // must be refused anyway.
    let cancelled_id = h
        .engine
        .initiate_workflow(
            WorkflowType::ConnectionRequest,
            &submission(&client, &client, "wrong address"),
        )
        .await
        .unwrap();
    assert!(
        h.engine
            .cancel_request(cancelled_id, client.id, Role::Client)
            .await
    );
    let decision = h
        .engine
        .validate_permission_transfer(
            cancelled_id,
            Role::Manager,
            Role::JuniorManager,
            manager.id,
            Role::Manager,
        )
        .await;
    assert!(!decision.allowed);
    assert_eq!(decision.reason, "request is in a terminal status");
    assert!(
        !h.engine
            .transfer_request_permissions(
                cancelled_id,
                Role::Manager,
                Role::JuniorManager,
                manager.id
            )
            .await
    );
    assert_eq!(
        role_of(&pool, cancelled_id).await,
        (Role::Manager, RequestStatus::Cancelled)
    );

    // A rated request ends at role_current = client, and
    // client -> manager is in the map via SubmitRequest; transferring
    // must not flip it back to in_progress.
    let completed_id = h
        .engine
        .initiate_workflow(
            WorkflowType::ConnectionRequest,
            &submission(&client, &client, "new fiber line"),
        )
        .await
        .unwrap();
    sqlx::query(
        "UPDATE service_requests SET role_current = 'client', status = 'completed' WHERE id = $1",
    )
    .bind(completed_id)
    .execute(&pool)
    .await
    .unwrap();
    let decision = h
        .engine
        .validate_permission_transfer(
            completed_id,
            Role::Client,
            Role::Manager,
            manager.id,
            Role::Manager,
        )
        .await;
    assert!(!decision.allowed);
    assert_eq!(decision.reason, "request is in a terminal status");
    assert!(
        !h.engine
            .transfer_request_permissions(completed_id, Role::Client, Role::Manager, manager.id)
            .await
    );
    assert_eq!(
        role_of(&pool, completed_id).await,
        (Role::Client, RequestStatus::Completed)
    );
}

// ---------------------------------------------------------------------------
// Test: notification fan-out and the aggregated reply view
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_notification_fanout_and_reply_view(pool: PgPool) {
    let h = harness(&pool);
    let client = seed(&pool, "Client", Role::Client, 1).await;
    let manager_a = seed(&pool, "Manager A", Role::Manager, 21).await;
    let manager_b = seed(&pool, "Manager B", Role::Manager, 22).await;
    // A manager without a delivery handle is skipped entirely.
    UserRepo::create(
        &pool,
        &CreateUser {
            telegram_id: None,
            full_name: "Manager C".to_string(),
            phone: None,
            role: Role::Manager,
            language: "ru".to_string(),
        },
    )
    .await
    .unwrap();

    let request_id = h
        .engine
        .initiate_workflow(
            WorkflowType::ConnectionRequest,
            &submission(&client, &client, "new fiber line"),
        )
        .await
        .unwrap();

    // Both reachable managers got the summary and a pending row.
    assert_eq!(h.channel.sent_to(21).len(), 1);
    assert_eq!(h.channel.sent_to(22).len(), 1);
    assert_eq!(
        PendingNotificationRepo::unhandled_count(&pool, manager_a.id)
            .await
            .unwrap(),
        1
    );
    let summary = &h.channel.sent_to(21)[0];
    assert!(summary.text.contains("new fiber line"));
    assert_eq!(summary.keyboard.len(), 1);
    assert_eq!(summary.keyboard[0].callback_data, "view_assignments");

    // The aggregated view lists the open assignment with its action
    // button plus the refresh button.
    let view = h.dispatcher.handle_notification_reply(manager_a.id).await;
    assert!(view.text.contains("new fiber line"));
    assert_eq!(view.keyboard.len(), 2);
    assert_eq!(
        view.keyboard[0].callback_data,
        format!("open_request:{request_id}")
    );
    assert_eq!(view.keyboard[1].callback_data, "refresh_assignments");

    assert!(
        h.dispatcher
            .mark_notification_handled(manager_a.id, request_id)
            .await
    );
    let pending = h.dispatcher.get_pending_notifications(manager_a.id).await;
    assert!(pending.is_empty());
    // Manager B's row is untouched.
    assert_eq!(
        h.dispatcher.get_pending_notifications(manager_b.id).await.len(),
        1
    );

    // Marking handled does not empty the view; the request is still
    // assigned to the manager role.
    let view = h.dispatcher.handle_notification_reply(manager_a.id).await;
    assert!(!view.keyboard.is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_fanout_outcomes_per_role(pool: PgPool) {
    let h = harness(&pool);
    let client = seed(&pool, "Client", Role::Client, 1).await;
    let manager = seed(&pool, "Manager", Role::Manager, 2).await;

    let request_id = h
        .engine
        .initiate_workflow(
            WorkflowType::ConnectionRequest,
            &submission(&client, &client, "new fiber line"),
        )
        .await
        .unwrap();

    // Clients and admins are excluded from role paging.
    assert!(
        h.dispatcher
            .send_assignment_notification(Role::Client, request_id, WorkflowType::ConnectionRequest)
            .await
    );
    assert!(
        h.dispatcher
            .send_assignment_notification(Role::Admin, request_id, WorkflowType::ConnectionRequest)
            .await
    );
    // No reachable users for the role.
    assert!(
        !h.dispatcher
            .send_assignment_notification(
                Role::Warehouse,
                request_id,
                WorkflowType::ConnectionRequest
            )
            .await
    );
    // Every delivery failing yields false, but the pending row remains.
    h.channel.fail_for(2);
    assert!(
        !h.dispatcher
            .send_assignment_notification(Role::Manager, request_id, WorkflowType::ConnectionRequest)
            .await
    );
    assert!(
        PendingNotificationRepo::unhandled_count(&pool, manager.id)
            .await
            .unwrap()
            >= 1
    );

    // An empty queue renders the nothing-pending view.
    let warehouse = seed(&pool, "Warehouse", Role::Warehouse, 6).await;
    let view = h.dispatcher.handle_notification_reply(warehouse.id).await;
    assert!(view.keyboard.is_empty());
    assert!(view.text.contains("yo'q"));
}

// ---------------------------------------------------------------------------
// Test: initiation and cancellation rules
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_initiation_denials_leave_no_state(pool: PgPool) {
    let h = harness(&pool);
    let client = seed(&pool, "Client", Role::Client, 1).await;
    let technician = seed(&pool, "Technician", Role::Technician, 5).await;
    let operator = seed(&pool, "Operator", Role::CallCenter, 7).await;
    seed(&pool, "Manager", Role::Manager, 2).await;

    // Technicians initiate nothing.
    assert!(h
        .engine
        .initiate_workflow(
            WorkflowType::ConnectionRequest,
            &submission(&client, &technician, "for a friend"),
        )
        .await
        .is_none());
    // Call-center operators may not open connection requests.
    assert!(h
        .engine
        .initiate_workflow(
            WorkflowType::ConnectionRequest,
            &submission(&client, &operator, "connection please"),
        )
        .await
        .is_none());
    // Blank descriptions are rejected before any write.
    assert!(h
        .engine
        .initiate_workflow(
            WorkflowType::ConnectionRequest,
            &submission(&client, &client, "   "),
        )
        .await
        .is_none());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM service_requests")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
    assert!(h.channel.sent().is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_clients_cancel_only_their_own_requests(pool: PgPool) {
    let h = harness(&pool);
    let client = seed(&pool, "Client", Role::Client, 1).await;
    let other = seed(&pool, "Other", Role::Client, 9).await;
    seed(&pool, "Manager", Role::Manager, 2).await;

    let request_id = h
        .engine
        .initiate_workflow(
            WorkflowType::ConnectionRequest,
            &submission(&client, &client, "new fiber line"),
        )
        .await
        .unwrap();

    assert!(
        !h.engine
            .cancel_request(request_id, other.id, Role::Client)
            .await
    );
    assert_eq!(role_of(&pool, request_id).await.1, RequestStatus::New);

    assert!(
        h.engine
            .cancel_request(request_id, client.id, Role::Client)
            .await
    );
    assert_eq!(role_of(&pool, request_id).await.1, RequestStatus::Cancelled);
}
