//! Assignment notification dispatch and the aggregated reply view.
//!
//! Role-based fan-out: when a request lands on a role, every active,
//! reachable member of that role gets a pending-notification row and a
//! summary message. Aggregation happens when the user taps through: one
//! view listing every open request assigned to their role, regardless
//! of how many notification rows exist.
//!
//! Delivery is sequential with per-recipient isolation: one failed
//! send is logged and skipped, the rest of the pool still gets paged.

use std::sync::Arc;

use fiberdesk_core::request::WorkflowType;
use fiberdesk_core::roles::Role;
use fiberdesk_core::types::DbId;
use fiberdesk_db::models::pending_notification::PendingNotificationDetail;
use fiberdesk_db::models::service_request::ServiceRequest;
use fiberdesk_db::models::user::User;
use fiberdesk_db::repositories::{PendingNotificationRepo, ServiceRequestRepo, UserRepo};
use sqlx::PgPool;

use crate::delivery::{DeliveryChannel, InlineButton};
use crate::templates;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The rendered reply to a notification tap: aggregated text plus the
/// per-request action keyboard.
#[derive(Debug, Clone)]
pub struct NotificationView {
    pub text: String,
    pub keyboard: Vec<InlineButton>,
}

/// Per-path outcome of the staff-created notification fan-out. Each
/// path succeeds or fails independently.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaffCreatedOutcome {
    pub client_notified: bool,
    pub creator_confirmed: bool,
    pub pool_notified: bool,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Fans out assignment notifications and serves the aggregated view.
pub struct NotificationDispatcher {
    pool: PgPool,
    channel: Arc<dyn DeliveryChannel>,
}

impl NotificationDispatcher {
    pub fn new(pool: PgPool, channel: Arc<dyn DeliveryChannel>) -> Self {
        Self { pool, channel }
    }

    /// Notify every reachable member of `role` that a request now needs
    /// their attention.
    ///
    /// Clients and admins are excluded from role paging and count as
    /// trivially notified. Returns `true` iff at least one delivery
    /// succeeded (or no delivery was required).
    pub async fn send_assignment_notification(
        &self,
        role: Role,
        request_id: DbId,
        workflow_type: WorkflowType,
    ) -> bool {
        if !role.is_notifiable() {
            return true;
        }
        let Some(request) = self.load_request(request_id).await else {
            return false;
        };
        let text = templates::assignment_summary(&request);
        self.dispatch_to_role(role, &request, workflow_type, &text)
            .await
    }

    /// The aggregated "my assignments" view for a user: every open
    /// request assigned to their role, one action button each, plus a
    /// refresh button. An empty queue yields the nothing-pending text
    /// with no keyboard.
    pub async fn handle_notification_reply(&self, user_id: DbId) -> NotificationView {
        let user = match UserRepo::find_by_id(&self.pool, user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!(user_id, "Notification reply from unknown user");
                return Self::empty_view();
            }
            Err(e) => {
                tracing::error!(user_id, error = %e, "Failed to load user for notification reply");
                return Self::empty_view();
            }
        };

        let requests = match ServiceRequestRepo::list_open_by_role(&self.pool, user.role).await {
            Ok(requests) => requests,
            Err(e) => {
                tracing::error!(user_id, role = %user.role, error = %e, "Failed to list open assignments");
                Vec::new()
            }
        };
        if requests.is_empty() {
            return Self::empty_view();
        }

        let mut keyboard: Vec<InlineButton> = requests
            .iter()
            .map(|request| templates::open_request_button(request.id))
            .collect();
        keyboard.push(templates::refresh_button());
        NotificationView {
            text: templates::assignment_view(&requests),
            keyboard,
        }
    }

    /// Mark the user's notifications for a request as handled.
    /// Idempotent; `false` only when no notification row exists.
    pub async fn mark_notification_handled(&self, user_id: DbId, request_id: DbId) -> bool {
        match PendingNotificationRepo::mark_handled(&self.pool, user_id, request_id).await {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(user_id, request_id, error = %e, "Failed to mark notification handled");
                false
            }
        }
    }

    /// The user's unhandled notifications with current request state,
    /// newest first.
    pub async fn get_pending_notifications(
        &self,
        user_id: DbId,
    ) -> Vec<PendingNotificationDetail> {
        match PendingNotificationRepo::list_unhandled(&self.pool, user_id).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(user_id, error = %e, "Failed to list pending notifications");
                Vec::new()
            }
        }
    }

    /// Purge handled notifications older than the retention window.
    /// Returns the number of rows removed.
    pub async fn cleanup_handled_notifications(&self, older_than_days: i32) -> u64 {
        match PendingNotificationRepo::cleanup_handled(&self.pool, older_than_days).await {
            Ok(removed) => {
                if removed > 0 {
                    tracing::info!(removed, older_than_days, "Cleaned up handled notifications");
                }
                removed
            }
            Err(e) => {
                tracing::error!(older_than_days, error = %e, "Notification cleanup failed");
                0
            }
        }
    }

    /// The three-message fan-out for a request created by staff on a
    /// client's behalf: client notice, creator confirmation, and the
    /// workflow-participant dispatch to the first responsible role.
    /// Each path's delivery outcome is independent.
    pub async fn send_staff_created_notifications(
        &self,
        request_id: DbId,
        creator_id: DbId,
        client_id: DbId,
    ) -> StaffCreatedOutcome {
        let Some(request) = self.load_request(request_id).await else {
            return StaffCreatedOutcome::default();
        };
        let creator = self.load_user(creator_id).await;
        let creator_role = creator
            .as_ref()
            .map(|user| user.role)
            .or(request.creator_role)
            .unwrap_or(Role::Admin);

        let client_notified = match self.load_user(client_id).await {
            Some(client) => {
                let text = templates::staff_created_client_notice(&request, creator_role);
                self.send_direct(&client, &text).await
            }
            None => false,
        };

        let creator_confirmed = match creator {
            Some(creator) => {
                let text = templates::staff_created_confirmation(&request);
                self.send_direct(&creator, &text).await
            }
            None => false,
        };

        let responsible = fiberdesk_core::workflow::first_responsible_role(request.workflow_type);
        let text = templates::staff_created_assignment(&request, creator_role);
        let pool_notified = self
            .dispatch_to_role(responsible, &request, request.workflow_type, &text)
            .await;

        StaffCreatedOutcome {
            client_notified,
            creator_confirmed,
            pool_notified,
        }
    }

    // -- internals ---------------------------------------------------------

    /// Record a pending row and deliver the text to every reachable
    /// member of the role. `false` when the role has no reachable
    /// members or every delivery failed.
    async fn dispatch_to_role(
        &self,
        role: Role,
        request: &ServiceRequest,
        workflow_type: WorkflowType,
        text: &str,
    ) -> bool {
        let users = match UserRepo::list_notifiable_by_role(&self.pool, role).await {
            Ok(users) => users,
            Err(e) => {
                tracing::error!(role = %role, error = %e, "Failed to resolve notification recipients");
                return false;
            }
        };
        if users.is_empty() {
            tracing::warn!(role = %role, request_id = request.id, "No reachable users for role");
            return false;
        }

        let keyboard = vec![templates::view_assignments_button()];
        let mut delivered = 0usize;
        for user in &users {
            let Some(chat_id) = user.telegram_id else {
                continue;
            };
            if let Err(e) =
                PendingNotificationRepo::create(&self.pool, user.id, request.id, workflow_type, role)
                    .await
            {
                tracing::error!(user_id = user.id, request_id = request.id, error = %e,
                    "Failed to record pending notification");
                continue;
            }
            match self.channel.send(chat_id, text, &keyboard).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(user_id = user.id, chat_id, error = %e,
                        "Assignment notification delivery failed");
                }
            }
        }
        delivered > 0
    }

    /// One-off message to a single user, no pending row. `false` when
    /// the user has no delivery handle or the send failed.
    async fn send_direct(&self, user: &User, text: &str) -> bool {
        let Some(chat_id) = user.telegram_id else {
            return false;
        };
        match self.channel.send(chat_id, text, &[]).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(user_id = user.id, chat_id, error = %e, "Direct notification failed");
                false
            }
        }
    }

    async fn load_request(&self, request_id: DbId) -> Option<ServiceRequest> {
        match ServiceRequestRepo::find_by_id(&self.pool, request_id).await {
            Ok(Some(request)) => Some(request),
            Ok(None) => {
                tracing::warn!(request_id, "Notification requested for missing request");
                None
            }
            Err(e) => {
                tracing::error!(request_id, error = %e, "Failed to load request for notification");
                None
            }
        }
    }

    async fn load_user(&self, user_id: DbId) -> Option<User> {
        match UserRepo::find_by_id(&self.pool, user_id).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(user_id, error = %e, "Failed to load user for notification");
                None
            }
        }
    }

    fn empty_view() -> NotificationView {
        NotificationView {
            text: templates::nothing_pending(),
            keyboard: Vec::new(),
        }
    }
}
