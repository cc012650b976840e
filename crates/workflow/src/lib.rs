//! fiberdesk-workflow — access control, workflow engine and
//! notification dispatch for the service-desk bot.
//!
//! Bot handlers consume three entry points:
//!
//! - [`AccessControl`] — decides, for any (user, role, action, request)
//!   tuple, whether the action is permitted, and filters request lists
//!   by role. Every check is audited fire-and-forget.
//! - [`WorkflowEngine`] — creates requests, advances `role_current`
//!   through the per-workflow step table, and validates/performs manual
//!   permission transfers.
//! - [`NotificationDispatcher`] — fans out assignment notifications to
//!   the responsible role's pool and serves the aggregated
//!   "my assignments" view.
//!
//! All collaborators are injected (`PgPool`, [`DeliveryChannel`]);
//! there are no process-wide singletons. Public operations are total:
//! storage failures are logged and converted to safe return values.

pub mod access;
pub mod config;
pub mod delivery;
pub mod engine;
pub mod notify;
pub mod templates;

pub use access::{AccessControl, AccessDecision, AccessType, UserPermissions};
pub use config::WorkflowConfig;
pub use delivery::{DeliveryChannel, DeliveryError, InlineButton, MockDelivery, TelegramDelivery};
pub use engine::{NewRequest, TransitionContext, WorkflowEngine};
pub use notify::{NotificationDispatcher, NotificationView, StaffCreatedOutcome};
