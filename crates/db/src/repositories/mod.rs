//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod access_log_repo;
pub mod pending_notification_repo;
pub mod service_request_repo;
pub mod state_transition_repo;
pub mod user_repo;

pub use access_log_repo::AccessLogRepo;
pub use pending_notification_repo::PendingNotificationRepo;
pub use service_request_repo::ServiceRequestRepo;
pub use state_transition_repo::StateTransitionRepo;
pub use user_repo::UserRepo;
