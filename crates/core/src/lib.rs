//! fiberdesk-core — pure domain logic for the service-desk workflow.
//!
//! This crate has no I/O and no internal dependencies. It defines:
//!
//! - [`roles::Role`] — the closed set of bot roles.
//! - [`request`] — workflow type, status, priority and category enums.
//! - [`permissions`] — the static role → permission matrix.
//! - [`workflow`] — per-workflow role sequences, the action step table,
//!   and the role-transition projection used for transfer validation.
//! - [`i18n`] — uz/ru display names for roles and priorities.
//! - [`audit`] — access-control audit string helpers.

pub mod audit;
pub mod error;
pub mod i18n;
pub mod permissions;
pub mod request;
pub mod roles;
pub mod types;
pub mod workflow;

pub use error::CoreError;
pub use roles::Role;
pub use request::{Priority, RequestCategory, RequestStatus, WorkflowType};
