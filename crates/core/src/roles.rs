//! The closed set of bot roles.
//!
//! Roles are stored in the database as their snake_case string form
//! (see [`Role::as_str`]); the enum keeps the permission matrix and the
//! workflow tables exhaustively checked at compile time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A user's role in the service-desk workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Manager,
    JuniorManager,
    Controller,
    Technician,
    Warehouse,
    CallCenter,
    CallCenterSupervisor,
    Admin,
}

/// All roles, in workflow-pipeline order.
pub const ALL_ROLES: &[Role] = &[
    Role::Client,
    Role::Manager,
    Role::JuniorManager,
    Role::Controller,
    Role::Technician,
    Role::Warehouse,
    Role::CallCenter,
    Role::CallCenterSupervisor,
    Role::Admin,
];

impl Role {
    /// The snake_case string form stored in the `users.role` and
    /// `service_requests.role_current` columns.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Manager => "manager",
            Role::JuniorManager => "junior_manager",
            Role::Controller => "controller",
            Role::Technician => "technician",
            Role::Warehouse => "warehouse",
            Role::CallCenter => "call_center",
            Role::CallCenterSupervisor => "call_center_supervisor",
            Role::Admin => "admin",
        }
    }

    /// Whether this role is staff (anything except the client).
    pub fn is_staff(self) -> bool {
        self != Role::Client
    }

    /// Whether this role is paged by the assignment-notification
    /// mechanism. Clients and admins are never paged.
    pub fn is_notifiable(self) -> bool {
        !matches!(self, Role::Client | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Role::Client),
            "manager" => Ok(Role::Manager),
            "junior_manager" => Ok(Role::JuniorManager),
            "controller" => Ok(Role::Controller),
            "technician" => Ok(Role::Technician),
            "warehouse" => Ok(Role::Warehouse),
            "call_center" => Ok(Role::CallCenter),
            "call_center_supervisor" => Ok(Role::CallCenterSupervisor),
            "admin" => Ok(Role::Admin),
            other => Err(CoreError::Validation(format!("Unknown role '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_str_round_trips_for_all_roles() {
        for role in ALL_ROLES {
            let parsed: Role = role.as_str().parse().unwrap();
            assert_eq!(parsed, *role);
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(Role::from_str("janitor").is_err());
        assert!(Role::from_str("").is_err());
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert!(Role::from_str("Manager").is_err());
    }

    #[test]
    fn client_is_not_staff() {
        assert!(!Role::Client.is_staff());
        assert!(Role::Manager.is_staff());
        assert!(Role::Admin.is_staff());
    }

    #[test]
    fn client_and_admin_are_not_notifiable() {
        assert!(!Role::Client.is_notifiable());
        assert!(!Role::Admin.is_notifiable());
        assert!(Role::Manager.is_notifiable());
        assert!(Role::Warehouse.is_notifiable());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::JuniorManager).unwrap();
        assert_eq!(json, "\"junior_manager\"");
        let back: Role = serde_json::from_str("\"call_center_supervisor\"").unwrap();
        assert_eq!(back, Role::CallCenterSupervisor);
    }
}
