//! Uzbek/Russian display names for roles, priorities and workflows.
//!
//! The bot serves two locales. Lookups never fail: an unknown language
//! code falls back to Uzbek, and every enum variant has both names.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::request::{Priority, WorkflowType};
use crate::roles::Role;

/// Supported interface languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Uz,
    Ru,
}

/// Both languages, in delivery order (uz first).
pub const ALL_LANGS: &[Lang] = &[Lang::Uz, Lang::Ru];

impl Lang {
    pub fn as_str(self) -> &'static str {
        match self {
            Lang::Uz => "uz",
            Lang::Ru => "ru",
        }
    }

    /// Parse a user's language code, defaulting to Uzbek.
    pub fn from_code(code: &str) -> Self {
        match code {
            "ru" => Lang::Ru,
            _ => Lang::Uz,
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Localized display name of a role.
pub fn role_name(role: Role, lang: Lang) -> &'static str {
    match (role, lang) {
        (Role::Client, Lang::Uz) => "Mijoz",
        (Role::Client, Lang::Ru) => "Клиент",
        (Role::Manager, Lang::Uz) => "Menejer",
        (Role::Manager, Lang::Ru) => "Менеджер",
        (Role::JuniorManager, Lang::Uz) => "Kichik menejer",
        (Role::JuniorManager, Lang::Ru) => "Младший менеджер",
        (Role::Controller, Lang::Uz) => "Nazoratchi",
        (Role::Controller, Lang::Ru) => "Контролёр",
        (Role::Technician, Lang::Uz) => "Texnik",
        (Role::Technician, Lang::Ru) => "Техник",
        (Role::Warehouse, Lang::Uz) => "Ombor",
        (Role::Warehouse, Lang::Ru) => "Склад",
        (Role::CallCenter, Lang::Uz) => "Call-markaz",
        (Role::CallCenter, Lang::Ru) => "Колл-центр",
        (Role::CallCenterSupervisor, Lang::Uz) => "Call-markaz boshlig'i",
        (Role::CallCenterSupervisor, Lang::Ru) => "Супервайзер колл-центра",
        (Role::Admin, Lang::Uz) => "Administrator",
        (Role::Admin, Lang::Ru) => "Администратор",
    }
}

/// Localized display name of a priority level.
pub fn priority_name(priority: Priority, lang: Lang) -> &'static str {
    match (priority, lang) {
        (Priority::Low, Lang::Uz) => "Past",
        (Priority::Low, Lang::Ru) => "Низкий",
        (Priority::Medium, Lang::Uz) => "O'rta",
        (Priority::Medium, Lang::Ru) => "Средний",
        (Priority::High, Lang::Uz) => "Yuqori",
        (Priority::High, Lang::Ru) => "Высокий",
        (Priority::Urgent, Lang::Uz) => "Shoshilinch",
        (Priority::Urgent, Lang::Ru) => "Срочный",
    }
}

/// Localized display name of a workflow type.
pub fn workflow_name(workflow: WorkflowType, lang: Lang) -> &'static str {
    match (workflow, lang) {
        (WorkflowType::ConnectionRequest, Lang::Uz) => "Ulanish arizasi",
        (WorkflowType::ConnectionRequest, Lang::Ru) => "Заявка на подключение",
        (WorkflowType::TechnicalService, Lang::Uz) => "Texnik xizmat",
        (WorkflowType::TechnicalService, Lang::Ru) => "Техническое обслуживание",
        (WorkflowType::CallCenterDirect, Lang::Uz) => "Call-markaz arizasi",
        (WorkflowType::CallCenterDirect, Lang::Ru) => "Заявка колл-центра",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
