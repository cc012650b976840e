//! Request-level enums: workflow type, status, priority and access
//! category, plus the small validation helpers shared by the DB and
//! workflow layers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/* --------------------------------------------------------------------------
Workflow type
-------------------------------------------------------------------------- */

/// The category of service request. Each type has its own role sequence
/// (see [`crate::workflow`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    ConnectionRequest,
    TechnicalService,
    CallCenterDirect,
}

/// All workflow types.
pub const ALL_WORKFLOW_TYPES: &[WorkflowType] = &[
    WorkflowType::ConnectionRequest,
    WorkflowType::TechnicalService,
    WorkflowType::CallCenterDirect,
];

impl WorkflowType {
    /// The string form stored in `service_requests.workflow_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowType::ConnectionRequest => "connection_request",
            WorkflowType::TechnicalService => "technical_service",
            WorkflowType::CallCenterDirect => "call_center_direct",
        }
    }
}

impl fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "connection_request" => Ok(WorkflowType::ConnectionRequest),
            "technical_service" => Ok(WorkflowType::TechnicalService),
            "call_center_direct" => Ok(WorkflowType::CallCenterDirect),
            other => Err(CoreError::Validation(format!(
                "Unknown workflow type '{other}'"
            ))),
        }
    }
}

/* --------------------------------------------------------------------------
Request status
-------------------------------------------------------------------------- */

/// Lifecycle status of a service request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    New,
    InProgress,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::New => "new",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal requests accept no further transitions and do not
    /// surface in assignment views.
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(RequestStatus::New),
            "in_progress" => Ok(RequestStatus::InProgress),
            "completed" => Ok(RequestStatus::Completed),
            "cancelled" => Ok(RequestStatus::Cancelled),
            other => Err(CoreError::Validation(format!(
                "Unknown request status '{other}'"
            ))),
        }
    }
}

/* --------------------------------------------------------------------------
Priority
-------------------------------------------------------------------------- */

/// Request priority. Ordering is Low < Medium < High < Urgent; listing
/// queries sort by the numeric rank descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    /// Numeric rank used for `ORDER BY` in listing queries (urgent = 3).
    pub fn rank(self) -> i16 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
            Priority::Urgent => 3,
        }
    }

    /// Colored-circle glyph shown in chat summaries.
    pub fn glyph(self) -> &'static str {
        match self {
            Priority::Low => "\u{1F7E2}",    // 🟢
            Priority::Medium => "\u{1F7E1}", // 🟡
            Priority::High => "\u{1F7E0}",   // 🟠
            Priority::Urgent => "\u{1F534}", // 🔴
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(CoreError::Validation(format!("Unknown priority '{other}'"))),
        }
    }
}

/* --------------------------------------------------------------------------
Request access categories
-------------------------------------------------------------------------- */

/// Coarse request-access tags carried by the role permission matrix.
///
/// `AllRequests` grants access to every request regardless of type; the
/// other tags map one-to-one onto a [`WorkflowType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestCategory {
    AllRequests,
    ConnectionRequests,
    TechnicalRequests,
    CallCenterRequests,
}

impl RequestCategory {
    /// The workflow type this tag grants access to, or `None` for the
    /// blanket `AllRequests` tag.
    pub fn workflow_type(self) -> Option<WorkflowType> {
        match self {
            RequestCategory::AllRequests => None,
            RequestCategory::ConnectionRequests => Some(WorkflowType::ConnectionRequest),
            RequestCategory::TechnicalRequests => Some(WorkflowType::TechnicalService),
            RequestCategory::CallCenterRequests => Some(WorkflowType::CallCenterDirect),
        }
    }
}

/* --------------------------------------------------------------------------
Validation helpers
-------------------------------------------------------------------------- */

/// Minimum accepted completion rating.
pub const MIN_RATING: i16 = 1;

/// Maximum accepted completion rating.
pub const MAX_RATING: i16 = 5;

/// Maximum length for a request description.
pub const MAX_DESCRIPTION_LENGTH: usize = 4_000;

/// Validate a completion rating (1-5 stars).
pub fn validate_rating(rating: i16) -> Result<(), CoreError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Rating {rating} out of range {MIN_RATING}-{MAX_RATING}"
        )))
    }
}

/// Validate a request description: non-empty after trimming, within the
/// length cap.
pub fn validate_description(description: &str) -> Result<(), CoreError> {
    if description.trim().is_empty() {
        return Err(CoreError::Validation(
            "Request description must not be empty".to_string(),
        ));
    }
    if description.len() > MAX_DESCRIPTION_LENGTH {
        return Err(CoreError::Validation(format!(
            "Description exceeds maximum length of {MAX_DESCRIPTION_LENGTH} characters"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
