use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use validator::Validate;

use crate::core::error::{AppError, Result};

/// Report lifecycle state matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "report_state", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportState {
    Pending,
    Assigned,
    InProgress,
    Suspended,
    Resolved,
    Declined,
}

impl ReportState {
    pub const OPERATIONAL: [ReportState; 3] = [
        ReportState::Assigned,
        ReportState::InProgress,
        ReportState::Suspended,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportState::Pending => "PENDING",
            ReportState::Assigned => "ASSIGNED",
            ReportState::InProgress => "IN_PROGRESS",
            ReportState::Suspended => "SUSPENDED",
            ReportState::Resolved => "RESOLVED",
            ReportState::Declined => "DECLINED",
        }
    }

    /// RESOLVED and DECLINED absorb every further transition
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReportState::Resolved | ReportState::Declined)
    }

    pub fn is_operational(&self) -> bool {
        matches!(
            self,
            ReportState::Assigned | ReportState::InProgress | ReportState::Suspended
        )
    }

    /// Whether a report in this state must carry an assignee
    pub fn requires_assignee(&self) -> bool {
        !matches!(self, ReportState::Pending | ReportState::Declined)
    }
}

impl std::fmt::Display for ReportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Municipal office, one per report category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Type)]
#[sqlx(type_name = "office_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Office {
    Infrastructure,
    Environment,
    Safety,
    Sanitation,
    Transport,
    Organization,
    Other,
}

impl std::fmt::Display for Office {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Office::Infrastructure => write!(f, "infrastructure"),
            Office::Environment => write!(f, "environment"),
            Office::Safety => write!(f, "safety"),
            Office::Sanitation => write!(f, "sanitation"),
            Office::Transport => write!(f, "transport"),
            Office::Organization => write!(f, "organization"),
            Office::Other => write!(f, "other"),
        }
    }
}

/// Database model for report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Report {
    pub id: i64,
    pub title: String,
    pub category: Office,
    pub state: ReportState,
    pub assigned_officer_id: Option<i64>,
    /// Only set once the report is DECLINED
    pub reason: Option<String>,
    /// None for anonymous reports
    pub author_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Report {
    pub fn is_assigned_to(&self, staff_id: i64) -> bool {
        self.assigned_officer_id == Some(staff_id)
    }
}

/// Data for filing a new report
#[derive(Debug, Clone, Validate)]
pub struct CreateReport {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    pub category: Option<Office>,
    pub author_id: Option<i64>,
}

/// How a transition treats the current assignee
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssigneeUpdate {
    Unchanged,
    Set(i64),
    Clear,
}

/// Rejects any transition whose result would break
/// `state ∈ {PENDING, DECLINED} ⇔ assigned_officer_id IS NULL`.
///
/// Every store implementation calls this before writing, so the rule holds no
/// matter which caller drives the transition.
pub fn check_assignment_invariant(
    expected: ReportState,
    new_state: ReportState,
    assignee: AssigneeUpdate,
) -> Result<()> {
    let has_assignee = match assignee {
        AssigneeUpdate::Set(_) => true,
        AssigneeUpdate::Clear => false,
        AssigneeUpdate::Unchanged => expected.requires_assignee(),
    };

    if has_assignee != new_state.requires_assignee() {
        return Err(AppError::Internal(format!(
            "Transition {} -> {} with {:?} would break the assignment invariant",
            expected, new_state, assignee
        )));
    }

    Ok(())
}
