//! Transition rules for the report lifecycle.
//!
//! ```text
//! PENDING     -> ASSIGNED     officer approves (routing picks the owner)
//! PENDING     -> DECLINED     officer rejects, reason required
//! ASSIGNED    -> IN_PROGRESS  assignee
//! IN_PROGRESS -> SUSPENDED    assignee
//! SUSPENDED   -> IN_PROGRESS  assignee
//! IN_PROGRESS -> RESOLVED     assignee
//! ```

use serde::{Deserialize, Serialize};

use crate::core::error::{AppError, Result};
use crate::features::reports::models::{Report, ReportState};
use crate::features::staff::models::{StaffMember, StaffRole};

/// The capacity in which a staff member calls `review`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    /// Front-line reviewer triaging PENDING reports
    Officer,
    /// Whoever works an assignment: maintainer or technical office staff
    Maintainer,
}

impl std::fmt::Display for ActorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorKind::Officer => write!(f, "officer"),
            ActorKind::Maintainer => write!(f, "maintainer"),
        }
    }
}

/// The member must hold a role backing the claimed actor kind: a public
/// relations capability for officers, an assignment-eligible one for
/// maintainers.
pub fn ensure_actor_kind(member: &StaffMember, actor: ActorKind) -> Result<()> {
    let holds = member.capabilities.iter().any(|c| match actor {
        ActorKind::Officer => c.role == StaffRole::MunicipalPublicRelationsOfficer,
        ActorKind::Maintainer => c.role.is_assignment_eligible(),
    });

    if !holds {
        return Err(AppError::Forbidden(format!(
            "Staff member {} holds no role to act as {}",
            member.id, actor
        )));
    }

    Ok(())
}

pub fn ensure_not_terminal(report: &Report) -> Result<()> {
    if report.state.is_terminal() {
        return Err(AppError::TerminalState(report.state));
    }
    Ok(())
}

/// Unclaimed PENDING work is open to every officer; once a report has an
/// owner only that owner may act on it.
pub fn authorize(report: &Report, actor_id: i64, actor: ActorKind) -> Result<()> {
    let allowed = match report.assigned_officer_id {
        None => report.state == ReportState::Pending && actor == ActorKind::Officer,
        Some(owner) => owner == actor_id,
    };

    if !allowed {
        return Err(AppError::Forbidden(format!(
            "Staff member {} may not act on report {}",
            actor_id, report.id
        )));
    }

    Ok(())
}

/// Legal single-step moves for each actor kind
pub fn validate_transition(from: ReportState, actor: ActorKind, to: ReportState) -> Result<()> {
    use ActorKind::*;
    use ReportState::*;

    match (from, actor, to) {
        (Pending, Officer, Assigned)
        | (Pending, Officer, Declined)
        | (Assigned, Maintainer, InProgress)
        | (InProgress, Maintainer, Suspended)
        | (Suspended, Maintainer, InProgress)
        | (InProgress, Maintainer, Resolved) => Ok(()),
        _ => Err(AppError::InvalidTransition { from, to, actor }),
    }
}

/// DECLINED needs a non-blank reason; returns it trimmed
pub fn require_reason(reason: Option<&str>) -> Result<&str> {
    match reason.map(str::trim) {
        Some(r) if !r.is_empty() => Ok(r),
        _ => Err(AppError::Validation(
            "A reason is required to decline a report".to_string(),
        )),
    }
}
