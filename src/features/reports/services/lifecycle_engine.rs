use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::notifications::NotificationSink;
use crate::features::reports::models::{AssigneeUpdate, Office, Report, ReportState};
use crate::features::reports::services::assignment_router::AssignmentRouter;
use crate::features::reports::services::report_store::ReportStore;
use crate::features::reports::services::transition_policy::{
    authorize, ensure_actor_kind, ensure_not_terminal, require_reason, validate_transition,
    ActorKind,
};
use crate::features::staff::Directory;

/// What `review` did with the requested transition
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewOutcome {
    /// The transition was committed and notified
    Applied(Report),
    /// The report was already in the requested state
    Unchanged(Report),
    /// Approval postponed; nobody can currently receive reports for `office`
    Deferred { report: Report, office: Office },
}

impl ReviewOutcome {
    pub fn report(&self) -> &Report {
        match self {
            ReviewOutcome::Applied(report)
            | ReviewOutcome::Unchanged(report)
            | ReviewOutcome::Deferred { report, .. } => report,
        }
    }

    pub fn into_report(self) -> Report {
        match self {
            ReviewOutcome::Applied(report)
            | ReviewOutcome::Unchanged(report)
            | ReviewOutcome::Deferred { report, .. } => report,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, ReviewOutcome::Deferred { .. })
    }
}

/// The report state machine.
///
/// All writes go through `ReportStore::transition`; every committed change is
/// handed to the notification sink, whose failures are logged and dropped.
pub struct LifecycleEngine {
    store: Arc<dyn ReportStore>,
    directory: Arc<dyn Directory>,
    router: AssignmentRouter,
    sink: Arc<dyn NotificationSink>,
}

impl LifecycleEngine {
    pub fn new(
        store: Arc<dyn ReportStore>,
        directory: Arc<dyn Directory>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            router: AssignmentRouter::new(Arc::clone(&directory)),
            store,
            directory,
            sink,
        }
    }

    /// Apply a staff member's requested transition to a report.
    ///
    /// Approving (PENDING -> ASSIGNED) routes the report to an eligible staff
    /// member. When nobody is eligible the approval is `Deferred`: nothing is
    /// written and the report stays PENDING, open to review.
    /// Requesting the state the report is already in yields `Unchanged`.
    pub async fn review(
        &self,
        actor_id: i64,
        actor: ActorKind,
        report_id: i64,
        target: ReportState,
        reason: Option<&str>,
    ) -> Result<ReviewOutcome> {
        let report = self.store.get(report_id).await?;

        let member = self.directory.get_member(actor_id).await?;
        if !member.active {
            return Err(AppError::Forbidden(format!(
                "Staff member {} is not active",
                actor_id
            )));
        }
        ensure_actor_kind(&member, actor)?;

        ensure_not_terminal(&report)?;
        authorize(&report, actor_id, actor)?;

        if report.state == target {
            tracing::debug!("Report {} already {}; nothing to do", report.id, target);
            return Ok(ReviewOutcome::Unchanged(report));
        }

        validate_transition(report.state, actor, target)?;

        let (assignee, reason) = match target {
            ReportState::Declined => (AssigneeUpdate::Unchanged, Some(require_reason(reason)?)),
            ReportState::Assigned => match self.router.select_assignee(report.category).await {
                Ok(staff_id) => (AssigneeUpdate::Set(staff_id), None),
                Err(AppError::NoEligibleStaff(office)) => {
                    tracing::warn!(
                        "Approval of report {} deferred: no eligible staff for office {}",
                        report.id,
                        office
                    );
                    return Ok(ReviewOutcome::Deferred { report, office });
                }
                Err(e) => return Err(e),
            },
            _ => (AssigneeUpdate::Unchanged, None),
        };

        let updated = self
            .store
            .transition(
                report.id,
                report.state,
                report.assigned_officer_id,
                target,
                assignee,
                reason,
            )
            .await?;

        tracing::info!(
            "Staff {} ({}) moved report {} from {} to {}",
            actor_id,
            actor,
            updated.id,
            report.state,
            updated.state
        );

        self.notify(&updated).await;
        Ok(ReviewOutcome::Applied(updated))
    }

    /// System-initiated reset of an operational report back to the triage pool.
    ///
    /// Skips actor authorization but still goes through the store's
    /// compare-and-set, so a concurrent change of state or owner surfaces as
    /// `Conflict`.
    pub async fn reset_to_pending(&self, report: &Report) -> Result<Report> {
        if !report.state.is_operational() {
            return Err(AppError::BadRequest(format!(
                "Report {} is {} and cannot be reset",
                report.id, report.state
            )));
        }

        let updated = self
            .store
            .transition(
                report.id,
                report.state,
                report.assigned_officer_id,
                ReportState::Pending,
                AssigneeUpdate::Clear,
                None,
            )
            .await?;

        tracing::info!(
            "Report {} reset from {} to PENDING (previous assignee: {:?})",
            report.id,
            report.state,
            report.assigned_officer_id
        );

        self.notify(&updated).await;
        Ok(updated)
    }

    async fn notify(&self, report: &Report) {
        if let Err(e) = self.sink.report_state_changed(report).await {
            tracing::warn!(
                "Failed to notify state change of report {} ({}): {}",
                report.id,
                report.state,
                e
            );
        }
    }
}
