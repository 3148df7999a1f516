use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::Office;
use crate::features::staff::models::StaffMember;
use crate::features::staff::Directory;

/// Picks the owner of a freshly approved report.
///
/// Technical office staff beat maintainers; ties go to the lowest staff id, so
/// the same directory contents always yield the same assignee.
pub struct AssignmentRouter {
    directory: Arc<dyn Directory>,
}

impl AssignmentRouter {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self { directory }
    }

    /// Fails `NoEligibleStaff` when nobody can take reports for `office`
    pub async fn select_assignee(&self, office: Office) -> Result<i64> {
        let candidates = self.directory.find_eligible(office).await?;

        let selected = pick_candidate(&candidates, office)
            .ok_or(AppError::NoEligibleStaff(office))?;

        tracing::debug!(
            "Routing {} report to staff {} out of {} candidates",
            office,
            selected,
            candidates.len()
        );

        Ok(selected)
    }
}

fn pick_candidate(candidates: &[StaffMember], office: Office) -> Option<i64> {
    candidates
        .iter()
        .filter_map(|m| m.routing_rank_for(office).map(|rank| (rank, m.id)))
        .min()
        .map(|(_, id)| id)
}
