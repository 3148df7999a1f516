use std::collections::HashMap;
use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::{Office, Report};
use crate::features::reports::services::lifecycle_engine::LifecycleEngine;
use crate::features::reports::services::report_store::ReportStore;
use crate::features::staff::Directory;

/// Returns work to the triage pool when its owner can no longer do it.
///
/// Every reset is a regular PENDING transition through the engine, so it is
/// compare-and-set guarded and notified like any other change. Running any of
/// these entry points twice for the same loss resets nothing the second time.
pub struct CapabilityReconciler {
    engine: Arc<LifecycleEngine>,
    store: Arc<dyn ReportStore>,
    directory: Arc<dyn Directory>,
}

impl CapabilityReconciler {
    pub fn new(
        engine: Arc<LifecycleEngine>,
        store: Arc<dyn ReportStore>,
        directory: Arc<dyn Directory>,
    ) -> Self {
        Self {
            engine,
            store,
            directory,
        }
    }

    /// Reset every operational report owned by `staff_id`.
    ///
    /// Returns the number of reports moved back to PENDING.
    pub async fn reconcile(&self, staff_id: i64) -> Result<usize> {
        let reports = self.store.list_operational_by_assignee(staff_id).await?;
        self.reset_all(staff_id, reports).await
    }

    /// Reset the reports `staff_id` owns for one office only.
    ///
    /// No-op while the member still holds another eligible role for `office`.
    pub async fn reconcile_office(&self, staff_id: i64, office: Office) -> Result<usize> {
        match self.directory.get_member(staff_id).await {
            Ok(member) if member.is_eligible_for(office) => {
                tracing::debug!(
                    "Staff {} is still eligible for office {}; nothing to reconcile",
                    staff_id,
                    office
                );
                return Ok(0);
            }
            Ok(_) | Err(AppError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let reports = self
            .store
            .list_operational_by_assignee(staff_id)
            .await?
            .into_iter()
            .filter(|r| r.category == office)
            .collect();

        self.reset_all(staff_id, reports).await
    }

    /// Full scan for operational reports whose owner lost eligibility for
    /// the report's office. Covers events missed while the service was down.
    pub async fn sweep(&self) -> Result<usize> {
        let reports = self.store.list_operational().await?;
        let mut offices: HashMap<i64, Vec<Office>> = HashMap::new();
        let mut stale: HashMap<i64, Vec<Report>> = HashMap::new();

        for report in reports {
            let Some(owner) = report.assigned_officer_id else {
                continue;
            };

            if !offices.contains_key(&owner) {
                // Deleted members hold no offices
                let eligible = match self.directory.get_member(owner).await {
                    Ok(member) => member.eligible_offices(),
                    Err(AppError::NotFound(_)) => Vec::new(),
                    Err(e) => return Err(e),
                };
                offices.insert(owner, eligible);
            }

            let eligible = offices
                .get(&owner)
                .is_some_and(|held| held.contains(&report.category));

            if !eligible {
                stale.entry(owner).or_default().push(report);
            }
        }

        let mut total = 0;
        let mut failed_owners = Vec::new();
        for (owner, reports) in stale {
            match self.reset_all(owner, reports).await {
                Ok(count) => total += count,
                Err(e) => {
                    tracing::error!("Sweep could not reconcile staff {}: {}", owner, e);
                    failed_owners.push(owner);
                }
            }
        }

        if !failed_owners.is_empty() {
            return Err(AppError::Internal(format!(
                "Sweep left reports unreconciled for staff {:?}",
                failed_owners
            )));
        }

        if total > 0 {
            tracing::info!("Sweep reset {} orphaned reports", total);
        }

        Ok(total)
    }

    async fn reset_all(&self, staff_id: i64, reports: Vec<Report>) -> Result<usize> {
        let mut reset = 0;
        let mut failed = 0;

        for report in reports {
            match self.reset_one(staff_id, report).await {
                Ok(true) => reset += 1,
                Ok(false) => {}
                Err(e) => {
                    failed += 1;
                    tracing::error!("Failed to reset report for staff {}: {}", staff_id, e);
                }
            }
        }

        if reset > 0 {
            tracing::info!("Reset {} reports previously owned by staff {}", reset, staff_id);
        }

        if failed > 0 {
            return Err(AppError::Internal(format!(
                "{} reports owned by staff {} could not be reset",
                failed, staff_id
            )));
        }

        Ok(reset)
    }

    /// Ok(false) when a concurrent change already took the report off `staff_id`
    async fn reset_one(&self, staff_id: i64, report: Report) -> Result<bool> {
        match self.engine.reset_to_pending(&report).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_retryable() => {
                let current = self.store.get(report.id).await?;
                if current.state.is_operational() && current.is_assigned_to(staff_id) {
                    self.engine.reset_to_pending(&current).await?;
                    Ok(true)
                } else {
                    tracing::debug!(
                        "Report {} changed concurrently ({}); skipping reset",
                        current.id,
                        current.state
                    );
                    Ok(false)
                }
            }
            Err(e) => Err(e),
        }
    }
}
