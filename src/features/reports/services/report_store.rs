use async_trait::async_trait;
use sqlx::PgPool;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::{
    check_assignment_invariant, AssigneeUpdate, CreateReport, Office, Report, ReportState,
};

/// Persistence for report state and assignee.
///
/// `transition` is the only way a report's `state`/`assigned_officer_id` pair
/// changes after creation; it must apply as one compare-and-set on the
/// expected current state.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// File a new report in PENDING with no assignee
    async fn create(&self, data: &CreateReport) -> Result<Report>;

    /// Fails `NotFound` for an unknown id
    async fn get(&self, id: i64) -> Result<Report>;

    /// Move `id` from `expected` to `new_state`.
    ///
    /// Fails `Conflict` when the stored state no longer equals `expected` or
    /// the stored assignee no longer equals `expected_assignee`.
    async fn transition(
        &self,
        id: i64,
        expected: ReportState,
        expected_assignee: Option<i64>,
        new_state: ReportState,
        assignee: AssigneeUpdate,
        reason: Option<&str>,
    ) -> Result<Report>;

    /// Reports in ASSIGNED, IN_PROGRESS or SUSPENDED owned by `staff_id`
    async fn list_operational_by_assignee(&self, staff_id: i64) -> Result<Vec<Report>>;

    /// Every report in an operational state
    async fn list_operational(&self) -> Result<Vec<Report>>;
}

/// Reason is persisted only alongside DECLINED
pub(crate) fn stored_reason(new_state: ReportState, reason: Option<&str>) -> Option<String> {
    match new_state {
        ReportState::Declined => reason.map(str::to_string),
        _ => None,
    }
}

const REPORT_COLUMNS: &str =
    "id, title, category, state, assigned_officer_id, reason, author_id, created_at, updated_at";

/// Postgres-backed report store
pub struct PgReportStore {
    pool: PgPool,
}

impl PgReportStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_state(&self, id: i64) -> Result<Option<ReportState>> {
        sqlx::query_scalar::<_, ReportState>("SELECT state FROM reports WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to read report state: {:?}", e);
                AppError::Database(e)
            })
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn create(&self, data: &CreateReport) -> Result<Report> {
        data.validate()?;

        let report = sqlx::query_as::<_, Report>(&format!(
            r#"
            INSERT INTO reports (title, category, author_id, state)
            VALUES ($1, $2, $3, 'PENDING')
            RETURNING {}
            "#,
            REPORT_COLUMNS
        ))
        .bind(&data.title)
        .bind(data.category.unwrap_or(Office::Other))
        .bind(data.author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create report: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(
            "Created report {} (category: {}, anonymous: {})",
            report.id,
            report.category,
            report.author_id.is_none()
        );

        Ok(report)
    }

    async fn get(&self, id: i64) -> Result<Report> {
        sqlx::query_as::<_, Report>(&format!(
            "SELECT {} FROM reports WHERE id = $1",
            REPORT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get report: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))
    }

    async fn transition(
        &self,
        id: i64,
        expected: ReportState,
        expected_assignee: Option<i64>,
        new_state: ReportState,
        assignee: AssigneeUpdate,
        reason: Option<&str>,
    ) -> Result<Report> {
        check_assignment_invariant(expected, new_state, assignee)?;

        let (replace_assignee, new_assignee) = match assignee {
            AssigneeUpdate::Unchanged => (false, None),
            AssigneeUpdate::Set(staff_id) => (true, Some(staff_id)),
            AssigneeUpdate::Clear => (true, None),
        };

        // Single conditional UPDATE: the WHERE on state and assignee is the compare-and-set
        let updated = sqlx::query_as::<_, Report>(&format!(
            r#"
            UPDATE reports
            SET
                state = $3,
                assigned_officer_id = CASE WHEN $4 THEN $5 ELSE assigned_officer_id END,
                reason = $6,
                updated_at = NOW()
            WHERE id = $1
            AND state = $2
            AND assigned_officer_id IS NOT DISTINCT FROM $7
            RETURNING {}
            "#,
            REPORT_COLUMNS
        ))
        .bind(id)
        .bind(expected)
        .bind(new_state)
        .bind(replace_assignee)
        .bind(new_assignee)
        .bind(stored_reason(new_state, reason))
        .bind(expected_assignee)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to transition report: {:?}", e);
            AppError::Database(e)
        })?;

        match updated {
            Some(report) => {
                tracing::info!(
                    "Report {} moved {} -> {} (assignee: {:?})",
                    id,
                    expected,
                    new_state,
                    report.assigned_officer_id
                );
                Ok(report)
            }
            None => match self.current_state(id).await? {
                Some(actual) => Err(AppError::Conflict(format!(
                    "Report {} is {} but {} (assignee {:?}) was expected",
                    id, actual, expected, expected_assignee
                ))),
                None => Err(AppError::NotFound(format!("Report {} not found", id))),
            },
        }
    }

    async fn list_operational_by_assignee(&self, staff_id: i64) -> Result<Vec<Report>> {
        sqlx::query_as::<_, Report>(&format!(
            r#"
            SELECT {}
            FROM reports
            WHERE assigned_officer_id = $1
            AND state IN ('ASSIGNED', 'IN_PROGRESS', 'SUSPENDED')
            ORDER BY id ASC
            "#,
            REPORT_COLUMNS
        ))
        .bind(staff_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list reports by assignee: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn list_operational(&self) -> Result<Vec<Report>> {
        sqlx::query_as::<_, Report>(&format!(
            r#"
            SELECT {}
            FROM reports
            WHERE state IN ('ASSIGNED', 'IN_PROGRESS', 'SUSPENDED')
            ORDER BY id ASC
            "#,
            REPORT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list operational reports: {:?}", e);
            AppError::Database(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_only_kept_for_declined() {
        assert_eq!(
            stored_reason(ReportState::Declined, Some("duplicate")),
            Some("duplicate".to_string())
        );
        assert_eq!(stored_reason(ReportState::Assigned, Some("ignored")), None);
        assert_eq!(stored_reason(ReportState::Pending, None), None);
    }
}
