use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::ReportState;

/// Citizens following a report receive its status notifications
pub struct FollowService {
    pool: PgPool,
}

impl FollowService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Idempotent; fails `BadRequest` once the report is closed
    pub async fn follow(&self, user_id: i64, report_id: i64) -> Result<()> {
        let state = self.report_state(report_id).await?;
        ensure_followable(state)?;

        let result = sqlx::query(
            r#"
            INSERT INTO report_follows (user_id, report_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, report_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(report_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to follow report: {:?}", e);
            AppError::Database(e)
        })?;

        if result.rows_affected() > 0 {
            tracing::info!("User {} now follows report {}", user_id, report_id);
        }

        Ok(())
    }

    /// Idempotent
    pub async fn unfollow(&self, user_id: i64, report_id: i64) -> Result<()> {
        self.report_state(report_id).await?;

        sqlx::query("DELETE FROM report_follows WHERE user_id = $1 AND report_id = $2")
            .bind(user_id)
            .bind(report_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to unfollow report: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(())
    }

    async fn report_state(&self, report_id: i64) -> Result<ReportState> {
        sqlx::query_scalar::<_, ReportState>("SELECT state FROM reports WHERE id = $1")
            .bind(report_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", report_id)))
    }
}

fn ensure_followable(state: ReportState) -> Result<()> {
    if state.is_terminal() {
        return Err(AppError::BadRequest(format!(
            "Cannot follow a report that is {}",
            state
        )));
    }
    Ok(())
}
