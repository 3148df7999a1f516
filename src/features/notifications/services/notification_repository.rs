use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::notifications::models::{NewNotification, Notification, Recipient};
use crate::features::reports::models::Report;

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Author plus followers of `report`, each user at most once
    async fn recipients_for_report(&self, report: &Report) -> Result<Vec<Recipient>>;

    /// Store all rows or none
    async fn insert_many(&self, notifications: &[NewNotification]) -> Result<Vec<Notification>>;

    /// Newest first
    async fn list_for_user(&self, user_id: i64, unread_only: bool) -> Result<Vec<Notification>>;

    /// Fails `NotFound` for an unknown id and `Forbidden` when the
    /// notification belongs to someone else
    async fn mark_read(&self, id: i64, user_id: i64) -> Result<Notification>;
}

const NOTIFICATION_COLUMNS: &str = "id, recipient_id, report_id, kind, message, read, created_at";

pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn recipients_for_report(&self, report: &Report) -> Result<Vec<Recipient>> {
        sqlx::query_as::<_, Recipient>(
            r#"
            SELECT u.id AS user_id, u.first_name, u.email, u.email_notifications
            FROM users u
            WHERE u.id = $2
            OR u.id IN (SELECT user_id FROM report_follows WHERE report_id = $1)
            ORDER BY u.id ASC
            "#,
        )
        .bind(report.id)
        .bind(report.author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load notification recipients: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn insert_many(&self, notifications: &[NewNotification]) -> Result<Vec<Notification>> {
        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(notifications.len());

        for n in notifications {
            let row = sqlx::query_as::<_, Notification>(&format!(
                r#"
                INSERT INTO notifications (recipient_id, report_id, kind, message)
                VALUES ($1, $2, $3, $4)
                RETURNING {}
                "#,
                NOTIFICATION_COLUMNS
            ))
            .bind(n.recipient_id)
            .bind(n.report_id)
            .bind(n.kind)
            .bind(&n.message)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert notification: {:?}", e);
                AppError::Database(e)
            })?;
            stored.push(row);
        }

        tx.commit().await?;
        Ok(stored)
    }

    async fn list_for_user(&self, user_id: i64, unread_only: bool) -> Result<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {}
            FROM notifications
            WHERE recipient_id = $1
            AND (NOT $2 OR read = FALSE)
            ORDER BY created_at DESC, id DESC
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list notifications: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn mark_read(&self, id: i64, user_id: i64) -> Result<Notification> {
        let updated = sqlx::query_as::<_, Notification>(&format!(
            r#"
            UPDATE notifications
            SET read = TRUE
            WHERE id = $1 AND recipient_id = $2
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to mark notification as read: {:?}", e);
            AppError::Database(e)
        })?;

        if let Some(notification) = updated {
            return Ok(notification);
        }

        let owner = sqlx::query_scalar::<_, i64>(
            "SELECT recipient_id FROM notifications WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match owner {
            Some(_) => Err(AppError::Forbidden(
                "You can only mark your own notifications as read".to_string(),
            )),
            None => Err(AppError::NotFound(format!("Notification {} not found", id))),
        }
    }
}
