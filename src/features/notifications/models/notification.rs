use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

use crate::features::reports::models::{Report, ReportState};

/// Notification type matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "notification_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    StatusChange,
}

/// In-app notification delivered to one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: i64,
    pub report_id: i64,
    pub kind: NotificationKind,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub recipient_id: i64,
    pub report_id: i64,
    pub kind: NotificationKind,
    pub message: String,
}

/// A user who hears about a report: its author or a follower
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Recipient {
    pub user_id: i64,
    pub first_name: String,
    pub email: Option<String>,
    /// Opt-in for e-mail copies of in-app notifications
    pub email_notifications: bool,
}

pub fn build_status_message(report: &Report) -> String {
    match report.state {
        ReportState::Declined => format!(
            "Your report #{} has been DECLINED. Reason: {}",
            report.id,
            report.reason.as_deref().unwrap_or("N/A")
        ),
        state => format!("Your report #{} is now {}", report.id, state),
    }
}
