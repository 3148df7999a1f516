use async_trait::async_trait;
use futures::future::join_all;
use minijinja::context;
use std::sync::Arc;

use crate::core::config::NotificationConfig;
use crate::core::error::Result;
use crate::features::notifications::models::{
    build_status_message, NewNotification, Notification, NotificationKind, Recipient,
};
use crate::features::notifications::services::notification_repository::NotificationRepository;
use crate::features::notifications::services::notification_sink::NotificationSink;
use crate::features::reports::models::Report;
use crate::modules::mail::{Mailer, OutgoingEmail};
use crate::shared::constants::STATUS_EMAIL_SUBJECT_PREFIX;
use crate::shared::templates::render_template;
use crate::shared::validation::EMAIL_REGEX;

/// Fans report state changes out to the author and followers.
///
/// In-app rows are written before returning. E-mail copies go to opted-in
/// recipients on a background task, so relay latency never reaches the caller.
pub struct NotificationService {
    repository: Arc<dyn NotificationRepository>,
    mailer: Option<Arc<dyn Mailer>>,
    config: NotificationConfig,
}

impl NotificationService {
    pub fn new(
        repository: Arc<dyn NotificationRepository>,
        mailer: Option<Arc<dyn Mailer>>,
        config: NotificationConfig,
    ) -> Self {
        Self {
            repository,
            mailer,
            config,
        }
    }

    pub async fn list_for_user(&self, user_id: i64, unread_only: bool) -> Result<Vec<Notification>> {
        self.repository.list_for_user(user_id, unread_only).await
    }

    pub async fn mark_read(&self, id: i64, user_id: i64) -> Result<Notification> {
        let notification = self.repository.mark_read(id, user_id).await?;
        tracing::debug!("User {} read notification {}", user_id, id);
        Ok(notification)
    }

    fn spawn_emails(&self, mailer: Arc<dyn Mailer>, emails: Vec<OutgoingEmail>) {
        let max_attempts = self.config.email_max_attempts;
        let retry_delay = self.config.email_retry_delay;

        tokio::spawn(async move {
            let sends = emails
                .iter()
                .map(|email| send_with_retry(mailer.as_ref(), email, max_attempts, retry_delay));
            let delivered = join_all(sends).await.into_iter().filter(|ok| *ok).count();

            tracing::debug!("Delivered {} of {} status e-mails", delivered, emails.len());
        });
    }
}

#[async_trait]
impl NotificationSink for NotificationService {
    async fn report_state_changed(&self, report: &Report) -> Result<()> {
        let recipients = self.repository.recipients_for_report(report).await?;
        if recipients.is_empty() {
            tracing::debug!("Report {} has no one to notify", report.id);
            return Ok(());
        }

        let message = build_status_message(report);
        let rows: Vec<NewNotification> = recipients
            .iter()
            .map(|r| NewNotification {
                recipient_id: r.user_id,
                report_id: report.id,
                kind: NotificationKind::StatusChange,
                message: message.clone(),
            })
            .collect();

        let stored = self.repository.insert_many(&rows).await?;
        tracing::info!(
            "Stored {} notifications for report {} ({})",
            stored.len(),
            report.id,
            report.state
        );

        if let Some(mailer) = &self.mailer {
            let emails: Vec<OutgoingEmail> = recipients
                .iter()
                .filter_map(|r| compose_status_email(r, report, &message))
                .collect();

            if !emails.is_empty() {
                self.spawn_emails(Arc::clone(mailer), emails);
            }
        }

        Ok(())
    }
}

/// None unless the recipient opted in and has a usable address
pub(crate) fn compose_status_email(
    recipient: &Recipient,
    report: &Report,
    message: &str,
) -> Option<OutgoingEmail> {
    if !recipient.email_notifications {
        return None;
    }

    let to = recipient
        .email
        .as_deref()
        .filter(|email| EMAIL_REGEX.is_match(email))?;

    let ctx = context! {
        first_name => recipient.first_name.as_str(),
        message => message,
        report_id => report.id,
        title => report.title.as_str(),
    };

    let rendered = render_template("status_change.html", ctx.clone())
        .and_then(|html| render_template("status_change.txt", ctx).map(|text| (html, text)));

    match rendered {
        Ok((html, text)) => Some(OutgoingEmail {
            to: to.to_string(),
            subject: format!("{} #{}", STATUS_EMAIL_SUBJECT_PREFIX, report.id),
            html,
            text,
        }),
        Err(e) => {
            tracing::warn!(
                "Skipping e-mail to user {} for report {}: {}",
                recipient.user_id,
                report.id,
                e
            );
            None
        }
    }
}

/// Try up to `max_attempts` times; true once the relay accepts the message
pub(crate) async fn send_with_retry(
    mailer: &dyn Mailer,
    email: &OutgoingEmail,
    max_attempts: u32,
    retry_delay: std::time::Duration,
) -> bool {
    for attempt in 1..=max_attempts {
        match mailer.send(email).await {
            Ok(()) => return true,
            Err(e) if attempt < max_attempts => {
                tracing::debug!(
                    "E-mail attempt {}/{} failed: {}; retrying",
                    attempt,
                    max_attempts,
                    e
                );
                tokio::time::sleep(retry_delay).await;
            }
            Err(e) => {
                tracing::warn!(
                    "Giving up on e-mail after {} attempts: {}",
                    max_attempts,
                    e
                );
            }
        }
    }

    false
}
