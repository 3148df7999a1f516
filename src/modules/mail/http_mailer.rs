use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use super::{Mailer, OutgoingEmail};
use crate::core::config::MailConfig;
use crate::core::error::{AppError, Result};

/// Request body accepted by the mail relay
#[derive(Debug, Serialize)]
struct SendMailRequest<'a> {
    message_id: Uuid,
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

/// Mail relay client
pub struct HttpMailer {
    api_url: String,
    api_key: Option<String>,
    from_address: String,
    http_client: reqwest::Client,
}

impl HttpMailer {
    /// Returns None when no relay URL is configured
    pub fn from_config(config: &MailConfig) -> Result<Option<Self>> {
        let Some(api_url) = config.api_url.clone() else {
            return Ok(None);
        };

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build mail client: {}", e)))?;

        Ok(Some(Self {
            api_url,
            api_key: config.api_key.clone(),
            from_address: config.from_address.clone(),
            http_client,
        }))
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        let body = SendMailRequest {
            message_id: Uuid::now_v7(),
            from: &self.from_address,
            to: &email.to,
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
        };

        let mut request = self.http_client.post(&self.api_url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!("Mail relay request failed: {}", e);
            AppError::ExternalServiceError(format!("Failed to send e-mail: {}", e))
        })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!("Mail {} accepted by relay", body.message_id);
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        tracing::warn!("Mail relay error: HTTP {} - {}", status, text);
        Err(AppError::ExternalServiceError(format!(
            "Mail relay error: HTTP {}",
            status
        )))
    }
}
