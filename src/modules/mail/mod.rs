//! Outgoing e-mail
//!
//! `Mailer` is the seam the notification service sends through; `HttpMailer`
//! posts messages to a transactional mail relay.

mod http_mailer;

use async_trait::async_trait;
use serde::Serialize;

use crate::core::error::Result;

pub use http_mailer::HttpMailer;

/// A rendered message ready for delivery
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<()>;
}
