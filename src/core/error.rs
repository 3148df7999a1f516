use thiserror::Error;

use crate::features::reports::models::{Office, ReportState};
use crate::features::reports::services::ActorKind;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid transition: {actor} cannot move a report from {from} to {to}")]
    InvalidTransition {
        from: ReportState,
        to: ReportState,
        actor: ActorKind,
    },

    #[error("Report is in terminal state {0}")]
    TerminalState(ReportState),

    #[error("No eligible staff for office {0}")]
    NoEligibleStaff(Office),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),
}

impl AppError {
    /// Only a lost compare-and-set race is worth retrying, and only after a fresh read.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Conflict(_))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
