use async_trait::async_trait;

use crate::core::error::Result;
use crate::features::reports::models::Report;

/// Receives every committed report state change.
///
/// Implementations fan the change out to interested users. Errors returned
/// here are logged by the caller and never undo the transition.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn report_state_changed(&self, report: &Report) -> Result<()>;
}
