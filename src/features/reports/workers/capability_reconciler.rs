use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{interval, MissedTickBehavior};

use crate::features::reports::services::CapabilityReconciler;
use crate::features::staff::models::CapabilityLost;

/// Background worker driving the reconciler.
///
/// Handles capability-loss events as they arrive and runs a periodic sweep,
/// the first one immediately on startup.
pub struct CapabilityReconcilerWorker {
    reconciler: Arc<CapabilityReconciler>,
    events: UnboundedReceiver<CapabilityLost>,
    sweep_interval: Duration,
}

impl CapabilityReconcilerWorker {
    pub fn new(
        reconciler: Arc<CapabilityReconciler>,
        events: UnboundedReceiver<CapabilityLost>,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            reconciler,
            events,
            sweep_interval,
        }
    }

    /// Run until aborted. Losing the event feed leaves the sweep running.
    pub async fn run(mut self) {
        tracing::info!(
            "Starting capability reconciler worker (sweep every {:?})",
            self.sweep_interval
        );

        let mut sweep = interval(self.sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut events_open = true;

        loop {
            tokio::select! {
                event = self.events.recv(), if events_open => match event {
                    Some(event) => self.handle(event).await,
                    None => {
                        tracing::warn!("Capability event channel closed; continuing with sweeps only");
                        events_open = false;
                    }
                },
                _ = sweep.tick() => {
                    if let Err(e) = self.reconciler.sweep().await {
                        tracing::error!("Reconciler sweep failed: {:?}", e);
                    }
                }
            }
        }
    }

    async fn handle(&self, event: CapabilityLost) {
        let result = match event.office {
            Some(office) => self.reconciler.reconcile_office(event.staff_id, office).await,
            None => self.reconciler.reconcile(event.staff_id).await,
        };

        match result {
            Ok(count) => tracing::debug!(
                "Handled capability loss for staff {} (office: {:?}): {} reports reset",
                event.staff_id,
                event.office,
                count
            ),
            Err(e) => tracing::error!(
                "Failed to reconcile staff {} (office: {:?}): {:?}",
                event.staff_id,
                event.office,
                e
            ),
        }
    }
}
