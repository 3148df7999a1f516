use sqlx::postgres::PgListener;
use sqlx::PgPool;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

use crate::core::error::{AppError, Result};
use crate::features::staff::models::CapabilityLost;
use crate::shared::constants::LISTENER_RECONNECT_DELAY_SECS;

/// Forwards capability-loss notifications published by the directory triggers
/// to the reconciler worker.
pub struct CapabilityListener {
    pool: PgPool,
    channel: String,
    sender: UnboundedSender<CapabilityLost>,
    reconnect_delay: Duration,
}

impl CapabilityListener {
    pub fn new(pool: PgPool, channel: String, sender: UnboundedSender<CapabilityLost>) -> Self {
        Self {
            pool,
            channel,
            sender,
            reconnect_delay: Duration::from_secs(LISTENER_RECONNECT_DELAY_SECS),
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Listen until the receiving side goes away.
    ///
    /// Failing to connect or subscribe is retried after `reconnect_delay`;
    /// the periodic sweep covers whatever is published in the meantime.
    pub async fn run(self) {
        let mut listener = loop {
            if self.sender.is_closed() {
                tracing::info!("Reconciler worker stopped before capability listener connected");
                return;
            }

            match self.connect().await {
                Ok(listener) => break listener,
                Err(e) => {
                    tracing::warn!(
                        "Capability listener unavailable, retrying in {:?}: {}",
                        self.reconnect_delay,
                        e
                    );
                    tokio::time::sleep(self.reconnect_delay).await;
                }
            }
        };

        tracing::info!("Listening for capability changes on channel '{}'", self.channel);

        loop {
            let notification = match listener.recv().await {
                Ok(n) => n,
                Err(e) => {
                    tracing::error!("Capability listener error: {:?}", e);
                    tokio::time::sleep(self.reconnect_delay).await;
                    continue;
                }
            };

            let event = match parse_payload(notification.payload()) {
                Some(event) => event,
                None => continue,
            };

            tracing::info!(
                "Capability lost: staff {} (office: {:?})",
                event.staff_id,
                event.office
            );

            if self.sender.send(event).is_err() {
                tracing::info!("Reconciler worker stopped; capability listener exiting");
                return;
            }
        }
    }

    async fn connect(&self) -> Result<PgListener> {
        let mut listener = PgListener::connect_with(&self.pool).await.map_err(|e| {
            tracing::error!("Failed to connect capability listener: {:?}", e);
            AppError::Database(e)
        })?;

        listener.listen(&self.channel).await.map_err(|e| {
            tracing::error!("Failed to LISTEN on {}: {:?}", self.channel, e);
            AppError::Database(e)
        })?;

        Ok(listener)
    }
}

fn parse_payload(payload: &str) -> Option<CapabilityLost> {
    match serde_json::from_str::<CapabilityLost>(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!("Ignoring malformed capability payload {:?}: {}", payload, e);
            None
        }
    }
}
