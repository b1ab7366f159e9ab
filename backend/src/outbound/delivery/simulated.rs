//! Latency-simulating delivery adapter.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::domain::NotificationJob;
use crate::domain::ports::{DeliveryError, NotificationDelivery};

/// Delivery adapter that waits for a fixed latency and logs the send.
///
/// Stands in for email, SMS and push providers, which all share the slow
/// round-trip the dispatcher exists to keep off request paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedDelivery {
    latency: Duration,
}

impl SimulatedDelivery {
    /// Create an adapter that takes `latency` per delivery.
    pub const fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// Delay applied to every delivery.
    pub const fn latency(&self) -> Duration {
        self.latency
    }
}

#[async_trait]
impl NotificationDelivery for SimulatedDelivery {
    async fn deliver(&self, job: &NotificationJob) -> Result<(), DeliveryError> {
        if job.destination.address.trim().is_empty() {
            return Err(DeliveryError::rejected("destination address is empty"));
        }
        tokio::time::sleep(self.latency).await;
        info!(
            notification_id = %job.notification.id(),
            channel = %job.destination.channel,
            address = %job.destination.address,
            title = job.notification.title(),
            "simulated notification sent"
        );
        Ok(())
    }
}
