//! Per-channel delivery routing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{DeliveryError, NotificationDelivery};
use crate::domain::{DeliveryChannel, NotificationJob};

/// Routes each job to the adapter registered for its channel.
#[derive(Clone, Default)]
pub struct ChannelRouter {
    routes: HashMap<DeliveryChannel, Arc<dyn NotificationDelivery>>,
}

impl ChannelRouter {
    /// Create a router with no channels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `delivery` for `channel`, replacing any previous adapter.
    #[must_use]
    pub fn with_channel(
        mut self,
        channel: DeliveryChannel,
        delivery: Arc<dyn NotificationDelivery>,
    ) -> Self {
        self.routes.insert(channel, delivery);
        self
    }

    /// Register `delivery` for every channel.
    #[must_use]
    pub fn with_all_channels(self, delivery: Arc<dyn NotificationDelivery>) -> Self {
        [DeliveryChannel::Email, DeliveryChannel::Push, DeliveryChannel::Sms]
            .into_iter()
            .fold(self, |router, channel| {
                router.with_channel(channel, Arc::clone(&delivery))
            })
    }
}

#[async_trait]
impl NotificationDelivery for ChannelRouter {
    async fn deliver(&self, job: &NotificationJob) -> Result<(), DeliveryError> {
        let channel = job.destination.channel;
        let Some(delivery) = self.routes.get(&channel) else {
            return Err(DeliveryError::unsupported_channel(channel.to_string()));
        };
        delivery.deliver(job).await
    }
}
