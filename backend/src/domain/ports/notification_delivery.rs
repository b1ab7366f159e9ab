//! Port for delivering a notification job over a channel.
//!
//! Implementations may be slow. They are only ever called from dispatcher
//! workers, never on a request path.

use async_trait::async_trait;

use crate::domain::NotificationJob;

use super::define_port_error;

define_port_error! {
    /// Errors raised by delivery adapters.
    pub enum DeliveryError {
        /// The destination could not be reached.
        Unreachable { message: String } => "delivery destination unreachable: {message}",
        /// The provider refused the message.
        Rejected { message: String } => "delivery rejected: {message}",
        /// No adapter is configured for the job's channel.
        UnsupportedChannel { channel: String } => "no delivery adapter for channel {channel}",
    }
}

/// Delivery capability selected per channel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationDelivery: Send + Sync {
    /// Deliver one job.
    async fn deliver(&self, job: &NotificationJob) -> Result<(), DeliveryError>;
}
