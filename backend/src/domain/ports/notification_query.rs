//! Driving port for notification reads.

use async_trait::async_trait;

use crate::domain::{Error, Notification, UserId};

/// Driving port for listing a user's notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationQuery: Send + Sync {
    /// Notifications addressed to `user_id`, newest first.
    async fn list(&self, user_id: &UserId) -> Result<Vec<Notification>, Error>;
}
