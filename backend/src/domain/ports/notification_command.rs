//! Driving port for notification mutations.

use async_trait::async_trait;

use crate::domain::{DeliveryChannel, Error, Notification, NotificationId, UserId};

/// Request to notify a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendNotificationRequest {
    /// Recipient of the notification.
    pub user_id: UserId,
    /// Short heading.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Channel used for out-of-app delivery.
    pub channel: DeliveryChannel,
}

/// Driving port for sending notifications and acknowledging them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationCommand: Send + Sync {
    /// Persist a notification and queue it for delivery.
    ///
    /// Returns once the notification is stored; delivery happens later and
    /// may be dropped under back-pressure.
    async fn send(&self, request: SendNotificationRequest) -> Result<Notification, Error>;

    /// Mark one of the user's notifications as read.
    ///
    /// # Errors
    ///
    /// Returns `not_found` when the notification does not exist or belongs
    /// to another user.
    async fn mark_as_read(
        &self,
        user_id: &UserId,
        notification_id: &NotificationId,
    ) -> Result<(), Error>;
}
