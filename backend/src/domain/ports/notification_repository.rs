//! Port for notification persistence.

use async_trait::async_trait;

use crate::domain::{Notification, NotificationId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification repository adapters.
    pub enum NotificationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "notification repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "notification repository query failed: {message}",
    }
}

/// Port for storing and reading a user's notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Persist a new notification.
    async fn create(&self, notification: &Notification) -> Result<(), NotificationRepositoryError>;

    /// Notifications addressed to `user_id`, newest first.
    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Notification>, NotificationRepositoryError>;

    /// Flag a notification as read.
    ///
    /// Returns `false` when no notification with that id belongs to the user.
    async fn mark_as_read(
        &self,
        user_id: &UserId,
        notification_id: &NotificationId,
    ) -> Result<bool, NotificationRepositoryError>;
}
