//! Port resolving where a user's notifications are delivered.

use async_trait::async_trait;

use crate::domain::{DeliveryChannel, Destination, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by recipient directory adapters.
    pub enum RecipientDirectoryError {
        /// Directory connection could not be established.
        Connection { message: String } => "recipient directory connection failed: {message}",
        /// Lookup failed during execution.
        Query { message: String } => "recipient directory query failed: {message}",
    }
}

/// Resolves a user's address for a delivery channel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    /// Destination for `user_id` on `channel`.
    ///
    /// `None` means the user is unknown or has no address for the channel.
    async fn resolve(
        &self,
        user_id: &UserId,
        channel: DeliveryChannel,
    ) -> Result<Option<Destination>, RecipientDirectoryError>;
}

/// Push topic a user's devices subscribe to.
///
/// # Examples
/// ```
/// use eventhub::domain::UserId;
/// use eventhub::domain::ports::push_topic_for;
///
/// let user = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id");
/// assert_eq!(push_topic_for(&user), "users/3fa85f64-5717-4562-b3fc-2c963f66afa6");
/// ```
pub fn push_topic_for(user_id: &UserId) -> String {
    format!("users/{user_id}")
}
