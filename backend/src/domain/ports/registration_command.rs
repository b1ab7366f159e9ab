//! Driving port for registration mutations.
//!
//! HTTP handlers call this port after the session identity has been
//! extracted. Identifiers are already parsed; the coordinator only checks
//! existence and business rules.

use async_trait::async_trait;

use crate::domain::{EventId, Registration, RegistrationError, UserId};

/// Driving port for registering, cancelling and checking in.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationCommand: Send + Sync {
    /// Register `user_id` for `event_id`.
    ///
    /// # Errors
    ///
    /// - `EventNotFound` / `EventNotPublished` when the event cannot be joined.
    /// - `AlreadyRegistered` when an active registration exists.
    /// - `EventFull` when every seat is taken at commit time.
    /// - `StorageUnavailable` after a transient failure and one retry.
    async fn register(
        &self,
        user_id: &UserId,
        event_id: &EventId,
    ) -> Result<Registration, RegistrationError>;

    /// Cancel the user's active registration, freeing its seat.
    ///
    /// Cancelling when no active registration exists fails with
    /// `RegistrationNotFound`.
    async fn cancel(&self, user_id: &UserId, event_id: &EventId) -> Result<(), RegistrationError>;

    /// Check an attendee in on behalf of the event organizer.
    async fn check_in(
        &self,
        organizer_id: &UserId,
        event_id: &EventId,
        attendee_id: &UserId,
    ) -> Result<(), RegistrationError>;
}
