//! Driving port for registration reads.

use async_trait::async_trait;

use crate::domain::{EventId, RegistrantFilter, Registration, RegistrationError, UserId};

/// Driving port for organizer and attendee registration listings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationQuery: Send + Sync {
    /// Registrants of an event, visible to its organizer only.
    async fn event_registrants(
        &self,
        organizer_id: &UserId,
        event_id: &EventId,
        filter: RegistrantFilter,
    ) -> Result<Vec<Registration>, RegistrationError>;

    /// The caller's own registrations, newest first.
    async fn user_registrations(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Registration>, RegistrationError>;
}
