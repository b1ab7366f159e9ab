//! Port the registration coordinator uses to tell attendees about their
//! registration.

use async_trait::async_trait;

use crate::domain::{Error, Event, Registration};

/// Best-effort notification hook invoked after a registration commits.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationNotifier: Send + Sync {
    /// Notify the registrant that `registration` for `event` is confirmed.
    async fn registration_confirmed(
        &self,
        registration: &Registration,
        event: &Event,
    ) -> Result<(), Error>;
}

/// Notifier that does nothing, for deployments and tests without
/// notification wiring.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentRegistrationNotifier;

#[async_trait]
impl RegistrationNotifier for SilentRegistrationNotifier {
    async fn registration_confirmed(
        &self,
        _registration: &Registration,
        _event: &Event,
    ) -> Result<(), Error> {
        Ok(())
    }
}
