//! Registration coordinator.
//!
//! Enforces the registration rules (event exists and is published, no active
//! registration for the pair, capacity not exceeded) and delegates the
//! capacity check itself to the ledger's atomic primitive. The pre-checks
//! here only produce friendlier errors early; the ledger re-checks both
//! duplicates and capacity under its lock, so concurrent callers cannot slip
//! past them.
//!
//! Transient ledger failures are retried exactly once. A retry that finds
//! the pair already confirmed adopts that row, since the first attempt may
//! have committed before its connection dropped. Which of several
//! concurrent callers wins the last seat is decided by commit order, not
//! arrival order.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, error, info, warn};

use crate::domain::ports::{
    EventRepository, EventRepositoryError, RegistrationCommand, RegistrationNotifier,
    RegistrationQuery, RegistrationRepository, RegistrationRepositoryError,
};
use crate::domain::{
    Event, EventId, RegistrantFilter, Registration, RegistrationError, RegistrationStatus, UserId,
};

/// Registration service implementing the registration driving ports.
#[derive(Clone)]
pub struct RegistrationService<E, R> {
    events: Arc<E>,
    registrations: Arc<R>,
    notifier: Arc<dyn RegistrationNotifier>,
    clock: Arc<dyn Clock>,
}

impl<E, R> RegistrationService<E, R> {
    /// Create a new service over the event store and capacity ledger.
    pub fn new(
        events: Arc<E>,
        registrations: Arc<R>,
        notifier: Arc<dyn RegistrationNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            events,
            registrations,
            notifier,
            clock,
        }
    }
}

/// Run `attempt`, retrying once when the first failure is transient.
async fn retry_once<T, Err, F, Fut>(
    operation: &'static str,
    is_transient: fn(&Err) -> bool,
    mut attempt: F,
) -> Result<T, Err>
where
    Err: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Err>>,
{
    match attempt().await {
        Err(err) if is_transient(&err) => {
            warn!(operation, error = %err, "transient storage failure, retrying once");
            attempt().await
        }
        outcome => outcome,
    }
}

fn is_transient_event_error(error: &EventRepositoryError) -> bool {
    matches!(error, EventRepositoryError::Connection { .. })
}

fn storage_unavailable(operation: &'static str, message: String) -> RegistrationError {
    error!(operation, error = %message, "registration storage failure");
    RegistrationError::StorageUnavailable { message }
}

fn map_event_error(operation: &'static str, error: EventRepositoryError) -> RegistrationError {
    storage_unavailable(operation, error.to_string())
}

/// Translate a ledger failure into the registration taxonomy.
///
/// `target` is the status the failed call was trying to reach; it is only
/// used to describe invalid transitions.
fn map_ledger_error(
    operation: &'static str,
    event_id: EventId,
    target: RegistrationStatus,
    error: RegistrationRepositoryError,
) -> RegistrationError {
    match error {
        RegistrationRepositoryError::EventNotFound => RegistrationError::EventNotFound { event_id },
        RegistrationRepositoryError::AlreadyActive => {
            RegistrationError::AlreadyRegistered { event_id }
        }
        RegistrationRepositoryError::EventFull { .. } => RegistrationError::EventFull { event_id },
        RegistrationRepositoryError::NotFound => {
            RegistrationError::RegistrationNotFound { event_id }
        }
        RegistrationRepositoryError::InvalidTransition { from } => {
            RegistrationError::InvalidStateTransition { from, to: target }
        }
        other @ (RegistrationRepositoryError::Connection { .. }
        | RegistrationRepositoryError::Contention { .. }
        | RegistrationRepositoryError::Query { .. }) => {
            storage_unavailable(operation, other.to_string())
        }
    }
}

impl<E, R> RegistrationService<E, R>
where
    E: EventRepository,
    R: RegistrationRepository,
{
    async fn load_event(
        &self,
        operation: &'static str,
        event_id: &EventId,
    ) -> Result<Event, RegistrationError> {
        retry_once(operation, is_transient_event_error, || {
            self.events.find_by_id(event_id)
        })
        .await
        .map_err(|err| map_event_error(operation, err))?
        .ok_or(RegistrationError::EventNotFound {
            event_id: *event_id,
        })
    }

    async fn load_organized_event(
        &self,
        operation: &'static str,
        organizer_id: &UserId,
        event_id: &EventId,
    ) -> Result<Event, RegistrationError> {
        let event = self.load_event(operation, event_id).await?;
        if !event.is_organized_by(organizer_id) {
            debug!(%event_id, %organizer_id, "rejecting non-organizer");
            return Err(RegistrationError::Forbidden);
        }
        Ok(event)
    }

    /// Reserve a seat for `candidate`, retrying once on a transient failure.
    ///
    /// A transient failure may hide a commit that landed. When the retry then
    /// reports `AlreadyActive`, the pair is re-read and a confirmed row is
    /// returned as this call's result.
    async fn create_confirmed(
        &self,
        operation: &'static str,
        candidate: &Registration,
        capacity: u32,
    ) -> Result<Registration, RegistrationRepositoryError> {
        let first = self
            .registrations
            .create_with_capacity_check(candidate, capacity)
            .await;
        let err = match first {
            Err(err) if err.is_transient() => err,
            outcome => return outcome,
        };
        warn!(operation, error = %err, "transient storage failure, retrying once");

        match self
            .registrations
            .create_with_capacity_check(candidate, capacity)
            .await
        {
            Err(RegistrationRepositoryError::AlreadyActive) => {
                self.committed_registration(candidate).await
            }
            outcome => outcome,
        }
    }

    async fn committed_registration(
        &self,
        candidate: &Registration,
    ) -> Result<Registration, RegistrationRepositoryError> {
        let existing = self
            .registrations
            .find_by_user_and_event(&candidate.user_id, &candidate.event_id)
            .await?;
        match existing {
            Some(registration) if registration.status == RegistrationStatus::Confirmed => {
                debug!(
                    event_id = %registration.event_id,
                    user_id = %registration.user_id,
                    "first attempt committed before its transient failure"
                );
                Ok(registration)
            }
            _ => Err(RegistrationRepositoryError::AlreadyActive),
        }
    }

    async fn notify_confirmed(&self, registration: &Registration, event: &Event) {
        if let Err(err) = self
            .notifier
            .registration_confirmed(registration, event)
            .await
        {
            warn!(
                event_id = %registration.event_id,
                user_id = %registration.user_id,
                error = %err,
                "registration confirmation notification failed"
            );
        }
    }
}

#[async_trait]
impl<E, R> RegistrationCommand for RegistrationService<E, R>
where
    E: EventRepository,
    R: RegistrationRepository,
{
    async fn register(
        &self,
        user_id: &UserId,
        event_id: &EventId,
    ) -> Result<Registration, RegistrationError> {
        const OP: &str = "register";
        let event = self.load_event(OP, event_id).await?;
        if !event.is_open_for_registration() {
            return Err(RegistrationError::EventNotPublished {
                event_id: *event_id,
            });
        }

        let existing = retry_once(OP, RegistrationRepositoryError::is_transient, || {
            self.registrations.find_by_user_and_event(user_id, event_id)
        })
        .await
        .map_err(|err| map_ledger_error(OP, *event_id, RegistrationStatus::Confirmed, err))?;
        if existing.is_some_and(|registration| registration.status.is_active()) {
            return Err(RegistrationError::AlreadyRegistered {
                event_id: *event_id,
            });
        }

        let candidate = Registration::confirmed(*event_id, user_id.clone(), self.clock.utc());
        let stored = self
            .create_confirmed(OP, &candidate, event.capacity())
            .await
            .map_err(|err| map_ledger_error(OP, *event_id, RegistrationStatus::Confirmed, err))?;

        info!(
            %event_id,
            %user_id,
            registration_id = %stored.id,
            "registration confirmed"
        );
        self.notify_confirmed(&stored, &event).await;
        Ok(stored)
    }

    async fn cancel(&self, user_id: &UserId, event_id: &EventId) -> Result<(), RegistrationError> {
        const OP: &str = "cancel";
        let now = self.clock.utc();
        let cancelled = retry_once(OP, RegistrationRepositoryError::is_transient, || {
            self.registrations.cancel(user_id, event_id, now)
        })
        .await
        .map_err(|err| map_ledger_error(OP, *event_id, RegistrationStatus::Cancelled, err))?;

        info!(%event_id, %user_id, registration_id = %cancelled.id, "registration cancelled");
        Ok(())
    }

    async fn check_in(
        &self,
        organizer_id: &UserId,
        event_id: &EventId,
        attendee_id: &UserId,
    ) -> Result<(), RegistrationError> {
        const OP: &str = "check_in";
        self.load_organized_event(OP, organizer_id, event_id).await?;

        let now = self.clock.utc();
        let checked_in = retry_once(OP, RegistrationRepositoryError::is_transient, || {
            self.registrations.check_in(attendee_id, event_id, now)
        })
        .await
        .map_err(|err| map_ledger_error(OP, *event_id, RegistrationStatus::CheckedIn, err))?;

        info!(
            %event_id,
            %attendee_id,
            registration_id = %checked_in.id,
            "attendee checked in"
        );
        Ok(())
    }
}

#[async_trait]
impl<E, R> RegistrationQuery for RegistrationService<E, R>
where
    E: EventRepository,
    R: RegistrationRepository,
{
    async fn event_registrants(
        &self,
        organizer_id: &UserId,
        event_id: &EventId,
        filter: RegistrantFilter,
    ) -> Result<Vec<Registration>, RegistrationError> {
        const OP: &str = "event_registrants";
        self.load_organized_event(OP, organizer_id, event_id).await?;

        retry_once(OP, RegistrationRepositoryError::is_transient, || {
            self.registrations.list_for_event(event_id, filter)
        })
        .await
        .map_err(|err| map_ledger_error(OP, *event_id, RegistrationStatus::Confirmed, err))
    }

    async fn user_registrations(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Registration>, RegistrationError> {
        const OP: &str = "user_registrations";
        retry_once(OP, RegistrationRepositoryError::is_transient, || {
            self.registrations.list_for_user(user_id)
        })
        .await
        .map_err(|err| storage_unavailable(OP, err.to_string()))
    }
}

#[cfg(test)]
mod tests;
