//! Port for the capacity ledger: the registration table plus the atomic
//! capacity-checked insert that guards it.
//!
//! Adapters must make [`RegistrationRepository::create_with_capacity_check`]
//! atomic with respect to every other writer for the same event, whether the
//! writers share a process or not. A counted-then-inserted implementation
//! without a lock held across both steps is incorrect.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{EventId, RegistrantFilter, Registration, RegistrationStatus, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by capacity ledger adapters.
    pub enum RegistrationRepositoryError {
        /// The event row does not exist.
        EventNotFound => "event does not exist",
        /// An active registration already exists for the user and event.
        AlreadyActive => "an active registration already exists",
        /// Seat-holding registrations have reached the capacity limit.
        EventFull { capacity: u32 } => "event capacity of {capacity} reached",
        /// No registration matched the requested transition.
        NotFound => "no matching registration",
        /// The stored registration cannot make the requested transition.
        InvalidTransition { from: RegistrationStatus } =>
            "registration cannot transition from {from}",
        /// Repository connection could not be established or was lost.
        Connection { message: String } =>
            "registration repository connection failed: {message}",
        /// The transaction was aborted by the store because of contention.
        Contention { message: String } =>
            "registration transaction aborted by contention: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "registration repository query failed: {message}",
    }
}

impl RegistrationRepositoryError {
    /// Whether an immediate retry may succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Contention { .. })
    }
}

/// Capacity ledger port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    /// Atomically count seat-holding registrations for the event and store
    /// `registration` as `confirmed` when fewer than `capacity_limit` exist.
    ///
    /// A prior `cancelled` row for the same user and event is revived in
    /// place; the returned registration is the stored row.
    async fn create_with_capacity_check(
        &self,
        registration: &Registration,
        capacity_limit: u32,
    ) -> Result<Registration, RegistrationRepositoryError>;

    /// Latest registration row for the pair, whatever its status.
    async fn find_by_user_and_event(
        &self,
        user_id: &UserId,
        event_id: &EventId,
    ) -> Result<Option<Registration>, RegistrationRepositoryError>;

    /// Cancel the user's active registration.
    ///
    /// Fails with `NotFound` when no active row exists and with
    /// `InvalidTransition` for checked-in attendees.
    async fn cancel(
        &self,
        user_id: &UserId,
        event_id: &EventId,
        at: DateTime<Utc>,
    ) -> Result<Registration, RegistrationRepositoryError>;

    /// Move a `confirmed` registration to `checked_in`.
    async fn check_in(
        &self,
        user_id: &UserId,
        event_id: &EventId,
        at: DateTime<Utc>,
    ) -> Result<Registration, RegistrationRepositoryError>;

    /// Registrations for an event matching `filter`, oldest first.
    async fn list_for_event(
        &self,
        event_id: &EventId,
        filter: RegistrantFilter,
    ) -> Result<Vec<Registration>, RegistrationRepositoryError>;

    /// Registrations held by a user, newest first.
    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Registration>, RegistrationRepositoryError>;

    /// Number of seat-holding registrations for the event.
    async fn count_by_event(&self, event_id: &EventId) -> Result<u32, RegistrationRepositoryError>;
}
