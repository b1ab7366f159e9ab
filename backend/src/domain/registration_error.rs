//! Typed outcomes of the registration workflow.
//!
//! Every variant except [`RegistrationError::StorageUnavailable`] is an
//! expected, user-facing result. `EventFull` in particular is a normal
//! outcome under contention and must never be reported as a storage fault.

use serde_json::json;

use super::{Error, EventId, RegistrationStatus};

/// Failure taxonomy for registration commands and queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// No event exists with the requested identifier.
    #[error("event {event_id} not found")]
    EventNotFound {
        /// Event the command targeted.
        event_id: EventId,
    },
    /// The event exists but is not accepting registrations.
    #[error("event {event_id} is not open for registration")]
    EventNotPublished {
        /// Event the command targeted.
        event_id: EventId,
    },
    /// The user already holds an active registration for the event.
    #[error("already registered for event {event_id}")]
    AlreadyRegistered {
        /// Event the command targeted.
        event_id: EventId,
    },
    /// Every seat is taken.
    #[error("event {event_id} is full")]
    EventFull {
        /// Event the command targeted.
        event_id: EventId,
    },
    /// No active registration exists for the user and event.
    #[error("no active registration for event {event_id}")]
    RegistrationNotFound {
        /// Event the command targeted.
        event_id: EventId,
    },
    /// The caller does not organise the event.
    #[error("only the event organizer may perform this action")]
    Forbidden,
    /// The registration is not in a state that allows the transition.
    #[error("cannot move registration from {from} to {to}")]
    InvalidStateTransition {
        /// Current status.
        from: RegistrationStatus,
        /// Requested status.
        to: RegistrationStatus,
    },
    /// The store failed twice with a transient error.
    #[error("registration store unavailable: {message}")]
    StorageUnavailable {
        /// Store error text; kept out of client responses.
        message: String,
    },
}

impl RegistrationError {
    /// Stable machine-readable code exposed to clients.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EventNotFound { .. } => "event_not_found",
            Self::EventNotPublished { .. } => "event_not_published",
            Self::AlreadyRegistered { .. } => "already_registered",
            Self::EventFull { .. } => "event_full",
            Self::RegistrationNotFound { .. } => "registration_not_found",
            Self::Forbidden => "forbidden",
            Self::InvalidStateTransition { .. } => "invalid_state_transition",
            Self::StorageUnavailable { .. } => "storage_unavailable",
        }
    }
}

impl From<RegistrationError> for Error {
    fn from(value: RegistrationError) -> Self {
        let code = value.code();
        let error = match &value {
            RegistrationError::EventNotFound { .. }
            | RegistrationError::RegistrationNotFound { .. } => Self::not_found(value.to_string()),
            RegistrationError::EventNotPublished { .. }
            | RegistrationError::AlreadyRegistered { .. }
            | RegistrationError::EventFull { .. }
            | RegistrationError::InvalidStateTransition { .. } => Self::conflict(value.to_string()),
            RegistrationError::Forbidden => Self::forbidden(value.to_string()),
            // Storage detail stays in the logs.
            RegistrationError::StorageUnavailable { .. } => {
                Self::service_unavailable("registration store temporarily unavailable")
            }
        };
        error.with_details(json!({ "code": code }))
    }
}
