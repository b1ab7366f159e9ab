//! Registrations of users for events.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EventId, RegistrationId, UserId};

/// Lifecycle state of a registration.
///
/// `confirmed -> cancelled` frees a seat; `confirmed -> checked_in` keeps it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    /// Holds a seat.
    Confirmed,
    /// Released its seat.
    Cancelled,
    /// Waiting for a seat; never counted against capacity.
    Waitlisted,
    /// Attended; still holds its seat.
    CheckedIn,
}

impl RegistrationStatus {
    /// Snake-case storage form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Waitlisted => "waitlisted",
            Self::CheckedIn => "checked_in",
        }
    }

    /// Anything but `cancelled` blocks a second registration for the pair.
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Whether the registration counts against the event capacity.
    pub const fn occupies_seat(self) -> bool {
        matches!(self, Self::Confirmed | Self::CheckedIn)
    }

    /// Statuses that count against capacity, in storage form.
    pub const SEAT_HOLDING: [Self; 2] = [Self::Confirmed, Self::CheckedIn];
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown registration status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown registration status: {0}")]
pub struct ParseRegistrationStatusError(pub String);

impl FromStr for RegistrationStatus {
    type Err = ParseRegistrationStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "waitlisted" => Ok(Self::Waitlisted),
            "checked_in" => Ok(Self::CheckedIn),
            other => Err(ParseRegistrationStatusError(other.to_owned())),
        }
    }
}

/// Status filter for organizer registrant listings.
/// Status filter for registrant listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrantFilter {
    /// Every registration, whatever its status.
    #[default]
    All,
    /// Only `confirmed`.
    Confirmed,
    /// Only `cancelled`.
    Cancelled,
    /// Only `checked_in`.
    CheckedIn,
}

impl RegistrantFilter {
    /// The single status selected by this filter, or `None` for `all`.
    pub const fn status(self) -> Option<RegistrationStatus> {
        match self {
            Self::All => None,
            Self::Confirmed => Some(RegistrationStatus::Confirmed),
            Self::Cancelled => Some(RegistrationStatus::Cancelled),
            Self::CheckedIn => Some(RegistrationStatus::CheckedIn),
        }
    }

    /// Whether a registration in `status` passes this filter.
    pub fn matches(self, status: RegistrationStatus) -> bool {
        self.status().is_none_or(|selected| selected == status)
    }
}

/// Error returned when parsing an unknown registrant filter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("status filter must be one of all, confirmed, cancelled, checked_in; got {0}")]
pub struct ParseRegistrantFilterError(pub String);

impl FromStr for RegistrantFilter {
    type Err = ParseRegistrantFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "checked_in" => Ok(Self::CheckedIn),
            other => Err(ParseRegistrantFilterError(other.to_owned())),
        }
    }
}

/// A user's registration for an event.
///
/// Registrations are never hard-deleted; cancelling flips the status and a
/// later re-registration revives the same row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// Stable across cancel and re-register.
    pub id: RegistrationId,
    /// Event the seat belongs to.
    pub event_id: EventId,
    /// Registrant.
    pub user_id: UserId,
    /// Current lifecycle state.
    pub status: RegistrationStatus,
    /// Time of the latest (re-)registration.
    pub registered_at: DateTime<Utc>,
    /// Set once the organizer checks the attendee in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_in_at: Option<DateTime<Utc>>,
}

impl Registration {
    /// A fresh `confirmed` registration awaiting the capacity check.
    pub fn confirmed(event_id: EventId, user_id: UserId, registered_at: DateTime<Utc>) -> Self {
        Self {
            id: RegistrationId::random(),
            event_id,
            user_id,
            status: RegistrationStatus::Confirmed,
            registered_at,
            checked_in_at: None,
        }
    }
}
