//! Events that users register for.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EventId, UserId};

/// Maximum title length in characters.
pub const EVENT_TITLE_MAX: usize = 255;

/// Publication state of an event.
///
/// Only `published` events accept registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Not yet visible to registrants.
    Draft,
    /// Open for registration.
    Published,
    /// Called off by the organizer.
    Cancelled,
}

impl EventStatus {
    /// Lowercase storage form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event status: {0}")]
pub struct ParseEventStatusError(pub String);

impl FromStr for EventStatus {
    type Err = ParseEventStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ParseEventStatusError(other.to_owned())),
        }
    }
}

/// Validation errors returned by [`Event::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventValidationError {
    /// Title is blank after trimming.
    #[error("event title must not be empty")]
    EmptyTitle,
    /// Title exceeds [`EVENT_TITLE_MAX`].
    #[error("event title must be at most {max} characters")]
    TitleTooLong {
        /// Maximum accepted length in characters.
        max: usize,
    },
    /// Capacity was zero.
    #[error("event capacity must be greater than zero")]
    ZeroCapacity,
    /// `ends_at` is not after `starts_at`.
    #[error("event must end after it starts")]
    EndsBeforeStart,
}

/// Input payload for [`Event::new`].
#[derive(Debug, Clone)]
pub struct EventDraft {
    /// Event identifier.
    pub id: EventId,
    /// Organizing user.
    pub organizer_id: UserId,
    /// Display title.
    pub title: String,
    /// Seat count.
    pub capacity: u32,
    /// Initial publication state.
    pub status: EventStatus,
    /// Start time.
    pub starts_at: DateTime<Utc>,
    /// End time; must follow `starts_at`.
    pub ends_at: DateTime<Utc>,
}

/// An event with a fixed seat capacity.
///
/// ## Invariants
/// - `capacity > 0`.
/// - `ends_at > starts_at`.
/// - `title` is non-blank and at most [`EVENT_TITLE_MAX`] characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    id: EventId,
    organizer_id: UserId,
    title: String,
    capacity: u32,
    status: EventStatus,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
}

impl Event {
    /// Validate a draft into an [`Event`].
    ///
    /// # Examples
    /// ```
    /// use chrono::{Duration, Utc};
    /// use eventhub::domain::{Event, EventDraft, EventId, EventStatus, UserId};
    ///
    /// let starts_at = Utc::now();
    /// let event = Event::new(EventDraft {
    ///     id: EventId::random(),
    ///     organizer_id: UserId::random(),
    ///     title: "RustConf".to_owned(),
    ///     capacity: 2,
    ///     status: EventStatus::Published,
    ///     starts_at,
    ///     ends_at: starts_at + Duration::hours(2),
    /// })
    /// .expect("valid event");
    /// assert!(event.is_open_for_registration());
    /// ```
    pub fn new(draft: EventDraft) -> Result<Self, EventValidationError> {
        let EventDraft {
            id,
            organizer_id,
            title,
            capacity,
            status,
            starts_at,
            ends_at,
        } = draft;

        if title.trim().is_empty() {
            return Err(EventValidationError::EmptyTitle);
        }
        if title.chars().count() > EVENT_TITLE_MAX {
            return Err(EventValidationError::TitleTooLong {
                max: EVENT_TITLE_MAX,
            });
        }
        if capacity == 0 {
            return Err(EventValidationError::ZeroCapacity);
        }
        if ends_at <= starts_at {
            return Err(EventValidationError::EndsBeforeStart);
        }

        Ok(Self {
            id,
            organizer_id,
            title,
            capacity,
            status,
            starts_at,
            ends_at,
        })
    }

    /// Event identifier.
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Organizing user.
    pub fn organizer_id(&self) -> &UserId {
        &self.organizer_id
    }

    /// Display title.
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Number of seats; confirmed and checked-in registrations each take one.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Publication state.
    pub fn status(&self) -> EventStatus {
        self.status
    }

    /// Start time.
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    /// End time.
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.ends_at
    }

    /// Registration eligibility depends on status alone.
    pub fn is_open_for_registration(&self) -> bool {
        self.status == EventStatus::Published
    }

    /// Whether `user_id` organises this event.
    pub fn is_organized_by(&self, user_id: &UserId) -> bool {
        &self.organizer_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::{fixture, rstest};

    #[fixture]
    fn draft() -> EventDraft {
        let starts_at = Utc::now();
        EventDraft {
            id: EventId::random(),
            organizer_id: UserId::random(),
            title: "Meetup".to_owned(),
            capacity: 10,
            status: EventStatus::Published,
            starts_at,
            ends_at: starts_at + Duration::hours(1),
        }
    }

    #[rstest]
    fn rejects_zero_capacity(draft: EventDraft) {
        let result = Event::new(EventDraft {
            capacity: 0,
            ..draft
        });
        assert_eq!(result, Err(EventValidationError::ZeroCapacity));
    }

    #[rstest]
    fn rejects_end_not_after_start(draft: EventDraft) {
        let result = Event::new(EventDraft {
            ends_at: draft.starts_at,
            ..draft
        });
        assert_eq!(result, Err(EventValidationError::EndsBeforeStart));
    }

    #[rstest]
    fn rejects_blank_and_long_titles(draft: EventDraft) {
        let blank = Event::new(EventDraft {
            title: "  ".to_owned(),
            ..draft.clone()
        });
        assert_eq!(blank, Err(EventValidationError::EmptyTitle));

        let long = Event::new(EventDraft {
            title: "x".repeat(EVENT_TITLE_MAX + 1),
            ..draft
        });
        assert_eq!(
            long,
            Err(EventValidationError::TitleTooLong {
                max: EVENT_TITLE_MAX
            })
        );
    }

    #[rstest]
    #[case(EventStatus::Draft, false)]
    #[case(EventStatus::Published, true)]
    #[case(EventStatus::Cancelled, false)]
    fn only_published_events_are_open(
        draft: EventDraft,
        #[case] status: EventStatus,
        #[case] open: bool,
    ) {
        let event = Event::new(EventDraft { status, ..draft }).expect("valid event");
        assert_eq!(event.is_open_for_registration(), open);
    }

    #[rstest]
    #[case("draft", EventStatus::Draft)]
    #[case("published", EventStatus::Published)]
    #[case("cancelled", EventStatus::Cancelled)]
    fn status_round_trips_through_strings(#[case] raw: &str, #[case] status: EventStatus) {
        assert_eq!(raw.parse::<EventStatus>(), Ok(status));
        assert_eq!(status.to_string(), raw);
    }

    #[rstest]
    fn status_rejects_unknown_values() {
        assert!("archived".parse::<EventStatus>().is_err());
    }
}
