//! Diesel row types and their conversion into domain values.
//!
//! Rows are internal to the persistence adapters; only domain types cross
//! the port boundary.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Event, EventDraft, EventId, Notification, NotificationDraft, NotificationId, Registration,
    RegistrationId, RegistrationStatus, UserId,
};

use super::schema::{events, notifications, registrations};

/// A stored row that no longer satisfies domain invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {table} row {id}: {reason}")]
pub(crate) struct RowMappingError {
    table: &'static str,
    id: Uuid,
    reason: String,
}

impl RowMappingError {
    fn new(table: &'static str, id: Uuid, reason: impl ToString) -> Self {
        Self {
            table,
            id,
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EventRow {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub capacity: i32,
    pub status: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = RowMappingError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let capacity =
            u32::try_from(row.capacity).map_err(|err| RowMappingError::new("events", id, err))?;
        let status = row
            .status
            .parse()
            .map_err(|err| RowMappingError::new("events", id, err))?;
        Self::new(EventDraft {
            id: EventId::from_uuid(id),
            organizer_id: UserId::from_uuid(row.organizer_id),
            title: row.title,
            capacity,
            status,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
        })
        .map_err(|err| RowMappingError::new("events", id, err))
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = events)]
pub(crate) struct NewEventRow<'a> {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: &'a str,
    pub capacity: i32,
    pub status: &'a str,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = registrations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RegistrationRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub registered_at: DateTime<Utc>,
    pub checked_in_at: Option<DateTime<Utc>>,
}

impl RegistrationRow {
    pub(crate) fn parsed_status(&self) -> Result<RegistrationStatus, RowMappingError> {
        self.status
            .parse()
            .map_err(|err| RowMappingError::new("registrations", self.id, err))
    }
}

impl TryFrom<RegistrationRow> for Registration {
    type Error = RowMappingError;

    fn try_from(row: RegistrationRow) -> Result<Self, Self::Error> {
        let status = row.parsed_status()?;
        Ok(Self {
            id: RegistrationId::from_uuid(row.id),
            event_id: EventId::from_uuid(row.event_id),
            user_id: UserId::from_uuid(row.user_id),
            status,
            registered_at: row.registered_at,
            checked_in_at: row.checked_in_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = registrations)]
pub(crate) struct NewRegistrationRow<'a> {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: &'a str,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = RowMappingError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let id = row.id;
        Self::new(NotificationDraft {
            id: NotificationId::from_uuid(id),
            user_id: UserId::from_uuid(row.user_id),
            title: row.title,
            message: row.message,
            read: row.read,
            created_at: row.created_at,
        })
        .map_err(|err| RowMappingError::new("notifications", id, err))
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = notifications)]
pub(crate) struct NewNotificationRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: &'a str,
    pub message: &'a str,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a Notification> for NewNotificationRow<'a> {
    fn from(notification: &'a Notification) -> Self {
        Self {
            id: *notification.id().as_uuid(),
            user_id: *notification.user_id().as_uuid(),
            title: notification.title(),
            message: notification.message(),
            read: notification.is_read(),
            created_at: notification.created_at(),
        }
    }
}
