//! PostgreSQL-backed `EventRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{EventRepository, EventRepositoryError};
use crate::domain::{Event, EventId};

use super::error_mapping::{DieselFailure, classify_diesel_error};
use super::models::{EventRow, NewEventRow};
use super::pool::{DbPool, PoolError};
use super::schema::events;

/// Diesel-backed event lookups.
#[derive(Clone)]
pub struct DieselEventRepository {
    pool: DbPool,
}

impl DieselEventRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> EventRepositoryError {
    EventRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: &diesel::result::Error) -> EventRepositoryError {
    match classify_diesel_error(error, "event repository") {
        DieselFailure::Connection(message) => EventRepositoryError::connection(message),
        DieselFailure::Contention(message)
        | DieselFailure::UniqueViolation(message)
        | DieselFailure::Other(message) => EventRepositoryError::query(message),
    }
}

#[async_trait]
impl EventRepository for DieselEventRepository {
    async fn find_by_id(&self, event_id: &EventId) -> Result<Option<Event>, EventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = events::table
            .find(event_id.as_uuid())
            .select(EventRow::as_select())
            .first::<EventRow>(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(&err))?;

        row.map(Event::try_from)
            .transpose()
            .map_err(|err| EventRepositoryError::query(err.to_string()))
    }

    async fn create(&self, event: &Event) -> Result<(), EventRepositoryError> {
        let capacity = i32::try_from(event.capacity())
            .map_err(|_| EventRepositoryError::query("capacity exceeds supported range"))?;
        let row = NewEventRow {
            id: *event.id().as_uuid(),
            organizer_id: *event.organizer_id().as_uuid(),
            title: event.title(),
            capacity,
            status: event.status().as_str(),
            starts_at: event.starts_at(),
            ends_at: event.ends_at(),
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(events::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        Ok(())
    }
}
