//! Port for reading and seeding events.
//!
//! Event authoring is owned by the organizer tooling; the registration flow
//! only looks events up. `create` exists for seeding and tests.

use async_trait::async_trait;

use crate::domain::{Event, EventId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by event repository adapters.
    pub enum EventRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "event repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "event repository query failed: {message}",
    }
}

/// Port for event lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Find an event by id.
    async fn find_by_id(&self, event_id: &EventId) -> Result<Option<Event>, EventRepositoryError>;

    /// Persist a new event.
    async fn create(&self, event: &Event) -> Result<(), EventRepositoryError>;
}
