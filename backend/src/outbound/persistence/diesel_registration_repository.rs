//! PostgreSQL-backed capacity ledger.
//!
//! Every capacity-checked write locks the event row with `SELECT ... FOR
//! UPDATE` before counting seat-holding registrations. Concurrent
//! registrations for one event therefore serialize on that lock in any
//! process sharing the database, while registrations for different events
//! proceed in parallel. The `(user_id, event_id)` unique constraint backs up
//! the per-pair invariant.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{RegistrationRepository, RegistrationRepositoryError};
use crate::domain::{EventId, RegistrantFilter, Registration, RegistrationStatus, UserId};

use super::error_mapping::{DieselFailure, classify_diesel_error};
use super::models::{NewRegistrationRow, RegistrationRow, RowMappingError};
use super::pool::{DbPool, PoolError};
use super::schema::{events, registrations};

/// Diesel-backed implementation of the capacity ledger.
#[derive(Clone)]
pub struct DieselRegistrationRepository {
    pool: DbPool,
}

impl DieselRegistrationRepository {
    /// Create a new ledger with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside a ledger transaction.
///
/// Business outcomes abort the transaction just like database errors so
/// that nothing is written when the capacity check fails.
#[derive(Debug)]
enum LedgerTxError {
    Domain(RegistrationRepositoryError),
    Database(diesel::result::Error),
}

impl From<diesel::result::Error> for LedgerTxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Database(error)
    }
}

impl From<RegistrationRepositoryError> for LedgerTxError {
    fn from(error: RegistrationRepositoryError) -> Self {
        Self::Domain(error)
    }
}

impl From<RowMappingError> for LedgerTxError {
    fn from(error: RowMappingError) -> Self {
        Self::Domain(RegistrationRepositoryError::query(error.to_string()))
    }
}

fn map_pool_error(error: PoolError) -> RegistrationRepositoryError {
    RegistrationRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: &diesel::result::Error) -> RegistrationRepositoryError {
    match classify_diesel_error(error, "registration repository") {
        DieselFailure::Connection(message) => RegistrationRepositoryError::connection(message),
        DieselFailure::Contention(message) => RegistrationRepositoryError::contention(message),
        // Only the (user_id, event_id) constraint can fire here.
        DieselFailure::UniqueViolation(_) => RegistrationRepositoryError::already_active(),
        DieselFailure::Other(message) => RegistrationRepositoryError::query(message),
    }
}

fn map_tx_error(error: LedgerTxError) -> RegistrationRepositoryError {
    match error {
        LedgerTxError::Domain(error) => error,
        LedgerTxError::Database(error) => map_diesel_error(&error),
    }
}

fn seat_holding_statuses() -> [&'static str; 2] {
    RegistrationStatus::SEAT_HOLDING.map(RegistrationStatus::as_str)
}

fn to_domain(rows: Vec<RegistrationRow>) -> Result<Vec<Registration>, RegistrationRepositoryError> {
    rows.into_iter()
        .map(Registration::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| RegistrationRepositoryError::query(err.to_string()))
}

/// Lock and fetch the pair's registration row.
async fn lock_pair(
    conn: &mut AsyncPgConnection,
    user_id: &UserId,
    event_id: &EventId,
) -> Result<Option<RegistrationRow>, diesel::result::Error> {
    registrations::table
        .filter(registrations::user_id.eq(user_id.as_uuid()))
        .filter(registrations::event_id.eq(event_id.as_uuid()))
        .select(RegistrationRow::as_select())
        .for_update()
        .first::<RegistrationRow>(conn)
        .await
        .optional()
}

async fn count_seats(
    conn: &mut AsyncPgConnection,
    event_id: &EventId,
) -> Result<i64, diesel::result::Error> {
    registrations::table
        .filter(registrations::event_id.eq(event_id.as_uuid()))
        .filter(registrations::status.eq_any(seat_holding_statuses()))
        .count()
        .get_result::<i64>(conn)
        .await
}

#[async_trait]
impl RegistrationRepository for DieselRegistrationRepository {
    async fn create_with_capacity_check(
        &self,
        registration: &Registration,
        capacity_limit: u32,
    ) -> Result<Registration, RegistrationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let registration = registration.clone();

        conn.transaction::<_, LedgerTxError, _>(|conn| {
            async move {
                let event_id = registration.event_id;
                let locked = events::table
                    .find(event_id.as_uuid())
                    .select(events::id)
                    .for_update()
                    .first::<uuid::Uuid>(conn)
                    .await
                    .optional()?;
                if locked.is_none() {
                    return Err(RegistrationRepositoryError::event_not_found().into());
                }

                let existing = lock_pair(conn, &registration.user_id, &event_id).await?;
                let existing_status = existing.as_ref().map(RegistrationRow::parsed_status);
                if let Some(status) = existing_status.transpose()? {
                    if status.is_active() {
                        return Err(RegistrationRepositoryError::already_active().into());
                    }
                }

                let seats = count_seats(conn, &event_id).await?;
                if seats >= i64::from(capacity_limit) {
                    debug!(%event_id, seats, capacity_limit, "event full");
                    return Err(RegistrationRepositoryError::event_full(capacity_limit).into());
                }

                let confirmed = RegistrationStatus::Confirmed.as_str();
                let stored = match existing {
                    Some(row) => {
                        diesel::update(registrations::table.find(row.id))
                            .set((
                                registrations::status.eq(confirmed),
                                registrations::registered_at.eq(registration.registered_at),
                                registrations::checked_in_at.eq(None::<DateTime<Utc>>),
                                registrations::updated_at.eq(registration.registered_at),
                            ))
                            .returning(RegistrationRow::as_returning())
                            .get_result::<RegistrationRow>(conn)
                            .await?
                    }
                    None => {
                        let row = NewRegistrationRow {
                            id: *registration.id.as_uuid(),
                            event_id: *event_id.as_uuid(),
                            user_id: *registration.user_id.as_uuid(),
                            status: confirmed,
                            registered_at: registration.registered_at,
                            updated_at: registration.registered_at,
                        };
                        diesel::insert_into(registrations::table)
                            .values(&row)
                            .returning(RegistrationRow::as_returning())
                            .get_result::<RegistrationRow>(conn)
                            .await?
                    }
                };
                Ok(Registration::try_from(stored)?)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error)
    }

    async fn find_by_user_and_event(
        &self,
        user_id: &UserId,
        event_id: &EventId,
    ) -> Result<Option<Registration>, RegistrationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = registrations::table
            .filter(registrations::user_id.eq(user_id.as_uuid()))
            .filter(registrations::event_id.eq(event_id.as_uuid()))
            .select(RegistrationRow::as_select())
            .first::<RegistrationRow>(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(&err))?;

        row.map(Registration::try_from)
            .transpose()
            .map_err(|err| RegistrationRepositoryError::query(err.to_string()))
    }

    async fn cancel(
        &self,
        user_id: &UserId,
        event_id: &EventId,
        at: DateTime<Utc>,
    ) -> Result<Registration, RegistrationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (user_id, event_id) = (user_id.clone(), *event_id);

        conn.transaction::<_, LedgerTxError, _>(|conn| {
            async move {
                let Some(row) = lock_pair(conn, &user_id, &event_id).await? else {
                    return Err(RegistrationRepositoryError::not_found().into());
                };
                match row.parsed_status()? {
                    RegistrationStatus::Cancelled => {
                        return Err(RegistrationRepositoryError::not_found().into());
                    }
                    RegistrationStatus::CheckedIn => {
                        return Err(RegistrationRepositoryError::invalid_transition(
                            RegistrationStatus::CheckedIn,
                        )
                        .into());
                    }
                    RegistrationStatus::Confirmed | RegistrationStatus::Waitlisted => {}
                }

                let stored = diesel::update(registrations::table.find(row.id))
                    .set((
                        registrations::status.eq(RegistrationStatus::Cancelled.as_str()),
                        registrations::updated_at.eq(at),
                    ))
                    .returning(RegistrationRow::as_returning())
                    .get_result::<RegistrationRow>(conn)
                    .await?;
                Ok(Registration::try_from(stored)?)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error)
    }

    async fn check_in(
        &self,
        user_id: &UserId,
        event_id: &EventId,
        at: DateTime<Utc>,
    ) -> Result<Registration, RegistrationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (user_id, event_id) = (user_id.clone(), *event_id);

        conn.transaction::<_, LedgerTxError, _>(|conn| {
            async move {
                let Some(row) = lock_pair(conn, &user_id, &event_id).await? else {
                    return Err(RegistrationRepositoryError::not_found().into());
                };
                let status = row.parsed_status()?;
                if status != RegistrationStatus::Confirmed {
                    return Err(RegistrationRepositoryError::invalid_transition(status).into());
                }

                let stored = diesel::update(registrations::table.find(row.id))
                    .set((
                        registrations::status.eq(RegistrationStatus::CheckedIn.as_str()),
                        registrations::checked_in_at.eq(Some(at)),
                        registrations::updated_at.eq(at),
                    ))
                    .returning(RegistrationRow::as_returning())
                    .get_result::<RegistrationRow>(conn)
                    .await?;
                Ok(Registration::try_from(stored)?)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error)
    }

    async fn list_for_event(
        &self,
        event_id: &EventId,
        filter: RegistrantFilter,
    ) -> Result<Vec<Registration>, RegistrationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = registrations::table
            .filter(registrations::event_id.eq(event_id.as_uuid()))
            .select(RegistrationRow::as_select())
            .order((registrations::registered_at.asc(), registrations::id.asc()))
            .into_boxed();
        if let Some(status) = filter.status() {
            query = query.filter(registrations::status.eq(status.as_str()));
        }

        let rows = query
            .load::<RegistrationRow>(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        to_domain(rows)
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Registration>, RegistrationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = registrations::table
            .filter(registrations::user_id.eq(user_id.as_uuid()))
            .select(RegistrationRow::as_select())
            .order((registrations::registered_at.desc(), registrations::id.desc()))
            .load::<RegistrationRow>(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        to_domain(rows)
    }

    async fn count_by_event(&self, event_id: &EventId) -> Result<u32, RegistrationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let seats = count_seats(&mut conn, event_id)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        u32::try_from(seats).map_err(|err| RegistrationRepositoryError::query(err.to_string()))
    }
}
