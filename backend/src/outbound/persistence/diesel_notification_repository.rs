//! PostgreSQL-backed `NotificationRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{NotificationRepository, NotificationRepositoryError};
use crate::domain::{Notification, NotificationId, UserId};

use super::error_mapping::{DieselFailure, classify_diesel_error};
use super::models::{NewNotificationRow, NotificationRow};
use super::pool::{DbPool, PoolError};
use super::schema::notifications;

/// Diesel-backed notification store.
#[derive(Clone)]
pub struct DieselNotificationRepository {
    pool: DbPool,
}

impl DieselNotificationRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> NotificationRepositoryError {
    NotificationRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: &diesel::result::Error) -> NotificationRepositoryError {
    match classify_diesel_error(error, "notification repository") {
        DieselFailure::Connection(message) => NotificationRepositoryError::connection(message),
        DieselFailure::Contention(message)
        | DieselFailure::UniqueViolation(message)
        | DieselFailure::Other(message) => NotificationRepositoryError::query(message),
    }
}

#[async_trait]
impl NotificationRepository for DieselNotificationRepository {
    async fn create(&self, notification: &Notification) -> Result<(), NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(notifications::table)
            .values(NewNotificationRow::from(notification))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = notifications::table
            .filter(notifications::user_id.eq(user_id.as_uuid()))
            .order((notifications::created_at.desc(), notifications::id.desc()))
            .select(NotificationRow::as_select())
            .load::<NotificationRow>(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;

        rows.into_iter()
            .map(Notification::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| NotificationRepositoryError::query(err.to_string()))
    }

    async fn mark_as_read(
        &self,
        user_id: &UserId,
        notification_id: &NotificationId,
    ) -> Result<bool, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            notifications::table
                .filter(notifications::id.eq(notification_id.as_uuid()))
                .filter(notifications::user_id.eq(user_id.as_uuid())),
        )
        .set(notifications::read.eq(true))
        .execute(&mut conn)
        .await
        .map_err(|err| map_diesel_error(&err))?;
        Ok(updated > 0)
    }
}
