//! PostgreSQL-backed `RecipientDirectory` reading contact columns from
//! `users`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{RecipientDirectory, RecipientDirectoryError, push_topic_for};
use crate::domain::{DeliveryChannel, Destination, UserId};

use super::error_mapping::{DieselFailure, classify_diesel_error};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed recipient lookups.
#[derive(Clone)]
pub struct DieselRecipientDirectory {
    pool: DbPool,
}

impl DieselRecipientDirectory {
    /// Create a new directory with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> RecipientDirectoryError {
    RecipientDirectoryError::connection(error.into_message())
}

fn map_diesel_error(error: &diesel::result::Error) -> RecipientDirectoryError {
    match classify_diesel_error(error, "recipient directory") {
        DieselFailure::Connection(message) => RecipientDirectoryError::connection(message),
        DieselFailure::Contention(message)
        | DieselFailure::UniqueViolation(message)
        | DieselFailure::Other(message) => RecipientDirectoryError::query(message),
    }
}

/// Pick the address for `channel` from a user's contact columns.
fn destination_for(
    user_id: &UserId,
    channel: DeliveryChannel,
    email: String,
    phone: Option<String>,
) -> Option<Destination> {
    let address = match channel {
        DeliveryChannel::Email => Some(email),
        DeliveryChannel::Sms => phone,
        DeliveryChannel::Push => Some(push_topic_for(user_id)),
    }?;
    Some(Destination { channel, address })
}

#[async_trait]
impl RecipientDirectory for DieselRecipientDirectory {
    async fn resolve(
        &self,
        user_id: &UserId,
        channel: DeliveryChannel,
    ) -> Result<Option<Destination>, RecipientDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let contact = users::table
            .find(user_id.as_uuid())
            .select((users::email, users::phone))
            .first::<(String, Option<String>)>(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(&err))?;

        Ok(contact.and_then(|(email, phone)| destination_for(user_id, channel, email, phone)))
    }
}
