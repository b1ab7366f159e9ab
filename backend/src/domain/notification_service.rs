//! Notification domain service.
//!
//! Persists notifications, resolves where each one should be delivered and
//! hands the delivery to the [`NotificationQueue`]. The caller never waits
//! for delivery; a stored notification stays visible in-app even when the
//! delivery job is dropped or no destination exists.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    NotificationCommand, NotificationQuery, NotificationQueue, NotificationRepository,
    NotificationRepositoryError, RecipientDirectory, RegistrationNotifier,
    SendNotificationRequest, SubmitOutcome,
};
use crate::domain::{
    DeliveryChannel, Error, Event, Notification, NotificationDraft, NotificationId,
    NotificationJob, Registration, UserId,
};

/// Notification service implementing the notification driving ports and
/// the registration notifier.
#[derive(Clone)]
pub struct NotificationService<N, D> {
    notifications: Arc<N>,
    directory: Arc<D>,
    queue: Arc<dyn NotificationQueue>,
    clock: Arc<dyn Clock>,
}

impl<N, D> NotificationService<N, D> {
    /// Create a new service.
    pub fn new(
        notifications: Arc<N>,
        directory: Arc<D>,
        queue: Arc<dyn NotificationQueue>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            notifications,
            directory,
            queue,
            clock,
        }
    }
}

fn map_repository_error(error: NotificationRepositoryError) -> Error {
    match error {
        NotificationRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("notification repository unavailable: {message}"))
        }
        NotificationRepositoryError::Query { message } => {
            Error::internal(format!("notification repository error: {message}"))
        }
    }
}

impl<N, D> NotificationService<N, D>
where
    N: NotificationRepository,
    D: RecipientDirectory,
{
    async fn dispatch(&self, notification: &Notification, channel: DeliveryChannel) {
        let notification_id = notification.id();
        let user_id = notification.user_id();
        let destination = match self.directory.resolve(user_id, channel).await {
            Ok(Some(destination)) => destination,
            Ok(None) => {
                info!(%notification_id, %user_id, %channel, "no destination; in-app only");
                return;
            }
            Err(err) => {
                warn!(
                    %notification_id,
                    %user_id,
                    %channel,
                    error = %err,
                    "recipient lookup failed; skipping delivery"
                );
                return;
            }
        };

        let outcome = self.queue.submit(NotificationJob {
            notification: notification.clone(),
            destination,
        });
        if outcome == SubmitOutcome::Accepted {
            debug!(%notification_id, %channel, "delivery queued");
        }
    }
}

#[async_trait]
impl<N, D> NotificationCommand for NotificationService<N, D>
where
    N: NotificationRepository,
    D: RecipientDirectory,
{
    async fn send(&self, request: SendNotificationRequest) -> Result<Notification, Error> {
        let SendNotificationRequest {
            user_id,
            title,
            message,
            channel,
        } = request;

        let notification = Notification::new(NotificationDraft {
            id: NotificationId::random(),
            user_id,
            title,
            message,
            read: false,
            created_at: self.clock.utc(),
        })
        .map_err(|err| Error::invalid_request(err.to_string()))?;

        self.notifications
            .create(&notification)
            .await
            .map_err(map_repository_error)?;

        self.dispatch(&notification, channel).await;
        Ok(notification)
    }

    async fn mark_as_read(
        &self,
        user_id: &UserId,
        notification_id: &NotificationId,
    ) -> Result<(), Error> {
        let updated = self
            .notifications
            .mark_as_read(user_id, notification_id)
            .await
            .map_err(map_repository_error)?;
        if updated {
            Ok(())
        } else {
            Err(Error::not_found("notification not found"))
        }
    }
}

#[async_trait]
impl<N, D> NotificationQuery for NotificationService<N, D>
where
    N: NotificationRepository,
    D: RecipientDirectory,
{
    async fn list(&self, user_id: &UserId) -> Result<Vec<Notification>, Error> {
        self.notifications
            .list_for_user(user_id)
            .await
            .map_err(map_repository_error)
    }
}

#[async_trait]
impl<N, D> RegistrationNotifier for NotificationService<N, D>
where
    N: NotificationRepository,
    D: RecipientDirectory,
{
    async fn registration_confirmed(
        &self,
        registration: &Registration,
        event: &Event,
    ) -> Result<(), Error> {
        self.send(SendNotificationRequest {
            user_id: registration.user_id.clone(),
            title: "Registration confirmed".to_owned(),
            message: format!("You are registered for {}.", event.title()),
            channel: DeliveryChannel::Email,
        })
        .await
        .map(|_| ())
    }
}
