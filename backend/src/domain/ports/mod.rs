//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod dispatch_metrics;
mod event_repository;
mod notification_command;
mod notification_delivery;
mod notification_query;
mod notification_queue;
mod notification_repository;
mod recipient_directory;
mod registration_command;
mod registration_notifier;
mod registration_query;
mod registration_repository;

#[cfg(test)]
pub use dispatch_metrics::MockDispatchMetrics;
pub use dispatch_metrics::{
    DispatchMetrics, DispatchMetricsError, DispatchOutcome, NoOpDispatchMetrics,
};
#[cfg(test)]
pub use event_repository::MockEventRepository;
pub use event_repository::{EventRepository, EventRepositoryError};
#[cfg(test)]
pub use notification_command::MockNotificationCommand;
pub use notification_command::{NotificationCommand, SendNotificationRequest};
#[cfg(test)]
pub use notification_delivery::MockNotificationDelivery;
pub use notification_delivery::{DeliveryError, NotificationDelivery};
#[cfg(test)]
pub use notification_query::MockNotificationQuery;
pub use notification_query::NotificationQuery;
#[cfg(test)]
pub use notification_queue::MockNotificationQueue;
pub use notification_queue::{DropReason, NotificationQueue, SubmitOutcome};
#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
pub use notification_repository::{NotificationRepository, NotificationRepositoryError};
#[cfg(test)]
pub use recipient_directory::MockRecipientDirectory;
pub use recipient_directory::{RecipientDirectory, RecipientDirectoryError, push_topic_for};
#[cfg(test)]
pub use registration_command::MockRegistrationCommand;
pub use registration_command::RegistrationCommand;
#[cfg(test)]
pub use registration_notifier::MockRegistrationNotifier;
pub use registration_notifier::{RegistrationNotifier, SilentRegistrationNotifier};
#[cfg(test)]
pub use registration_query::MockRegistrationQuery;
pub use registration_query::RegistrationQuery;
#[cfg(test)]
pub use registration_repository::MockRegistrationRepository;
pub use registration_repository::{RegistrationRepository, RegistrationRepositoryError};
