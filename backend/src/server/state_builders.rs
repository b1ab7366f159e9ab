//! Wiring of persistence adapters, domain services and the dispatcher into
//! the HTTP state.

use std::sync::Arc;
use std::time::Duration;

use mockable::{Clock, DefaultClock};

use eventhub::domain::ports::{DispatchMetrics, NotificationDelivery, NotificationQueue};
use eventhub::domain::{
    DispatcherConfig, NotificationDispatcher, NotificationService, RegistrationService,
};
use eventhub::inbound::http::state::HttpState;
use eventhub::outbound::delivery::{ChannelRouter, SimulatedDelivery};
use eventhub::outbound::persistence::{
    DbPool, DieselEventRepository, DieselNotificationRepository, DieselRecipientDirectory,
    DieselRegistrationRepository,
};

/// Dispatcher tuning taken from application settings.
#[derive(Debug, Clone, Copy)]
pub struct DispatchSettings {
    pub queue_capacity: usize,
    pub delivery_latency: Duration,
}

/// Everything the server and the shutdown path need.
pub struct Services {
    pub http_state: HttpState,
    pub dispatcher: Arc<NotificationDispatcher>,
}

/// Route every channel through the simulated delivery adapter.
fn build_delivery(latency: Duration) -> Arc<dyn NotificationDelivery> {
    Arc::new(ChannelRouter::new().with_all_channels(Arc::new(SimulatedDelivery::new(latency))))
}

/// Build the dispatcher and the services that feed it.
///
/// The dispatcher is returned stopped; the caller starts it once the
/// runtime is up.
pub fn build_services(
    pool: &DbPool,
    settings: DispatchSettings,
    metrics: Option<Arc<dyn DispatchMetrics>>,
) -> Services {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let dispatcher = NotificationDispatcher::new(
        build_delivery(settings.delivery_latency),
        DispatcherConfig {
            queue_capacity: settings.queue_capacity,
        },
    );
    let dispatcher = Arc::new(match metrics {
        Some(metrics) => dispatcher.with_metrics(metrics),
        None => dispatcher,
    });
    let queue: Arc<dyn NotificationQueue> = dispatcher.clone();

    let notifications = Arc::new(NotificationService::new(
        Arc::new(DieselNotificationRepository::new(pool.clone())),
        Arc::new(DieselRecipientDirectory::new(pool.clone())),
        queue,
        Arc::clone(&clock),
    ));
    let registrations = Arc::new(RegistrationService::new(
        Arc::new(DieselEventRepository::new(pool.clone())),
        Arc::new(DieselRegistrationRepository::new(pool.clone())),
        notifications.clone(),
        clock,
    ));

    Services {
        http_state: HttpState::new(
            registrations.clone(),
            registrations,
            notifications.clone(),
            notifications,
        ),
        dispatcher,
    }
}
