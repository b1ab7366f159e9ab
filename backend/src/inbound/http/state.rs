//! Shared HTTP adapter state.
//!
//! Handlers receive this state via `web::Data` so they depend only on
//! driving ports and stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    NotificationCommand, NotificationQuery, RegistrationCommand, RegistrationQuery,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Register, cancel and check in.
    pub registrations: Arc<dyn RegistrationCommand>,
    /// Registrant and "my registrations" listings.
    pub registrations_query: Arc<dyn RegistrationQuery>,
    /// Send and mark-as-read.
    pub notifications: Arc<dyn NotificationCommand>,
    /// Notification inbox.
    pub notifications_query: Arc<dyn NotificationQuery>,
}

impl HttpState {
    /// Bundle the driving ports.
    pub fn new(
        registrations: Arc<dyn RegistrationCommand>,
        registrations_query: Arc<dyn RegistrationQuery>,
        notifications: Arc<dyn NotificationCommand>,
        notifications_query: Arc<dyn NotificationQuery>,
    ) -> Self {
        Self {
            registrations,
            registrations_query,
            notifications,
            notifications_query,
        }
    }
}
