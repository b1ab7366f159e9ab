//! Listener and cookie settings handed to [`create_server`](super::create_server).

use std::net::SocketAddr;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;
use eventhub::inbound::http::session_config::SessionSettings;

/// Everything the HTTP server needs beyond the application state.
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) bind_addr: SocketAddr,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Listen on `bind_addr` and read session cookies according to `session`.
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr) -> Self {
        Self {
            session,
            bind_addr,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Wrap every request in the Prometheus middleware, when one was built.
    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn with_metrics(self, prometheus: Option<PrometheusMetrics>) -> Self {
        Self { prometheus, ..self }
    }
}
