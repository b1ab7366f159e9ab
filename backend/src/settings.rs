//! Application settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `EVENTHUB_*` environment variables or a
//! config file; missing optional values fall back to the defaults below.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_NOTIFICATION_WORKERS: usize = 5;
const DEFAULT_NOTIFICATION_QUEUE_CAPACITY: usize = 100;
const DEFAULT_DELIVERY_LATENCY_MS: u64 = 2000;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Runtime configuration for the eventhub server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "EVENTHUB")]
pub struct AppSettings {
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// Number of notification delivery workers.
    pub notification_workers: Option<usize>,
    /// Bound on queued notification jobs.
    pub notification_queue_capacity: Option<usize>,
    /// Simulated delivery latency per job, in milliseconds.
    pub delivery_latency_ms: Option<u64>,
    /// Upper bound on draining the dispatcher during shutdown.
    pub shutdown_timeout_secs: Option<u64>,
    /// Maximum size of the database connection pool.
    pub db_max_connections: Option<u32>,
}

/// Settings that cannot be turned into a runnable configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("database_url is required (set EVENTHUB_DATABASE_URL)")]
    MissingDatabaseUrl,
    #[error("invalid bind_addr {value}: {message}")]
    InvalidBindAddr { value: String, message: String },
}

impl AppSettings {
    /// Return the configured database URL.
    ///
    /// # Errors
    ///
    /// Fails when no URL is configured or it is blank.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        self.database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(SettingsError::MissingDatabaseUrl)
    }

    /// Return the parsed bind address, falling back to the default.
    ///
    /// # Errors
    ///
    /// Fails when the configured value is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| {
            SettingsError::InvalidBindAddr {
                value: raw.to_owned(),
                message: err.to_string(),
            }
        })
    }

    pub fn notification_workers(&self) -> usize {
        self.notification_workers
            .unwrap_or(DEFAULT_NOTIFICATION_WORKERS)
    }

    pub fn notification_queue_capacity(&self) -> usize {
        self.notification_queue_capacity
            .unwrap_or(DEFAULT_NOTIFICATION_QUEUE_CAPACITY)
    }

    pub fn delivery_latency(&self) -> Duration {
        Duration::from_millis(
            self.delivery_latency_ms
                .unwrap_or(DEFAULT_DELIVERY_LATENCY_MS),
        )
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(
            self.shutdown_timeout_secs
                .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        )
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }
}
