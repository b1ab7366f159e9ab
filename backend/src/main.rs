//! Eventhub entry-point: loads settings, migrates the database, wires the
//! services and runs the HTTP server until a shutdown signal arrives.

mod server;
mod settings;

use std::time::Duration;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use eventhub::domain::NotificationDispatcher;
use eventhub::inbound::http::health::HealthState;
use eventhub::inbound::http::session_config::{BuildMode, session_settings_from_env};
use eventhub::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};

use server::{DispatchSettings, ServerConfig, build_services, create_server};
use settings::AppSettings;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().wrap_err("failed to load settings")?;
    let env = DefaultEnv::new();
    let session = session_settings_from_env(&env, BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;

    let database_url = settings.database_url()?;
    run_pending_migrations(database_url).await?;
    let pool = DbPool::new(
        PoolConfig::new(database_url).with_max_size(settings.db_max_connections()),
    )
    .await
    .map_err(|err| eyre!("database pool: {}", err.into_message()))?;

    #[cfg(feature = "metrics")]
    let prometheus = server::metrics::build_prometheus();
    #[cfg(feature = "metrics")]
    let dispatch_metrics = server::metrics::dispatch_metrics(prometheus.as_ref());
    #[cfg(not(feature = "metrics"))]
    let dispatch_metrics = None;

    let services = build_services(
        &pool,
        DispatchSettings {
            queue_capacity: settings.notification_queue_capacity(),
            delivery_latency: settings.delivery_latency(),
        },
        dispatch_metrics,
    );
    services
        .dispatcher
        .start(settings.notification_workers())
        .wrap_err("failed to start notification dispatcher")?;

    let config = ServerConfig::new(session, settings.bind_addr()?);
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(prometheus);

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), services.http_state, config)?;
    let handle = server.handle();
    let server_task = actix_web::rt::spawn(server);

    wait_for_shutdown_signal().await?;
    info!("shutdown signal received");
    health_state.mark_unhealthy();
    handle.stop(true).await;
    match server_task.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(error = %err, "HTTP server stopped with an error"),
        Err(err) => warn!(error = %err, "HTTP server task ended abnormally"),
    }

    drain_dispatcher(&services.dispatcher, settings.shutdown_timeout()).await;
    info!("shutdown complete");
    Ok(())
}

/// Stop the dispatcher, giving queued jobs at most `timeout` to finish.
async fn drain_dispatcher(dispatcher: &NotificationDispatcher, timeout: Duration) {
    if tokio::time::timeout(timeout, dispatcher.stop()).await.is_err() {
        warn!(
            abandoned = dispatcher.stats().outstanding(),
            timeout_secs = timeout.as_secs(),
            "notification dispatcher did not drain in time; abandoning jobs"
        );
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate()).wrap_err("install SIGTERM handler")?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.wrap_err("listen for SIGINT")?,
        _ = terminate.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .wrap_err("listen for Ctrl-C")
}
