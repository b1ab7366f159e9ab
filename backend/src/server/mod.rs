//! HTTP server assembly: routes, session cookies and middleware order.

mod config;
#[cfg(feature = "metrics")]
pub(crate) mod metrics;
mod state_builders;

pub use config::ServerConfig;
pub use state_builders::{DispatchSettings, Services, build_services};

#[cfg(feature = "metrics")]
use metrics::MetricsLayer;

use actix_session::config::{CookieContentSecurity, PersistentSession};
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use eventhub::Trace;
#[cfg(debug_assertions)]
use eventhub::doc::ApiDoc;
use eventhub::inbound::http::health::{HealthState, live, ready};
use eventhub::inbound::http::notifications::{
    list as list_notifications, mark_read, send as send_notification,
};
use eventhub::inbound::http::registrations::{
    cancel, check_in, list_mine, list_registrants, register,
};
use eventhub::inbound::http::session_config::SessionSettings;
use eventhub::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

const SESSION_COOKIE: &str = "session";
const SESSION_TTL_HOURS: i64 = 2;

/// Cookie sessions are minted by the auth service; this side only reads them.
fn session_middleware(settings: &SessionSettings) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), settings.key.clone())
        .cookie_name(SESSION_COOKIE.to_owned())
        .cookie_path("/".to_owned())
        .cookie_secure(settings.cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(settings.same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(CookieDuration::hours(SESSION_TTL_HOURS)),
        )
        .build()
}

/// Versioned REST routes. Every one of them requires a session.
fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(cancel)
        .service(list_registrants)
        .service(check_in)
        .service(list_mine)
        .service(send_notification)
        .service(list_notifications)
        .service(mark_read);
}

/// Per-worker application inputs. Owned so each Actix worker gets its own
/// copy.
#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    session: SessionSettings,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        session,
    } = deps;

    let api = web::scope("/api/v1")
        .wrap(session_middleware(&session))
        .configure(api_routes);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Bind the HTTP listener and mark the service ready.
///
/// Signal handling is left to the caller so that shutdown can flip the
/// health probes and drain the notification dispatcher in order.
///
/// # Errors
/// Returns [`std::io::Error`] when the socket cannot be bound.
pub fn create_server(
    health_state: web::Data<HealthState>,
    http_state: HttpState,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        session,
        bind_addr,
        #[cfg(feature = "metrics")]
        prometheus,
    } = config;
    let http_state = web::Data::new(http_state);

    #[cfg(feature = "metrics")]
    let metrics_layer = MetricsLayer::from_option(prometheus);

    let deps = AppDependencies {
        health_state: health_state.clone(),
        http_state,
        session,
    };
    let server = HttpServer::new(move || {
        let app = build_app(deps.clone());

        #[cfg(feature = "metrics")]
        let app = app.wrap(metrics_layer.clone());

        app
    })
    .bind(bind_addr)?
    .disable_signals()
    .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests;
