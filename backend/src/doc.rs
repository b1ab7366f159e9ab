//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint from the inbound layer, the
//! error schema wrappers and the session cookie security scheme. The
//! document backs Swagger UI in debug builds and the `openapi-dump` binary.

use crate::inbound::http::notifications::{NotificationResponse, SendNotificationBody};
use crate::inbound::http::registrations::RegistrationResponse;
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Signed session cookie issued by the authentication service.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Eventhub API",
        description = "Event registration with capacity limits, check-in and user notifications.",
        license(name = "ISC", url = "https://opensource.org/license/isc-license-txt")
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::registrations::register,
        crate::inbound::http::registrations::cancel,
        crate::inbound::http::registrations::list_registrants,
        crate::inbound::http::registrations::check_in,
        crate::inbound::http::registrations::list_mine,
        crate::inbound::http::notifications::send,
        crate::inbound::http::notifications::list,
        crate::inbound::http::notifications::mark_read,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        RegistrationResponse,
        NotificationResponse,
        SendNotificationBody
    )),
    tags(
        (name = "registrations", description = "Event registration and check-in"),
        (name = "notifications", description = "User notifications"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
