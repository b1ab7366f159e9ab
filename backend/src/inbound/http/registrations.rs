//! Registration HTTP handlers.
//!
//! ```text
//! POST   /api/v1/events/{event_id}/registrations
//! DELETE /api/v1/events/{event_id}/registrations
//! GET    /api/v1/events/{event_id}/registrants?status=
//! POST   /api/v1/events/{event_id}/registrants/{user_id}/check-in
//! GET    /api/v1/users/me/registrations
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::Registration;
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_event_id, parse_registrant_filter, parse_user_id,
};

const EVENT_ID: FieldName = FieldName::new("eventId");
const USER_ID: FieldName = FieldName::new("userId");
const STATUS: FieldName = FieldName::new("status");

/// Response payload for a registration.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    /// Registration identifier.
    pub id: String,
    /// Event the registration belongs to.
    pub event_id: String,
    /// Registrant identifier.
    pub user_id: String,
    /// `confirmed`, `cancelled`, `waitlisted` or `checked_in`.
    #[schema(example = "confirmed")]
    pub status: String,
    /// RFC 3339 timestamp of the latest registration.
    pub registered_at: String,
    /// RFC 3339 check-in timestamp, once checked in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_in_at: Option<String>,
}

impl From<Registration> for RegistrationResponse {
    fn from(value: Registration) -> Self {
        Self {
            id: value.id.to_string(),
            event_id: value.event_id.to_string(),
            user_id: value.user_id.to_string(),
            status: value.status.to_string(),
            registered_at: value.registered_at.to_rfc3339(),
            checked_in_at: value.checked_in_at.map(|at| at.to_rfc3339()),
        }
    }
}

fn to_responses(registrations: Vec<Registration>) -> Vec<RegistrationResponse> {
    registrations
        .into_iter()
        .map(RegistrationResponse::from)
        .collect()
}

/// Query string for registrant listings.
#[derive(Debug, Deserialize, IntoParams)]
pub struct RegistrantsQuery {
    /// One of `all`, `confirmed`, `cancelled`, `checked_in`.
    pub status: Option<String>,
}

/// Register the authenticated user for an event.
#[utoipa::path(
    post,
    path = "/api/v1/events/{event_id}/registrations",
    params(("event_id" = String, Path, description = "Event identifier")),
    responses(
        (status = 201, description = "Registration confirmed", body = RegistrationResponse),
        (status = 400, description = "Invalid event identifier", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Event not found", body = ErrorSchema),
        (status = 409, description = "Event full, unpublished or already registered", body = ErrorSchema),
        (status = 503, description = "Registration store unavailable", body = ErrorSchema)
    ),
    tags = ["registrations"],
    operation_id = "registerForEvent"
)]
#[post("/events/{event_id}/registrations")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let event_id = parse_event_id(&path.into_inner(), EVENT_ID)?;
    let registration = state.registrations.register(&user_id, &event_id).await?;
    Ok(HttpResponse::Created().json(RegistrationResponse::from(registration)))
}

/// Cancel the authenticated user's registration for an event.
#[utoipa::path(
    delete,
    path = "/api/v1/events/{event_id}/registrations",
    params(("event_id" = String, Path, description = "Event identifier")),
    responses(
        (status = 204, description = "Registration cancelled"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "No active registration", body = ErrorSchema),
        (status = 409, description = "Registration already checked in", body = ErrorSchema)
    ),
    tags = ["registrations"],
    operation_id = "cancelRegistration"
)]
#[delete("/events/{event_id}/registrations")]
pub async fn cancel(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let event_id = parse_event_id(&path.into_inner(), EVENT_ID)?;
    state.registrations.cancel(&user_id, &event_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// List an event's registrants. Organizer only.
#[utoipa::path(
    get,
    path = "/api/v1/events/{event_id}/registrants",
    params(
        ("event_id" = String, Path, description = "Event identifier"),
        RegistrantsQuery
    ),
    responses(
        (status = 200, description = "Registrants in registration order", body = [RegistrationResponse]),
        (status = 400, description = "Invalid status filter", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Caller does not organise the event", body = ErrorSchema),
        (status = 404, description = "Event not found", body = ErrorSchema)
    ),
    tags = ["registrations"],
    operation_id = "listEventRegistrants"
)]
#[get("/events/{event_id}/registrants")]
pub async fn list_registrants(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    query: web::Query<RegistrantsQuery>,
) -> ApiResult<web::Json<Vec<RegistrationResponse>>> {
    let organizer_id = session.require_user_id()?;
    let event_id = parse_event_id(&path.into_inner(), EVENT_ID)?;
    let filter = parse_registrant_filter(query.status.as_deref(), STATUS)?;
    let registrants = state
        .registrations_query
        .event_registrants(&organizer_id, &event_id, filter)
        .await?;
    Ok(web::Json(to_responses(registrants)))
}

/// Check an attendee in. Organizer only.
#[utoipa::path(
    post,
    path = "/api/v1/events/{event_id}/registrants/{user_id}/check-in",
    params(
        ("event_id" = String, Path, description = "Event identifier"),
        ("user_id" = String, Path, description = "Attendee identifier")
    ),
    responses(
        (status = 204, description = "Attendee checked in"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Caller does not organise the event", body = ErrorSchema),
        (status = 404, description = "Event or registration not found", body = ErrorSchema),
        (status = 409, description = "Registration is not confirmed", body = ErrorSchema)
    ),
    tags = ["registrations"],
    operation_id = "checkInAttendee"
)]
#[post("/events/{event_id}/registrants/{user_id}/check-in")]
pub async fn check_in(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let organizer_id = session.require_user_id()?;
    let (raw_event_id, raw_user_id) = path.into_inner();
    let event_id = parse_event_id(&raw_event_id, EVENT_ID)?;
    let attendee_id = parse_user_id(&raw_user_id, USER_ID)?;
    state
        .registrations
        .check_in(&organizer_id, &event_id, &attendee_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// List the authenticated user's registrations, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/registrations",
    responses(
        (status = 200, description = "Registrations", body = [RegistrationResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["registrations"],
    operation_id = "listMyRegistrations"
)]
#[get("/users/me/registrations")]
pub async fn list_mine(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<RegistrationResponse>>> {
    let user_id = session.require_user_id()?;
    let registrations = state.registrations_query.user_registrations(&user_id).await?;
    Ok(web::Json(to_responses(registrations)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use chrono::Utc;
    use rstest::rstest;
    use serde_json::Value;

    use super::*;
    use crate::domain::ports::{
        MockNotificationCommand, MockNotificationQuery, MockRegistrationCommand,
        MockRegistrationQuery,
    };
    use crate::domain::{EventId, RegistrantFilter, RegistrationError, UserId};
    use crate::inbound::http::test_utils::{session_cookie_for, test_session_middleware};

    const EVENT: &str = "11111111-1111-1111-1111-111111111111";
    const USER: &str = "22222222-2222-2222-2222-222222222222";

    fn state(command: MockRegistrationCommand, query: MockRegistrationQuery) -> HttpState {
        HttpState::new(
            Arc::new(command),
            Arc::new(query),
            Arc::new(MockNotificationCommand::new()),
            Arc::new(MockNotificationQuery::new()),
        )
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .wrap(test_session_middleware())
                    .service(register)
                    .service(cancel)
                    .service(list_registrants)
                    .service(check_in)
                    .service(list_mine),
            )
            .await
        };
    }

    fn registration() -> Registration {
        Registration::confirmed(
            EventId::new(EVENT).expect("event id"),
            UserId::new(USER).expect("user id"),
            Utc::now(),
        )
    }

    #[rstest]
    #[actix_web::test]
    async fn register_returns_created_registration() {
        let mut command = MockRegistrationCommand::new();
        command
            .expect_register()
            .withf(|user, event| user.as_ref() == USER && event.to_string() == EVENT)
            .times(1)
            .returning(|_, _| Ok(registration()));
        let app = app!(state(command, MockRegistrationQuery::new()));

        let req = test::TestRequest::post()
            .uri(&format!("/events/{EVENT}/registrations"))
            .cookie(session_cookie_for(USER).await)
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["status"], "confirmed");
        assert_eq!(body["eventId"], EVENT);
        assert!(body.get("checkedInAt").is_none());
    }

    #[rstest]
    #[actix_web::test]
    async fn register_requires_a_session() {
        let mut command = MockRegistrationCommand::new();
        command.expect_register().never();
        let app = app!(state(command, MockRegistrationQuery::new()));

        let req = test::TestRequest::post()
            .uri(&format!("/events/{EVENT}/registrations"))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[case(RegistrationError::EventFull { event_id: EventId::random() }, StatusCode::CONFLICT, "event_full")]
    #[case(RegistrationError::AlreadyRegistered { event_id: EventId::random() }, StatusCode::CONFLICT, "already_registered")]
    #[case(RegistrationError::EventNotFound { event_id: EventId::random() }, StatusCode::NOT_FOUND, "event_not_found")]
    #[case(RegistrationError::StorageUnavailable { message: "pool timeout".to_owned() }, StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable")]
    #[actix_web::test]
    async fn register_maps_failures_to_stable_codes(
        #[case] failure: RegistrationError,
        #[case] status: StatusCode,
        #[case] code: &str,
    ) {
        let mut command = MockRegistrationCommand::new();
        command
            .expect_register()
            .return_once(move |_, _| Err(failure));
        let app = app!(state(command, MockRegistrationQuery::new()));

        let req = test::TestRequest::post()
            .uri(&format!("/events/{EVENT}/registrations"))
            .cookie(session_cookie_for(USER).await)
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), status);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["details"]["code"], code);
    }

    #[rstest]
    #[actix_web::test]
    async fn invalid_event_id_is_rejected_before_the_port() {
        let mut command = MockRegistrationCommand::new();
        command.expect_cancel().never();
        let app = app!(state(command, MockRegistrationQuery::new()));

        let req = test::TestRequest::delete()
            .uri("/events/not-a-uuid/registrations")
            .cookie(session_cookie_for(USER).await)
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["details"]["field"], "eventId");
    }

    #[rstest]
    #[actix_web::test]
    async fn cancel_returns_no_content() {
        let mut command = MockRegistrationCommand::new();
        command.expect_cancel().times(1).returning(|_, _| Ok(()));
        let app = app!(state(command, MockRegistrationQuery::new()));

        let req = test::TestRequest::delete()
            .uri(&format!("/events/{EVENT}/registrations"))
            .cookie(session_cookie_for(USER).await)
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }

    #[rstest]
    #[case("", RegistrantFilter::All)]
    #[case("?status=checked_in", RegistrantFilter::CheckedIn)]
    #[actix_web::test]
    async fn registrants_pass_the_parsed_filter(
        #[case] query_string: &str,
        #[case] expected: RegistrantFilter,
    ) {
        let mut query = MockRegistrationQuery::new();
        query
            .expect_event_registrants()
            .withf(move |_, _, filter| *filter == expected)
            .times(1)
            .returning(|_, _, _| Ok(vec![registration()]));
        let app = app!(state(MockRegistrationCommand::new(), query));

        let req = test::TestRequest::get()
            .uri(&format!("/events/{EVENT}/registrants{query_string}"))
            .cookie(session_cookie_for(USER).await)
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));
    }

    #[rstest]
    #[actix_web::test]
    async fn registrants_reject_unknown_filter() {
        let mut query = MockRegistrationQuery::new();
        query.expect_event_registrants().never();
        let app = app!(state(MockRegistrationCommand::new(), query));

        let req = test::TestRequest::get()
            .uri(&format!("/events/{EVENT}/registrants?status=waitlisted"))
            .cookie(session_cookie_for(USER).await)
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[actix_web::test]
    async fn check_in_by_non_organizer_is_forbidden() {
        let mut command = MockRegistrationCommand::new();
        command
            .expect_check_in()
            .withf(|_, _, attendee| attendee.as_ref() == USER)
            .return_once(|_, _, _| Err(RegistrationError::Forbidden));
        let app = app!(state(command, MockRegistrationQuery::new()));

        let req = test::TestRequest::post()
            .uri(&format!("/events/{EVENT}/registrants/{USER}/check-in"))
            .cookie(session_cookie_for(USER).await)
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[rstest]
    #[actix_web::test]
    async fn list_mine_returns_the_callers_registrations() {
        let mut query = MockRegistrationQuery::new();
        query
            .expect_user_registrations()
            .withf(|user| user.as_ref() == USER)
            .returning(|_| Ok(vec![registration(), registration()]));
        let app = app!(state(MockRegistrationCommand::new(), query));

        let req = test::TestRequest::get()
            .uri("/users/me/registrations")
            .cookie(session_cookie_for(USER).await)
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body.as_array().map(Vec::len), Some(2));
    }
}
