//! Notification HTTP handlers.
//!
//! ```text
//! POST  /api/v1/notifications
//! GET   /api/v1/notifications
//! PATCH /api/v1/notifications/{notification_id}/read
//! ```
//!
//! Sending returns `202 Accepted` once the notification is stored; delivery
//! happens later on the dispatcher and may be dropped under load.

use actix_web::{HttpResponse, get, patch, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Notification;
use crate::domain::ports::SendNotificationRequest;
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, missing_field_error, parse_channel, parse_notification_id,
};

/// Request payload for sending a notification to the caller.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationBody {
    /// Short heading, at most 255 characters.
    pub title: Option<String>,
    /// Notification body.
    pub message: Option<String>,
    /// `email` (default), `sms` or `push`.
    pub channel: Option<String>,
}

/// Response payload for a notification.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    /// Notification identifier.
    pub id: String,
    /// Recipient identifier.
    pub user_id: String,
    /// Short heading.
    pub title: String,
    /// Notification body.
    pub message: String,
    /// Whether the recipient has read it.
    pub read: bool,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl From<Notification> for NotificationResponse {
    fn from(value: Notification) -> Self {
        Self {
            id: value.id().to_string(),
            user_id: value.user_id().to_string(),
            title: value.title().to_owned(),
            message: value.message().to_owned(),
            read: value.is_read(),
            created_at: value.created_at().to_rfc3339(),
        }
    }
}

/// Send a notification to the authenticated user.
#[utoipa::path(
    post,
    path = "/api/v1/notifications",
    request_body = SendNotificationBody,
    responses(
        (status = 202, description = "Notification stored; delivery queued", body = NotificationResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Notification store unavailable", body = ErrorSchema)
    ),
    tags = ["notifications"],
    operation_id = "sendNotification"
)]
#[post("/notifications")]
pub async fn send(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SendNotificationBody>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let SendNotificationBody {
        title,
        message,
        channel,
    } = payload.into_inner();
    let title = title.ok_or_else(|| missing_field_error(FieldName::new("title")))?;
    let message = message.ok_or_else(|| missing_field_error(FieldName::new("message")))?;
    let channel = parse_channel(channel.as_deref(), FieldName::new("channel"))?;

    let notification = state
        .notifications
        .send(SendNotificationRequest {
            user_id,
            title,
            message,
            channel,
        })
        .await?;
    Ok(HttpResponse::Accepted().json(NotificationResponse::from(notification)))
}

/// List the authenticated user's notifications, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    responses(
        (status = 200, description = "Notifications", body = [NotificationResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["notifications"],
    operation_id = "listNotifications"
)]
#[get("/notifications")]
pub async fn list(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<NotificationResponse>>> {
    let user_id = session.require_user_id()?;
    let notifications = state.notifications_query.list(&user_id).await?;
    Ok(web::Json(
        notifications
            .into_iter()
            .map(NotificationResponse::from)
            .collect(),
    ))
}

/// Mark one of the authenticated user's notifications as read.
#[utoipa::path(
    patch,
    path = "/api/v1/notifications/{notification_id}/read",
    params(("notification_id" = String, Path, description = "Notification identifier")),
    responses(
        (status = 204, description = "Notification marked as read"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Notification not found", body = ErrorSchema)
    ),
    tags = ["notifications"],
    operation_id = "markNotificationRead"
)]
#[patch("/notifications/{notification_id}/read")]
pub async fn mark_read(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let notification_id =
        parse_notification_id(&path.into_inner(), FieldName::new("notificationId"))?;
    state
        .notifications
        .mark_as_read(&user_id, &notification_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use chrono::Utc;
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::ports::{
        MockNotificationCommand, MockNotificationQuery, MockRegistrationCommand,
        MockRegistrationQuery,
    };
    use crate::domain::{DeliveryChannel, Error, NotificationDraft, NotificationId};
    use crate::inbound::http::test_utils::{session_cookie_for, test_session_middleware};

    const USER: &str = "33333333-3333-3333-3333-333333333333";

    fn state(command: MockNotificationCommand, query: MockNotificationQuery) -> HttpState {
        HttpState::new(
            Arc::new(MockRegistrationCommand::new()),
            Arc::new(MockRegistrationQuery::new()),
            Arc::new(command),
            Arc::new(query),
        )
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .wrap(test_session_middleware())
                    .service(send)
                    .service(list)
                    .service(mark_read),
            )
            .await
        };
    }

    fn notification_for(request: &SendNotificationRequest) -> Notification {
        Notification::new(NotificationDraft {
            id: NotificationId::random(),
            user_id: request.user_id.clone(),
            title: request.title.clone(),
            message: request.message.clone(),
            read: false,
            created_at: Utc::now(),
        })
        .expect("valid notification")
    }

    #[rstest]
    #[actix_web::test]
    async fn send_accepts_and_echoes_the_notification() {
        let mut command = MockNotificationCommand::new();
        command
            .expect_send()
            .withf(|request| {
                request.user_id.as_ref() == USER && request.channel == DeliveryChannel::Sms
            })
            .times(1)
            .returning(|request| Ok(notification_for(&request)));
        let app = app!(state(command, MockNotificationQuery::new()));

        let req = test::TestRequest::post()
            .uri("/notifications")
            .cookie(session_cookie_for(USER).await)
            .set_json(json!({ "title": "Doors open", "message": "18:00", "channel": "sms" }))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::ACCEPTED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["title"], "Doors open");
        assert_eq!(body["read"], false);
    }

    #[rstest]
    #[case(json!({ "message": "body" }), "title")]
    #[case(json!({ "title": "t" }), "message")]
    #[case(json!({ "title": "t", "message": "m", "channel": "pigeon" }), "channel")]
    #[actix_web::test]
    async fn send_rejects_invalid_payloads(#[case] payload: Value, #[case] field: &str) {
        let mut command = MockNotificationCommand::new();
        command.expect_send().never();
        let app = app!(state(command, MockNotificationQuery::new()));

        let req = test::TestRequest::post()
            .uri("/notifications")
            .cookie(session_cookie_for(USER).await)
            .set_json(payload)
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["details"]["field"], field);
    }

    #[rstest]
    #[actix_web::test]
    async fn list_returns_the_callers_notifications() {
        let mut query = MockNotificationQuery::new();
        query
            .expect_list()
            .withf(|user| user.as_ref() == USER)
            .returning(|user| {
                Ok(vec![notification_for(&SendNotificationRequest {
                    user_id: user.clone(),
                    title: "One".to_owned(),
                    message: "first".to_owned(),
                    channel: DeliveryChannel::Email,
                })])
            });
        let app = app!(state(MockNotificationCommand::new(), query));

        let req = test::TestRequest::get()
            .uri("/notifications")
            .cookie(session_cookie_for(USER).await)
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body[0]["userId"], USER);
    }

    #[rstest]
    #[case(Ok(()), StatusCode::NO_CONTENT)]
    #[case(Err(Error::not_found("notification not found")), StatusCode::NOT_FOUND)]
    #[actix_web::test]
    async fn mark_read_maps_outcomes(
        #[case] outcome: Result<(), Error>,
        #[case] expected: StatusCode,
    ) {
        let mut command = MockNotificationCommand::new();
        command
            .expect_mark_as_read()
            .return_once(move |_, _| outcome);
        let app = app!(state(command, MockNotificationQuery::new()));

        let req = test::TestRequest::patch()
            .uri(&format!("/notifications/{}/read", NotificationId::random()))
            .cookie(session_cookie_for(USER).await)
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), expected);
    }

    #[rstest]
    #[actix_web::test]
    async fn mark_read_requires_a_session() {
        let app = app!(state(
            MockNotificationCommand::new(),
            MockNotificationQuery::new()
        ));

        let req = test::TestRequest::patch()
            .uri(&format!("/notifications/{}/read", NotificationId::random()))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
