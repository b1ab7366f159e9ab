//! Tests for HTTP error mapping.

use actix_web::ResponseError;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::domain::{EventId, RegistrationError, RegistrationStatus};

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

async fn body_of(response: HttpResponse) -> Value {
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    serde_json::from_slice(&bytes).expect("error JSON")
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("no auth"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("taken"), StatusCode::CONFLICT)]
#[case(Error::service_unavailable("down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] err: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&err), status);
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted() {
    let error = Error::internal("db password rejected")
        .with_trace_id(TRACE_ID)
        .with_details(json!({"secret": "x"}));

    let response = error.error_response();
    assert_eq!(
        response
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|value| value.to_str().ok()),
        Some(TRACE_ID)
    );
    let body = body_of(response).await;

    assert_eq!(body["message"], "Internal server error");
    assert_eq!(body["traceId"], TRACE_ID);
    assert!(body.get("details").is_none());
}

#[rstest]
#[actix_web::test]
async fn client_errors_keep_details() {
    let error = Error::invalid_request("bad").with_details(json!({"field": "status"}));
    let body = body_of(error.error_response()).await;
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["field"], "status");
}

#[rstest]
#[case(RegistrationError::EventNotFound { event_id: EventId::random() }, StatusCode::NOT_FOUND, "event_not_found")]
#[case(RegistrationError::EventNotPublished { event_id: EventId::random() }, StatusCode::CONFLICT, "event_not_published")]
#[case(RegistrationError::EventFull { event_id: EventId::random() }, StatusCode::CONFLICT, "event_full")]
#[case(RegistrationError::Forbidden, StatusCode::FORBIDDEN, "forbidden")]
#[case(
    RegistrationError::InvalidStateTransition {
        from: RegistrationStatus::CheckedIn,
        to: RegistrationStatus::Cancelled,
    },
    StatusCode::CONFLICT,
    "invalid_state_transition"
)]
#[case(RegistrationError::StorageUnavailable { message: "pool".to_owned() }, StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable")]
#[actix_web::test]
async fn registration_errors_carry_stable_codes(
    #[case] error: RegistrationError,
    #[case] status: StatusCode,
    #[case] code: &str,
) {
    let response = Error::from(error).error_response();
    assert_eq!(response.status(), status);
    let body = body_of(response).await;
    assert_eq!(body["details"]["code"], code);
}
