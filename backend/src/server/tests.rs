//! Tests for application assembly.

use std::sync::Arc;

use actix_web::cookie::{Key, SameSite};
use actix_web::http::StatusCode;
use actix_web::test;
use chrono::Utc;
use rstest::rstest;

use eventhub::domain::ports::SilentRegistrationNotifier;
use eventhub::domain::{
    DispatcherConfig, NotificationDispatcher, NotificationService, RegistrationService,
    TRACE_ID_HEADER,
};
use eventhub::outbound::delivery::{ChannelRouter, SimulatedDelivery};
use eventhub::test_support::{InMemoryStore, MutableClock};

use super::{AppDependencies, HealthState, HttpState, SessionSettings, build_app, web};

const SESSION_KEY: [u8; 64] = [3; 64];

fn http_state() -> HttpState {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(MutableClock::new(Utc::now()));
    let delivery = ChannelRouter::new()
        .with_all_channels(Arc::new(SimulatedDelivery::new(std::time::Duration::ZERO)));
    let dispatcher = Arc::new(NotificationDispatcher::new(
        Arc::new(delivery),
        DispatcherConfig { queue_capacity: 4 },
    ));
    let notifications = Arc::new(NotificationService::new(
        Arc::clone(&store),
        Arc::clone(&store),
        dispatcher,
        clock.clone(),
    ));
    let registrations = Arc::new(RegistrationService::new(
        Arc::clone(&store),
        store,
        Arc::new(SilentRegistrationNotifier),
        clock,
    ));
    HttpState::new(
        registrations.clone(),
        registrations,
        notifications.clone(),
        notifications,
    )
}

fn dependencies(health_state: web::Data<HealthState>) -> AppDependencies {
    AppDependencies {
        health_state,
        http_state: web::Data::new(http_state()),
        session: SessionSettings {
            key: Key::from(&SESSION_KEY),
            cookie_secure: false,
            same_site: SameSite::Lax,
        },
    }
}

#[rstest]
#[actix_web::test]
async fn probes_follow_health_state_and_carry_trace_ids() {
    let health_state = web::Data::new(HealthState::new());
    let app = test::init_service(build_app(dependencies(health_state.clone()))).await;

    let live = test::call_service(&app, test::TestRequest::get().uri("/health/live").to_request())
        .await;
    assert_eq!(live.status(), StatusCode::OK);
    assert!(live.headers().contains_key(TRACE_ID_HEADER));

    let not_ready =
        test::call_service(&app, test::TestRequest::get().uri("/health/ready").to_request())
            .await;
    assert_eq!(not_ready.status(), StatusCode::SERVICE_UNAVAILABLE);

    health_state.mark_ready();
    let ready =
        test::call_service(&app, test::TestRequest::get().uri("/health/ready").to_request())
            .await;
    assert_eq!(ready.status(), StatusCode::OK);
}

#[rstest]
#[case("/api/v1/users/me/registrations")]
#[case("/api/v1/notifications")]
#[actix_web::test]
async fn api_routes_require_a_session(#[case] uri: &str) {
    let health_state = web::Data::new(HealthState::new());
    let app = test::init_service(build_app(dependencies(health_state))).await;

    let res = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[actix_web::test]
async fn cloned_dependencies_build_independent_apps() {
    let deps = dependencies(web::Data::new(HealthState::new()));
    let first = test::init_service(build_app(deps.clone())).await;
    let second = test::init_service(build_app(deps)).await;

    for app in [&first, &second] {
        let res =
            test::call_service(app, test::TestRequest::get().uri("/health/live").to_request())
                .await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
