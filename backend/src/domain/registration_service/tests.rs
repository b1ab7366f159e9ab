//! Tests for the registration coordinator.

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    MockEventRepository, MockRegistrationNotifier, MockRegistrationRepository,
    SilentRegistrationNotifier,
};
use crate::domain::{Error, EventDraft, EventStatus};

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

#[fixture]
fn organizer() -> UserId {
    UserId::random()
}

fn event_with(organizer: &UserId, status: EventStatus, capacity: u32) -> Event {
    let starts_at = fixture_now() + Duration::days(7);
    Event::new(EventDraft {
        id: EventId::random(),
        organizer_id: organizer.clone(),
        title: "Systems Meetup".to_owned(),
        capacity,
        status,
        starts_at,
        ends_at: starts_at + Duration::hours(3),
    })
    .expect("valid event")
}

fn events_returning(event: Option<Event>) -> MockEventRepository {
    let mut events = MockEventRepository::new();
    events
        .expect_find_by_id()
        .returning(move |_| Ok(event.clone()));
    events
}

fn make_service(
    events: MockEventRepository,
    registrations: MockRegistrationRepository,
) -> RegistrationService<MockEventRepository, MockRegistrationRepository> {
    make_service_with_notifier(events, registrations, Arc::new(SilentRegistrationNotifier))
}

fn make_service_with_notifier(
    events: MockEventRepository,
    registrations: MockRegistrationRepository,
    notifier: Arc<dyn RegistrationNotifier>,
) -> RegistrationService<MockEventRepository, MockRegistrationRepository> {
    RegistrationService::new(
        Arc::new(events),
        Arc::new(registrations),
        notifier,
        Arc::new(FixedClock(fixture_now())),
    )
}

fn registration_for(event: &Event, user_id: &UserId, status: RegistrationStatus) -> Registration {
    Registration {
        status,
        ..Registration::confirmed(event.id(), user_id.clone(), fixture_now())
    }
}

#[rstest]
#[tokio::test]
async fn register_rejects_missing_event() {
    let service = make_service(events_returning(None), MockRegistrationRepository::new());
    let event_id = EventId::random();

    let err = service
        .register(&UserId::random(), &event_id)
        .await
        .expect_err("missing event");

    assert_eq!(err, RegistrationError::EventNotFound { event_id });
}

#[rstest]
#[case(EventStatus::Draft)]
#[case(EventStatus::Cancelled)]
#[tokio::test]
async fn register_rejects_unpublished_event_regardless_of_capacity(
    organizer: UserId,
    #[case] status: EventStatus,
) {
    let event = event_with(&organizer, status, 500);
    let event_id = event.id();
    let mut registrations = MockRegistrationRepository::new();
    registrations.expect_create_with_capacity_check().never();
    let service = make_service(events_returning(Some(event)), registrations);

    let err = service
        .register(&UserId::random(), &event_id)
        .await
        .expect_err("unpublished event");

    assert_eq!(err, RegistrationError::EventNotPublished { event_id });
}

#[rstest]
#[case(RegistrationStatus::Confirmed)]
#[case(RegistrationStatus::Waitlisted)]
#[case(RegistrationStatus::CheckedIn)]
#[tokio::test]
async fn register_rejects_active_registration(
    organizer: UserId,
    #[case] status: RegistrationStatus,
) {
    let event = event_with(&organizer, EventStatus::Published, 10);
    let event_id = event.id();
    let user_id = UserId::random();
    let existing = registration_for(&event, &user_id, status);
    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_find_by_user_and_event()
        .return_once(move |_, _| Ok(Some(existing)));
    registrations.expect_create_with_capacity_check().never();
    let service = make_service(events_returning(Some(event)), registrations);

    let err = service
        .register(&user_id, &event_id)
        .await
        .expect_err("duplicate registration");

    assert_eq!(err, RegistrationError::AlreadyRegistered { event_id });
}

#[rstest]
#[tokio::test]
async fn register_allows_reregistration_after_cancel(organizer: UserId) {
    let event = event_with(&organizer, EventStatus::Published, 10);
    let event_id = event.id();
    let user_id = UserId::random();
    let previous = registration_for(&event, &user_id, RegistrationStatus::Cancelled);
    let revived_id = previous.id;
    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_find_by_user_and_event()
        .return_once(move |_, _| Ok(Some(previous)));
    registrations
        .expect_create_with_capacity_check()
        .times(1)
        .returning(move |candidate, _| {
            Ok(Registration {
                id: revived_id,
                ..candidate.clone()
            })
        });
    let service = make_service(events_returning(Some(event)), registrations);

    let registration = service
        .register(&user_id, &event_id)
        .await
        .expect("re-registration succeeds");

    assert_eq!(registration.id, revived_id);
    assert_eq!(registration.status, RegistrationStatus::Confirmed);
}

#[rstest]
#[tokio::test]
async fn register_passes_event_capacity_and_clock_to_ledger(organizer: UserId) {
    let event = event_with(&organizer, EventStatus::Published, 25);
    let event_id = event.id();
    let user_id = UserId::random();
    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_find_by_user_and_event()
        .return_once(|_, _| Ok(None));
    registrations
        .expect_create_with_capacity_check()
        .withf(|candidate, limit| *limit == 25 && candidate.registered_at == fixture_now())
        .times(1)
        .returning(|candidate, _| Ok(candidate.clone()));
    let service = make_service(events_returning(Some(event)), registrations);

    let registration = service
        .register(&user_id, &event_id)
        .await
        .expect("registration succeeds");

    assert_eq!(registration.user_id, user_id);
    assert_eq!(registration.event_id, event_id);
}

#[rstest]
#[case(RegistrationRepositoryError::event_full(1_u32), "event_full")]
#[case(RegistrationRepositoryError::already_active(), "already_registered")]
#[case(RegistrationRepositoryError::event_not_found(), "event_not_found")]
#[case(RegistrationRepositoryError::query("syntax error"), "storage_unavailable")]
#[tokio::test]
async fn register_maps_ledger_rejections(
    organizer: UserId,
    #[case] ledger_error: RegistrationRepositoryError,
    #[case] code: &str,
) {
    let event = event_with(&organizer, EventStatus::Published, 1);
    let event_id = event.id();
    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_find_by_user_and_event()
        .return_once(|_, _| Ok(None));
    registrations
        .expect_create_with_capacity_check()
        .times(1)
        .return_once(move |_, _| Err(ledger_error));
    let service = make_service(events_returning(Some(event)), registrations);

    let err = service
        .register(&UserId::random(), &event_id)
        .await
        .expect_err("ledger rejection");

    assert_eq!(err.code(), code);
}

#[rstest]
#[tokio::test]
async fn register_retries_transient_failure_once(organizer: UserId) {
    let event = event_with(&organizer, EventStatus::Published, 3);
    let event_id = event.id();
    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_find_by_user_and_event()
        .return_once(|_, _| Ok(None));
    let mut seq = mockall::Sequence::new();
    registrations
        .expect_create_with_capacity_check()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_, _| {
            Err(RegistrationRepositoryError::contention(
                "could not serialize access",
            ))
        });
    registrations
        .expect_create_with_capacity_check()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|candidate, _| Ok(candidate.clone()));
    let service = make_service(events_returning(Some(event)), registrations);

    let registration = service
        .register(&UserId::random(), &event_id)
        .await
        .expect("second attempt succeeds");

    assert_eq!(registration.status, RegistrationStatus::Confirmed);
}

#[rstest]
#[tokio::test]
async fn register_surfaces_storage_unavailable_after_second_transient_failure(
    organizer: UserId,
) {
    let event = event_with(&organizer, EventStatus::Published, 3);
    let event_id = event.id();
    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_find_by_user_and_event()
        .return_once(|_, _| Ok(None));
    registrations
        .expect_create_with_capacity_check()
        .times(2)
        .returning(|_, _| Err(RegistrationRepositoryError::connection("connection reset")));
    let service = make_service(events_returning(Some(event)), registrations);

    let err = service
        .register(&UserId::random(), &event_id)
        .await
        .expect_err("storage unavailable");

    assert!(matches!(err, RegistrationError::StorageUnavailable { .. }));
}

#[rstest]
#[case(RegistrationStatus::Confirmed, None)]
#[case(RegistrationStatus::CheckedIn, Some("already registered"))]
#[tokio::test]
async fn register_retry_rereads_pair_after_already_active(
    organizer: UserId,
    #[case] stored_status: RegistrationStatus,
    #[case] expected_error: Option<&str>,
) {
    let event = event_with(&organizer, EventStatus::Published, 3);
    let event_id = event.id();
    let user_id = UserId::random();
    let stored = registration_for(&event, &user_id, stored_status);
    let stored_id = stored.id;
    let mut registrations = MockRegistrationRepository::new();
    let mut lookups = mockall::Sequence::new();
    registrations
        .expect_find_by_user_and_event()
        .times(1)
        .in_sequence(&mut lookups)
        .return_once(|_, _| Ok(None));
    registrations
        .expect_find_by_user_and_event()
        .times(1)
        .in_sequence(&mut lookups)
        .return_once(move |_, _| Ok(Some(stored)));
    let mut attempts = mockall::Sequence::new();
    registrations
        .expect_create_with_capacity_check()
        .times(1)
        .in_sequence(&mut attempts)
        .return_once(|_, _| Err(RegistrationRepositoryError::connection("connection reset")));
    registrations
        .expect_create_with_capacity_check()
        .times(1)
        .in_sequence(&mut attempts)
        .return_once(|_, _| Err(RegistrationRepositoryError::already_active()));
    let service = make_service(events_returning(Some(event)), registrations);

    let outcome = service.register(&user_id, &event_id).await;

    match expected_error {
        None => {
            let registration = outcome.expect("committed row adopted");
            assert_eq!(registration.id, stored_id);
            assert_eq!(registration.status, RegistrationStatus::Confirmed);
        }
        Some(message) => {
            let err = outcome.expect_err("pair already active");
            assert_eq!(err, RegistrationError::AlreadyRegistered { event_id });
            assert!(err.to_string().contains(message));
        }
    }
}

#[rstest]
#[tokio::test]
async fn register_does_not_reread_when_first_attempt_reports_already_active(organizer: UserId) {
    let event = event_with(&organizer, EventStatus::Published, 3);
    let event_id = event.id();
    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_find_by_user_and_event()
        .times(1)
        .return_once(|_, _| Ok(None));
    registrations
        .expect_create_with_capacity_check()
        .times(1)
        .return_once(|_, _| Err(RegistrationRepositoryError::already_active()));
    let service = make_service(events_returning(Some(event)), registrations);

    let err = service
        .register(&UserId::random(), &event_id)
        .await
        .expect_err("duplicate");

    assert_eq!(err, RegistrationError::AlreadyRegistered { event_id });
}

#[rstest]
#[tokio::test]
async fn register_does_not_retry_event_full(organizer: UserId) {
    let event = event_with(&organizer, EventStatus::Published, 1);
    let event_id = event.id();
    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_find_by_user_and_event()
        .return_once(|_, _| Ok(None));
    registrations
        .expect_create_with_capacity_check()
        .times(1)
        .return_once(|_, _| Err(RegistrationRepositoryError::event_full(1_u32)));
    let service = make_service(events_returning(Some(event)), registrations);

    let err = service
        .register(&UserId::random(), &event_id)
        .await
        .expect_err("event full");

    assert_eq!(err, RegistrationError::EventFull { event_id });
}

#[rstest]
#[tokio::test]
async fn register_notifies_and_ignores_notifier_failure(organizer: UserId) {
    let event = event_with(&organizer, EventStatus::Published, 2);
    let event_id = event.id();
    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_find_by_user_and_event()
        .return_once(|_, _| Ok(None));
    registrations
        .expect_create_with_capacity_check()
        .returning(|candidate, _| Ok(candidate.clone()));
    let mut notifier = MockRegistrationNotifier::new();
    notifier
        .expect_registration_confirmed()
        .times(1)
        .returning(|_, _| Err(Error::service_unavailable("notification store down")));
    let service = make_service_with_notifier(
        events_returning(Some(event)),
        registrations,
        Arc::new(notifier),
    );

    let registration = service
        .register(&UserId::random(), &event_id)
        .await
        .expect("registration still succeeds");

    assert_eq!(registration.status, RegistrationStatus::Confirmed);
}

#[rstest]
#[tokio::test]
async fn register_retries_event_lookup_once_on_connection_failure(organizer: UserId) {
    let event = event_with(&organizer, EventStatus::Published, 2);
    let event_id = event.id();
    let mut events = MockEventRepository::new();
    let mut seq = mockall::Sequence::new();
    events
        .expect_find_by_id()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| Err(EventRepositoryError::connection("pool timeout")));
    events
        .expect_find_by_id()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(Some(event)));
    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_find_by_user_and_event()
        .return_once(|_, _| Ok(None));
    registrations
        .expect_create_with_capacity_check()
        .returning(|candidate, _| Ok(candidate.clone()));
    let service = make_service(events, registrations);

    service
        .register(&UserId::random(), &event_id)
        .await
        .expect("lookup retried");
}

#[rstest]
#[tokio::test]
async fn cancel_without_active_registration_is_not_found() {
    let event_id = EventId::random();
    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_cancel()
        .times(1)
        .return_once(|_, _, _| Err(RegistrationRepositoryError::not_found()));
    let service = make_service(MockEventRepository::new(), registrations);

    let err = service
        .cancel(&UserId::random(), &event_id)
        .await
        .expect_err("nothing to cancel");

    assert_eq!(err, RegistrationError::RegistrationNotFound { event_id });
}

#[rstest]
#[tokio::test]
async fn cancel_of_checked_in_attendee_is_invalid_transition() {
    let event_id = EventId::random();
    let mut registrations = MockRegistrationRepository::new();
    registrations.expect_cancel().return_once(|_, _, _| {
        Err(RegistrationRepositoryError::invalid_transition(
            RegistrationStatus::CheckedIn,
        ))
    });
    let service = make_service(MockEventRepository::new(), registrations);

    let err = service
        .cancel(&UserId::random(), &event_id)
        .await
        .expect_err("checked-in attendees stay");

    assert_eq!(
        err,
        RegistrationError::InvalidStateTransition {
            from: RegistrationStatus::CheckedIn,
            to: RegistrationStatus::Cancelled,
        }
    );
}

#[rstest]
#[tokio::test]
async fn cancel_succeeds_for_active_registration(organizer: UserId) {
    let event = event_with(&organizer, EventStatus::Published, 2);
    let event_id = event.id();
    let user_id = UserId::random();
    let cancelled = registration_for(&event, &user_id, RegistrationStatus::Cancelled);
    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_cancel()
        .withf(move |_, _, at| *at == fixture_now())
        .return_once(move |_, _, _| Ok(cancelled));
    let service = make_service(MockEventRepository::new(), registrations);

    service
        .cancel(&user_id, &event_id)
        .await
        .expect("cancel succeeds");
}

#[rstest]
#[tokio::test]
async fn check_in_requires_organizer(organizer: UserId) {
    let event = event_with(&organizer, EventStatus::Published, 2);
    let event_id = event.id();
    let mut registrations = MockRegistrationRepository::new();
    registrations.expect_check_in().never();
    let service = make_service(events_returning(Some(event)), registrations);

    let err = service
        .check_in(&UserId::random(), &event_id, &UserId::random())
        .await
        .expect_err("not the organizer");

    assert_eq!(err, RegistrationError::Forbidden);
}

#[rstest]
#[tokio::test]
async fn check_in_rejects_non_confirmed_registration(organizer: UserId) {
    let event = event_with(&organizer, EventStatus::Published, 2);
    let event_id = event.id();
    let mut registrations = MockRegistrationRepository::new();
    registrations.expect_check_in().return_once(|_, _, _| {
        Err(RegistrationRepositoryError::invalid_transition(
            RegistrationStatus::Cancelled,
        ))
    });
    let service = make_service(events_returning(Some(event)), registrations);

    let err = service
        .check_in(&organizer, &event_id, &UserId::random())
        .await
        .expect_err("cancelled registration");

    assert_eq!(
        err,
        RegistrationError::InvalidStateTransition {
            from: RegistrationStatus::Cancelled,
            to: RegistrationStatus::CheckedIn,
        }
    );
}

#[rstest]
#[tokio::test]
async fn check_in_moves_confirmed_attendee(organizer: UserId) {
    let event = event_with(&organizer, EventStatus::Published, 2);
    let event_id = event.id();
    let attendee = UserId::random();
    let checked_in = Registration {
        checked_in_at: Some(fixture_now()),
        ..registration_for(&event, &attendee, RegistrationStatus::CheckedIn)
    };
    let expected_attendee = attendee.clone();
    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_check_in()
        .withf(move |user, _, _| *user == expected_attendee)
        .return_once(move |_, _, _| Ok(checked_in));
    let service = make_service(events_returning(Some(event)), registrations);

    service
        .check_in(&organizer, &event_id, &attendee)
        .await
        .expect("check-in succeeds");
}

#[rstest]
#[tokio::test]
async fn event_registrants_is_organizer_only(organizer: UserId) {
    let event = event_with(&organizer, EventStatus::Published, 2);
    let event_id = event.id();
    let service = make_service(
        events_returning(Some(event)),
        MockRegistrationRepository::new(),
    );

    let err = service
        .event_registrants(&UserId::random(), &event_id, RegistrantFilter::All)
        .await
        .expect_err("not the organizer");

    assert_eq!(err, RegistrationError::Forbidden);
}

#[rstest]
#[tokio::test]
async fn event_registrants_forwards_filter(organizer: UserId) {
    let event = event_with(&organizer, EventStatus::Published, 2);
    let event_id = event.id();
    let row = registration_for(&event, &UserId::random(), RegistrationStatus::CheckedIn);
    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_list_for_event()
        .withf(|_, filter| *filter == RegistrantFilter::CheckedIn)
        .return_once(move |_, _| Ok(vec![row]));
    let service = make_service(events_returning(Some(event)), registrations);

    let listed = service
        .event_registrants(&organizer, &event_id, RegistrantFilter::CheckedIn)
        .await
        .expect("listing succeeds");

    assert_eq!(listed.len(), 1);
}

#[rstest]
#[tokio::test]
async fn user_registrations_maps_storage_errors() {
    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_list_for_user()
        .times(1)
        .return_once(|_| Err(RegistrationRepositoryError::query("relation missing")));
    let service = make_service(MockEventRepository::new(), registrations);

    let err = service
        .user_registrations(&UserId::random())
        .await
        .expect_err("storage error");

    assert_eq!(err.code(), "storage_unavailable");
}
