//! In-memory store implementing the persistence ports.
//!
//! Every operation runs under one lock, so the capacity check and the write
//! in [`RegistrationRepository::create_with_capacity_check`] are atomic for
//! all callers sharing the store. The lock is never held across an await.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    EventRepository, EventRepositoryError, NotificationRepository, NotificationRepositoryError,
    RecipientDirectory, RecipientDirectoryError, RegistrationRepository,
    RegistrationRepositoryError, push_topic_for,
};
use crate::domain::{
    DeliveryChannel, Destination, Event, EventId, Notification, NotificationId, RegistrantFilter,
    Registration, RegistrationStatus, User, UserId,
};

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    events: HashMap<EventId, Event>,
    registrations: HashMap<(UserId, EventId), Registration>,
    notifications: Vec<Notification>,
    injected_failures: Vec<RegistrationRepositoryError>,
}

impl State {
    fn take_injected_failure(&mut self) -> Result<(), RegistrationRepositoryError> {
        match self.injected_failures.pop() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn seats_taken(&self, event_id: &EventId) -> usize {
        self.registrations
            .values()
            .filter(|registration| {
                registration.event_id == *event_id && registration.status.occupies_seat()
            })
            .count()
    }
}

/// Shared in-memory backing store for tests.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add or replace a user.
    pub fn insert_user(&self, user: User) {
        self.lock().users.insert(user.id().clone(), user);
    }

    /// Add or replace an event.
    pub fn insert_event(&self, event: Event) {
        self.lock().events.insert(event.id(), event);
    }

    /// Make the next ledger calls fail with `errors`, one per call, in order.
    pub fn fail_ledger_with(&self, errors: impl IntoIterator<Item = RegistrationRepositoryError>) {
        let mut state = self.lock();
        let mut errors: Vec<_> = errors.into_iter().collect();
        errors.reverse();
        errors.append(&mut state.injected_failures);
        state.injected_failures = errors;
    }

    /// Number of seat-holding registrations for `event_id`.
    pub fn seats_taken(&self, event_id: &EventId) -> usize {
        self.lock().seats_taken(event_id)
    }

    /// Every registration stored for `event_id`, in no particular order.
    pub fn registrations_for(&self, event_id: &EventId) -> Vec<Registration> {
        self.lock()
            .registrations
            .values()
            .filter(|registration| registration.event_id == *event_id)
            .cloned()
            .collect()
    }

    /// Every stored notification, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().notifications.clone()
    }
}

#[async_trait]
impl EventRepository for InMemoryStore {
    async fn find_by_id(&self, event_id: &EventId) -> Result<Option<Event>, EventRepositoryError> {
        Ok(self.lock().events.get(event_id).cloned())
    }

    async fn create(&self, event: &Event) -> Result<(), EventRepositoryError> {
        let mut state = self.lock();
        if state.events.contains_key(&event.id()) {
            return Err(EventRepositoryError::query("event already exists"));
        }
        state.events.insert(event.id(), event.clone());
        Ok(())
    }
}

#[async_trait]
impl RegistrationRepository for InMemoryStore {
    async fn create_with_capacity_check(
        &self,
        registration: &Registration,
        capacity_limit: u32,
    ) -> Result<Registration, RegistrationRepositoryError> {
        let mut state = self.lock();
        state.take_injected_failure()?;

        let event_id = registration.event_id;
        if !state.events.contains_key(&event_id) {
            return Err(RegistrationRepositoryError::event_not_found());
        }
        let key = (registration.user_id.clone(), event_id);
        let existing = state.registrations.get(&key).cloned();
        if existing
            .as_ref()
            .is_some_and(|stored| stored.status.is_active())
        {
            return Err(RegistrationRepositoryError::already_active());
        }
        let capacity = usize::try_from(capacity_limit).unwrap_or(usize::MAX);
        if state.seats_taken(&event_id) >= capacity {
            return Err(RegistrationRepositoryError::event_full(capacity_limit));
        }

        let stored = match existing {
            Some(revived) => Registration {
                status: RegistrationStatus::Confirmed,
                registered_at: registration.registered_at,
                checked_in_at: None,
                ..revived
            },
            None => Registration {
                status: RegistrationStatus::Confirmed,
                ..registration.clone()
            },
        };
        state.registrations.insert(key, stored.clone());
        Ok(stored)
    }

    async fn find_by_user_and_event(
        &self,
        user_id: &UserId,
        event_id: &EventId,
    ) -> Result<Option<Registration>, RegistrationRepositoryError> {
        let mut state = self.lock();
        state.take_injected_failure()?;
        Ok(state
            .registrations
            .get(&(user_id.clone(), *event_id))
            .cloned())
    }

    async fn cancel(
        &self,
        user_id: &UserId,
        event_id: &EventId,
        _at: DateTime<Utc>,
    ) -> Result<Registration, RegistrationRepositoryError> {
        let mut state = self.lock();
        state.take_injected_failure()?;
        let Some(stored) = state.registrations.get_mut(&(user_id.clone(), *event_id)) else {
            return Err(RegistrationRepositoryError::not_found());
        };
        match stored.status {
            RegistrationStatus::Cancelled => Err(RegistrationRepositoryError::not_found()),
            RegistrationStatus::CheckedIn => Err(RegistrationRepositoryError::invalid_transition(
                RegistrationStatus::CheckedIn,
            )),
            RegistrationStatus::Confirmed | RegistrationStatus::Waitlisted => {
                stored.status = RegistrationStatus::Cancelled;
                Ok(stored.clone())
            }
        }
    }

    async fn check_in(
        &self,
        user_id: &UserId,
        event_id: &EventId,
        at: DateTime<Utc>,
    ) -> Result<Registration, RegistrationRepositoryError> {
        let mut state = self.lock();
        state.take_injected_failure()?;
        let Some(stored) = state.registrations.get_mut(&(user_id.clone(), *event_id)) else {
            return Err(RegistrationRepositoryError::not_found());
        };
        if stored.status != RegistrationStatus::Confirmed {
            return Err(RegistrationRepositoryError::invalid_transition(stored.status));
        }
        stored.status = RegistrationStatus::CheckedIn;
        stored.checked_in_at = Some(at);
        Ok(stored.clone())
    }

    async fn list_for_event(
        &self,
        event_id: &EventId,
        filter: RegistrantFilter,
    ) -> Result<Vec<Registration>, RegistrationRepositoryError> {
        let mut state = self.lock();
        state.take_injected_failure()?;
        let mut registrations: Vec<_> = state
            .registrations
            .values()
            .filter(|registration| {
                registration.event_id == *event_id && filter.matches(registration.status)
            })
            .cloned()
            .collect();
        registrations.sort_by_key(|registration| (registration.registered_at, registration.id));
        Ok(registrations)
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Registration>, RegistrationRepositoryError> {
        let mut state = self.lock();
        state.take_injected_failure()?;
        let mut registrations: Vec<_> = state
            .registrations
            .values()
            .filter(|registration| registration.user_id == *user_id)
            .cloned()
            .collect();
        registrations.sort_by_key(|registration| (registration.registered_at, registration.id));
        registrations.reverse();
        Ok(registrations)
    }

    async fn count_by_event(&self, event_id: &EventId) -> Result<u32, RegistrationRepositoryError> {
        let mut state = self.lock();
        state.take_injected_failure()?;
        u32::try_from(state.seats_taken(event_id))
            .map_err(|err| RegistrationRepositoryError::query(err.to_string()))
    }
}

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn create(&self, notification: &Notification) -> Result<(), NotificationRepositoryError> {
        self.lock().notifications.push(notification.clone());
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        Ok(self
            .lock()
            .notifications
            .iter()
            .rev()
            .filter(|notification| notification.user_id() == user_id)
            .cloned()
            .collect())
    }

    async fn mark_as_read(
        &self,
        user_id: &UserId,
        notification_id: &NotificationId,
    ) -> Result<bool, NotificationRepositoryError> {
        let mut state = self.lock();
        let Some(position) = state.notifications.iter().position(|notification| {
            notification.id() == *notification_id && notification.user_id() == user_id
        }) else {
            return Ok(false);
        };
        let notification = state.notifications.remove(position);
        state.notifications.insert(position, notification.mark_read());
        Ok(true)
    }
}

#[async_trait]
impl RecipientDirectory for InMemoryStore {
    async fn resolve(
        &self,
        user_id: &UserId,
        channel: DeliveryChannel,
    ) -> Result<Option<Destination>, RecipientDirectoryError> {
        let state = self.lock();
        let Some(user) = state.users.get(user_id) else {
            return Ok(None);
        };
        let address = match channel {
            DeliveryChannel::Email => Some(user.email().to_owned()),
            DeliveryChannel::Sms => user.phone().map(str::to_owned),
            DeliveryChannel::Push => Some(push_topic_for(user_id)),
        };
        Ok(address.map(|address| Destination { channel, address }))
    }
}
