//! Domain primitives, services and ports.
//!
//! Purpose: define strongly typed entities used by the API and persistence
//! layers, and the services that enforce registration and notification
//! rules. Nothing in here knows about HTTP or SQL.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic error payload.
//! - Event, Registration, Notification and their identifiers.
//! - RegistrationService: capacity-safe registration coordinator.
//! - NotificationService and NotificationDispatcher: persistence plus
//!   bounded asynchronous delivery.

pub mod error;
pub mod event;
pub mod identifier;
pub mod notification;
pub mod notification_dispatcher;
pub mod notification_service;
pub mod ports;
pub mod registration;
pub mod registration_error;
pub mod registration_service;
pub mod trace_id;
pub mod user;

pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::event::{
    EVENT_TITLE_MAX, Event, EventDraft, EventStatus, EventValidationError, ParseEventStatusError,
};
pub use self::identifier::{EventId, IdentifierError, NotificationId, RegistrationId};
pub use self::notification::{
    DeliveryChannel, Destination, NOTIFICATION_TITLE_MAX, Notification, NotificationDraft,
    NotificationJob, NotificationValidationError, ParseDeliveryChannelError,
};
pub use self::notification_dispatcher::{
    DispatchStats, DispatcherConfig, DispatcherError, DispatcherState, NotificationDispatcher,
};
pub use self::notification_service::NotificationService;
pub use self::registration::{
    ParseRegistrantFilterError, ParseRegistrationStatusError, RegistrantFilter, Registration,
    RegistrationStatus,
};
pub use self::registration_error::RegistrationError;
pub use self::registration_service::RegistrationService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{User, UserDraft, UserId, UserValidationError};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use eventhub::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
