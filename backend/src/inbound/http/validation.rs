//! Shared validation helpers for inbound HTTP adapters.

use std::str::FromStr;

use serde_json::json;

use crate::domain::{
    DeliveryChannel, Error, EventId, NotificationId, RegistrantFilter, UserId,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValidationCode {
    MissingField,
    InvalidUuid,
    InvalidValue,
}

impl ValidationCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidUuid => "invalid_uuid",
            Self::InvalidValue => "invalid_value",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, message: String, code: ValidationCode, value: Option<&str>) -> Error {
    let details = match value {
        Some(value) => json!({ "field": field.as_str(), "value": value, "code": code.as_str() }),
        None => json!({ "field": field.as_str(), "code": code.as_str() }),
    };
    Error::invalid_request(message).with_details(details)
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    field_error(
        field,
        format!("missing required field: {}", field.as_str()),
        ValidationCode::MissingField,
        None,
    )
}

fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    field_error(
        field,
        format!("{} must be a valid UUID", field.as_str()),
        ValidationCode::InvalidUuid,
        Some(value),
    )
}

pub(crate) fn parse_event_id(value: &str, field: FieldName) -> Result<EventId, Error> {
    EventId::new(value).map_err(|_| invalid_uuid_error(field, value))
}

pub(crate) fn parse_user_id(value: &str, field: FieldName) -> Result<UserId, Error> {
    UserId::new(value).map_err(|_| invalid_uuid_error(field, value))
}

pub(crate) fn parse_notification_id(
    value: &str,
    field: FieldName,
) -> Result<NotificationId, Error> {
    NotificationId::new(value).map_err(|_| invalid_uuid_error(field, value))
}

/// Parse an optional registrant filter; absent means every registrant.
pub(crate) fn parse_registrant_filter(
    value: Option<&str>,
    field: FieldName,
) -> Result<RegistrantFilter, Error> {
    match value {
        None => Ok(RegistrantFilter::All),
        Some(raw) => RegistrantFilter::from_str(raw).map_err(|err| {
            field_error(field, err.to_string(), ValidationCode::InvalidValue, Some(raw))
        }),
    }
}

/// Parse an optional delivery channel; absent means email.
pub(crate) fn parse_channel(
    value: Option<&str>,
    field: FieldName,
) -> Result<DeliveryChannel, Error> {
    match value {
        None => Ok(DeliveryChannel::default()),
        Some(raw) => DeliveryChannel::from_str(raw).map_err(|err| {
            field_error(field, err.to_string(), ValidationCode::InvalidValue, Some(raw))
        }),
    }
}
