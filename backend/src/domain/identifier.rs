//! UUID-backed identifier newtypes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned when an identifier string is not a UUID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} id must be a valid UUID")]
pub struct IdentifierError {
    kind: &'static str,
}

impl IdentifierError {
    /// Name of the identifier that failed to parse.
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

macro_rules! define_uuid_id {
    ($(#[$outer:meta])* $name:ident => $kind:literal) => {
        $(#[$outer])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Parse an identifier from its string form.
            pub fn new(raw: impl AsRef<str>) -> Result<Self, IdentifierError> {
                let raw = raw.as_ref();
                if raw.trim() != raw {
                    return Err(IdentifierError { kind: $kind });
                }
                Uuid::parse_str(raw)
                    .map(Self)
                    .map_err(|_| IdentifierError { kind: $kind })
            }

            /// Generate a fresh random identifier.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an already-parsed UUID.
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdentifierError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

define_uuid_id! {
    /// Identifier of an [`Event`](crate::domain::Event).
    EventId => "event"
}

define_uuid_id! {
    /// Identifier of a [`Registration`](crate::domain::Registration).
    RegistrationId => "registration"
}

define_uuid_id! {
    /// Identifier of a [`Notification`](crate::domain::Notification).
    NotificationId => "notification"
}
