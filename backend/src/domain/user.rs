//! User identity and contact details.
//!
//! Accounts are owned by the external auth service; this backend only needs
//! a stable identifier and the contact points notifications are sent to.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors returned by the user constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// The identifier was empty.
    #[error("user id must not be empty")]
    EmptyId,
    /// The identifier was not a UUID.
    #[error("user id must be a valid UUID")]
    InvalidId,
    /// The display name was blank.
    #[error("display name must not be empty")]
    EmptyDisplayName,
    /// The email address was malformed.
    #[error("email address must contain a local part and a domain")]
    InvalidEmail,
    /// The phone number was blank once trimmed.
    #[error("phone number must not be blank when present")]
    BlankPhone,
}

/// Stable user identifier stored as a UUID.
///
/// The original string form is retained so identifiers round-trip exactly
/// through session cookies and logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    ///
    /// # Examples
    /// ```
    /// use eventhub::domain::UserId;
    ///
    /// let id = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id");
    /// assert_eq!(id.as_ref(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
    /// assert!(UserId::new("nope").is_err());
    /// ```
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Wrap an already-parsed UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Input payload for [`User::new`].
#[derive(Debug, Clone)]
pub struct UserDraft {
    /// User identifier.
    pub id: UserId,
    /// Email address; must contain a local part and a domain.
    pub email: String,
    /// Non-blank display name.
    pub display_name: String,
    /// Optional phone number for SMS delivery.
    pub phone: Option<String>,
}

/// A user as seen by the registration and notification flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    email: String,
    display_name: String,
    phone: Option<String>,
}

impl User {
    /// Validate a draft into a [`User`].
    ///
    /// # Examples
    /// ```
    /// use eventhub::domain::{User, UserDraft, UserId};
    ///
    /// let user = User::new(UserDraft {
    ///     id: UserId::random(),
    ///     email: "ada@example.com".to_owned(),
    ///     display_name: "Ada".to_owned(),
    ///     phone: None,
    /// })
    /// .expect("valid user");
    /// assert_eq!(user.email(), "ada@example.com");
    /// ```
    pub fn new(draft: UserDraft) -> Result<Self, UserValidationError> {
        let UserDraft {
            id,
            email,
            display_name,
            phone,
        } = draft;

        if display_name.trim().is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(UserValidationError::InvalidEmail),
        }
        if phone.as_deref().is_some_and(|value| value.trim().is_empty()) {
            return Err(UserValidationError::BlankPhone);
        }

        Ok(Self {
            id,
            email,
            display_name,
            phone,
        })
    }

    /// User identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Email address.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Display name.
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Phone number used for SMS delivery, when the user supplied one.
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }
}
