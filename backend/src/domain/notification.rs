//! In-app notifications and the jobs that deliver them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{NotificationId, UserId};

/// Maximum notification title length in characters.
pub const NOTIFICATION_TITLE_MAX: usize = 255;

/// Validation errors returned by [`Notification::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationValidationError {
    /// Title is blank after trimming.
    #[error("notification title must not be empty")]
    EmptyTitle,
    /// Title exceeds [`NOTIFICATION_TITLE_MAX`].
    #[error("notification title must be at most {max} characters")]
    TitleTooLong {
        /// Maximum accepted length in characters.
        max: usize,
    },
    /// Message is blank after trimming.
    #[error("notification message must not be empty")]
    EmptyMessage,
}

/// Input payload for [`Notification::new`].
#[derive(Debug, Clone)]
pub struct NotificationDraft {
    /// Notification identifier.
    pub id: NotificationId,
    /// Recipient.
    pub user_id: UserId,
    /// Short heading.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Read flag.
    pub read: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// A persisted notification addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    id: NotificationId,
    user_id: UserId,
    title: String,
    message: String,
    read: bool,
    created_at: DateTime<Utc>,
}

impl Notification {
    /// Validate a draft into a [`Notification`].
    pub fn new(draft: NotificationDraft) -> Result<Self, NotificationValidationError> {
        let NotificationDraft {
            id,
            user_id,
            title,
            message,
            read,
            created_at,
        } = draft;

        if title.trim().is_empty() {
            return Err(NotificationValidationError::EmptyTitle);
        }
        if title.chars().count() > NOTIFICATION_TITLE_MAX {
            return Err(NotificationValidationError::TitleTooLong {
                max: NOTIFICATION_TITLE_MAX,
            });
        }
        if message.trim().is_empty() {
            return Err(NotificationValidationError::EmptyMessage);
        }

        Ok(Self {
            id,
            user_id,
            title,
            message,
            read,
            created_at,
        })
    }

    /// Notification identifier.
    pub fn id(&self) -> NotificationId {
        self.id
    }

    /// Recipient.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Short heading.
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Body text.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Whether the recipient has read it.
    pub fn is_read(&self) -> bool {
        self.read
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Copy of this notification flagged as read.
    pub fn mark_read(mut self) -> Self {
        self.read = true;
        self
    }
}

/// Channel a notification job is delivered over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryChannel {
    /// The recipient's email address.
    #[default]
    Email,
    /// The recipient's push topic.
    Push,
    /// The recipient's phone number.
    Sms,
}

impl DeliveryChannel {
    /// Lowercase wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Push => "push",
            Self::Sms => "sms",
        }
    }
}

impl fmt::Display for DeliveryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown delivery channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("delivery channel must be one of email, push, sms; got {0}")]
pub struct ParseDeliveryChannelError(pub String);

impl FromStr for DeliveryChannel {
    type Err = ParseDeliveryChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "push" => Ok(Self::Push),
            "sms" => Ok(Self::Sms),
            other => Err(ParseDeliveryChannelError(other.to_owned())),
        }
    }
}

/// Where a notification job is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Channel the address belongs to.
    pub channel: DeliveryChannel,
    /// Email address, phone number or push topic depending on `channel`.
    pub address: String,
}

/// Transient unit of work owned by the dispatcher queue until a worker
/// claims it. Jobs are never persisted or re-queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationJob {
    /// The stored notification being delivered.
    pub notification: Notification,
    /// Resolved delivery target.
    pub destination: Destination,
}
