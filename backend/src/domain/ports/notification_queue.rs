//! Port for handing notification jobs to asynchronous delivery.

use crate::domain::NotificationJob;

/// Why a submission was not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The bounded queue had no free slot.
    QueueFull,
    /// The dispatcher is stopped or draining.
    NotRunning,
}

impl DropReason {
    /// Label used in logs and metrics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QueueFull => "queue_full",
            Self::NotRunning => "not_running",
        }
    }
}

/// Result of a non-blocking submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The job is queued and will be processed by a worker.
    Accepted,
    /// The job was discarded.
    Dropped(DropReason),
}

impl SubmitOutcome {
    /// Whether the job was queued.
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Fire-and-forget job submission. Implementations never block the caller.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationQueue: Send + Sync {
    /// Try to enqueue `job`.
    fn submit(&self, job: NotificationJob) -> SubmitOutcome;
}
