//! Domain port for recording notification dispatch outcomes.
//!
//! Implementations may export to Prometheus or discard the counts.

use super::define_port_error;

define_port_error! {
    /// Errors exposed when recording dispatch metrics.
    pub enum DispatchMetricsError {
        /// Metric exporter rejected the write.
        Export { message: String } => "dispatch metrics exporter failed: {message}",
    }
}

/// Outcome label attached to each recorded job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchOutcome {
    /// Queued for a worker.
    Accepted,
    /// Rejected at submission.
    Dropped,
    /// Handed to the channel adapter successfully.
    Delivered,
    /// The channel adapter returned an error.
    Failed,
}

impl DispatchOutcome {
    /// Label value used by exporters.
    pub const fn as_label(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Dropped => "dropped",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
        }
    }
}

/// Metrics recording port for dispatcher outcomes.
///
/// Recording is synchronous because it runs on the submit path, which must
/// never wait.
#[cfg_attr(test, mockall::automock)]
pub trait DispatchMetrics: Send + Sync {
    /// Count one job with the given outcome.
    fn record(&self, outcome: DispatchOutcome) -> Result<(), DispatchMetricsError>;
}

/// No-op implementation for when metrics are disabled or in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpDispatchMetrics;

impl DispatchMetrics for NoOpDispatchMetrics {
    fn record(&self, _outcome: DispatchOutcome) -> Result<(), DispatchMetricsError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(DispatchOutcome::Accepted, "accepted")]
    #[case(DispatchOutcome::Dropped, "dropped")]
    #[case(DispatchOutcome::Delivered, "delivered")]
    #[case(DispatchOutcome::Failed, "failed")]
    fn outcomes_have_stable_labels(#[case] outcome: DispatchOutcome, #[case] label: &str) {
        assert_eq!(outcome.as_label(), label);
    }

    #[rstest]
    fn noop_accepts_everything() {
        let metrics = NoOpDispatchMetrics;
        assert!(metrics.record(DispatchOutcome::Failed).is_ok());
    }
}
