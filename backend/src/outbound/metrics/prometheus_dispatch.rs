//! Prometheus adapter for notification dispatch metrics.

use prometheus::{IntCounterVec, Opts, Registry};

use crate::domain::ports::{DispatchMetrics, DispatchMetricsError, DispatchOutcome};

/// Prometheus-backed dispatch outcome recorder.
///
/// # Metric
///
/// - **Name**: `eventhub_notification_jobs_total`
/// - **Type**: Counter
/// - **Labels**:
///   - `outcome`: `accepted`, `dropped`, `delivered`, or `failed`
pub struct PrometheusDispatchMetrics {
    jobs_total: IntCounterVec,
}

impl PrometheusDispatchMetrics {
    /// Create and register metrics with the given registry.
    ///
    /// # Errors
    ///
    /// Returns an error if a metric with the same name is already
    /// registered.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let jobs_total = IntCounterVec::new(
            Opts::new(
                "eventhub_notification_jobs_total",
                "Notification jobs by dispatch outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(jobs_total.clone()))?;
        Ok(Self { jobs_total })
    }
}

impl DispatchMetrics for PrometheusDispatchMetrics {
    fn record(&self, outcome: DispatchOutcome) -> Result<(), DispatchMetricsError> {
        self.jobs_total
            .get_metric_with_label_values(&[outcome.as_label()])
            .map_err(|err| DispatchMetricsError::export(err.to_string()))?
            .inc();
        Ok(())
    }
}
