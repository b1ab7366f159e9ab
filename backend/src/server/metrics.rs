//! Prometheus wiring: request metrics middleware and dispatcher counters.

use actix_service::{
    Service, ServiceExt as _, Transform,
    boxed::{self, BoxService},
};
use actix_web::body::BoxBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Compat;
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use futures_util::future::LocalBoxFuture;
use std::sync::Arc;
use tracing::warn;

use eventhub::domain::ports::DispatchMetrics;
use eventhub::outbound::metrics::PrometheusDispatchMetrics;

/// Build the request metrics middleware serving `/metrics`.
///
/// Returns `None` when Prometheus cannot be configured; the server then
/// runs without metrics rather than failing to start.
pub(crate) fn build_prometheus() -> Option<PrometheusMetrics> {
    PrometheusMetricsBuilder::new("eventhub")
        .endpoint("/metrics")
        .build()
        .inspect_err(|err| warn!(error = %err, "Prometheus metrics disabled"))
        .ok()
}

/// Register the dispatcher counters on the request metrics registry.
pub(crate) fn dispatch_metrics(
    prometheus: Option<&PrometheusMetrics>,
) -> Option<Arc<dyn DispatchMetrics>> {
    let prometheus = prometheus?;
    match PrometheusDispatchMetrics::new(&prometheus.registry) {
        Ok(metrics) => Some(Arc::new(metrics)),
        Err(err) => {
            warn!(error = %err, "dispatch metrics registration failed");
            None
        }
    }
}

/// Request metrics middleware that degrades to a pass-through when
/// Prometheus is unavailable.
#[derive(Clone)]
pub(crate) enum MetricsLayer {
    Enabled(Arc<PrometheusMetrics>),
    Disabled,
}

impl MetricsLayer {
    #[must_use]
    pub(crate) fn from_option(metrics: Option<PrometheusMetrics>) -> Self {
        metrics.map_or(Self::Disabled, |metrics| Self::Enabled(Arc::new(metrics)))
    }
}

impl<S, B> Transform<S, ServiceRequest> for MetricsLayer
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = BoxService<ServiceRequest, ServiceResponse<BoxBody>, actix_web::Error>;
    type Future = LocalBoxFuture<'static, Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        match self.clone() {
            Self::Enabled(metrics) => {
                let transform = Compat::new((*metrics).clone()).new_transform(service);
                Box::pin(async move { Ok(boxed::service(transform.await?)) })
            }
            Self::Disabled => Box::pin(async move {
                let passthrough = service.map(|res: ServiceResponse<B>| res.map_into_boxed_body());
                Ok(boxed::service(passthrough))
            }),
        }
    }
}
