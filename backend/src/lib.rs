//! Eventhub backend library.
//!
//! Capacity-safe event registration and asynchronous notification
//! delivery, organised as a hexagon: [`domain`] holds entities, services
//! and ports; [`inbound`] and [`outbound`] hold the adapters.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
