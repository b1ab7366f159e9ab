//! Delivery channel adapters for the notification dispatcher.
//!
//! No third-party provider is wired in yet. [`SimulatedDelivery`] stands in
//! for each channel and [`ChannelRouter`] picks the adapter for a job's
//! [`DeliveryChannel`](crate::domain::DeliveryChannel).

mod router;
mod simulated;

pub use router::ChannelRouter;
pub use simulated::SimulatedDelivery;
