//! Shared helpers for eventhub integration tests.
//!
//! Integration tests compile as separate crates, so helpers live here and
//! each suite pulls in the parts it needs with `mod support;`.

#![allow(
    dead_code,
    reason = "each integration test crate uses a different subset of helpers"
)]

pub mod cluster_skip;
pub mod embedded_postgres;

pub use cluster_skip::handle_cluster_setup_failure;
pub use embedded_postgres::migrated_database;
