//! Test doubles shared by unit and integration tests.
//!
//! Compiled for `cfg(test)` and behind the `test-support` feature so the
//! integration suites can run the full service stack without PostgreSQL.

mod clock;
mod in_memory;

pub use clock::MutableClock;
pub use in_memory::InMemoryStore;
