//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL via `diesel-async` and `bb8` connection pooling.
//!
//! - **Thin adapters**: repositories translate between Diesel rows and
//!   domain types. Business rules stay in the domain services.
//! - **Internal models**: row structs (`models.rs`) and the schema
//!   (`schema.rs`) never leave this module.
//! - **Strongly typed errors**: every database error is mapped to the
//!   owning port's error type.
//!
//! # Example
//!
//! ```ignore
//! use eventhub::outbound::persistence::{DbPool, PoolConfig, DieselRegistrationRepository};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/eventhub")).await?;
//! let ledger = DieselRegistrationRepository::new(pool);
//! ```

mod diesel_event_repository;
mod diesel_notification_repository;
mod diesel_recipient_directory;
mod diesel_registration_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_event_repository::DieselEventRepository;
pub use diesel_notification_repository::DieselNotificationRepository;
pub use diesel_recipient_directory::DieselRecipientDirectory;
pub use diesel_registration_repository::DieselRegistrationRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
