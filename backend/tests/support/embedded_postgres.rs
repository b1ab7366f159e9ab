//! Embedded PostgreSQL databases with the eventhub schema applied.
//!
//! Cluster bootstrap drives its own runtime, so these helpers must be called
//! outside Tokio; suites build their runtime afterwards.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::MigrationHarness;
use eventhub::outbound::persistence::MIGRATIONS;
use pg_embedded_setup_unpriv::TemporaryDatabase;
use pg_embedded_setup_unpriv::test_support::shared_cluster_handle;

/// Create a fresh database on the shared cluster and migrate it.
///
/// The database is dropped when the returned guard goes out of scope.
pub fn migrated_database() -> Result<TemporaryDatabase, String> {
    assert!(
        tokio::runtime::Handle::try_current().is_err(),
        "provision databases before entering a Tokio runtime"
    );
    let cluster = shared_cluster_handle().map_err(|err| format!("cluster: {err:?}"))?;
    let name = format!("eventhub_test_{}", uuid::Uuid::new_v4().simple());
    let database = cluster
        .temporary_database(name.as_str())
        .map_err(|err| format!("temporary database: {err:?}"))?;
    let mut conn = PgConnection::establish(database.url())
        .map_err(|err| format!("connect for migrations: {err}"))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|err| format!("apply migrations: {err}"))?;
    Ok(database)
}
