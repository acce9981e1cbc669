use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing_subscriber::EnvFilter;
use user_session_seaorm_store::migration::Migrator;
use user_session_seaorm_store::UserSessionStore;

/// Connects to a fresh in-memory SQLite database with the schema applied.
///
/// The pool is pinned to a single connection so every query sees the same
/// in-memory database.
pub async fn setup() -> (UserSessionStore, DatabaseConnection) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let conn = Database::connect(opt)
        .await
        .expect("Failed to connect to database");
    Migrator::up(&conn, None)
        .await
        .expect("Failed to run migrations");

    (UserSessionStore::new(conn.clone()), conn)
}
