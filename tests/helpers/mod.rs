use sentryd::infrastructure::database::DatabaseConnection;
use sqlx::SqlitePool;

/// Create an in-memory `SQLite` database for testing, migrated to the
/// latest schema.
#[allow(dead_code)]
pub async fn setup_test_db() -> SqlitePool {
    let db_conn = DatabaseConnection::new("sqlite::memory:")
        .await
        .expect("failed to create test database");

    db_conn.migrate().await.expect("failed to run migrations");

    db_conn.pool().clone()
}
