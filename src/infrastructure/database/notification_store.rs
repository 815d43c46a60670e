//! Persistent `Notifier` (C10): an append-only queue table, no transport.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::CoreResult;
use crate::domain::ports::Notifier;

pub struct DatabaseNotifier {
    pool: SqlitePool,
}

impl DatabaseNotifier {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Notifier for DatabaseNotifier {
    async fn send_message(&self, text: &str) -> CoreResult<()> {
        sqlx::query("INSERT INTO notifications (id, text, created_at) VALUES (?, ?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(text)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::DatabaseConnection;
    use sqlx::Row;

    #[tokio::test]
    async fn appends_one_row_per_message() {
        let conn = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        conn.migrate().await.unwrap();
        let notifier = DatabaseNotifier::new(conn.pool().clone());

        notifier.send_message("job 1 completed").await.unwrap();
        notifier.send_message("job 2 failed").await.unwrap();

        let rows = sqlx::query("SELECT text FROM notifications ORDER BY created_at ASC")
            .fetch_all(conn.pool())
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get::<String, _>("text"), "job 1 completed");
    }
}
