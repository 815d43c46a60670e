use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::domain::errors::{CoreError, CoreResult};
use crate::domain::models::WatcherState;
use crate::domain::ports::WatcherStateStore;

pub struct SqliteWatcherStateStore {
    pool: SqlitePool,
}

impl SqliteWatcherStateStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WatcherStateStore for SqliteWatcherStateStore {
    async fn get(&self, watcher_name: &str, external_key: &str) -> CoreResult<Option<WatcherState>> {
        let row = sqlx::query("SELECT * FROM watcher_state WHERE watcher_name = ? AND external_key = ?")
            .bind(watcher_name)
            .bind(external_key)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else { return Ok(None) };
        let checkpoint: String = row.get("checkpoint");
        Ok(Some(WatcherState {
            watcher_name: row.get("watcher_name"),
            external_key: row.get("external_key"),
            checkpoint: serde_json::from_str(&checkpoint)?,
            last_check: row
                .get::<String, _>("last_check")
                .parse::<DateTime<Utc>>()
                .map_err(|e| CoreError::Other(e.into()))?,
        }))
    }

    /// Idempotent upsert keyed by `(watcher_name, external_key)`.
    async fn put(&self, state: &WatcherState) -> CoreResult<()> {
        sqlx::query(
            "INSERT INTO watcher_state (watcher_name, external_key, checkpoint, last_check)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(watcher_name, external_key) DO UPDATE SET
                checkpoint = excluded.checkpoint,
                last_check = excluded.last_check",
        )
        .bind(&state.watcher_name)
        .bind(&state.external_key)
        .bind(serde_json::to_string(&state.checkpoint)?)
        .bind(state.last_check.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::DatabaseConnection;

    #[tokio::test]
    async fn put_is_an_idempotent_upsert() {
        let conn = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        conn.migrate().await.unwrap();
        let store = SqliteWatcherStateStore::new(conn.pool().clone());

        let state = WatcherState::new("github", "o/r", serde_json::json!({"sha": "abc"}));
        store.put(&state).await.unwrap();
        let state2 = WatcherState::new("github", "o/r", serde_json::json!({"sha": "def"}));
        store.put(&state2).await.unwrap();

        let fetched = store.get("github", "o/r").await.unwrap().unwrap();
        assert_eq!(fetched.checkpoint, serde_json::json!({"sha": "def"}));
    }
}
