use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::errors::{CoreError, CoreResult};
use crate::domain::models::EventLog;
use crate::domain::ports::EventLogStore;

pub struct SqliteEventLogStore {
    pool: SqlitePool,
}

impl SqliteEventLogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> CoreResult<EventLog> {
        let result: String = row.get("result");
        Ok(EventLog {
            id: Uuid::parse_str(row.get::<String, _>("id").as_str()).map_err(|e| CoreError::Other(e.into()))?,
            handler_name: row.get("handler_name"),
            trigger: row.get("trigger"),
            result: serde_json::from_str(&result)?,
            created_at: row
                .get::<String, _>("created_at")
                .parse::<chrono::DateTime<chrono::Utc>>()
                .map_err(|e| CoreError::Other(e.into()))?,
        })
    }
}

#[async_trait]
impl EventLogStore for SqliteEventLogStore {
    async fn insert(&self, entry: &EventLog) -> CoreResult<()> {
        sqlx::query("INSERT INTO event_logs (id, handler_name, trigger, result, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(entry.id.to_string())
            .bind(&entry.handler_name)
            .bind(&entry.trigger)
            .bind(serde_json::to_string(&entry.result)?)
            .bind(entry.created_at.to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_recent(&self, limit: u32) -> CoreResult<Vec<EventLog>> {
        let rows = sqlx::query("SELECT * FROM event_logs ORDER BY created_at DESC LIMIT ?")
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_entry).collect()
    }
}
