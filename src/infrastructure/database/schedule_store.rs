use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::domain::errors::{CoreError, CoreResult};
use crate::domain::models::ScheduledAction;
use crate::domain::ports::ScheduleStore;

pub struct SqliteScheduleStore {
    pool: SqlitePool,
}

impl SqliteScheduleStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_action(row: &sqlx::sqlite::SqliteRow) -> CoreResult<ScheduledAction> {
        let last_run: Option<String> = row.get("last_run");
        Ok(ScheduledAction {
            name: row.get("name"),
            command_string: row.get("command_string"),
            interval_minutes: row.get::<i64, _>("interval_minutes") as u32,
            enabled: row.get::<i64, _>("enabled") != 0,
            last_run: last_run
                .map(|s| s.parse::<DateTime<Utc>>())
                .transpose()
                .map_err(|e| CoreError::Other(e.into()))?,
        })
    }
}

#[async_trait]
impl ScheduleStore for SqliteScheduleStore {
    async fn list(&self) -> CoreResult<Vec<ScheduledAction>> {
        let rows = sqlx::query("SELECT * FROM scheduled_actions").fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_action).collect()
    }

    async fn upsert(&self, action: &ScheduledAction) -> CoreResult<()> {
        sqlx::query(
            "INSERT INTO scheduled_actions (name, command_string, interval_minutes, enabled, last_run)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(name) DO UPDATE SET
                command_string = excluded.command_string,
                interval_minutes = excluded.interval_minutes,
                enabled = excluded.enabled,
                last_run = excluded.last_run",
        )
        .bind(&action.name)
        .bind(&action.command_string)
        .bind(i64::from(action.interval_minutes))
        .bind(i64::from(action.enabled))
        .bind(action.last_run.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_ran(&self, name: &str, at: DateTime<Utc>) -> CoreResult<()> {
        sqlx::query("UPDATE scheduled_actions SET last_run = ? WHERE name = ?")
            .bind(at.to_rfc3339())
            .bind(name)
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
    async fn upsert_is_idempotent_on_name() {
        let conn = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        conn.migrate().await.unwrap();
        let store = SqliteScheduleStore::new(conn.pool().clone());

        let action = ScheduledAction::new("sync", "noop", 5, true);
        store.upsert(&action).await.unwrap();
        store.upsert(&action).await.unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].interval_minutes, 5);
    }
}
