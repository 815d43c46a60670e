use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::errors::CoreResult;
use crate::domain::models::{Job, JobResult, JobStatus};
use crate::domain::ports::JobStore;

pub struct SqliteJobStore {
    pool: SqlitePool,
}

impl SqliteJobStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_job(row: &sqlx::sqlite::SqliteRow) -> CoreResult<Job> {
        let status: String = row.get("status");
        let result: Option<String> = row.get("result");

        Ok(Job {
            id: Uuid::parse_str(row.get::<String, _>("id").as_str())
                .map_err(|e| crate::domain::errors::CoreError::Other(e.into()))?,
            job_type: row.get("job_type"),
            status: status.parse().unwrap_or(JobStatus::Pending),
            created_at: parse_dt(row.get::<String, _>("created_at"))?,
            started_at: row.get::<Option<String>, _>("started_at").map(parse_dt).transpose()?,
            completed_at: row.get::<Option<String>, _>("completed_at").map(parse_dt).transpose()?,
            result: result.as_deref().map(serde_json::from_str).transpose()?,
            error: row.get("error"),
        })
    }
}

fn parse_dt(s: String) -> CoreResult<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(&s).map_err(|e| crate::domain::errors::CoreError::Other(e.into()))?.with_timezone(&Utc))
}

// `JobStatus` is not a `FromStr` target by default; provide it here since the
// store is the only place that round-trips the column as a bare string.
impl std::str::FromStr for JobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(()),
        }
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn insert(&self, job: &Job) -> CoreResult<()> {
        let result_json = job.result.as_ref().map(serde_json::to_string).transpose()?;

        sqlx::query(
            "INSERT INTO jobs (id, job_type, status, created_at, started_at, completed_at, result, error)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(job.id.to_string())
        .bind(&job.job_type)
        .bind(job.status.to_string())
        .bind(job.created_at.to_rfc3339())
        .bind(job.started_at.map(|t| t.to_rfc3339()))
        .bind(job.completed_at.map(|t| t.to_rfc3339()))
        .bind(result_json)
        .bind(&job.error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, job: &Job) -> CoreResult<()> {
        let result_json = job.result.as_ref().map(serde_json::to_string).transpose()?;

        sqlx::query(
            "UPDATE jobs SET status = ?, started_at = ?, completed_at = ?, result = ?, error = ? WHERE id = ?",
        )
        .bind(job.status.to_string())
        .bind(job.started_at.map(|t| t.to_rfc3339()))
        .bind(job.completed_at.map(|t| t.to_rfc3339()))
        .bind(result_json)
        .bind(&job.error)
        .bind(job.id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> CoreResult<Option<Job>> {
        let row = sqlx::query("SELECT * FROM jobs WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_job).transpose()
    }

    async fn list_recent(&self, limit: u32) -> CoreResult<Vec<Job>> {
        let rows = sqlx::query("SELECT * FROM jobs ORDER BY created_at DESC LIMIT ?")
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_job).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::DatabaseConnection;

    async fn store() -> SqliteJobStore {
        let conn = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        conn.migrate().await.unwrap();
        SqliteJobStore::new(conn.pool().clone())
    }

    #[tokio::test]
    async fn round_trips_a_job() {
        let store = store().await;
        let mut job = Job::new("demo");
        store.insert(&job).await.unwrap();

        job.status = JobStatus::Completed;
        job.result = Some(JobResult::success("done"));
        store.update(&job).await.unwrap();

        let fetched = store.get(job.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Completed);
        assert_eq!(fetched.result.unwrap().message.as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn list_recent_orders_newest_first() {
        let store = store().await;
        let a = Job::new("a");
        let b = Job::new("b");
        store.insert(&a).await.unwrap();
        store.insert(&b).await.unwrap();

        let recent = store.list_recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
    }
}
