//! Persistence boundaries. Services depend on these traits, never on `sqlx`
//! directly, so the concrete SQLite-backed implementations stay confined to
//! the infrastructure layer and can be swapped for test doubles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::CoreResult;
use crate::domain::models::{EventLog, Job, ScheduledAction, WatcherState};

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert(&self, job: &Job) -> CoreResult<()>;
    async fn update(&self, job: &Job) -> CoreResult<()>;
    async fn get(&self, id: Uuid) -> CoreResult<Option<Job>>;
    async fn list_recent(&self, limit: u32) -> CoreResult<Vec<Job>>;
}

#[async_trait]
pub trait EventLogStore: Send + Sync {
    async fn insert(&self, entry: &EventLog) -> CoreResult<()>;
    async fn list_recent(&self, limit: u32) -> CoreResult<Vec<EventLog>>;
}

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn list(&self) -> CoreResult<Vec<ScheduledAction>>;
    async fn upsert(&self, action: &ScheduledAction) -> CoreResult<()>;
    async fn mark_ran(&self, name: &str, at: DateTime<Utc>) -> CoreResult<()>;
}

#[async_trait]
pub trait WatcherStateStore: Send + Sync {
    async fn get(&self, watcher_name: &str, external_key: &str) -> CoreResult<Option<WatcherState>>;
    async fn put(&self, state: &WatcherState) -> CoreResult<()>;
}
