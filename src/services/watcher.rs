//! Watcher subsystem (C5): periodic pollers that publish events.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;

use crate::domain::errors::CoreResult;
use crate::domain::models::{JobResult, WatcherState};
use crate::domain::ports::{WatcherJob, WatcherStateStore};
use crate::services::event_bus::EventBus;
use crate::services::job_manager::{JobManager, JobTask};

/// Wraps a `WatcherJob` as the job manager's unit of work: initialize,
/// record `last_check`, then repeat {poll, publish, sleep} until stopped.
struct WatcherTask {
    watcher: Arc<dyn WatcherJob>,
    state_store: Arc<dyn WatcherStateStore>,
    event_bus: Arc<EventBus>,
}

#[async_trait]
impl JobTask for WatcherTask {
    async fn run(&self, stop_signal: Arc<AtomicBool>) -> CoreResult<JobResult> {
        let name = self.watcher.name().to_string();
        let external_key = self.watcher.external_key().to_string();

        self.watcher.initialize().await?;

        let mut checkpoint = self
            .state_store
            .get(&name, &external_key)
            .await?
            .map(|s| s.checkpoint)
            .unwrap_or(serde_json::json!({}));

        loop {
            if stop_signal.load(Ordering::SeqCst) {
                return Ok(JobResult::success(format!("watcher {name} stopped")));
            }

            let cycle = self.watcher.check(checkpoint.clone()).await;
            let cycle = match cycle {
                Ok(cycle) => cycle,
                Err(e) => {
                    warn!(watcher = %name, error = %e, "watcher poll cycle failed");
                    sleep_or_stop(self.watcher.poll_interval_secs(), &stop_signal).await;
                    continue;
                }
            };

            checkpoint = cycle.checkpoint.clone();
            self.state_store
                .put(&WatcherState {
                    watcher_name: name.clone(),
                    external_key: external_key.clone(),
                    checkpoint: checkpoint.clone(),
                    last_check: Utc::now(),
                })
                .await?;

            for (trigger, payload) in cycle.events {
                self.event_bus.publish(trigger, payload).await;
            }

            if stop_signal.load(Ordering::SeqCst) {
                return Ok(JobResult::success(format!("watcher {name} stopped")));
            }
            sleep_or_stop(self.watcher.poll_interval_secs(), &stop_signal).await;
        }
    }
}

async fn sleep_or_stop(interval_secs: u64, stop_signal: &Arc<AtomicBool>) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(interval_secs);
    while tokio::time::Instant::now() < deadline {
        if stop_signal.load(Ordering::SeqCst) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// Discovers the configured set of watchers, submits each as a job, and
/// tears them all down together on shutdown.
pub struct WatcherManager {
    job_manager: Arc<JobManager>,
    event_bus: Arc<EventBus>,
    state_store: Arc<dyn WatcherStateStore>,
    running: tokio::sync::Mutex<Vec<uuid::Uuid>>,
}

impl WatcherManager {
    pub fn new(job_manager: Arc<JobManager>, event_bus: Arc<EventBus>, state_store: Arc<dyn WatcherStateStore>) -> Self {
        Self {
            job_manager,
            event_bus,
            state_store,
            running: tokio::sync::Mutex::new(Vec::new()),
        }
    }

    /// Construct each watcher in `active_watchers` as a job and submit it.
    pub async fn start(&self, active_watchers: Vec<Arc<dyn WatcherJob>>) -> CoreResult<()> {
        for watcher in active_watchers {
            let name = watcher.name().to_string();
            let task = Arc::new(WatcherTask {
                watcher,
                state_store: self.state_store.clone(),
                event_bus: self.event_bus.clone(),
            });

            let job_id = self.job_manager.submit(format!("watcher:{name}"), task).await?;
            self.running.lock().await.push(job_id);
        }
        Ok(())
    }

    /// Cancel every running watcher job.
    pub async fn stop(&self) -> CoreResult<()> {
        let job_ids = self.running.lock().await.drain(..).collect::<Vec<_>>();
        for job_id in job_ids {
            self.job_manager.stop(job_id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{EventLogStore, Notifier, WatcherCycle};
    use crate::infrastructure::database::{DatabaseConnection, SqliteJobStore};
    use std::sync::atomic::AtomicUsize;

    struct NullNotifier;

    #[async_trait]
    impl Notifier for NullNotifier {
        async fn send_message(&self, _text: &str) -> CoreResult<()> {
            Ok(())
        }
    }

    struct FakeEventLogStore;

    #[async_trait]
    impl EventLogStore for FakeEventLogStore {
        async fn insert(&self, _entry: &crate::domain::models::EventLog) -> CoreResult<()> {
            Ok(())
        }

        async fn list_recent(&self, _limit: u32) -> CoreResult<Vec<crate::domain::models::EventLog>> {
            Ok(Vec::new())
        }
    }

    struct CountingWatcher {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl WatcherJob for CountingWatcher {
        fn name(&self) -> &str {
            "counter"
        }

        fn external_key(&self) -> &str {
            "only-key"
        }

        fn poll_interval_secs(&self) -> u64 {
            0
        }

        async fn check(&self, checkpoint: serde_json::Value) -> CoreResult<WatcherCycle> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(WatcherCycle {
                checkpoint: serde_json::json!({"count": n}),
                events: vec![(crate::domain::models::HandlerTrigger::GithubPush, checkpoint)],
            })
        }
    }

    #[tokio::test]
    async fn stop_halts_the_polling_loop() {
        let conn = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        conn.migrate().await.unwrap();
        let job_store = Arc::new(SqliteJobStore::new(conn.pool().clone()));
        let job_manager = Arc::new(JobManager::new(job_store, Arc::new(NullNotifier)));
        let event_bus = Arc::new(EventBus::new(Arc::new(FakeEventLogStore)));
        let state_store = Arc::new(crate::infrastructure::database::SqliteWatcherStateStore::new(conn.pool().clone()));

        let manager = WatcherManager::new(job_manager, event_bus, state_store);
        let calls = Arc::new(AtomicUsize::new(0));
        manager.start(vec![Arc::new(CountingWatcher { calls: calls.clone() })]).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        manager.stop().await.unwrap();

        assert!(calls.load(Ordering::SeqCst) >= 1);
    }
}
