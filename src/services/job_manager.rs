//! Job manager (C4): the single source of truth for long-running work.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, Notify, RwLock};
use tracing::{error, warn};
use uuid::Uuid;

use crate::domain::errors::{CoreError, CoreResult};
use crate::domain::models::{Job, JobResult, JobStatus};
use crate::domain::ports::{JobStore, Notifier};

/// A unit of long-running work the manager drives to completion. `run`
/// should observe `stop_signal` and return promptly once it flips to
/// `true`; `wait_for_result` otherwise never unblocks on a cancelled job.
#[async_trait]
pub trait JobTask: Send + Sync {
    async fn run(&self, stop_signal: Arc<AtomicBool>) -> CoreResult<JobResult>;
}

struct Handle {
    stop_signal: Arc<AtomicBool>,
    done: Arc<Notify>,
}

pub struct JobManager {
    store: Arc<dyn JobStore>,
    notifier: Arc<dyn Notifier>,
    handles: RwLock<HashMap<Uuid, Handle>>,
}

impl JobManager {
    pub fn new(store: Arc<dyn JobStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Register, persist, and start `task` as a job of kind `job_type`.
    /// Returns as soon as the task has been spawned; execution continues
    /// in the background.
    pub async fn submit(&self, job_type: impl Into<String>, task: Arc<dyn JobTask>) -> CoreResult<Uuid> {
        let mut job = Job::new(job_type);
        job.status = JobStatus::Running;
        job.started_at = Some(Utc::now());
        let job_id = job.id;

        if let Err(e) = self.store.insert(&job).await {
            return Err(e);
        }

        let stop_signal = Arc::new(AtomicBool::new(false));
        let done = Arc::new(Notify::new());

        {
            let mut handles = self.handles.write().await;
            handles.insert(
                job_id,
                Handle {
                    stop_signal: stop_signal.clone(),
                    done: done.clone(),
                },
            );
        }

        let store = self.store.clone();
        let notifier = self.notifier.clone();

        tokio::spawn(async move {
            let outcome = task.run(stop_signal).await;
            let mut job = match store.get(job_id).await {
                Ok(Some(job)) => job,
                _ => return,
            };

            // `stop` may already have marked this job CANCELLED while the
            // task was shutting down; a terminal status never regresses.
            if job.status.is_terminal() {
                done.notify_waiters();
                return;
            }

            match outcome {
                Ok(result) => {
                    job.status = if result.success { JobStatus::Completed } else { JobStatus::Failed };
                    job.result = Some(result);
                }
                Err(e) => {
                    job.status = JobStatus::Failed;
                    job.error = Some(e.to_string());
                }
            }
            job.completed_at = Some(Utc::now());

            if let Err(e) = store.update(&job).await {
                error!(job_id = %job_id, error = %e, "failed to persist job completion");
            }

            let message = format!("job {job_id} ({}) finished: {}", job.job_type, job.status);
            if let Err(e) = notifier.send_message(&message).await {
                warn!(job_id = %job_id, error = %e, "failed to send job completion notification");
            }

            done.notify_waiters();
        });

        Ok(job_id)
    }

    pub async fn get(&self, job_id: Uuid) -> CoreResult<Option<Job>> {
        self.store.get(job_id).await
    }

    pub async fn list(&self, status: Option<JobStatus>) -> CoreResult<Vec<Job>> {
        let jobs = self.store.list_recent(1000).await?;
        Ok(match status {
            Some(s) => jobs.into_iter().filter(|j| j.status == s).collect(),
            None => jobs,
        })
    }

    /// Mark the job CANCELLED up front (so the completing task sees an
    /// already-terminal record and defers to it), signal `stop_handler`
    /// via the stop flag, and wait briefly for the task to exit.
    pub async fn stop(&self, job_id: Uuid) -> CoreResult<bool> {
        let handle = {
            let handles = self.handles.read().await;
            match handles.get(&job_id) {
                Some(h) => (h.stop_signal.clone(), h.done.clone()),
                None => return Ok(false),
            }
        };
        let (stop_signal, done) = handle;

        if let Some(mut job) = self.store.get(job_id).await? {
            if !job.status.is_terminal() {
                job.status = JobStatus::Cancelled;
                job.completed_at = Some(Utc::now());
                self.store.update(&job).await?;

                let message = format!("job {job_id} ({}) cancelled", job.job_type);
                if let Err(e) = self.notifier.send_message(&message).await {
                    warn!(job_id = %job_id, error = %e, "failed to send cancellation notification");
                }
            }
        }

        stop_signal.store(true, Ordering::SeqCst);
        let _ = tokio::time::timeout(Duration::from_millis(500), done.notified()).await;

        Ok(true)
    }

    /// Block until the job reaches a terminal state or `timeout` elapses.
    pub async fn wait_for_result(&self, job_id: Uuid, timeout: Duration) -> CoreResult<JobResult> {
        let done = {
            let handles = self.handles.read().await;
            handles.get(&job_id).map(|h| h.done.clone())
        };

        let wait = async {
            if let Some(done) = done {
                loop {
                    if let Some(job) = self.store.get(job_id).await.ok().flatten() {
                        if job.status.is_terminal() {
                            return job.result.unwrap_or_else(|| JobResult::failure(job.error.unwrap_or_default()));
                        }
                    }
                    done.notified().await;
                }
            } else if let Some(job) = self.store.get(job_id).await.ok().flatten() {
                job.result.unwrap_or_else(|| JobResult::failure(job.error.unwrap_or_default()))
            } else {
                JobResult::failure("job not found")
            }
        };

        tokio::time::timeout(timeout, wait).await.map_err(|_| CoreError::JobWaitTimeout(job_id, timeout))
    }

    pub async fn most_recent_finished(&self) -> CoreResult<Option<Job>> {
        let jobs = self.store.list_recent(50).await?;
        Ok(jobs.into_iter().find(|j| j.status.is_terminal()))
    }
}

/// Guards against double-dispatch of `stop_handler` semantics when a job
/// is stopped twice concurrently; `stop` itself is idempotent at the
/// storage layer since `update_status` transitions are terminal-safe.
pub struct StopOnce(Mutex<bool>);

impl StopOnce {
    pub fn new() -> Self {
        Self(Mutex::new(false))
    }

    pub async fn fire_once(&self) -> bool {
        let mut fired = self.0.lock().await;
        if *fired {
            false
        } else {
            *fired = true;
            true
        }
    }
}

impl Default for StopOnce {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::{DatabaseConnection, SqliteJobStore};

    struct NullNotifier;

    #[async_trait]
    impl Notifier for NullNotifier {
        async fn send_message(&self, _text: &str) -> CoreResult<()> {
            Ok(())
        }
    }

    struct Instant;

    #[async_trait]
    impl JobTask for Instant {
        async fn run(&self, _stop_signal: Arc<AtomicBool>) -> CoreResult<JobResult> {
            Ok(JobResult::success("done"))
        }
    }

    struct SleepUntilStopped;

    #[async_trait]
    impl JobTask for SleepUntilStopped {
        async fn run(&self, stop_signal: Arc<AtomicBool>) -> CoreResult<JobResult> {
            loop {
                if stop_signal.load(Ordering::SeqCst) {
                    return Ok(JobResult::failure("cancelled"));
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    }

    async fn manager() -> JobManager {
        let conn = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        conn.migrate().await.unwrap();
        let store = Arc::new(SqliteJobStore::new(conn.pool().clone()));
        JobManager::new(store, Arc::new(NullNotifier))
    }

    #[tokio::test]
    async fn submit_and_wait_returns_completed_result() {
        let manager = manager().await;
        let id = manager.submit("demo", Arc::new(Instant)).await.unwrap();
        let result = manager.wait_for_result(id, Duration::from_secs(1)).await.unwrap();
        assert!(result.success);
    }

    #[tokio::test]
    async fn stop_transitions_job_to_cancelled_quickly() {
        let manager = manager().await;
        let id = manager.submit("watch", Arc::new(SleepUntilStopped)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let stopped = manager.stop(id).await.unwrap();
        assert!(stopped);

        let job = manager.get(id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Cancelled);
    }

    #[tokio::test]
    async fn wait_for_result_times_out_on_a_job_that_never_finishes() {
        let manager = manager().await;
        let id = manager.submit("stuck", Arc::new(SleepUntilStopped)).await.unwrap();
        let result = manager.wait_for_result(id, Duration::from_millis(50)).await;
        assert!(matches!(result, Err(CoreError::JobWaitTimeout(_, _))));
        manager.stop(id).await.unwrap();
    }
}
