//! Scheduler (C7): fixed-interval invocation of registered actions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::domain::errors::{CoreError, CoreResult};
use crate::domain::models::ScheduledAction;
use crate::domain::ports::{ActionArgs, ScheduleStore};
use crate::services::action_registry::ActionRegistry;
use crate::services::command_parser;

struct Tick {
    handle: JoinHandle<()>,
    stop: Arc<AtomicBool>,
}

pub struct Scheduler {
    actions: Arc<ActionRegistry>,
    store: Arc<dyn ScheduleStore>,
    ticks: tokio::sync::Mutex<HashMap<String, Tick>>,
}

impl Scheduler {
    pub fn new(actions: Arc<ActionRegistry>, store: Arc<dyn ScheduleStore>) -> Self {
        Self {
            actions,
            store,
            ticks: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Load persisted `ScheduledAction` rows without starting any ticks yet.
    pub async fn load_config(&self) -> CoreResult<Vec<ScheduledAction>> {
        self.store.list().await
    }

    /// Register (or update) a scheduled action. The action must already be
    /// registered in the action registry.
    pub async fn schedule(&self, name: &str, command: &str, interval_minutes: u32, enabled: bool) -> CoreResult<()> {
        let action_name = command.split_whitespace().next().unwrap_or(command);
        if self.actions.get_spec(action_name).await.is_none() {
            return Err(CoreError::UnknownScheduledAction(action_name.to_string()));
        }

        self.store.upsert(&ScheduledAction::new(name, command, interval_minutes, enabled)).await?;

        if enabled {
            self.enable(name).await?;
        }
        Ok(())
    }

    pub async fn list(&self) -> CoreResult<Vec<ScheduledAction>> {
        self.store.list().await
    }

    pub async fn status(&self, name: &str) -> CoreResult<Option<ScheduledAction>> {
        Ok(self.store.list().await?.into_iter().find(|a| a.name == name))
    }

    /// Start every enabled scheduled action's tick task.
    pub async fn start(&self) -> CoreResult<()> {
        let actions = self.store.list().await?;
        for action in actions.into_iter().filter(|a| a.enabled) {
            self.spawn_tick(action).await;
        }
        Ok(())
    }

    /// Cancel every running tick task.
    pub async fn stop(&self) {
        let mut ticks = self.ticks.lock().await;
        for (_, tick) in ticks.drain() {
            tick.stop.store(true, Ordering::SeqCst);
            tick.handle.abort();
        }
    }

    /// Idempotent: enabling an action that's already enabled is a no-op.
    pub async fn enable(&self, name: &str) -> CoreResult<()> {
        if self.ticks.lock().await.contains_key(name) {
            return Ok(());
        }

        let Some(action) = self.store.list().await?.into_iter().find(|a| a.name == name) else {
            return Err(CoreError::UnknownScheduledAction(name.to_string()));
        };
        let mut action = action;
        action.enabled = true;
        self.store.upsert(&action).await?;
        self.spawn_tick(action).await;
        Ok(())
    }

    /// Idempotent: cancels the per-action tick task if one is running.
    pub async fn disable(&self, name: &str) -> CoreResult<()> {
        if let Some(tick) = self.ticks.lock().await.remove(name) {
            tick.stop.store(true, Ordering::SeqCst);
            tick.handle.abort();
        }

        if let Some(mut action) = self.store.list().await?.into_iter().find(|a| a.name == name) {
            action.enabled = false;
            self.store.upsert(&action).await?;
        }
        Ok(())
    }

    async fn spawn_tick(&self, action: ScheduledAction) {
        let name = action.name.clone();
        if self.ticks.lock().await.contains_key(&name) {
            return;
        }

        let stop = Arc::new(AtomicBool::new(false));
        let stop_for_task = stop.clone();
        let actions = self.actions.clone();
        let store = self.store.clone();
        let command = action.command_string.clone();
        let interval_minutes = action.interval_minutes;
        let task_name = name.clone();

        let handle = tokio::spawn(async move {
            loop {
                if stop_for_task.load(Ordering::SeqCst) {
                    return;
                }

                if let Err(e) = run_once(&actions, &command).await {
                    error!(action = %task_name, error = %e, "scheduled action failed; retrying shortly");
                    sleep_unless_stopped(Duration::from_secs(60), &stop_for_task).await;
                    continue;
                }

                if let Err(e) = store.mark_ran(&task_name, Utc::now()).await {
                    warn!(action = %task_name, error = %e, "failed to persist last_run");
                }

                sleep_unless_stopped(Duration::from_secs(u64::from(interval_minutes) * 60), &stop_for_task).await;
            }
        });

        self.ticks.lock().await.insert(name, Tick { handle, stop });
    }
}

async fn run_once(actions: &ActionRegistry, command: &str) -> CoreResult<()> {
    let (action_name, tail) = command.split_once(' ').unwrap_or((command, ""));
    let args = command_parser::parse_args(tail);
    actions.dispatch(action_name, args).await?;
    Ok(())
}

async fn sleep_unless_stopped(duration: Duration, stop: &Arc<AtomicBool>) {
    let deadline = tokio::time::Instant::now() + duration;
    while tokio::time::Instant::now() < deadline {
        if stop.load(Ordering::SeqCst) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::CoreResult as Res;
    use crate::domain::models::ActionSpec;
    use crate::domain::ports::{ActionHandler, ActionOutcome};
    use crate::infrastructure::database::{DatabaseConnection, SqliteScheduleStore};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct Noop(Arc<AtomicUsize>);

    #[async_trait]
    impl ActionHandler for Noop {
        async fn call(&self, _args: ActionArgs) -> Res<ActionOutcome> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(ActionOutcome::Text("ran".to_string()))
        }
    }

    fn noop_spec() -> ActionSpec {
        ActionSpec {
            name: "noop".to_string(),
            description: String::new(),
            help_text: String::new(),
            agent_hint: String::new(),
            arguments: vec![],
        }
    }

    #[tokio::test]
    async fn disabled_action_never_runs() {
        let conn = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        conn.migrate().await.unwrap();
        let schedule_store = Arc::new(SqliteScheduleStore::new(conn.pool().clone()));

        let registry = Arc::new(ActionRegistry::new());
        let counter = Arc::new(AtomicUsize::new(0));
        registry.register("noop", noop_spec(), Arc::new(Noop(counter.clone()))).await.unwrap();

        let scheduler = Scheduler::new(registry, schedule_store);
        scheduler.schedule("sync", "noop", 1, true).await.unwrap();
        scheduler.schedule("off", "noop", 1, false).await.unwrap();

        scheduler.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.stop().await;

        assert!(counter.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn enabling_twice_is_idempotent() {
        let conn = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        conn.migrate().await.unwrap();
        let schedule_store = Arc::new(SqliteScheduleStore::new(conn.pool().clone()));

        let registry = Arc::new(ActionRegistry::new());
        let counter = Arc::new(AtomicUsize::new(0));
        registry.register("noop", noop_spec(), Arc::new(Noop(counter.clone()))).await.unwrap();

        let scheduler = Scheduler::new(registry, schedule_store);
        scheduler.schedule("sync", "noop", 1, false).await.unwrap();

        scheduler.enable("sync").await.unwrap();
        scheduler.enable("sync").await.unwrap();
        assert_eq!(scheduler.ticks.lock().await.len(), 1);
        scheduler.stop().await;
    }

    #[tokio::test]
    async fn unknown_action_refuses_to_schedule() {
        let conn = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        conn.migrate().await.unwrap();
        let schedule_store = Arc::new(SqliteScheduleStore::new(conn.pool().clone()));
        let registry = Arc::new(ActionRegistry::new());

        let scheduler = Scheduler::new(registry, schedule_store);
        let err = scheduler.schedule("sync", "does-not-exist", 1, true).await.unwrap_err();
        assert!(matches!(err, CoreError::UnknownScheduledAction(_)));
    }
}
