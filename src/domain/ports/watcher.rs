//! Watcher job contract (C5).

use async_trait::async_trait;

use crate::domain::errors::CoreResult;
use crate::domain::models::HandlerTrigger;
use crate::domain::ports::webhook::WebhookRouter;

/// The outcome of one polling cycle: the checkpoint to persist, and zero or
/// more events for the caller to publish on the event bus.
pub struct WatcherCycle {
    pub checkpoint: serde_json::Value,
    pub events: Vec<(HandlerTrigger, serde_json::Value)>,
}

/// One polling cycle of a watcher: check the external source since the last
/// checkpoint and report both the events discovered and the checkpoint to
/// persist for next time. The watcher manager is responsible for actually
/// publishing the returned events.
#[async_trait]
pub trait WatcherJob: Send + Sync {
    fn name(&self) -> &str;
    fn external_key(&self) -> &str;
    fn poll_interval_secs(&self) -> u64;

    /// One-time setup run once before the poll loop starts. Most watchers
    /// have nothing to do here; the default is a no-op.
    async fn initialize(&self) -> CoreResult<()> {
        Ok(())
    }

    async fn check(&self, checkpoint: serde_json::Value) -> CoreResult<WatcherCycle>;

    /// Register an HTTP route against C6's router before its listener
    /// starts. Most watchers poll only and have nothing to register; the
    /// default is a no-op.
    fn register_routes(&self, _router: &mut dyn WebhookRouter) {}
}
