//! Outbound notification fan-out (C10).

use async_trait::async_trait;

use crate::domain::errors::CoreResult;

/// A destination a notification can be sent to. Handlers, the scheduler, and
/// the planner all depend on this trait rather than any concrete transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_message(&self, text: &str) -> CoreResult<()>;
}
