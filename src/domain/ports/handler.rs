//! Event handler contract (C3 consumer side).

use async_trait::async_trait;

use crate::domain::errors::CoreResult;
use crate::domain::models::{HandlerResult, HandlerTrigger};

/// A subscriber reacting to one or more trigger kinds published on the
/// event bus. `name()` is the identity used for exactly-once bookkeeping
/// in the event log.
#[async_trait]
pub trait EventHandler: Send + Sync {
    fn name(&self) -> &str;
    fn triggers(&self) -> &[HandlerTrigger];
    async fn handle(&self, trigger: &HandlerTrigger, payload: serde_json::Value) -> CoreResult<HandlerResult>;
}
