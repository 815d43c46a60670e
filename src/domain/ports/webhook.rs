//! Webhook handler contract (C6).

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::CoreResult;

/// One registered webhook endpoint. `handle` receives the parsed JSON body
/// and is expected to translate it into a trigger + context and publish on
/// the event bus itself (the server has no opinion on what a handler does
/// beyond routing to it).
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    async fn handle(&self, body: serde_json::Value) -> CoreResult<serde_json::Value>;
}

/// The narrow slice of C6 a watcher is handed so it can register its own
/// route before the listener starts, without depending on the HTTP server's
/// concrete type.
pub trait WebhookRouter {
    fn register(&mut self, path: &str, handler: Arc<dyn WebhookHandler>);
}
