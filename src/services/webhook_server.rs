//! Webhook server (C6): a single HTTP listener dispatching by normalized
//! path to whichever handler registered it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use tracing::{info, warn};

use crate::domain::ports::{WebhookHandler, WebhookRouter};

/// Normalize a registered or incoming path so `/x`, `webhook/x`, and
/// `/webhooks/x` all resolve to the same route: `/webhooks/x`.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    let trimmed = trimmed.strip_prefix("webhooks/").or_else(|| trimmed.strip_prefix("webhook/")).unwrap_or(trimmed);
    format!("/webhooks/{trimmed}")
}

#[derive(Clone)]
struct ServerState {
    handlers: Arc<HashMap<String, Arc<dyn WebhookHandler>>>,
}

pub struct WebhookServer {
    handlers: HashMap<String, Arc<dyn WebhookHandler>>,
    started: AtomicBool,
    shutdown: tokio::sync::Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
}

impl WebhookServer {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            started: AtomicBool::new(false),
            shutdown: tokio::sync::Mutex::new(None),
        }
    }

    pub fn register(&mut self, path: &str, handler: Arc<dyn WebhookHandler>) {
        self.handlers.insert(normalize_path(path), handler);
    }

    /// Idempotent: a second call while already started logs a warning and
    /// returns without rebinding.
    pub async fn start(&self, bind_address: &str, port: u16) -> anyhow::Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("webhook server already started; ignoring duplicate start() call");
            return Ok(());
        }

        let state = ServerState {
            handlers: Arc::new(self.handlers.clone()),
        };

        let app = Router::new().route("/webhooks/*path", post(dispatch)).with_state(state);

        let addr = format!("{bind_address}:{port}");
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!(%addr, "webhook server listening");

        let (tx, rx) = tokio::sync::oneshot::channel();
        *self.shutdown.lock().await = Some(tx);

        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = rx.await;
            });
            if let Err(e) = server.await {
                warn!(error = %e, "webhook server exited with an error");
            }
        });

        Ok(())
    }

    pub async fn stop(&self) {
        if let Some(tx) = self.shutdown.lock().await.take() {
            let _ = tx.send(());
        }
        self.started.store(false, Ordering::SeqCst);
    }
}

impl Default for WebhookServer {
    fn default() -> Self {
        Self::new()
    }
}

impl WebhookRouter for WebhookServer {
    fn register(&mut self, path: &str, handler: Arc<dyn WebhookHandler>) {
        WebhookServer::register(self, path, handler);
    }
}

async fn dispatch(State(state): State<ServerState>, Path(path): Path<String>, headers: HeaderMap, body: axum::body::Bytes) -> impl IntoResponse {
    let normalized = normalize_path(&path);

    let Some(handler) = state.handlers.get(&normalized) else {
        return (StatusCode::NOT_FOUND, format!("no webhook registered at {normalized}")).into_response();
    };

    let content_type = headers.get(axum::http::header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or("");
    if !content_type.starts_with("application/json") {
        return (StatusCode::BAD_REQUEST, "expected application/json body").into_response();
    }

    let parsed: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => return (StatusCode::BAD_REQUEST, format!("malformed JSON body: {e}")).into_response(),
    };

    match handler.handle(parsed).await {
        Ok(response) => (StatusCode::OK, axum::Json(response)).into_response(),
        Err(crate::domain::errors::CoreError::WebhookMalformed(msg)) => (StatusCode::BAD_REQUEST, msg).into_response(),
        Err(e) => {
            warn!(path = %normalized, error = %e, "webhook handler failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_all_three_forms() {
        assert_eq!(normalize_path("/x"), "/webhooks/x");
        assert_eq!(normalize_path("webhook/x"), "/webhooks/x");
        assert_eq!(normalize_path("/webhooks/x"), "/webhooks/x");
    }
}
