//! Built-in webhook endpoints (C6): blockchain event ingestion and
//! code-host push/PR ingestion. Each translates its body shape into a
//! trigger and publishes it on the event bus itself.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::errors::{CoreError, CoreResult};
use crate::domain::models::HandlerTrigger;
use crate::domain::ports::WebhookHandler;
use crate::services::event_bus::EventBus;

/// `/webhooks/quicknode`: `{payload: [{logs: [{topics: [...]}]}]}`.
pub struct QuicknodeWebhook {
    event_bus: Arc<EventBus>,
}

impl QuicknodeWebhook {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self { event_bus }
    }
}

#[async_trait]
impl WebhookHandler for QuicknodeWebhook {
    async fn handle(&self, body: Value) -> CoreResult<Value> {
        let payload = body
            .get("payload")
            .and_then(Value::as_array)
            .ok_or_else(|| CoreError::WebhookMalformed("expected a `payload` array".to_string()))?;

        for event in payload {
            let logs = event
                .get("logs")
                .and_then(Value::as_array)
                .ok_or_else(|| CoreError::WebhookMalformed("each payload entry must have a `logs` array".to_string()))?;

            for log in logs {
                if !log.get("topics").is_some_and(Value::is_array) {
                    return Err(CoreError::WebhookMalformed("each log entry must have a `topics` array".to_string()));
                }
            }
        }

        for event in payload {
            self.event_bus
                .publish(HandlerTrigger::BlockchainEvent, serde_json::json!({ "source": "quicknode", "payload": event }))
                .await;
        }

        Ok(serde_json::json!({ "published": payload.len() }))
    }
}

/// Code-host push/PR endpoint: infers `GITHUB_PR` vs `GITHUB_PUSH` from
/// body shape (`pull_request` vs `commit`).
pub struct CodeHostWebhook {
    event_bus: Arc<EventBus>,
}

impl CodeHostWebhook {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self { event_bus }
    }
}

#[async_trait]
impl WebhookHandler for CodeHostWebhook {
    async fn handle(&self, body: Value) -> CoreResult<Value> {
        let repo_url = body
            .get("repo_url")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::WebhookMalformed("expected a `repo_url` string".to_string()))?
            .to_string();

        let trigger = if body.get("pull_request").is_some() {
            HandlerTrigger::GithubPr
        } else if body.get("commit").is_some() {
            HandlerTrigger::GithubPush
        } else {
            return Err(CoreError::WebhookMalformed("expected a `pull_request` or `commit` field".to_string()));
        };

        self.event_bus.publish(trigger.clone(), serde_json::json!({ "repo_url": repo_url, "body": body })).await;

        Ok(serde_json::json!({ "published": trigger.name() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::{DatabaseConnection, SqliteEventLogStore};

    async fn event_bus() -> Arc<EventBus> {
        let conn = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        conn.migrate().await.unwrap();
        Arc::new(EventBus::new(Arc::new(SqliteEventLogStore::new(conn.pool().clone()))))
    }

    #[tokio::test]
    async fn quicknode_rejects_missing_payload() {
        let handler = QuicknodeWebhook::new(event_bus().await);
        let err = handler.handle(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, CoreError::WebhookMalformed(_)));
    }

    #[tokio::test]
    async fn quicknode_rejects_log_without_topics() {
        let handler = QuicknodeWebhook::new(event_bus().await);
        let body = serde_json::json!({ "payload": [{ "logs": [{ "data": "0x1" }] }] });
        let err = handler.handle(body).await.unwrap_err();
        assert!(matches!(err, CoreError::WebhookMalformed(_)));
    }

    #[tokio::test]
    async fn quicknode_accepts_well_formed_payload() {
        let handler = QuicknodeWebhook::new(event_bus().await);
        let body = serde_json::json!({ "payload": [{ "logs": [{ "topics": ["0xabc"] }] }] });
        let result = handler.handle(body).await.unwrap();
        assert_eq!(result["published"], 1);
    }

    #[tokio::test]
    async fn code_host_infers_pull_request_vs_push() {
        let handler = CodeHostWebhook::new(event_bus().await);

        let pr = handler
            .handle(serde_json::json!({ "repo_url": "https://example.com/r", "pull_request": {} }))
            .await
            .unwrap();
        assert_eq!(pr["published"], "GITHUB_PR");

        let push = handler
            .handle(serde_json::json!({ "repo_url": "https://example.com/r", "commit": {} }))
            .await
            .unwrap();
        assert_eq!(push["published"], "GITHUB_PUSH");
    }

    #[tokio::test]
    async fn code_host_rejects_unrecognized_shape() {
        let handler = CodeHostWebhook::new(event_bus().await);
        let err = handler.handle(serde_json::json!({ "repo_url": "x" })).await.unwrap_err();
        assert!(matches!(err, CoreError::WebhookMalformed(_)));
    }
}
