//! Event bus (C3): fan-out from a trigger to every handler subscribed to it.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{error, warn};
use uuid::Uuid;

use crate::domain::errors::CoreResult;
use crate::domain::models::{EventLog, HandlerResult, HandlerTrigger};
use crate::domain::ports::{EventHandler, EventLogStore};

pub struct EventBus {
    handlers: RwLock<HashMap<String, Vec<Arc<dyn EventHandler>>>>,
    event_log: Arc<dyn EventLogStore>,
}

impl EventBus {
    pub fn new(event_log: Arc<dyn EventLogStore>) -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            event_log,
        }
    }

    /// Register a handler under every trigger it declares.
    pub async fn subscribe(&self, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().await;
        for trigger in handler.triggers() {
            handlers.entry(trigger.name().to_string()).or_default().push(handler.clone());
        }
    }

    /// Invoke every handler subscribed to `trigger` concurrently. A
    /// handler's failure is isolated to its own EventLog entry and never
    /// propagates to the caller or to sibling handlers.
    pub async fn publish(&self, trigger: HandlerTrigger, payload: serde_json::Value) {
        let subscribed = {
            let handlers = self.handlers.read().await;
            handlers.get(trigger.name()).cloned().unwrap_or_default()
        };

        let invocations = subscribed.into_iter().map(|handler| {
            let trigger = trigger.clone();
            let payload = payload.clone();
            async move {
                let outcome = handler.handle(&trigger, payload).await;
                (handler.name().to_string(), trigger.name().to_string(), outcome)
            }
        });

        let results = join_all(invocations).await;

        for (handler_name, trigger_name, outcome) in results {
            let result_json = match outcome {
                Ok(handler_result) => serde_json::to_value(&handler_result).unwrap_or_default(),
                Err(e) => {
                    warn!(handler = %handler_name, trigger = %trigger_name, error = %e, "handler invocation failed");
                    serde_json::to_value(HandlerResult::err(e.to_string())).unwrap_or_default()
                }
            };

            let entry = EventLog {
                id: Uuid::new_v4(),
                handler_name,
                trigger: trigger_name,
                result: result_json,
                created_at: Utc::now(),
            };

            if let Err(e) = self.event_log.insert(&entry).await {
                error!(error = %e, "failed to persist event log entry");
            }
        }
    }

    pub async fn recent_log(&self, limit: u32) -> CoreResult<Vec<EventLog>> {
        self.event_log.list_recent(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        name: &'static str,
        triggers: Vec<HandlerTrigger>,
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl EventHandler for Counting {
        fn name(&self) -> &str {
            self.name
        }

        fn triggers(&self) -> &[HandlerTrigger] {
            &self.triggers
        }

        async fn handle(&self, _trigger: &HandlerTrigger, _payload: serde_json::Value) -> CoreResult<HandlerResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(crate::domain::errors::CoreError::Other(anyhow::anyhow!("boom")))
            } else {
                Ok(HandlerResult::ok(None))
            }
        }
    }

    struct FakeEventLogStore {
        rows: tokio::sync::Mutex<Vec<EventLog>>,
    }

    #[async_trait]
    impl EventLogStore for FakeEventLogStore {
        async fn insert(&self, entry: &EventLog) -> CoreResult<()> {
            self.rows.lock().await.push(entry.clone());
            Ok(())
        }

        async fn list_recent(&self, limit: u32) -> CoreResult<Vec<EventLog>> {
            let rows = self.rows.lock().await;
            Ok(rows.iter().rev().take(limit as usize).cloned().collect())
        }
    }

    #[tokio::test]
    async fn sibling_failure_does_not_affect_others() {
        let store = Arc::new(FakeEventLogStore { rows: tokio::sync::Mutex::new(Vec::new()) });
        let bus = EventBus::new(store.clone());

        let calls_a = Arc::new(AtomicUsize::new(0));
        let calls_b = Arc::new(AtomicUsize::new(0));

        bus.subscribe(Arc::new(Counting {
            name: "ok_handler",
            triggers: vec![HandlerTrigger::GithubPr],
            calls: calls_a.clone(),
            fail: false,
        }))
        .await;
        bus.subscribe(Arc::new(Counting {
            name: "boom_handler",
            triggers: vec![HandlerTrigger::GithubPr],
            calls: calls_b.clone(),
            fail: true,
        }))
        .await;

        bus.publish(HandlerTrigger::GithubPr, serde_json::json!({})).await;

        assert_eq!(calls_a.load(Ordering::SeqCst), 1);
        assert_eq!(calls_b.load(Ordering::SeqCst), 1);

        let log = bus.recent_log(10).await.unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.iter().any(|e| e.handler_name == "ok_handler" && e.result["success"] == true));
        assert!(log.iter().any(|e| e.handler_name == "boom_handler" && e.result["success"] == false));
    }
}
