//! Notification fan-out (C10): the concrete, non-persistent transport and
//! a composite that hands one message to every configured `Notifier`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client as ReqwestClient;
use tracing::warn;

use crate::domain::errors::CoreResult;
use crate::domain::ports::Notifier;

/// A chat transport is handed a whole message and is responsible for
/// splitting it if the transport has a size limit. `MAX_CHUNK_CHARS` is a
/// conservative default matching common chat-platform message limits.
const MAX_CHUNK_CHARS: usize = 3900;

/// Posts a message to a configured incoming-webhook URL (Slack/Discord/Mattermost
/// style), splitting oversized messages into sequential chunks.
pub struct WebhookNotifier {
    http_client: ReqwestClient,
    webhook_url: String,
}

impl WebhookNotifier {
    pub fn new(webhook_url: impl Into<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        let http_client = ReqwestClient::builder().timeout(Duration::from_secs(timeout_secs)).build()?;
        Ok(Self {
            http_client,
            webhook_url: webhook_url.into(),
        })
    }

    fn chunks(text: &str) -> Vec<&str> {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());

        let mut chunks = Vec::new();
        let mut start = 0;
        let mut count = 0;
        for window in boundaries.windows(2) {
            count += 1;
            if count == MAX_CHUNK_CHARS {
                chunks.push(&text[start..window[1]]);
                start = window[1];
                count = 0;
            }
        }
        if start < text.len() {
            chunks.push(&text[start..]);
        }
        if chunks.is_empty() {
            chunks.push(text);
        }
        chunks
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_message(&self, text: &str) -> CoreResult<()> {
        for chunk in Self::chunks(text) {
            let response = self
                .http_client
                .post(&self.webhook_url)
                .json(&serde_json::json!({ "text": chunk }))
                .send()
                .await
                .map_err(|e| crate::domain::errors::CoreError::Other(e.into()))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(crate::domain::errors::CoreError::Other(anyhow::anyhow!("webhook notification failed ({status}): {body}")));
            }
        }
        Ok(())
    }
}

/// Fans one message out to every registered `Notifier`, isolating failures
/// per-target the same way `EventBus::publish` isolates handler failures.
pub struct CompositeNotifier {
    targets: Vec<Arc<dyn Notifier>>,
}

impl CompositeNotifier {
    pub fn new(targets: Vec<Arc<dyn Notifier>>) -> Self {
        Self { targets }
    }
}

#[async_trait]
impl Notifier for CompositeNotifier {
    async fn send_message(&self, text: &str) -> CoreResult<()> {
        let results = join_all(self.targets.iter().map(|target| {
            let target = target.clone();
            let text = text.to_string();
            async move { target.send_message(&text).await }
        }))
        .await;

        for result in results {
            if let Err(e) = result {
                warn!(error = %e, "a notification target failed");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl Notifier for Counting {
        async fn send_message(&self, _text: &str) -> CoreResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl Notifier for AlwaysFails {
        async fn send_message(&self, _text: &str) -> CoreResult<()> {
            Err(crate::domain::errors::CoreError::Other(anyhow::anyhow!("boom")))
        }
    }

    #[tokio::test]
    async fn fans_out_to_every_target_even_if_one_fails() {
        let calls = Arc::new(AtomicUsize::new(0));
        let composite = CompositeNotifier::new(vec![Arc::new(Counting(calls.clone())), Arc::new(AlwaysFails), Arc::new(Counting(calls.clone()))]);

        composite.send_message("hello").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn short_messages_are_not_chunked() {
        assert_eq!(WebhookNotifier::chunks("hello"), vec!["hello"]);
    }

    #[test]
    fn oversized_messages_split_into_multiple_chunks() {
        let long = "x".repeat(10_000);
        let chunks = WebhookNotifier::chunks(&long);
        assert!(chunks.len() > 1);
        assert_eq!(chunks.iter().map(|c| c.len()).sum::<usize>(), 10_000);
    }
}
