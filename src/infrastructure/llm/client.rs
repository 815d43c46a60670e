use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use std::time::Duration;

use super::types::{ContentBlock, Message, MessageRequest, MessageResponse};
use crate::domain::errors::{CoreError, CoreResult};
use crate::domain::ports::{ChatMessage, ChatRole, LlmClient};

/// Thin wrapper over the Anthropic Messages API. No rate limiting or retry
/// policy — the planner's own step budget is the only backpressure this
/// crate needs; callers that want resilience wrap this in their own policy.
pub struct AnthropicClient {
    http_client: ReqwestClient,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, model: impl Into<String>, max_tokens: u32, timeout_secs: u64) -> anyhow::Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_max_idle_per_host(10)
            .tcp_nodelay(true)
            .build()?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
            max_tokens,
        })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, messages: &[ChatMessage]) -> CoreResult<String> {
        let system = messages
            .iter()
            .find(|m| m.role == ChatRole::System)
            .map(|m| m.content.clone());

        let request = MessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system,
            messages: messages
                .iter()
                .filter(|m| m.role != ChatRole::System)
                .map(|m| Message {
                    role: match m.role {
                        ChatRole::User => "user".to_string(),
                        ChatRole::Assistant => "assistant".to_string(),
                        ChatRole::System => unreachable!("system messages are filtered above"),
                    },
                    content: m.content.clone(),
                })
                .collect(),
        };

        let response = self
            .http_client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| CoreError::Other(e.into()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::Other(anyhow::anyhow!("LLM request failed ({status}): {body}")));
        }

        let parsed: MessageResponse = response.json().await.map_err(|e| CoreError::Other(e.into()))?;

        let text = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        Ok(text)
    }
}
