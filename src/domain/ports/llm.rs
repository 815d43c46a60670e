//! The LLM chat-completion boundary the planner (C8) runs against.

use async_trait::async_trait;

use crate::domain::errors::CoreResult;

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a full conversation and return the assistant's raw text reply.
    /// Callers are responsible for parsing that text as a `PlanStep`.
    async fn complete(&self, messages: &[ChatMessage]) -> CoreResult<String>;
}
