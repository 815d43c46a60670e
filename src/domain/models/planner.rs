//! Planner run state and audit trail (C8).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One step of a planner run, recorded for audit. In-memory only unless the
/// surrounding job chooses to persist the full run via `JobResult.data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStep {
    pub step_number: u32,
    pub action: String,
    pub input_data: serde_json::Value,
    pub output_data: serde_json::Value,
    pub reasoning: String,
    pub next_action: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// The structured JSON a planner expects back from the LLM each step.
/// Deserialization is strict: every field must be present with the right
/// type, and `command.is_empty()` is the sentinel for "just respond".
#[derive(Debug, Clone, Deserialize)]
pub struct PlanStep {
    pub thought: String,
    pub command: String,
    pub output: String,
    pub is_final: bool,
}

/// The mutable state threaded through a single planner run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerState {
    pub message: String,
    pub status: PlannerStatus,
    pub last_result: Option<String>,
    pub command_history: Vec<String>,
    pub is_final: bool,
    pub step_count: u32,
    pub result: Option<String>,
    pub error: Option<String>,
}

impl PlannerState {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: PlannerStatus::Started,
            last_result: None,
            command_history: Vec::new(),
            is_final: false,
            step_count: 0,
            result: None,
            error: None,
        }
    }

    /// The truncated view handed to the LLM each step: only the fields the
    /// plan actually needs, so a long-running conversation doesn't grow the
    /// prompt without bound.
    pub fn truncated_for_llm(&self) -> serde_json::Value {
        serde_json::json!({
            "message": self.message,
            "status": self.status,
            "last_result": self.last_result,
            "error": self.error,
            "result": self.result,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannerStatus {
    Started,
    InProgress,
    Completed,
    Failed,
}
