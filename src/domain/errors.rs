//! Crate-wide error kinds for the execution substrate.
//!
//! Each variant maps to one row of the error table in the design spec:
//! argument validation, action lookup, job failure, watcher cycles,
//! webhook malformation, timeouts, LLM response parsing, and scheduler
//! misconfiguration all get a distinct, matchable variant rather than a
//! single opaque string.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("action not found: {0}")]
    ActionNotFound(String),

    #[error("action already registered: {0}")]
    ActionAlreadyRegistered(String),

    #[error("action spec name '{spec_name}' does not match registration name '{name}'")]
    InvalidActionSpec { name: String, spec_name: String },

    #[error("missing required argument(s) for '{action}': {missing:?}")]
    MissingRequiredArguments { action: String, missing: Vec<String> },

    #[error("unknown argument(s) for '{action}': {unknown:?}")]
    UnknownArguments { action: String, unknown: Vec<String> },

    #[error("expected at least {required} positional argument(s) for '{action}', got {got}")]
    TooFewPositionalArguments {
        action: String,
        required: usize,
        got: usize,
    },

    #[error("expected at most {max} positional argument(s) for '{action}', got {got}")]
    TooManyPositionalArguments { action: String, max: usize, got: usize },

    #[error("job not found: {0}")]
    JobNotFound(Uuid),

    #[error("job failed: {0}")]
    JobFailed(String),

    #[error("timed out waiting for job {0} after {1:?}")]
    JobWaitTimeout(Uuid, std::time::Duration),

    #[error("webhook request malformed: {0}")]
    WebhookMalformed(String),

    #[error("unknown webhook path: {0}")]
    WebhookNotFound(String),

    #[error("scheduler cannot schedule unknown action: {0}")]
    UnknownScheduledAction(String),

    #[error("LLM response was not valid JSON: {0}")]
    LlmResponseNotJson(String),

    #[error("LLM response missing or malformed required field: {0}")]
    LlmResponseSchema(String),

    #[error("planner run exceeded its step or time budget")]
    PlannerBudgetExceeded,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
