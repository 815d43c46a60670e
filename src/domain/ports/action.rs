//! The narrow interface actions are dispatched through (C1/C2 boundary).

use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::errors::CoreResult;

/// Arguments as parsed by the command parser: either a positional list or a
/// name-keyed map, matching however the caller supplied them.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionArgs {
    Positional(Vec<String>),
    Named(HashMap<String, String>),
}

impl ActionArgs {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Positional(v) => v.is_empty(),
            Self::Named(m) => m.is_empty(),
        }
    }
}

/// What an action handler hands back to its caller.
#[derive(Debug, Clone)]
pub enum ActionOutcome {
    /// Plain human-readable text.
    Text(String),
    /// A structured value (e.g. for a chat client that renders JSON).
    Structured(serde_json::Value),
    /// The action started a background job; callers that detect this must
    /// transparently await the job's terminal result.
    JobLaunched(uuid::Uuid),
}

impl ActionOutcome {
    /// Render as the string form the planner threads through `last_result`.
    pub fn as_display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Structured(v) => v.to_string(),
            Self::JobLaunched(id) => format!("Job started with ID: {id}"),
        }
    }
}

/// A callable operation registered in C1. Implementations accept whichever
/// argument shape the parser produced and return one of a text result, a
/// structured result, or a job-launched sentinel.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn call(&self, args: ActionArgs) -> CoreResult<ActionOutcome>;
}
