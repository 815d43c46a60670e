//! Bridges C1 to C8: a built-in action that hands its argument to the
//! planner and returns its final response.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::CoreResult;
use crate::domain::models::{ActionSpec, ArgSpec};
use crate::domain::ports::{ActionArgs, ActionHandler, ActionOutcome};
use crate::services::planner::Planner;

pub struct AskAction {
    planner: Arc<Planner>,
}

impl AskAction {
    pub fn new(planner: Arc<Planner>) -> Self {
        Self { planner }
    }

    pub fn spec() -> ActionSpec {
        ActionSpec {
            name: "ask".to_string(),
            description: "Run the LLM planner against a free-form message".to_string(),
            help_text: "ask <message> — hands the message to the bounded planner loop and returns its final response.".to_string(),
            agent_hint: "Use for open-ended requests that may require chaining several registered actions.".to_string(),
            arguments: vec![ArgSpec::required("message", "the message to plan and act on")],
        }
    }
}

#[async_trait]
impl ActionHandler for AskAction {
    async fn call(&self, args: ActionArgs) -> CoreResult<ActionOutcome> {
        let message = match &args {
            ActionArgs::Positional(values) => values.first().cloned().unwrap_or_default(),
            ActionArgs::Named(map) => map.get("message").cloned().unwrap_or_default(),
        };

        let result = self.planner.run(message).await?;
        Ok(ActionOutcome::Text(result))
    }
}
