//! LLM Planner (C8): a bounded plan-then-execute loop over the action
//! registry, with loop detection and transparent awaiting of launched jobs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::errors::{CoreError, CoreResult};
use crate::domain::models::{ExecutionStep, PlanStep, PlannerState, PlannerStatus};
use crate::domain::ports::{ActionOutcome, ChatMessage, ChatRole, LlmClient};
use crate::services::action_registry::ActionRegistry;
use crate::services::command_parser;
use crate::services::job_manager::JobManager;

const SYSTEM_PROMPT: &str = "You are an autonomous security research assistant. Respond with a single JSON object with fields: thought (string), command (string, empty if you are only responding), output (string), is_final (bool). Do not include any text outside the JSON object.";

pub struct PlannerConfig {
    pub max_steps: u32,
    pub timeout: Duration,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_steps: 10,
            timeout: Duration::from_secs(300),
        }
    }
}

pub struct Planner {
    registry: Arc<ActionRegistry>,
    jobs: Arc<JobManager>,
    llm: Arc<dyn LlmClient>,
    config: PlannerConfig,
}

impl Planner {
    pub fn new(registry: Arc<ActionRegistry>, jobs: Arc<JobManager>, llm: Arc<dyn LlmClient>) -> Self {
        Self::with_config(registry, jobs, llm, PlannerConfig::default())
    }

    pub fn with_config(registry: Arc<ActionRegistry>, jobs: Arc<JobManager>, llm: Arc<dyn LlmClient>, config: PlannerConfig) -> Self {
        Self { registry, jobs, llm, config }
    }

    /// Run the bounded loop for a single user message to completion.
    pub async fn run(&self, message: impl Into<String>) -> CoreResult<String> {
        let mut state = PlannerState::new(message);
        state.status = PlannerStatus::InProgress;
        let started = Instant::now();
        let mut steps: Vec<ExecutionStep> = Vec::new();

        loop {
            if state.step_count >= self.config.max_steps {
                state.status = PlannerStatus::Failed;
                warn!(max_steps = self.config.max_steps, "planner terminated on step budget");
                return Err(CoreError::PlannerBudgetExceeded);
            }
            if started.elapsed() >= self.config.timeout {
                state.status = PlannerStatus::Failed;
                warn!(elapsed = ?started.elapsed(), "planner terminated on time budget");
                return Err(CoreError::PlannerBudgetExceeded);
            }

            let prompt = self.build_prompt(&state).await;
            let raw = self.llm.complete(&prompt).await?;
            let plan = parse_plan_step(&raw)?;

            state.step_count += 1;

            if plan.command.trim().is_empty() {
                steps.push(ExecutionStep {
                    step_number: state.step_count,
                    action: String::new(),
                    input_data: serde_json::json!({}),
                    output_data: serde_json::json!({ "output": plan.output }),
                    reasoning: plan.thought,
                    next_action: None,
                    timestamp: Utc::now(),
                });

                if plan.is_final {
                    state.status = PlannerStatus::Completed;
                    state.result = Some(plan.output.clone());
                    return Ok(plan.output);
                }
                continue;
            }

            let (name, tail) = plan.command.split_once(' ').unwrap_or((plan.command.as_str(), ""));
            let name = name.to_string();

            let prior_repeats = state.command_history.iter().filter(|c| **c == name).count();
            if prior_repeats >= 2 && state.last_result.is_some() {
                let surfaced = state.last_result.clone().unwrap_or_default();
                info!(command = %name, "planner loop-breaker triggered");
                state.status = PlannerStatus::Completed;
                state.result = Some(surfaced.clone());
                steps.push(ExecutionStep {
                    step_number: state.step_count,
                    action: name,
                    input_data: serde_json::json!({}),
                    output_data: serde_json::json!({ "output": surfaced }),
                    reasoning: "loop-breaker: repeated command with a known result".to_string(),
                    next_action: None,
                    timestamp: Utc::now(),
                });
                return Ok(surfaced);
            }

            let args = command_parser::parse_args(tail);
            let outcome = self.registry.dispatch(&name, args).await;

            let last_result = match outcome {
                Ok(ActionOutcome::JobLaunched(job_id)) => {
                    let result = self.jobs.wait_for_result(job_id, self.config.timeout).await?;
                    if result.outputs.is_empty() {
                        result.message.unwrap_or_default()
                    } else {
                        result.outputs.join("\n")
                    }
                }
                Ok(outcome) => outcome.as_display(),
                Err(e) => format!("error: {e}"),
            };

            state.command_history.push(name.clone());
            state.last_result = Some(last_result.clone());

            steps.push(ExecutionStep {
                step_number: state.step_count,
                action: name.clone(),
                input_data: serde_json::json!({ "tail": tail }),
                output_data: serde_json::json!({ "result": last_result }),
                reasoning: plan.thought,
                next_action: None,
                timestamp: Utc::now(),
            });

            if plan.is_final {
                state.status = PlannerStatus::Completed;
                state.result = Some(plan.output.clone());
                return Ok(plan.output);
            }
        }
    }

    async fn build_prompt(&self, state: &PlannerState) -> Vec<ChatMessage> {
        let commands = self.registry.commands(None).await;
        let mut lines = Vec::new();
        for (name, cmd) in &commands {
            lines.push(format!(
                "- {name}: {desc} (required: {req:?}, optional: {opt:?})",
                desc = cmd.description,
                req = cmd.required_params,
                opt = cmd.optional_params
            ));
        }
        lines.sort();

        let user_content = format!(
            "Available commands:\n{}\n\nCurrent state:\n{}",
            lines.join("\n"),
            serde_json::to_string_pretty(&state.truncated_for_llm()).unwrap_or_default()
        );

        vec![
            ChatMessage {
                role: ChatRole::System,
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: ChatRole::User,
                content: user_content,
            },
        ]
    }
}

/// Strip a fenced code block (` ```json ... ``` ` or ` ``` ... ``` `) or a
/// bare leading `json` token, then parse strictly. Any schema deviation is
/// an error, not a best-effort repair.
fn parse_plan_step(raw: &str) -> CoreResult<PlanStep> {
    let trimmed = raw.trim();
    let stripped = if let Some(inner) = trimmed.strip_prefix("```json") {
        inner.trim_end_matches("```").trim()
    } else if let Some(inner) = trimmed.strip_prefix("```") {
        inner.trim_end_matches("```").trim()
    } else if let Some(inner) = trimmed.strip_prefix("json") {
        inner.trim()
    } else {
        trimmed
    };

    serde_json::from_str::<PlanStep>(stripped).map_err(|e| CoreError::LlmResponseSchema(e.to_string()))
}
