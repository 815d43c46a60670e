//! End-to-end scenario spanning C1 (action registry), C4 (job manager) and
//! C8 (planner): an action that launches a background job, with the
//! planner transparently awaiting the job's result before producing its
//! final response.

mod helpers;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use async_trait::async_trait;

use sentryd::domain::errors::CoreResult;
use sentryd::domain::models::{ActionSpec, ArgSpec, JobResult};
use sentryd::domain::ports::{ActionArgs, ActionHandler, ActionOutcome, ChatMessage, LlmClient, Notifier};
use sentryd::infrastructure::database::SqliteJobStore;
use sentryd::services::{ActionRegistry, JobManager, JobTask, Planner};

struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn send_message(&self, _text: &str) -> CoreResult<()> {
        Ok(())
    }
}

struct DoneTask;

#[async_trait]
impl JobTask for DoneTask {
    async fn run(&self, _stop_signal: Arc<AtomicBool>) -> CoreResult<JobResult> {
        Ok(JobResult {
            success: true,
            message: None,
            data: None,
            outputs: vec!["done".to_string()],
        })
    }
}

struct LongTaskHandler {
    jobs: Arc<JobManager>,
}

#[async_trait]
impl ActionHandler for LongTaskHandler {
    async fn call(&self, _args: ActionArgs) -> CoreResult<ActionOutcome> {
        let job_id = self.jobs.submit("long_task", Arc::new(DoneTask)).await?;
        Ok(ActionOutcome::JobLaunched(job_id))
    }
}

fn long_task_spec() -> ActionSpec {
    ActionSpec {
        name: "long_task".to_string(),
        description: "run a background task".to_string(),
        help_text: String::new(),
        agent_hint: String::new(),
        arguments: vec![ArgSpec::optional("note", "an optional note")],
    }
}

struct ScriptedLlm {
    responses: tokio::sync::Mutex<Vec<String>>,
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, _messages: &[ChatMessage]) -> CoreResult<String> {
        let mut responses = self.responses.lock().await;
        Ok(responses.remove(0))
    }
}

#[tokio::test]
async fn planner_transparently_awaits_a_launched_job() {
    let pool = helpers::setup_test_db().await;

    let job_store = Arc::new(SqliteJobStore::new(pool));
    let jobs = Arc::new(JobManager::new(job_store, Arc::new(NullNotifier)));

    let registry = Arc::new(ActionRegistry::new());
    registry
        .register("long_task", long_task_spec(), Arc::new(LongTaskHandler { jobs: jobs.clone() }))
        .await
        .unwrap();

    let llm = Arc::new(ScriptedLlm {
        responses: tokio::sync::Mutex::new(vec![
            r#"{"thought":"dispatch the long task","command":"long_task","output":"","is_final":false}"#.to_string(),
            r#"{"thought":"summarize the job result","command":"","output":"done","is_final":true}"#.to_string(),
        ]),
    });

    let planner = Planner::new(registry, jobs, llm);

    let result = planner.run("Run it").await.unwrap();

    assert_eq!(result, "done");
}
