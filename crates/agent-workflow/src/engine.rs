//! Wave-based DAG scheduler: the core of the workflow engine.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::dag;
use crate::dispatch::StepDispatcher;
use crate::error::Result;
use crate::types::{MissingDependencyPolicy, StepOutcome, StepResult, Workflow, WorkflowResult, WorkflowStep};

const DEFAULT_MAX_PARALLEL_STEPS: usize = 8;

/// Runs [`Workflow`]s against a [`StepDispatcher`], scheduling steps in
/// dependency-respecting waves bounded by a concurrency cap.
pub struct WorkflowEngine<D> {
    dispatcher: Arc<D>,
    max_parallel_steps: usize,
}

impl<D: StepDispatcher + 'static> WorkflowEngine<D> {
    pub fn new(dispatcher: Arc<D>) -> Self {
        Self { dispatcher, max_parallel_steps: DEFAULT_MAX_PARALLEL_STEPS }
    }

    pub fn with_max_parallel_steps(mut self, max_parallel_steps: usize) -> Self {
        self.max_parallel_steps = max_parallel_steps.max(1);
        self
    }

    /// Validate and run a workflow to completion. `cancel` lets a caller
    /// abort a run already in progress; not-yet-started steps become
    /// `Cancelled` rather than running.
    pub async fn run(&self, workflow: &Workflow, cancel: CancellationToken) -> Result<WorkflowResult> {
        dag::validate(&workflow.steps)?;

        let by_id: HashMap<&str, &WorkflowStep> =
            workflow.steps.iter().map(|s| (s.id.as_str(), s)).collect();
        let mut results: HashMap<String, StepResult> = HashMap::with_capacity(workflow.steps.len());
        let mut pending: Vec<&str> = workflow.steps.iter().map(|s| s.id.as_str()).collect();
        let semaphore = Arc::new(Semaphore::new(self.max_parallel_steps));
        let mut abort = false;

        while !pending.is_empty() {
            if cancel.is_cancelled() || abort {
                for id in pending.drain(..) {
                    results.insert(
                        id.to_string(),
                        StepResult {
                            step_id: id.to_string(),
                            outcome: StepOutcome::Cancelled,
                            data: None,
                            error: Some("workflow cancelled".to_string()),
                        },
                    );
                }
                break;
            }

            let ready: Vec<&str> = pending
                .iter()
                .copied()
                .filter(|id| by_id[id].depends_on.iter().all(|d| results.contains_key(d)))
                .collect();

            // Acyclicity guarantees `ready` is non-empty whenever `pending` is not.
            let wave_order = ready.iter().map(|id| by_id[id].order).min().expect("ready is non-empty");
            let wave: Vec<&str> = ready.into_iter().filter(|id| by_id[id].order == wave_order).collect();

            let mut skipped_in_wave = Vec::new();
            let mut to_run = Vec::new();
            for id in wave {
                let step = by_id[id];
                if should_skip(step, &results) {
                    skipped_in_wave.push(id);
                } else {
                    to_run.push(id);
                }
            }
            for id in &skipped_in_wave {
                results.insert(
                    id.to_string(),
                    StepResult { step_id: id.to_string(), outcome: StepOutcome::Skipped, data: None, error: None },
                );
            }

            let outcomes = run_wave(&self.dispatcher, &to_run, &by_id, &results, workflow, &semaphore, &cancel).await;
            for result in outcomes {
                if result.outcome == StepOutcome::Failed && by_id[result.step_id.as_str()].required {
                    tracing::error!(step = %result.step_id, "required step failed, aborting workflow");
                    abort = true;
                }
                results.insert(result.step_id.clone(), result);
            }

            let ran: std::collections::HashSet<&str> =
                skipped_in_wave.iter().chain(to_run.iter()).copied().collect();
            pending.retain(|id| !ran.contains(id));
        }

        let success = workflow
            .steps
            .iter()
            .filter(|s| s.required)
            .all(|s| results.get(&s.id).map(|r| r.outcome == StepOutcome::Success).unwrap_or(false));

        Ok(WorkflowResult { workflow_id: workflow.id.clone(), success, steps: results })
    }
}

/// A dependent is skipped outright when any dependency didn't succeed and
/// its policy says `Skip` rather than run with empty data for that key.
fn should_skip(step: &WorkflowStep, results: &HashMap<String, StepResult>) -> bool {
    if step.missing_dependency_policy != MissingDependencyPolicy::Skip {
        return false;
    }
    step.depends_on
        .iter()
        .any(|d| results.get(d).map(|r| r.outcome != StepOutcome::Success).unwrap_or(true))
}

#[allow(clippy::too_many_arguments)]
async fn run_wave<D: StepDispatcher + 'static>(
    dispatcher: &Arc<D>,
    ids: &[&str],
    by_id: &HashMap<&str, &WorkflowStep>,
    results: &HashMap<String, StepResult>,
    workflow: &Workflow,
    semaphore: &Arc<Semaphore>,
    cancel: &CancellationToken,
) -> Vec<StepResult> {
    let mut handles = Vec::with_capacity(ids.len());
    for id in ids {
        let step = (*by_id[id]).clone();
        let effective_params = build_effective_params(&step, workflow, results);
        let dispatcher = dispatcher.clone();
        let semaphore = semaphore.clone();
        let cancel = cancel.clone();
        let timeout = step.timeout.or(workflow.timeout);

        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore not closed");
            let call = dispatcher.dispatch(&step, effective_params);
            let outcome = tokio::select! {
                _ = cancel.cancelled() => {
                    StepResult {
                        step_id: step.id.clone(),
                        outcome: StepOutcome::Cancelled,
                        data: None,
                        error: Some("workflow cancelled".to_string()),
                    }
                }
                result = run_with_optional_timeout(call, timeout) => result_to_step_result(&step.id, result),
            };
            outcome
        }));
    }

    let mut out = Vec::with_capacity(handles.len());
    for handle in handles {
        out.push(handle.await.expect("step task panicked"));
    }
    out
}

enum TimedResult {
    Completed(std::result::Result<Value, String>),
    TimedOut,
}

async fn run_with_optional_timeout(
    call: impl std::future::Future<Output = std::result::Result<Value, String>>,
    timeout: Option<std::time::Duration>,
) -> TimedResult {
    match timeout {
        Some(d) => match tokio::time::timeout(d, call).await {
            Ok(result) => TimedResult::Completed(result),
            Err(_) => TimedResult::TimedOut,
        },
        None => TimedResult::Completed(call.await),
    }
}

fn result_to_step_result(step_id: &str, result: TimedResult) -> StepResult {
    match result {
        TimedResult::Completed(Ok(data)) => {
            StepResult { step_id: step_id.to_string(), outcome: StepOutcome::Success, data: Some(data), error: None }
        }
        TimedResult::Completed(Err(e)) => {
            StepResult { step_id: step_id.to_string(), outcome: StepOutcome::Failed, data: None, error: Some(e) }
        }
        TimedResult::TimedOut => StepResult {
            step_id: step_id.to_string(),
            outcome: StepOutcome::Timeout,
            data: None,
            error: Some("step timed out".to_string()),
        },
    }
}

/// Merges step parameters, global context, and `dep_<id>_*`-prefixed
/// dependency result data into the map a step's dispatch actually sees.
fn build_effective_params(
    step: &WorkflowStep,
    workflow: &Workflow,
    results: &HashMap<String, StepResult>,
) -> HashMap<String, Value> {
    let mut params = step.parameters.clone();

    for (k, v) in &workflow.global_context {
        params.entry(k.clone()).or_insert_with(|| v.clone());
    }

    for dep in &step.depends_on {
        let Some(dep_result) = results.get(dep) else { continue };
        let Some(Value::Object(data)) = &dep_result.data else { continue };
        for (k, v) in data {
            params.insert(format!("dep_{dep}_{k}"), v.clone());
        }
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    fn step(id: &str, order: u32, depends_on: &[&str], required: bool) -> WorkflowStep {
        WorkflowStep {
            id: id.to_string(),
            target_agent_id: "agent-1".to_string(),
            skill_name: "echo".to_string(),
            operation: "run".to_string(),
            parameters: HashMap::new(),
            timeout: None,
            order,
            required,
            depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
            missing_dependency_policy: MissingDependencyPolicy::RunWithEmptyData,
        }
    }

    struct RecordingDispatcher {
        order: Mutex<Vec<String>>,
        fail: Vec<String>,
    }

    #[async_trait]
    impl StepDispatcher for RecordingDispatcher {
        async fn dispatch(
            &self,
            step: &WorkflowStep,
            params: HashMap<String, Value>,
        ) -> std::result::Result<Value, String> {
            self.order.lock().unwrap().push(step.id.clone());
            if self.fail.contains(&step.id) {
                return Err("boom".to_string());
            }
            Ok(json!({ "seen": params.keys().cloned().collect::<Vec<_>>() }))
        }
    }

    fn workflow(steps: Vec<WorkflowStep>) -> Workflow {
        Workflow { id: "wf-1".to_string(), name: "test".to_string(), steps, global_context: HashMap::new(), timeout: None }
    }

    #[tokio::test]
    async fn runs_steps_in_dependency_order() {
        let dispatcher = Arc::new(RecordingDispatcher { order: Mutex::new(Vec::new()), fail: vec![] });
        let engine = WorkflowEngine::new(dispatcher.clone());
        let wf = workflow(vec![step("a", 0, &[], true), step("b", 1, &["a"], true)]);

        let result = engine.run(&wf, CancellationToken::new()).await.unwrap();
        assert!(result.success);
        assert_eq!(result.steps["a"].outcome, StepOutcome::Success);
        assert_eq!(result.steps["b"].outcome, StepOutcome::Success);

        let order = dispatcher.order.lock().unwrap();
        assert_eq!(order.as_slice(), ["a", "b"]);
    }

    #[tokio::test]
    async fn required_step_failure_cancels_remaining_steps() {
        let dispatcher = Arc::new(RecordingDispatcher { order: Mutex::new(Vec::new()), fail: vec!["a".to_string()] });
        let engine = WorkflowEngine::new(dispatcher);
        let wf = workflow(vec![step("a", 0, &[], true), step("b", 1, &["a"], true)]);

        let result = engine.run(&wf, CancellationToken::new()).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.steps["a"].outcome, StepOutcome::Failed);
        assert_eq!(result.steps["b"].outcome, StepOutcome::Cancelled);
    }

    #[tokio::test]
    async fn optional_step_failure_does_not_abort_workflow() {
        let dispatcher = Arc::new(RecordingDispatcher { order: Mutex::new(Vec::new()), fail: vec!["a".to_string()] });
        let engine = WorkflowEngine::new(dispatcher);
        let wf = workflow(vec![step("a", 0, &[], false), step("b", 1, &["a"], true)]);

        let result = engine.run(&wf, CancellationToken::new()).await.unwrap();
        assert!(result.success);
        assert_eq!(result.steps["a"].outcome, StepOutcome::Failed);
        assert_eq!(result.steps["b"].outcome, StepOutcome::Success);
    }

    #[tokio::test]
    async fn skip_policy_skips_dependent_when_dependency_fails() {
        let dispatcher = Arc::new(RecordingDispatcher { order: Mutex::new(Vec::new()), fail: vec!["a".to_string()] });
        let engine = WorkflowEngine::new(dispatcher);
        let mut b = step("b", 1, &["a"], false);
        b.missing_dependency_policy = MissingDependencyPolicy::Skip;
        let wf = workflow(vec![step("a", 0, &[], false), b]);

        let result = engine.run(&wf, CancellationToken::new()).await.unwrap();
        assert_eq!(result.steps["b"].outcome, StepOutcome::Skipped);
    }

    #[tokio::test]
    async fn dependency_result_data_is_prefixed_for_dependents() {
        let dispatcher = Arc::new(RecordingDispatcher { order: Mutex::new(Vec::new()), fail: vec![] });
        let engine = WorkflowEngine::new(dispatcher);
        let wf = workflow(vec![step("a", 0, &[], true), step("b", 1, &["a"], true)]);

        let result = engine.run(&wf, CancellationToken::new()).await.unwrap();
        let seen = result.steps["b"].data.as_ref().unwrap()["seen"].as_array().unwrap();
        assert!(seen.iter().any(|v| v == "dep_a_seen"));
    }

    #[tokio::test]
    async fn cancellation_token_stops_unstarted_steps() {
        let dispatcher = Arc::new(RecordingDispatcher { order: Mutex::new(Vec::new()), fail: vec![] });
        let engine = WorkflowEngine::new(dispatcher);
        let wf = workflow(vec![step("a", 0, &[], true), step("b", 1, &["a"], true)]);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = engine.run(&wf, cancel).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.steps["a"].outcome, StepOutcome::Cancelled);
        assert_eq!(result.steps["b"].outcome, StepOutcome::Cancelled);
    }
}
