use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What to do for a dependent step when one of its dependencies is an
/// optional step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingDependencyPolicy {
    /// Run the dependent with empty data for the missing dependency's keys.
    #[default]
    RunWithEmptyData,
    /// Skip the dependent outright.
    Skip,
}

/// A single node in a workflow DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// Unique id within the owning workflow.
    pub id: String,
    /// Agent this step's skill call targets.
    pub target_agent_id: String,
    /// Skill to invoke.
    pub skill_name: String,
    /// Operation on that skill to invoke.
    pub operation: String,
    /// Parameters passed to the operation, before dependency data is merged in.
    pub parameters: HashMap<String, Value>,
    /// Per-step timeout; falls back to the workflow's overall timeout if unset.
    #[serde(default, with = "duration_secs_opt")]
    pub timeout: Option<Duration>,
    /// Scheduling band: steps with equal order run concurrently once eligible.
    pub order: u32,
    /// Whether failure of this step fails the whole workflow.
    #[serde(default = "default_required")]
    pub required: bool,
    /// Ids of steps that must reach a terminal state before this one starts.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// How to treat this step when a dependency it needs data from failed.
    #[serde(default)]
    pub missing_dependency_policy: MissingDependencyPolicy,
}

fn default_required() -> bool {
    true
}

/// A multi-step request: a DAG of skill invocations, possibly across agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique workflow id.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Steps, in no particular order — `depends_on` encodes the DAG.
    pub steps: Vec<WorkflowStep>,
    /// Context values visible to every step.
    #[serde(default)]
    pub global_context: HashMap<String, Value>,
    /// Overall workflow timeout.
    #[serde(default, with = "duration_secs_opt")]
    pub timeout: Option<Duration>,
}

/// Terminal state of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepOutcome {
    /// Completed successfully.
    Success,
    /// Completed with an error.
    Failed,
    /// Never started, because a policy or upstream failure excluded it.
    Skipped,
    /// Did not complete within its timeout.
    Timeout,
    /// Cancelled before completion.
    Cancelled,
}

/// The recorded result of one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// The step this result belongs to.
    pub step_id: String,
    /// Terminal outcome.
    pub outcome: StepOutcome,
    /// Result data on success.
    pub data: Option<Value>,
    /// Error message on failure/timeout/cancellation.
    pub error: Option<String>,
}

/// Immutable outcome of running a [`Workflow`] to completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    /// The workflow this result belongs to.
    pub workflow_id: String,
    /// `true` iff every `required` step reached `Success`.
    pub success: bool,
    /// Every step's outcome, keyed by step id.
    pub steps: HashMap<String, StepResult>,
}

mod duration_secs_opt {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        value.map(|d| d.as_secs()).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_secs))
    }
}
