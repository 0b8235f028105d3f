use std::collections::HashMap;

use serde_json::Value;

use crate::types::WorkflowStep;

/// How the workflow engine actually calls out to run a step.
///
/// Implemented by the Agent Runtime façade, which routes the call to the
/// local Function Dispatcher or a remote agent over A2A Transport depending
/// on `target_agent_id`. Kept as a trait so this crate has no dependency on
/// either.
#[async_trait::async_trait]
pub trait StepDispatcher: Send + Sync {
    /// Run one step with its fully merged parameter map, returning the
    /// step's result data or an error message.
    async fn dispatch(
        &self,
        step: &WorkflowStep,
        effective_params: HashMap<String, Value>,
    ) -> Result<Value, String>;
}
