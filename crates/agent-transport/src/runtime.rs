//! Agent Runtime: the top-level façade that routes an `Execute` request to
//! the local Function Dispatcher or a remote agent, and tracks the agent's
//! own lifecycle state.

use std::collections::HashMap;
use std::sync::Arc;

use agent_runtime::{CompositionEntry, FunctionDispatcher, HealthState, PluginHost, RuntimeError, SideEffectClass};
use agent_workflow::{StepDispatcher, WorkflowStep};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::client::A2aClient;
use crate::discovery::Discovery;
use crate::errors::TransportError;
use crate::types::{A2aMessage, AgentIdentity, MessageType, Payload, Priority, SkillRequestPayload, SkillResponsePayload};
use agent_workflow::{Workflow, WorkflowEngine};
use tokio_util::sync::CancellationToken;

/// Lifecycle state of a running agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Initializing,
    Ready,
    Degraded,
    Draining,
    Stopped,
}

/// The unified, stable error shape every crate's taxonomy converges into at
/// this façade.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgentError {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    pub retryable: bool,
}

impl AgentError {
    fn new(kind: &str, message: impl Into<String>, retryable: bool) -> Self {
        Self { kind: kind.to_string(), message: message.into(), cause: None, retryable }
    }
}

impl From<RuntimeError> for AgentError {
    fn from(e: RuntimeError) -> Self {
        let kind = match &e {
            RuntimeError::VersionUnsatisfied { .. } => "VersionUnsatisfied",
            RuntimeError::SkillConflict(..) => "SkillConflict",
            RuntimeError::SkillMissingRequired(_) => "SkillMissingRequired",
            RuntimeError::CompositionCycle(_) => "CompositionCycle",
            RuntimeError::ConfigSchemaViolation { .. } => "ConfigSchemaViolation",
            RuntimeError::InitializationFailed(..) => "InitializationFailed",
            RuntimeError::InitializationTimeout(..) => "InitializationTimeout",
            RuntimeError::DependencyNotReady(_) => "DependencyNotReady",
            RuntimeError::Reloading(_) => "Reloading",
            RuntimeError::ShuttingDown => "ShuttingDown",
            RuntimeError::OperationNotFound { .. } => "OperationNotFound",
            RuntimeError::InvalidArgument { .. } => "InvalidArgument",
            RuntimeError::SkillUnavailable(_) => "SkillUnavailable",
            RuntimeError::WriteForbidden(_) => "WriteForbidden",
            _ => "RuntimeError",
        };
        let retryable = e.retryable();
        Self::new(kind, e.to_string(), retryable)
    }
}

impl From<TransportError> for AgentError {
    fn from(e: TransportError) -> Self {
        let kind = match &e {
            TransportError::TargetUnknown(_) => "TargetUnknown",
            TransportError::Unreachable(..) => "Unreachable",
            TransportError::Timeout(_) => "Timeout",
            TransportError::CircuitOpen(_) => "CircuitOpen",
            TransportError::Unauthorized(_) => "Unauthorized",
            TransportError::ProtocolError(..) => "ProtocolError",
            TransportError::Overloaded(_) => "Overloaded",
            TransportError::RateLimited(..) => "RateLimited",
        };
        let retryable = e.retryable();
        Self::new(kind, e.to_string(), retryable)
    }
}

impl From<agent_workflow::WorkflowError> for AgentError {
    fn from(e: agent_workflow::WorkflowError) -> Self {
        let kind = match &e {
            agent_workflow::WorkflowError::DuplicateStepId(_) => "DuplicateStepId",
            agent_workflow::WorkflowError::DependencyMissing { .. } => "DependencyMissing",
            agent_workflow::WorkflowError::DependencyCycle(_) => "DependencyCycle",
            agent_workflow::WorkflowError::StepTimeout(_) => "StepTimeout",
            agent_workflow::WorkflowError::StepCancelled(_) => "StepCancelled",
            agent_workflow::WorkflowError::RequiredStepFailed(_) => "RequiredStepFailed",
        };
        Self::new(kind, e.to_string(), false)
    }
}

impl From<agent_templates::TemplateError> for AgentError {
    fn from(e: agent_templates::TemplateError) -> Self {
        use agent_templates::TemplateError;
        let kind = match &e {
            TemplateError::Invalid(..) => "TemplateInvalid",
            TemplateError::ExtendsUnknown { .. } => "TemplateExtendsUnknown",
            TemplateError::ExtendsCycle(_) => "TemplateExtendsCycle",
            TemplateError::VersionUnsatisfied { .. } => "VersionUnsatisfied",
            TemplateError::SkillConflict(..) => "SkillConflict",
            TemplateError::SkillMissingRequired(_) => "SkillMissingRequired",
            TemplateError::CompositionCycle(_) => "CompositionCycle",
            TemplateError::ConfigSchemaViolation { .. } => "ConfigSchemaViolation",
            _ => "TemplateInvalid",
        };
        Self::new(kind, e.to_string(), false)
    }
}

/// A request to run one operation, either locally or against a named
/// remote agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub target_agent: Option<String>,
    pub skill: String,
    pub operation: String,
    #[serde(default)]
    pub parameters: HashMap<String, Value>,
    /// Context values the template marked "shareable"; propagated as-is.
    #[serde(default)]
    pub context: HashMap<String, Value>,
    /// When present, the request is delegated to the Workflow Engine instead
    /// of being treated as a single local/remote skill call.
    #[serde(default)]
    pub workflow: Option<Workflow>,
}

/// The result of an [`ExecuteRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AgentError>,
}

impl ExecuteResponse {
    fn ok(data: Value) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    fn err(error: AgentError) -> Self {
        Self { success: false, data: None, error: Some(error) }
    }
}

/// Top-level façade: routes execution requests, tracks lifecycle state,
/// and exposes the correlation id / context propagation Agent Runtime owns.
pub struct AgentRuntime {
    self_identity: AgentIdentity,
    state: RwLock<AgentState>,
    dispatcher: Arc<FunctionDispatcher>,
    host: Arc<PluginHost>,
    discovery: Arc<Discovery>,
    transport: Arc<A2aClient>,
    /// The composition plan's entries, keyed by skill name, kept around
    /// solely so a hot-reload request can find the entry to reload without
    /// the caller having to resupply it.
    plan: RwLock<HashMap<String, CompositionEntry>>,
    instance_name: RwLock<String>,
}

impl AgentRuntime {
    pub fn new(
        self_identity: AgentIdentity,
        dispatcher: Arc<FunctionDispatcher>,
        host: Arc<PluginHost>,
        discovery: Arc<Discovery>,
        transport: Arc<A2aClient>,
    ) -> Self {
        Self {
            self_identity,
            state: RwLock::new(AgentState::Initializing),
            dispatcher,
            host,
            discovery,
            transport,
            plan: RwLock::new(HashMap::new()),
            instance_name: RwLock::new(String::new()),
        }
    }

    pub fn identity(&self) -> &AgentIdentity {
        &self.self_identity
    }

    /// Record the composition plan that was loaded into the Plugin Host, so
    /// `reload_skill` can later find each skill's entry by name.
    pub async fn set_composition_plan(&self, entries: Vec<CompositionEntry>, instance_name: String) {
        let mut plan = self.plan.write().await;
        plan.clear();
        for entry in entries {
            plan.insert(entry.implementation.metadata.name.clone(), entry);
        }
        *self.instance_name.write().await = instance_name;
    }

    /// Per-skill health, as last observed by the Plugin Host.
    pub async fn skill_health(&self) -> HashMap<String, HealthState> {
        self.host.health_snapshot().await
    }

    /// Hot-reload a single skill via the Plugin Host, using the entry
    /// recorded by [`Self::set_composition_plan`].
    pub async fn reload_skill(&self, skill: &str) -> Result<(), AgentError> {
        let entry = self
            .plan
            .read()
            .await
            .get(skill)
            .cloned()
            .ok_or_else(|| RuntimeError::InstanceNotFound { skill: skill.to_string(), instance: String::new() })?;
        let instance_name = self.instance_name.read().await.clone();

        self.host.hot_reload(&entry, &instance_name).await?;
        self.refresh_health().await;
        Ok(())
    }

    pub async fn state(&self) -> AgentState {
        *self.state.read().await
    }

    /// Called once boot (template composition + skill loading) succeeds.
    pub async fn mark_ready(&self) {
        *self.state.write().await = AgentState::Ready;
    }

    /// Re-derives `Ready`/`Degraded` from the Plugin Host's aggregate
    /// skill health. A no-op while `Draining`/`Stopped`.
    pub async fn refresh_health(&self) {
        let mut state = self.state.write().await;
        if matches!(*state, AgentState::Draining | AgentState::Stopped) {
            return;
        }
        *state = match self.host.aggregate_health().await {
            HealthState::Healthy => AgentState::Ready,
            _ => AgentState::Degraded,
        };
    }

    /// Begin rejecting new requests; in-flight requests are left to
    /// complete or time out by their own callers.
    pub async fn begin_draining(&self) {
        *self.state.write().await = AgentState::Draining;
    }

    pub async fn mark_stopped(&self) {
        *self.state.write().await = AgentState::Stopped;
    }

    /// Run one `ExecuteRequest`, routing locally, remotely, or to the
    /// Workflow Engine, and attaching a correlation id to the span.
    pub async fn execute(self: &Arc<Self>, request: ExecuteRequest) -> ExecuteResponse {
        let correlation_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("execute", correlation_id = %correlation_id, skill = %request.skill, operation = %request.operation);
        let _entered = span.enter();

        if matches!(self.state().await, AgentState::Draining | AgentState::Stopped) {
            return ExecuteResponse::err(AgentError::new("ShuttingDown", "agent is draining or stopped", false));
        }

        if let Some(workflow) = &request.workflow {
            return self.execute_workflow(workflow).await;
        }

        let target_is_self =
            request.target_agent.as_deref().map(|t| t == self.self_identity.id).unwrap_or(true);

        if target_is_self {
            self.execute_local(&request, &correlation_id).await
        } else {
            self.execute_remote(&request, &correlation_id).await
        }
    }

    async fn execute_workflow(self: &Arc<Self>, workflow: &Workflow) -> ExecuteResponse {
        let engine = Self::workflow_engine(self);
        match engine.run(workflow, CancellationToken::new()).await {
            Ok(result) => ExecuteResponse::ok(json!(result)),
            Err(e) => ExecuteResponse::err(e.into()),
        }
    }

    /// Builds a fresh [`WorkflowEngine`] over this runtime, for callers that
    /// already hold a shared handle and want to drive a workflow directly
    /// (e.g. to supply their own cancellation token).
    pub fn workflow_engine(self_arc: &Arc<Self>) -> WorkflowEngine<RuntimeStepDispatcher> {
        WorkflowEngine::new(Arc::new(RuntimeStepDispatcher::new(self_arc.clone())))
    }

    async fn execute_local(&self, request: &ExecuteRequest, correlation_id: &str) -> ExecuteResponse {
        if let Some(SideEffectClass::Write) =
            self.dispatcher.operation_side_effect(&request.skill, &request.operation).await
        {
            if let Some(health) = self.host.health_snapshot().await.get(&request.skill) {
                if *health != HealthState::Healthy {
                    return ExecuteResponse::err(RuntimeError::SkillUnavailable(request.skill.clone()).into());
                }
            }
        }

        let args: Vec<(String, String)> = request
            .parameters
            .iter()
            .map(|(k, v)| (k.clone(), v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string())))
            .collect();

        match self
            .dispatcher
            .invoke(&request.skill, &request.operation, args, correlation_id, &self.self_identity.id)
            .await
        {
            Ok(result) => ExecuteResponse::ok(json!(result)),
            Err(e) => ExecuteResponse::err(e.into()),
        }
    }

    async fn execute_remote(&self, request: &ExecuteRequest, correlation_id: &str) -> ExecuteResponse {
        let target = match &request.target_agent {
            Some(id) => match self.discovery.find_by_id(id).await {
                Ok(identity) => identity,
                Err(e) => return ExecuteResponse::err(e.into()),
            },
            None => unreachable!("execute_remote only called when target_agent is set"),
        };

        let message = A2aMessage {
            id: correlation_id.to_string(),
            message_type: MessageType::Request,
            from: self.self_identity.clone(),
            to: target.clone(),
            conversation_id: Some(correlation_id.to_string()),
            priority: Priority::Normal,
            time_to_live_seconds: Some(30),
            payload: Payload {
                content_type: "skill/request".to_string(),
                content: json!(SkillRequestPayload {
                    skill_name: request.skill.clone(),
                    operation: request.operation.clone(),
                    parameters: request.parameters.clone(),
                    context: request.context.clone(),
                }),
            },
        };

        match self.transport.send_request(&target.endpoint, &message).await {
            Ok(response) => match serde_json::from_value::<SkillResponsePayload>(response.payload.content) {
                Ok(payload) if payload.success => ExecuteResponse::ok(payload.data.unwrap_or(Value::Null)),
                Ok(payload) => ExecuteResponse::err(AgentError::new(
                    "SkillUnavailable",
                    payload.error.unwrap_or_else(|| "remote execution failed".to_string()),
                    false,
                )),
                Err(e) => ExecuteResponse::err(AgentError::new("ProtocolError", e.to_string(), false)),
            },
            Err(e) => ExecuteResponse::err(e.into()),
        }
    }
}

/// Adapts [`AgentRuntime`] into the [`StepDispatcher`] the Workflow Engine
/// drives steps through, so a workflow step is just an `Execute` call.
pub struct RuntimeStepDispatcher {
    runtime: Arc<AgentRuntime>,
}

impl RuntimeStepDispatcher {
    pub fn new(runtime: Arc<AgentRuntime>) -> Self {
        Self { runtime }
    }
}

#[async_trait]
impl StepDispatcher for RuntimeStepDispatcher {
    async fn dispatch(&self, step: &WorkflowStep, params: HashMap<String, Value>) -> Result<Value, String> {
        let response = self
            .runtime
            .execute(ExecuteRequest {
                target_agent: Some(step.target_agent_id.clone()),
                skill: step.skill_name.clone(),
                operation: step.operation.clone(),
                parameters: params,
                context: HashMap::new(),
                workflow: None,
            })
            .await;

        if response.success {
            Ok(response.data.unwrap_or(Value::Null))
        } else {
            Err(response.error.map(|e| e.message).unwrap_or_else(|| "step execution failed".to_string()))
        }
    }
}
