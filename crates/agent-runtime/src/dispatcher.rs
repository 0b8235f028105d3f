//! Function Dispatcher: routes `(skill, operation)` calls to the loaded
//! skill's executor, enforcing the operation table, parameter validation,
//! and read-only mode.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::errors::{Result, RuntimeError};
use crate::executor::SkillExecutor;
use crate::types::{ExecutionResult, SideEffectClass, SkillConcurrency, ToolDefinition};

/// One entry in the dispatch table: an operation's declared schema plus the
/// executor that will actually run it.
#[derive(Clone)]
struct OperationEntry {
    definition: ToolDefinition,
    executor: Arc<SkillExecutor>,
}

/// Maps `(skill_name, operation_name)` to a handler, as built from each
/// skill's `operations()` table at `Initialize` time.
pub struct FunctionDispatcher {
    operations: RwLock<HashMap<(String, String), OperationEntry>>,
    reloading: RwLock<HashSet<String>>,
    /// Per-skill mutex for skills registered with [`SkillConcurrency::Serial`];
    /// `invoke` holds this for the duration of the call.
    serial_locks: RwLock<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    read_only: AtomicBool,
}

impl FunctionDispatcher {
    /// Create an empty dispatcher, accepting both reads and writes.
    pub fn new() -> Self {
        Self {
            operations: RwLock::new(HashMap::new()),
            reloading: RwLock::new(HashSet::new()),
            serial_locks: RwLock::new(HashMap::new()),
            read_only: AtomicBool::new(false),
        }
    }

    /// Mark a skill as mid-hot-reload: calls against it fail with
    /// [`RuntimeError::Reloading`] instead of [`RuntimeError::OperationNotFound`]
    /// for the window between unregistering its old operations and
    /// registering its new ones.
    pub async fn begin_reload(&self, skill: &str) {
        self.reloading.write().await.insert(skill.to_string());
    }

    /// Clear the reloading marker, whether the reload succeeded or failed.
    pub async fn end_reload(&self, skill: &str) {
        self.reloading.write().await.remove(skill);
    }

    /// Register the operations a freshly initialized skill exposes.
    pub async fn register_operations(
        &self,
        skill: &str,
        executor: Arc<SkillExecutor>,
        tools: Vec<ToolDefinition>,
        concurrency: SkillConcurrency,
    ) {
        let mut table = self.operations.write().await;
        for tool in tools {
            table.insert(
                (skill.to_string(), tool.name.clone()),
                OperationEntry {
                    definition: tool,
                    executor: executor.clone(),
                },
            );
        }
        drop(table);

        if concurrency == SkillConcurrency::Serial {
            self.serial_locks
                .write()
                .await
                .entry(skill.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())));
        }
    }

    /// Remove every operation registered for a skill, e.g. before hot-reload.
    pub async fn unregister_skill(&self, skill: &str) {
        let mut table = self.operations.write().await;
        table.retain(|(s, _), _| s != skill);
        drop(table);
        self.serial_locks.write().await.remove(skill);
    }

    /// The side-effect class a registered operation was declared with, for
    /// callers that need to gate on it before invoking (e.g. degraded-skill
    /// write rejection). `None` if the operation isn't registered.
    pub async fn operation_side_effect(&self, skill: &str, operation: &str) -> Option<SideEffectClass> {
        let table = self.operations.read().await;
        table.get(&(skill.to_string(), operation.to_string())).map(|e| e.definition.side_effect)
    }

    /// Toggle read-only mode; while enabled, `write`-class operations fail
    /// with [`RuntimeError::WriteForbidden`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Whether the dispatcher currently rejects write-class operations.
    pub fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::SeqCst)
    }

    /// Invoke `operation` on `skill` with the given arguments.
    ///
    /// Attaches `request_id`/`caller_agent_id` as tracing fields for the
    /// duration of the call.
    pub async fn invoke(
        &self,
        skill: &str,
        operation: &str,
        args: Vec<(String, String)>,
        request_id: &str,
        caller_agent_id: &str,
    ) -> Result<ExecutionResult> {
        if self.reloading.read().await.contains(skill) {
            return Err(RuntimeError::Reloading(skill.to_string()));
        }

        let entry = {
            let table = self.operations.read().await;
            table.get(&(skill.to_string(), operation.to_string())).cloned()
        }
        .ok_or_else(|| RuntimeError::OperationNotFound {
            skill: skill.to_string(),
            operation: operation.to_string(),
        })?;

        if entry.definition.side_effect == SideEffectClass::Write && self.is_read_only() {
            return Err(RuntimeError::WriteForbidden(operation.to_string()));
        }

        validate_args(&entry.definition, &args)?;

        let serial_lock = self.serial_locks.read().await.get(skill).cloned();
        let _serial_guard = match &serial_lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        let span = tracing::info_span!(
            "dispatch",
            request_id = %request_id,
            caller_agent_id = %caller_agent_id,
            skill = %skill,
            operation = %operation,
        );
        let _enter = span.enter();

        entry
            .executor
            .execute_tool(operation, args)
            .await
            .map_err(|e| RuntimeError::ExecutionError(e.to_string()))
    }
}

impl Default for FunctionDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_args(definition: &ToolDefinition, args: &[(String, String)]) -> Result<()> {
    for param in &definition.parameters {
        if param.required && !args.iter().any(|(k, _)| k == &param.name) {
            return Err(RuntimeError::InvalidArgument {
                operation: definition.name.clone(),
                reason: format!("missing required parameter '{}'", param.name),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Parameter, ParameterType};

    fn tool(name: &str, side_effect: SideEffectClass, required_param: Option<&str>) -> ToolDefinition {
        ToolDefinition {
            name: name.to_string(),
            description: String::new(),
            parameters: required_param
                .map(|p| {
                    vec![Parameter {
                        name: p.to_string(),
                        param_type: ParameterType::String,
                        description: String::new(),
                        required: true,
                        default_value: None,
                    }]
                })
                .unwrap_or_default(),
            streaming: false,
            idempotent: true,
            side_effect,
        }
    }

    #[test]
    fn validate_args_catches_missing_required_parameter() {
        let def = tool("send", SideEffectClass::Write, Some("to"));
        let err = validate_args(&def, &[]).unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidArgument { .. }));
    }

    #[test]
    fn validate_args_passes_when_required_present() {
        let def = tool("send", SideEffectClass::Write, Some("to"));
        assert!(validate_args(&def, &[("to".to_string(), "x".to_string())]).is_ok());
    }

    #[tokio::test]
    async fn invoke_reports_operation_not_found() {
        let dispatcher = FunctionDispatcher::new();
        let err = dispatcher
            .invoke("alpha", "missing", vec![], "req-1", "agent-1")
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::OperationNotFound { .. }));
    }

    #[test]
    fn read_only_toggle_round_trips() {
        let dispatcher = FunctionDispatcher::new();
        assert!(!dispatcher.is_read_only());
        dispatcher.set_read_only(true);
        assert!(dispatcher.is_read_only());
    }
}
