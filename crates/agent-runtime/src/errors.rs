use thiserror::Error;

/// Errors raised across the Version Registry, Skill Registry, Composer, Plugin
/// Host, and Function Dispatcher.
#[derive(Error, Debug)]
pub enum RuntimeError {
    // --- Composition ---
    /// No registered version of a skill satisfies a requirement's range.
    #[error("no version of skill '{skill}' satisfies range '{range}'")]
    VersionUnsatisfied {
        /// Skill name.
        skill: String,
        /// Requested range, formatted for display.
        range: String,
    },

    /// Two selected skills declare a `conflicts` relationship.
    #[error("skill '{0}' conflicts with skill '{1}'")]
    SkillConflict(String, String),

    /// A required skill has no registered implementation.
    #[error("required skill '{0}' is not registered")]
    SkillMissingRequired(String),

    /// The skill dependency graph contains a cycle.
    #[error("composition cycle detected involving skill '{0}'")]
    CompositionCycle(String),

    /// A skill's effective configuration failed schema validation.
    #[error("configuration for skill '{skill}' violates schema: {reason}")]
    ConfigSchemaViolation {
        /// Skill name.
        skill: String,
        /// Human-readable violation description.
        reason: String,
    },

    /// Attempted to register a `(name, version)` pair that already exists.
    #[error("skill '{name}' version '{version}' is already registered")]
    DuplicateRegistration {
        /// Skill name.
        name: String,
        /// Version string.
        version: String,
    },

    // --- Lifecycle ---
    /// Component loading failed.
    #[error("component load failed: {0}")]
    ComponentLoadError(String),

    /// Component or configuration failed validation.
    #[error("validation failed: {0}")]
    ValidationError(String),

    /// Sandbox construction failed.
    #[error("sandbox initialization failed: {0}")]
    SandboxError(String),

    /// `Initialize` returned an error or never completed.
    #[error("initialization failed for skill '{0}': {1}")]
    InitializationFailed(String, String),

    /// `Initialize` did not complete within the configured timeout.
    #[error("initialization of skill '{0}' timed out after {1:?}")]
    InitializationTimeout(String, std::time::Duration),

    /// A skill this one depends on is not yet healthy.
    #[error("dependency '{0}' is not ready")]
    DependencyNotReady(String),

    /// A hot-reload is in progress; the skill is temporarily unavailable.
    #[error("skill '{0}' is reloading")]
    Reloading(String),

    /// The agent is draining and rejects new work.
    #[error("shutting down")]
    ShuttingDown,

    /// Configuration error unrelated to a specific skill.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// No instance with this name is loaded.
    #[error("instance not found: {skill}/{instance}")]
    InstanceNotFound {
        /// Skill name.
        skill: String,
        /// Instance name.
        instance: String,
    },

    // --- Dispatch ---
    /// No operation with this name is registered for the skill.
    #[error("operation '{operation}' not found on skill '{skill}'")]
    OperationNotFound {
        /// Skill name.
        skill: String,
        /// Requested operation name.
        operation: String,
    },

    /// Arguments failed the operation's parameter schema.
    #[error("invalid argument for '{operation}': {reason}")]
    InvalidArgument {
        /// Operation name.
        operation: String,
        /// Human-readable reason.
        reason: String,
    },

    /// The skill is known but currently cannot serve requests.
    #[error("skill '{0}' is unavailable")]
    SkillUnavailable(String),

    /// A write-class operation was attempted while the host is in read-only mode.
    #[error("operation '{0}' is a write and the host is in read-only mode")]
    WriteForbidden(String),

    /// Execution of an operation failed.
    #[error("execution failed: {0}")]
    ExecutionError(String),

    // --- Transport wrapping ---
    #[error("wasm runtime error: {0}")]
    WasmError(#[from] wasmtime::Error),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("toml deserialization error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl RuntimeError {
    /// Whether the Agent Runtime may retry an operation that failed with this error.
    pub fn retryable(&self) -> bool {
        matches!(self, RuntimeError::DependencyNotReady(_) | RuntimeError::Reloading(_))
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
