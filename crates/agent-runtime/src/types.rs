use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata about a skill implementation, as advertised to the Skill Registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillMetadata {
    /// Unique name of the skill
    pub name: String,
    /// Semantic version number
    pub version: String,
    /// Human-readable description of the skill
    pub description: String,
    /// Author or organization name
    pub author: String,
    /// URL to the source code repository
    pub repository: Option<String>,
    /// License identifier (e.g., MIT, Apache-2.0)
    pub license: Option<String>,
    /// Grouping used by the registry's category index, e.g. "communication".
    #[serde(default)]
    pub category: Option<String>,
    /// Capability tokens this implementation advertises, searchable via
    /// [`crate::registry::SkillRegistry::search`].
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Infrastructure tags required for this skill to function (e.g. "postgres").
    #[serde(default)]
    pub required_infrastructure: Vec<String>,
    /// Infrastructure tags that unlock extra behavior but aren't mandatory.
    #[serde(default)]
    pub optional_infrastructure: Vec<String>,
    /// Relationships to other skills, consulted by `validateCompatibility`.
    #[serde(default)]
    pub compatibility: Vec<CompatibilityEntry>,
    /// Free-form implementation-defined properties.
    #[serde(default)]
    pub properties: HashMap<String, String>,
    /// Declared concurrency guarantee; `Serial` skills are only ever called
    /// one at a time by the Function Dispatcher.
    #[serde(default)]
    pub concurrency: SkillConcurrency,
}

/// A skill's declared concurrency guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SkillConcurrency {
    /// Safe to call concurrently; the default.
    #[default]
    Reentrant,
    /// Calls must be serialized; the Plugin Host guards the skill's store
    /// with a per-skill mutex.
    Serial,
}

/// Definition of an operation a skill exposes through the Function Dispatcher.
///
/// Registration is data, not reflection: a skill builds its table of these at
/// `Initialize` time and hands it to the host, rather than the host discovering
/// methods by inspecting the skill's code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Operation identifier, unique within the owning skill.
    pub name: String,
    /// Human-readable description of what the operation does
    pub description: String,
    /// List of parameters accepted by this operation
    pub parameters: Vec<Parameter>,
    /// Whether this operation supports streaming output
    pub streaming: bool,
    /// Whether calling this operation twice with the same arguments is safe.
    #[serde(default)]
    pub idempotent: bool,
    /// The class of side effect this operation has, used to enforce read-only mode.
    #[serde(default)]
    pub side_effect: SideEffectClass,
}

/// Classifies an operation's effect on the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SideEffectClass {
    /// Observes state without changing it.
    #[default]
    Read,
    /// Mutates state owned by the skill or a dependent system.
    Write,
    /// Calls out to a system the host does not control (network, filesystem outside sandbox).
    External,
}

/// Parameter definition for a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter identifier
    pub name: String,
    #[serde(rename = "type")]
    /// Data type of the parameter
    pub param_type: ParameterType,
    /// Human-readable description of the parameter
    pub description: String,
    /// Whether this parameter must be provided
    pub required: bool,
    /// Default value if not provided
    pub default_value: Option<String>,
}

/// Supported parameter types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    /// Text string value
    String,
    /// Numeric value (integer or float)
    Number,
    /// Boolean true/false value
    Boolean,
    /// File path or file content
    File,
    /// JSON object or structured data
    Json,
    /// Array of values
    Array,
}

/// Result of tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the execution completed successfully
    pub success: bool,
    /// Standard output or result data
    pub output: String,
    /// Error message if execution failed
    pub error_message: Option<String>,
    /// Additional metadata about the execution
    pub metadata: Option<HashMap<String, String>>,
}

/// Chunk of streaming output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Type of stream chunk
    pub chunk_type: StreamChunkType,
    /// Content of the chunk
    pub data: String,
}

/// Type of stream chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamChunkType {
    /// Standard output stream
    Stdout,
    /// Standard error stream
    Stderr,
    /// Progress update
    Progress,
    /// Metadata information
    Metadata,
}

/// Configuration key-value pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue {
    /// Configuration key name
    pub key: String,
    /// Configuration value
    pub value: String,
    /// Whether this is a sensitive value
    pub secret: bool,
}

/// Skill dependency declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    /// Name of the required skill
    pub skill_name: String,
    /// Version requirement (e.g., ">=1.0.0")
    pub version_constraint: String,
    /// Whether this dependency is optional
    pub optional: bool,
}

/// Log level for host logging
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace-level logging (most verbose)
    Trace,
    /// Debug-level logging
    Debug,
    /// Informational logging
    Info,
    /// Warning-level logging
    Warn,
    /// Error-level logging
    Error,
}

/// Health state of a loaded skill instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    /// Not yet loaded.
    Uninitialized,
    /// `Initialize` is running.
    Initializing,
    /// Passing health checks.
    Healthy,
    /// Loaded but reporting problems.
    Degraded,
    /// Initialization or a health check failed terminally.
    Failed,
    /// Being unloaded as part of shutdown or hot-reload.
    Disposing,
}

/// How one skill relates to another, declared in [`SkillMetadata::compatibility`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompatibilityKind {
    /// The named skill must also be present.
    Required,
    /// The named skill, if present, improves behavior but isn't necessary.
    Enhances,
    /// The named skill must not be present at the same time.
    Conflicts,
    /// This skill supersedes the named skill; at most one `replaces` per target.
    Replaces,
}

/// A compatibility relationship to another skill by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityEntry {
    /// Name of the other skill.
    pub with_skill: String,
    /// The nature of the relationship.
    pub kind: CompatibilityKind,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}
