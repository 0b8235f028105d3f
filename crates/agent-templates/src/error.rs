//! Error taxonomy for template loading and composition.

use thiserror::Error;

/// Errors that can occur while loading, validating, or resolving templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Template failed schema validation.
    #[error("invalid template '{0}': {1}")]
    Invalid(String, String),

    /// `extends` names a template that does not exist.
    #[error("template '{child}' extends unknown template '{parent}'")]
    ExtendsUnknown {
        /// The template doing the extending.
        child: String,
        /// The missing parent name.
        parent: String,
    },

    /// `extends` chain contains a cycle.
    #[error("circular template inheritance detected involving '{0}'")]
    ExtendsCycle(String),

    /// No skill implementation satisfies a requirement's version range.
    #[error("no version of skill '{skill}' satisfies range '{range}'")]
    VersionUnsatisfied {
        /// Skill name.
        skill: String,
        /// The requested range, formatted for display.
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

    /// Template not found in the store.
    #[error("template not found: {0}")]
    NotFound(String),

    /// Underlying I/O failure while reading templates from disk.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse failure.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parse failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;
