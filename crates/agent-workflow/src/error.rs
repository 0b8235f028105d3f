use thiserror::Error;

/// Errors raised while building or running a workflow DAG.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// Two steps in the same workflow share an id.
    #[error("duplicate step id '{0}'")]
    DuplicateStepId(String),

    /// A `depends_on` entry references a step id that does not exist.
    #[error("step '{step}' depends on unknown step '{dependency}'")]
    DependencyMissing {
        /// The step declaring the dependency.
        step: String,
        /// The missing dependency's id.
        dependency: String,
    },

    /// The `depends_on` graph contains a cycle.
    #[error("dependency cycle detected involving step '{0}'")]
    DependencyCycle(String),

    /// A step did not complete within its timeout.
    #[error("step '{0}' timed out")]
    StepTimeout(String),

    /// A step was cancelled before completion.
    #[error("step '{0}' was cancelled")]
    StepCancelled(String),

    /// A `required` step failed, aborting the workflow.
    #[error("required step '{0}' failed")]
    RequiredStepFailed(String),
}

/// Result alias for workflow operations.
pub type Result<T> = std::result::Result<T, WorkflowError>;
