//! DAG-based workflow engine: schedules multi-step, multi-agent skill
//! invocations described as a dependency graph, propagating each step's
//! result data to its dependents and honoring per-step and per-workflow
//! timeouts and cancellation.

mod dag;
mod dispatch;
mod engine;
mod error;
mod types;

pub use dispatch::StepDispatcher;
pub use engine::WorkflowEngine;
pub use error::{Result, WorkflowError};
pub use types::{
    MissingDependencyPolicy, StepOutcome, StepResult, Workflow, WorkflowResult, WorkflowStep,
};
