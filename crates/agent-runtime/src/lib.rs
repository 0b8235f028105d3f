//! Agent Runtime - the façade that composes a declared agent template into a
//! running set of skills and dispatches operations against them.
//!
//! This crate covers four of the platform's core concerns:
//!
//! - **Version Registry**: semantic-version parsing and range satisfaction
//!   ([`version`]) used to pick an implementation of a named skill.
//! - **Skill Registry**: tracks every known implementation of every skill
//!   and its compatibility relationships ([`registry`]).
//! - **Composer**: turns an [`agent_templates::Template`] plus an
//!   environment into an ordered, config-validated load plan
//!   ([`composer`]).
//! - **Plugin Host**: loads a composition plan into isolated WASM Component
//!   Model sandboxes, supervises health, and performs hot-reload
//!   ([`host`], [`engine`], [`executor`], [`sandbox`]).
//! - **Function Dispatcher**: the single entry point agents and workflows
//!   call through to invoke a loaded skill's operations ([`dispatcher`]).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use agent_runtime::{PluginEngine, PluginHost, FunctionDispatcher};
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let engine = Arc::new(PluginEngine::new()?);
//! let dispatcher = Arc::new(FunctionDispatcher::new());
//! let host = PluginHost::new(engine, dispatcher.clone());
//! # Ok(())
//! # }
//! ```
//!
//! # Security Model
//!
//! Skills execute inside WASI sandboxes with capability-based security:
//! network and filesystem access must be explicitly granted per instance,
//! and every execution is traced with a request id and caller agent id.

#![warn(missing_docs)]

pub mod composer;
pub mod config;
pub mod credentials;
pub mod dispatcher;
pub mod engine;
pub mod errors;
pub mod executor;
pub mod host;
pub mod instance;
pub mod registry;
pub mod sandbox;
pub mod types;
pub mod version;

pub use composer::{compose, CompositionEntry, CompositionPlan, ConfigSchema, FieldSchema, FieldType};
pub use config::{expand_env_vars, is_likely_secret};
pub use credentials::{parse_keyring_reference, CredentialStore, SecureString};
pub use dispatcher::FunctionDispatcher;
pub use engine::PluginEngine;
pub use errors::{Result, RuntimeError};
pub use executor::{ComponentCache, SkillExecutor};
pub use host::PluginHost;
pub use instance::{Capabilities, InstanceConfig, InstanceManager};
pub use registry::{CompatibilityReport, SharedSkillRegistry, SkillImplementation, SkillRegistry};
pub use sandbox::{HostState, SandboxBuilder};
pub use types::*;
pub use version::{parse_version, select_best, VersionRange};

/// Build the default [`PluginEngine`] for a new agent runtime.
///
/// # Errors
///
/// Returns an error if the underlying Wasmtime engine fails to initialize,
/// typically due to an unwritable cache directory or an unsupported host.
pub fn init() -> anyhow::Result<PluginEngine> {
    PluginEngine::new()
}
