//! Template loading, inheritance resolution, and the Template data model.
//!
//! A [`Template`] describes the personality, required/optional skills, default
//! configuration, infrastructure demands, and validation rules an agent should be
//! composed from. Templates may extend a parent template; [`TemplateResolver`]
//! merges the chain additively (child wins on scalars, lists union and dedupe).
//!
//! [`TemplateStore`] loads a directory tree of template files and serves resolved
//! lookups by name; the Composer (in `agent-runtime`) turns a resolved template
//! into a concrete, validated composition plan against a skill registry.
//!
//! ```rust
//! use agent_templates::{Template, TemplateStore};
//! # fn example() -> agent_templates::Result<()> {
//! let store = TemplateStore::load("./templates")?;
//! let resolved = store.resolve("support-agent")?;
//! assert!(!resolved.name.is_empty());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod infrastructure;
pub mod inheritance;
pub mod personality;
pub mod skill_requirement;
pub mod store;
pub mod template;
pub mod validation;

pub use error::{Result, TemplateError};
pub use infrastructure::{Infrastructure, ResourceRequirements, ServiceRequirement};
pub use inheritance::{resolve_template, TemplateResolver};
pub use personality::Personality;
pub use skill_requirement::{merge_requirements, RequirementPriority, SkillRequirement};
pub use store::TemplateStore;
pub use template::Template;
pub use validation::{merge_rules, ValidationRule};
