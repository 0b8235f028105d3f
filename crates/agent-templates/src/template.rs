//! The `Template` type: a declarative description an agent is composed from.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::infrastructure::Infrastructure;
use crate::personality::Personality;
use crate::skill_requirement::SkillRequirement;
use crate::validation::ValidationRule;

/// A named, versioned description of the skills and configuration an agent needs.
///
/// Templates may extend a parent template via [`Template::extends`]; see
/// [`crate::inheritance`] for the merge semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Unique template name.
    pub name: String,

    /// Semantic version of this template definition.
    pub version: String,

    /// Human-readable summary.
    #[serde(default)]
    pub description: Option<String>,

    /// Name of the parent template, if any.
    #[serde(default, rename = "baseTemplate")]
    pub extends: Option<String>,

    /// Behavioral tuning.
    #[serde(default)]
    pub personality: Personality,

    /// Skills that must be present for the composed agent to be ready.
    #[serde(default)]
    pub required_skills: Vec<SkillRequirement>,

    /// Skills included when available, dropped otherwise.
    #[serde(default)]
    pub optional_skills: Vec<SkillRequirement>,

    /// Free-form default configuration, keyed by skill name then setting name.
    #[serde(default)]
    pub default_configuration: HashMap<String, serde_json::Value>,

    /// Infrastructure demands.
    #[serde(default)]
    pub infrastructure: Infrastructure,

    /// Rules the resolved composition must satisfy.
    #[serde(default)]
    pub validation_rules: Vec<ValidationRule>,
}

impl Template {
    /// True if this template has a parent to inherit from.
    pub fn has_parent(&self) -> bool {
        self.extends.is_some()
    }

    /// Parse a template from YAML or JSON text. Both are accepted identically since
    /// the schema is the same serde struct; JSON is valid YAML so this just picks
    /// the YAML deserializer for both.
    pub fn parse(text: &str) -> crate::error::Result<Template> {
        Ok(serde_yaml::from_str(text)?)
    }
}
