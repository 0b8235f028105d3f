//! A template's declared need for a skill implementation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Priority tier attached to a skill requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequirementPriority {
    /// Can be dropped under resource pressure.
    Low,
    /// Default tier.
    #[default]
    Normal,
    /// Should be preferred when resources are constrained.
    High,
    /// Agent composition fails outright if unmet.
    Critical,
}

/// A single skill a template requires (or optionally requests).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRequirement {
    /// Skill name, matched against the Skill Registry.
    pub name: String,

    /// Minimum acceptable semantic version, inclusive.
    pub min_version: String,

    /// Maximum acceptable semantic version, inclusive, if bounded.
    #[serde(default)]
    pub max_version: Option<String>,

    /// Priority tier.
    #[serde(default)]
    pub priority: RequirementPriority,

    /// Default configuration for this skill, later overridden by environment.
    #[serde(default)]
    pub configuration: HashMap<String, serde_json::Value>,

    /// Names of other skills this one depends on at runtime.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl SkillRequirement {
    /// Render the version constraint as a single range string for error messages,
    /// e.g. `>=1.2.0, <=2.0.0` or `>=1.2.0`.
    pub fn range_display(&self) -> String {
        match &self.max_version {
            Some(max) => format!(">={}, <={}", self.min_version, max),
            None => format!(">={}", self.min_version),
        }
    }
}

/// Merge two requirement lists: union by skill name, child wins on version/config/priority,
/// dependency lists concatenate and dedupe.
pub fn merge_requirements(
    parent: &[SkillRequirement],
    child: &[SkillRequirement],
) -> Vec<SkillRequirement> {
    let mut merged: Vec<SkillRequirement> = parent.to_vec();

    for req in child {
        if let Some(existing) = merged.iter_mut().find(|r| r.name == req.name) {
            let mut dependencies = existing.dependencies.clone();
            for d in &req.dependencies {
                if !dependencies.contains(d) {
                    dependencies.push(d.clone());
                }
            }
            let mut configuration = existing.configuration.clone();
            for (k, v) in &req.configuration {
                configuration.insert(k.clone(), v.clone());
            }
            *existing = SkillRequirement {
                name: req.name.clone(),
                min_version: req.min_version.clone(),
                max_version: req.max_version.clone().or_else(|| existing.max_version.clone()),
                priority: req.priority.max(existing.priority),
                configuration,
                dependencies,
            };
        } else {
            merged.push(req.clone());
        }
    }

    merged
}
