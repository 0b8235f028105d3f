//! Template-declared validation rules, checked against a resolved composition.

use serde::{Deserialize, Serialize};

/// A single rule a composed agent must satisfy.
///
/// `validation_expression` is a small implementation-defined predicate language
/// evaluated against the composition plan (e.g. `has_skill("auth")`); this crate
/// treats the expression as opaque text and leaves evaluation to the composer,
/// which knows the concrete plan shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    /// Short rule name, unique within a template.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// The predicate expression to evaluate.
    pub validation_expression: String,
    /// Message surfaced when the rule fails.
    pub error_message: String,
    /// Critical rules abort composition; non-critical rules only warn.
    #[serde(default = "default_is_critical")]
    pub is_critical: bool,
}

fn default_is_critical() -> bool {
    true
}

/// Concatenate validation rule lists, keeping parent rules before child rules and
/// deduplicating by name (child definition wins).
pub fn merge_rules(parent: &[ValidationRule], child: &[ValidationRule]) -> Vec<ValidationRule> {
    let mut merged: Vec<ValidationRule> = Vec::with_capacity(parent.len() + child.len());
    for rule in parent {
        merged.push(rule.clone());
    }
    for rule in child {
        if let Some(existing) = merged.iter_mut().find(|r| r.name == rule.name) {
            *existing = rule.clone();
        } else {
            merged.push(rule.clone());
        }
    }
    merged
}
