//! Composer: turns a resolved template plus an environment config into an
//! ordered plan of `(implementation, effective_config)` pairs.

use std::collections::{HashMap, HashSet};

use agent_templates::{RequirementPriority, SkillRequirement, Template};
use serde_json::Value;

use crate::errors::{Result, RuntimeError};
use crate::registry::{SkillImplementation, SkillRegistry};
use crate::version::VersionRange;

/// A single configuration field's validation rule.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    /// Expected shape of the value.
    pub field_type: FieldType,
    /// Whether the field must be present unconditionally.
    pub required: bool,
    /// Only required when `other_field` in the same config equals `equals`.
    pub required_if: Option<(String, Value)>,
}

/// Shape a configuration field's value must take.
#[derive(Debug, Clone)]
pub enum FieldType {
    /// Any string value.
    String,
    /// String value restricted to a fixed enum.
    Enum(Vec<String>),
    /// String value that must match a regex pattern.
    Pattern(String),
    /// Numeric value.
    Number,
    /// Boolean value.
    Boolean,
    /// Arbitrary JSON.
    Json,
}

/// Per-skill configuration schema, keyed by field name.
#[derive(Debug, Clone, Default)]
pub struct ConfigSchema {
    /// Field rules.
    pub fields: HashMap<String, FieldSchema>,
    /// Default values applied before template/environment overrides.
    pub defaults: HashMap<String, Value>,
}

impl ConfigSchema {
    /// Validate a config map against this schema.
    pub fn validate(&self, skill: &str, config: &HashMap<String, Value>) -> Result<()> {
        for (name, field) in &self.fields {
            let required = field.required
                || field
                    .required_if
                    .as_ref()
                    .is_some_and(|(other, expected)| config.get(other) == Some(expected));

            let value = match config.get(name) {
                Some(v) => v,
                None if required => {
                    return Err(RuntimeError::ConfigSchemaViolation {
                        skill: skill.to_string(),
                        reason: format!("missing required field '{}'", name),
                    })
                }
                None => continue,
            };

            let violation = match &field.field_type {
                FieldType::String => !value.is_string(),
                FieldType::Number => !value.is_number(),
                FieldType::Boolean => !value.is_boolean(),
                FieldType::Json => false,
                FieldType::Enum(allowed) => {
                    !value.as_str().is_some_and(|s| allowed.iter().any(|a| a == s))
                }
                FieldType::Pattern(pattern) => {
                    let re = regex::Regex::new(pattern).map_err(|e| RuntimeError::ConfigError(e.to_string()))?;
                    !value.as_str().is_some_and(|s| re.is_match(s))
                }
            };

            if violation {
                return Err(RuntimeError::ConfigSchemaViolation {
                    skill: skill.to_string(),
                    reason: format!("field '{}' does not satisfy its schema", name),
                });
            }
        }

        Ok(())
    }
}

/// One resolved entry in a [`CompositionPlan`].
#[derive(Debug, Clone)]
pub struct CompositionEntry {
    /// The resolved implementation backing this skill in the agent.
    pub implementation: SkillImplementation,
    /// Deep-merged configuration: schema defaults ◁ template config ◁ environment.
    pub effective_config: HashMap<String, Value>,
}

/// The ordered outcome of composing a template into an executable agent.
#[derive(Debug, Clone, Default)]
pub struct CompositionPlan {
    /// Entries in dependency (topological) order.
    pub entries: Vec<CompositionEntry>,
}

/// Resolve a template + environment overrides into a [`CompositionPlan`].
pub async fn compose(
    template: &Template,
    environment: &HashMap<String, HashMap<String, Value>>,
    registry: &SkillRegistry,
    schemas: &HashMap<String, ConfigSchema>,
) -> Result<CompositionPlan> {
    // 1 & 2. Resolve required skills unconditionally via the Skill Registry;
    // resolve optional skills only when their implementation's declared
    // required infrastructure is actually available on the template, dropping
    // them silently (not a hard failure) otherwise.
    let mut implementations = Vec::with_capacity(template.required_skills.len());
    for requirement in &template.required_skills {
        let range = VersionRange::parse(
            Some(requirement.min_version.as_str()),
            requirement.max_version.as_deref(),
        )?;
        let implementation = registry.find(&requirement.name, &range).await?;
        implementations.push((requirement.clone(), implementation));
    }

    for optional in &template.optional_skills {
        let range = match VersionRange::parse(Some(optional.min_version.as_str()), optional.max_version.as_deref()) {
            Ok(range) => range,
            Err(_) => continue,
        };
        let implementation = match registry.find(&optional.name, &range).await {
            Ok(implementation) => implementation,
            Err(_) => {
                tracing::info!(skill = %optional.name, "dropping optional skill: no registered implementation");
                continue;
            }
        };

        let infra_available = implementation.metadata.required_infrastructure.iter().all(|infra| {
            template.infrastructure.databases.iter().any(|s| &s.name == infra)
                || template.infrastructure.services.iter().any(|s| &s.name == infra)
        });

        if infra_available {
            implementations.push((optional.clone(), implementation));
        } else {
            tracing::info!(skill = %optional.name, "dropping optional skill: required infrastructure unavailable");
        }
    }

    // 3. Run validateCompatibility, auto-fetching any missing `required`
    // companion from the Skill Registry and inserting it into the plan; a
    // companion that the registry genuinely has no implementation for is
    // still a hard failure.
    loop {
        let metas: Vec<_> = implementations.iter().map(|(_, i)| i.metadata.clone()).collect();
        let report = SkillRegistry::validate_compatibility(&metas)?;

        let still_missing: HashSet<&String> =
            report.missing_required.iter().filter(|missing| !metas.iter().any(|m| &m.name == *missing)).collect();

        if still_missing.is_empty() {
            for (skill, enhancer) in &report.enhancement_hints {
                tracing::info!(skill = %skill, enhancer = %enhancer, "Skill compatibility enhancement available");
            }
            break;
        }

        for missing in still_missing {
            let implementation = registry.find(missing, &VersionRange::any()).await?;
            tracing::info!(skill = %missing, "auto-inserted required companion skill");
            implementations.push((
                SkillRequirement {
                    name: missing.clone(),
                    min_version: "0.0.0".to_string(),
                    max_version: None,
                    priority: RequirementPriority::Critical,
                    configuration: HashMap::new(),
                    dependencies: Vec::new(),
                },
                implementation,
            ));
        }
    }

    // 4. Build a dependency graph: A -> B iff A depends on B or A `required`s B.
    let names: Vec<String> = implementations.iter().map(|(r, _)| r.name.clone()).collect();
    let mut edges: HashMap<String, HashSet<String>> = HashMap::new();
    for (requirement, implementation) in &implementations {
        let entry = edges.entry(requirement.name.clone()).or_default();
        for dep in &requirement.dependencies {
            if names.contains(dep) {
                entry.insert(dep.clone());
            }
        }
        for compat in &implementation.metadata.compatibility {
            if matches!(compat.kind, crate::types::CompatibilityKind::Required) && names.contains(&compat.with_skill) {
                entry.insert(compat.with_skill.clone());
            }
        }
    }

    // 5. Topologically sort; detect cycles.
    let order = topological_sort(&names, &edges)?;

    // 6 & 7. Validate config per skill and build the effective config, emit the plan in topo order.
    let mut plan = CompositionPlan::default();
    let mut entries_by_name: HashMap<String, (crate::types::SkillMetadata, SkillImplementation)> = HashMap::new();
    for (requirement, implementation) in implementations {
        entries_by_name.insert(requirement.name.clone(), (implementation.metadata.clone(), implementation));
        let _ = requirement;
    }

    for name in order {
        let (_, implementation) = entries_by_name
            .remove(&name)
            .ok_or_else(|| RuntimeError::SkillMissingRequired(name.clone()))?;

        let schema = schemas.get(&name).cloned().unwrap_or_default();

        let mut effective_config = schema.defaults.clone();
        if let Some(template_config) = template.default_configuration.get(&name) {
            if let Value::Object(map) = template_config {
                for (k, v) in map {
                    effective_config.insert(k.clone(), v.clone());
                }
            }
        }
        if let Some(env_config) = environment.get(&name) {
            for (k, v) in env_config {
                effective_config.insert(k.clone(), v.clone());
            }
        }

        schema.validate(&name, &effective_config)?;

        plan.entries.push(CompositionEntry {
            implementation,
            effective_config,
        });
    }

    Ok(plan)
}

fn topological_sort(names: &[String], edges: &HashMap<String, HashSet<String>>) -> Result<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        Visiting,
        Done,
    }

    let mut marks: HashMap<&str, Mark> = names.iter().map(|n| (n.as_str(), Mark::Unvisited)).collect();
    let mut order = Vec::with_capacity(names.len());

    fn visit<'a>(
        name: &'a str,
        edges: &'a HashMap<String, HashSet<String>>,
        marks: &mut HashMap<&'a str, Mark>,
        order: &mut Vec<String>,
    ) -> Result<()> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => return Err(RuntimeError::CompositionCycle(name.to_string())),
            _ => {}
        }

        marks.insert(name, Mark::Visiting);
        if let Some(deps) = edges.get(name) {
            for dep in deps {
                visit(dep, edges, marks, order)?;
            }
        }
        marks.insert(name, Mark::Done);
        order.push(name.to_string());
        Ok(())
    }

    for name in names {
        visit(name, edges, &mut marks, &mut order)?;
    }

    Ok(order)
}
