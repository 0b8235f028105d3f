//! Template inheritance resolution.
//!
//! # Inheritance Rules
//!
//! - **Scalars** (description, personality fields): child overrides parent when set.
//! - **Skill lists**: union by skill name; child wins on version/config/priority.
//! - **Validation rules**: concatenated, child definition wins on name collision.
//! - **Default configuration / infrastructure**: deep merge, child wins on leaves.

use std::collections::{HashMap, HashSet};

use crate::error::TemplateError;
use crate::skill_requirement::merge_requirements;
use crate::template::Template;
use crate::validation::merge_rules;

/// Resolves template inheritance chains against a pluggable loader.
///
/// Generic over the loader so callers can back it with a filesystem directory,
/// an in-memory map (as in tests), or a remote store.
pub struct TemplateResolver<F> {
    loader: F,
    cache: HashMap<String, Template>,
    resolving: HashSet<String>,
}

impl<F> TemplateResolver<F>
where
    F: Fn(&str) -> Result<Template, TemplateError>,
{
    /// Create a resolver backed by `loader`.
    pub fn new(loader: F) -> Self {
        Self {
            loader,
            cache: HashMap::new(),
            resolving: HashSet::new(),
        }
    }

    /// Resolve `template`, merging in every ancestor named by `extends`.
    ///
    /// Returns [`TemplateError::ExtendsCycle`] if the `extends` chain loops back on
    /// itself, and [`TemplateError::ExtendsUnknown`] if a named parent cannot be
    /// loaded.
    pub fn resolve(&mut self, template: &Template) -> Result<Template, TemplateError> {
        if let Some(cached) = self.cache.get(&template.name) {
            return Ok(cached.clone());
        }

        if self.resolving.contains(&template.name) {
            return Err(TemplateError::ExtendsCycle(template.name.clone()));
        }
        self.resolving.insert(template.name.clone());

        let resolved = if let Some(ref parent_name) = template.extends {
            let resolved_parent = if let Some(cached) = self.cache.get(parent_name) {
                cached.clone()
            } else {
                let parent = (self.loader)(parent_name).map_err(|_| TemplateError::ExtendsUnknown {
                    child: template.name.clone(),
                    parent: parent_name.clone(),
                })?;
                self.resolve(&parent)?
            };
            merge_templates(&resolved_parent, template)
        } else {
            template.clone()
        };

        self.resolving.remove(&template.name);
        self.cache.insert(template.name.clone(), resolved.clone());
        Ok(resolved)
    }

    /// Drop all cached resolutions.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Drop a single cached resolution (and, conservatively, everything downstream).
    pub fn invalidate(&mut self, name: &str) {
        self.cache.remove(name);
        self.cache.clear();
    }
}

/// Resolve a single template without maintaining a long-lived cache.
pub fn resolve_template<F>(template: &Template, loader: F) -> Result<Template, TemplateError>
where
    F: Fn(&str) -> Result<Template, TemplateError>,
{
    TemplateResolver::new(loader).resolve(template)
}

fn merge_templates(parent: &Template, child: &Template) -> Template {
    let mut default_configuration = parent.default_configuration.clone();
    for (k, v) in &child.default_configuration {
        default_configuration.insert(k.clone(), v.clone());
    }

    Template {
        name: child.name.clone(),
        version: child.version.clone(),
        description: child.description.clone().or_else(|| parent.description.clone()),
        extends: child.extends.clone(),
        personality: parent.personality.merged_with(&child.personality),
        required_skills: merge_requirements(&parent.required_skills, &child.required_skills),
        optional_skills: merge_requirements(&parent.optional_skills, &child.optional_skills),
        default_configuration,
        infrastructure: parent.infrastructure.merged_with(&child.infrastructure),
        validation_rules: merge_rules(&parent.validation_rules, &child.validation_rules),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill_requirement::{RequirementPriority, SkillRequirement};

    fn req(name: &str, min_version: &str) -> SkillRequirement {
        SkillRequirement {
            name: name.to_string(),
            min_version: min_version.to_string(),
            max_version: None,
            priority: RequirementPriority::Normal,
            configuration: Default::default(),
            dependencies: Vec::new(),
        }
    }

    fn base_template(name: &str, extends: Option<&str>) -> Template {
        Template {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            description: None,
            extends: extends.map(|s| s.to_string()),
            personality: Default::default(),
            required_skills: Vec::new(),
            optional_skills: Vec::new(),
            default_configuration: Default::default(),
            infrastructure: Default::default(),
            validation_rules: Vec::new(),
        }
    }

    #[test]
    fn simple_inheritance_merges_skills() {
        let mut parent = base_template("parent", None);
        parent.required_skills.push(req("logging", "1.0.0"));

        let mut child = base_template("child", Some("parent"));
        child.required_skills.push(req("auth", "2.0.0"));

        let parents: HashMap<String, Template> = [("parent".to_string(), parent)].into_iter().collect();

        let resolved = resolve_template(&child, |id| {
            parents.get(id).cloned().ok_or_else(|| TemplateError::NotFound(id.to_string()))
        })
        .unwrap();

        assert_eq!(resolved.required_skills.len(), 2);
        assert!(resolved.required_skills.iter().any(|r| r.name == "logging"));
        assert!(resolved.required_skills.iter().any(|r| r.name == "auth"));
    }

    #[test]
    fn child_overrides_parent_version() {
        let mut parent = base_template("parent", None);
        parent.required_skills.push(req("auth", "1.0.0"));

        let mut child = base_template("child", Some("parent"));
        child.required_skills.push(req("auth", "2.0.0"));

        let parents: HashMap<String, Template> = [("parent".to_string(), parent)].into_iter().collect();

        let resolved = resolve_template(&child, |id| {
            parents.get(id).cloned().ok_or_else(|| TemplateError::NotFound(id.to_string()))
        })
        .unwrap();

        assert_eq!(resolved.required_skills.len(), 1);
        assert_eq!(resolved.required_skills[0].min_version, "2.0.0");
    }

    #[test]
    fn multi_level_inheritance() {
        let base = base_template("base", None);
        let middle = base_template("middle", Some("base"));
        let child = base_template("child", Some("middle"));

        let templates: HashMap<String, Template> =
            [("base".to_string(), base), ("middle".to_string(), middle)].into_iter().collect();

        let resolved = resolve_template(&child, |id| {
            templates.get(id).cloned().ok_or_else(|| TemplateError::NotFound(id.to_string()))
        })
        .unwrap();

        assert_eq!(resolved.name, "child");
    }

    #[test]
    fn circular_inheritance_detected() {
        let a = base_template("a", Some("b"));
        let b = base_template("b", Some("a"));

        let templates: HashMap<String, Template> =
            [("a".to_string(), a.clone()), ("b".to_string(), b)].into_iter().collect();

        let result = resolve_template(&a, |id| {
            templates.get(id).cloned().ok_or_else(|| TemplateError::NotFound(id.to_string()))
        });

        assert!(matches!(result, Err(TemplateError::ExtendsCycle(_))));
    }

    #[test]
    fn missing_parent_is_reported() {
        let child = base_template("child", Some("nonexistent"));

        let result = resolve_template(&child, |_| Err(TemplateError::NotFound("missing".into())));

        assert!(matches!(result, Err(TemplateError::ExtendsUnknown { .. })));
    }

    #[test]
    fn resolver_cache_loads_parent_once() {
        let call_count = std::cell::RefCell::new(0);

        let parent = base_template("parent", None);
        let child1 = base_template("child1", Some("parent"));
        let child2 = base_template("child2", Some("parent"));

        let parents: HashMap<String, Template> = [("parent".to_string(), parent)].into_iter().collect();

        let mut resolver = TemplateResolver::new(|id| {
            *call_count.borrow_mut() += 1;
            parents.get(id).cloned().ok_or_else(|| TemplateError::NotFound(id.to_string()))
        });

        resolver.resolve(&child1).unwrap();
        assert_eq!(*call_count.borrow(), 1);

        resolver.resolve(&child2).unwrap();
        assert_eq!(*call_count.borrow(), 1);
    }

    #[test]
    fn no_inheritance_returns_self() {
        let standalone = base_template("standalone", None);

        let resolved =
            resolve_template(&standalone, |_| Err(TemplateError::NotFound("should not be called".into())))
                .unwrap();

        assert_eq!(resolved.name, "standalone");
    }
}
