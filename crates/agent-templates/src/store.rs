//! Loads templates from a directory tree and resolves inheritance on demand.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Result, TemplateError};
use crate::inheritance::TemplateResolver;
use crate::template::Template;

/// An in-memory catalog of templates loaded from disk, with resolved-template caching.
///
/// Mirrors the manifest-discovery convention used elsewhere in this codebase: a
/// directory is walked once at startup, every `*.yaml`/`*.yml`/`*.json` file is
/// parsed as a [`Template`], and lookups by name are served from the resulting map.
pub struct TemplateStore {
    root: PathBuf,
    templates: HashMap<String, Template>,
}

impl TemplateStore {
    /// Walk `root` recursively and load every template file found.
    ///
    /// Returns [`TemplateError::Invalid`] naming the offending file if any template
    /// fails to parse.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let mut templates = HashMap::new();

        for entry in WalkDir::new(&root).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let is_template_file = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml") | Some("json")
            );
            if !is_template_file {
                continue;
            }

            let contents = std::fs::read_to_string(path)?;
            let template = Template::parse(&contents).map_err(|e| {
                TemplateError::Invalid(path.display().to_string(), e.to_string())
            })?;
            templates.insert(template.name.clone(), template);
        }

        Ok(Self { root, templates })
    }

    /// Directory this store was loaded from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of every loaded template.
    pub fn names(&self) -> Vec<&str> {
        self.templates.keys().map(|s| s.as_str()).collect()
    }

    /// Look up a raw (unresolved) template by name.
    pub fn get(&self, name: &str) -> Result<&Template> {
        self.templates.get(name).ok_or_else(|| TemplateError::NotFound(name.to_string()))
    }

    /// Resolve `name`'s full inheritance chain into a single merged template.
    pub fn resolve(&self, name: &str) -> Result<Template> {
        let template = self.get(name)?;
        let mut resolver = TemplateResolver::new(|id| {
            self.templates
                .get(id)
                .cloned()
                .ok_or_else(|| TemplateError::NotFound(id.to_string()))
        });
        resolver.resolve(template)
    }

    /// Insert or replace a template in the in-memory catalog without touching disk.
    /// Used by tests and by callers composing templates programmatically.
    pub fn insert(&mut self, template: Template) {
        self.templates.insert(template.name.clone(), template);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn loads_and_resolves_from_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("base.yaml"),
            r#"
name: base
version: "1.0.0"
requiredSkills:
  - name: logging
    minVersion: "1.0.0"
"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("child.yaml"),
            r#"
name: child
version: "1.0.0"
baseTemplate: base
requiredSkills:
  - name: auth
    minVersion: "2.0.0"
"#,
        )
        .unwrap();

        let store = TemplateStore::load(dir.path()).unwrap();
        assert_eq!(store.names().len(), 2);

        let resolved = store.resolve("child").unwrap();
        assert_eq!(resolved.required_skills.len(), 2);
    }

    #[test]
    fn missing_template_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = TemplateStore::load(dir.path()).unwrap();
        assert!(matches!(store.resolve("nope"), Err(TemplateError::NotFound(_))));
    }
}
