//! Skill Registry: an in-memory index of skill implementations by name,
//! version, category, and advertised capability.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::errors::{Result, RuntimeError};
use crate::types::{CompatibilityKind, SkillMetadata};
use crate::version::{parse_version, select_best, VersionRange};

/// A registered skill implementation: its metadata plus the on-disk
/// component the Plugin Host loads to produce a live instance.
#[derive(Debug, Clone)]
pub struct SkillImplementation {
    /// Advertised metadata for this implementation.
    pub metadata: SkillMetadata,
    /// Path to the WASM component backing this implementation.
    pub component_path: PathBuf,
}

/// Result of validating a selected set of skills against their declared
/// compatibility relationships.
#[derive(Debug, Clone, Default)]
pub struct CompatibilityReport {
    /// `required` companions referenced by a selected skill but not present in the selection.
    pub missing_required: Vec<String>,
    /// `(skill, enhancer)` pairs worth logging as hints; neither is mandatory.
    pub enhancement_hints: Vec<(String, String)>,
}

/// Read-mostly index of skill implementations, guarded by a single
/// registry-wide write lock; readers clone snapshots rather than hold the
/// lock across use.
pub struct SkillRegistry {
    by_name: RwLock<HashMap<String, Vec<SkillImplementation>>>,
}

impl SkillRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            by_name: RwLock::new(HashMap::new()),
        }
    }

    /// Register an implementation. Rejects a duplicate `(name, version)` pair.
    pub async fn register(&self, implementation: SkillImplementation) -> Result<()> {
        let mut by_name = self.by_name.write().await;
        let entries = by_name.entry(implementation.metadata.name.clone()).or_default();

        if entries
            .iter()
            .any(|e| e.metadata.version == implementation.metadata.version)
        {
            return Err(RuntimeError::DuplicateRegistration {
                name: implementation.metadata.name.clone(),
                version: implementation.metadata.version.clone(),
            });
        }

        tracing::info!(
            skill = %implementation.metadata.name,
            version = %implementation.metadata.version,
            "Registered skill implementation"
        );

        entries.push(implementation);
        Ok(())
    }

    /// Find the best implementation of `name` satisfying `range`, selecting
    /// the highest matching version and breaking ties by implementation id.
    pub async fn find(&self, name: &str, range: &VersionRange) -> Result<SkillImplementation> {
        let by_name = self.by_name.read().await;
        let entries = by_name
            .get(name)
            .ok_or_else(|| RuntimeError::SkillMissingRequired(name.to_string()))?;

        let mut candidates = Vec::with_capacity(entries.len());
        for entry in entries {
            let version = parse_version(&entry.metadata.version)?;
            candidates.push((version, entry.metadata.version.clone()));
        }

        let best = select_best(&candidates, range).ok_or_else(|| RuntimeError::VersionUnsatisfied {
            skill: name.to_string(),
            range: range.display(),
        })?;

        entries
            .iter()
            .find(|e| e.metadata.version == best.1)
            .cloned()
            .ok_or_else(|| RuntimeError::SkillMissingRequired(name.to_string()))
    }

    /// Return every implementation (across all skills) advertising `capability`.
    pub async fn search(&self, capability: &str) -> Vec<SkillImplementation> {
        let by_name = self.by_name.read().await;
        by_name
            .values()
            .flatten()
            .filter(|e| e.metadata.capabilities.iter().any(|c| c == capability))
            .cloned()
            .collect()
    }

    /// Validate a selected set of skills against their declared
    /// `compatibility` relationships.
    ///
    /// Rejects if any `conflicts` pair appears together in `selected`, or if
    /// more than one skill declares `replaces` against the same target name.
    /// Missing `required` companions and `enhances` hints are reported, not
    /// rejected — the Composer decides whether to fetch the companion.
    pub fn validate_compatibility(selected: &[SkillMetadata]) -> Result<CompatibilityReport> {
        let selected_names: std::collections::HashSet<&str> =
            selected.iter().map(|s| s.name.as_str()).collect();

        let mut replaces_targets: HashMap<&str, &str> = HashMap::new();
        let mut report = CompatibilityReport::default();

        for skill in selected {
            for entry in &skill.compatibility {
                match entry.kind {
                    CompatibilityKind::Conflicts => {
                        if selected_names.contains(entry.with_skill.as_str()) {
                            return Err(RuntimeError::SkillConflict(
                                skill.name.clone(),
                                entry.with_skill.clone(),
                            ));
                        }
                    }
                    CompatibilityKind::Required => {
                        if !selected_names.contains(entry.with_skill.as_str()) {
                            report.missing_required.push(entry.with_skill.clone());
                        }
                    }
                    CompatibilityKind::Enhances => {
                        if selected_names.contains(entry.with_skill.as_str()) {
                            report
                                .enhancement_hints
                                .push((skill.name.clone(), entry.with_skill.clone()));
                        }
                    }
                    CompatibilityKind::Replaces => {
                        if let Some(existing) = replaces_targets.insert(&entry.with_skill, &skill.name) {
                            if existing != skill.name {
                                return Err(RuntimeError::SkillConflict(
                                    existing.to_string(),
                                    skill.name.clone(),
                                ));
                            }
                        }
                    }
                }
            }
        }

        Ok(report)
    }
}

impl Default for SkillRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle suitable for embedding in the Plugin Host.
pub type SharedSkillRegistry = Arc<SkillRegistry>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CompatibilityEntry;

    fn meta(name: &str, version: &str) -> SkillMetadata {
        SkillMetadata {
            name: name.to_string(),
            version: version.to_string(),
            description: String::new(),
            author: String::new(),
            repository: None,
            license: None,
            category: None,
            capabilities: Vec::new(),
            required_infrastructure: Vec::new(),
            optional_infrastructure: Vec::new(),
            compatibility: Vec::new(),
            properties: HashMap::new(),
            concurrency: crate::types::SkillConcurrency::Reentrant,
        }
    }

    fn implementation(name: &str, version: &str) -> SkillImplementation {
        SkillImplementation {
            metadata: meta(name, version),
            component_path: PathBuf::from(format!("/tmp/{}-{}.wasm", name, version)),
        }
    }

    #[tokio::test]
    async fn register_rejects_duplicate_version() {
        let registry = SkillRegistry::new();
        registry.register(implementation("alpha", "1.0.0")).await.unwrap();

        let err = registry.register(implementation("alpha", "1.0.0")).await.unwrap_err();
        assert!(matches!(err, RuntimeError::DuplicateRegistration { .. }));
    }

    #[tokio::test]
    async fn find_selects_highest_satisfying_version() {
        let registry = SkillRegistry::new();
        registry.register(implementation("alpha", "1.0.0")).await.unwrap();
        registry.register(implementation("alpha", "1.2.0")).await.unwrap();

        let range = VersionRange::parse(Some("1.1.0"), None).unwrap();
        let found = registry.find("alpha", &range).await.unwrap();
        assert_eq!(found.metadata.version, "1.2.0");
    }

    #[tokio::test]
    async fn find_reports_version_unsatisfied() {
        let registry = SkillRegistry::new();
        registry.register(implementation("alpha", "1.0.0")).await.unwrap();

        let range = VersionRange::parse(Some("2.0.0"), None).unwrap();
        let err = registry.find("alpha", &range).await.unwrap_err();
        assert!(matches!(err, RuntimeError::VersionUnsatisfied { .. }));
    }

    #[tokio::test]
    async fn find_reports_missing_skill() {
        let registry = SkillRegistry::new();
        let err = registry
            .find("missing", &VersionRange::any())
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::SkillMissingRequired(_)));
    }

    #[tokio::test]
    async fn search_filters_by_capability() {
        let registry = SkillRegistry::new();
        let mut with_cap = implementation("alpha", "1.0.0");
        with_cap.metadata.capabilities.push("messaging".to_string());
        registry.register(with_cap).await.unwrap();
        registry.register(implementation("beta", "1.0.0")).await.unwrap();

        let found = registry.search("messaging").await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].metadata.name, "alpha");
    }

    #[test]
    fn validate_compatibility_rejects_conflicts() {
        let mut alpha = meta("alpha", "1.0.0");
        alpha.compatibility.push(CompatibilityEntry {
            with_skill: "beta".to_string(),
            kind: CompatibilityKind::Conflicts,
        });
        let beta = meta("beta", "1.0.0");

        let err = SkillRegistry::validate_compatibility(&[alpha, beta]).unwrap_err();
        assert!(matches!(err, RuntimeError::SkillConflict(_, _)));
    }

    #[test]
    fn validate_compatibility_reports_missing_required() {
        let mut alpha = meta("alpha", "1.0.0");
        alpha.compatibility.push(CompatibilityEntry {
            with_skill: "beta".to_string(),
            kind: CompatibilityKind::Required,
        });

        let report = SkillRegistry::validate_compatibility(&[alpha]).unwrap();
        assert_eq!(report.missing_required, vec!["beta".to_string()]);
    }

    #[test]
    fn validate_compatibility_rejects_double_replaces() {
        let mut alpha = meta("alpha", "1.0.0");
        alpha.compatibility.push(CompatibilityEntry {
            with_skill: "legacy".to_string(),
            kind: CompatibilityKind::Replaces,
        });
        let mut gamma = meta("gamma", "1.0.0");
        gamma.compatibility.push(CompatibilityEntry {
            with_skill: "legacy".to_string(),
            kind: CompatibilityKind::Replaces,
        });

        let err = SkillRegistry::validate_compatibility(&[alpha, gamma]).unwrap_err();
        assert!(matches!(err, RuntimeError::SkillConflict(_, _)));
    }
}
