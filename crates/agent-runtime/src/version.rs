//! Version Registry: semantic version parsing and range satisfaction.

use semver::Version;

use crate::errors::{Result, RuntimeError};

/// Parse a semantic version string, surfacing failures as [`RuntimeError::ValidationError`].
pub fn parse_version(input: &str) -> Result<Version> {
    Version::parse(input).map_err(|e| RuntimeError::ValidationError(format!("invalid version '{}': {}", input, e)))
}

/// An inclusive-minimum, inclusive-maximum version range, as declared on a
/// `SkillRequirement` (`minVersion`/`maxVersion`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionRange {
    min: Option<Version>,
    max: Option<Version>,
}

impl VersionRange {
    /// Build a range from optional min/max version strings.
    pub fn parse(min: Option<&str>, max: Option<&str>) -> Result<Self> {
        Ok(Self {
            min: min.map(parse_version).transpose()?,
            max: max.map(parse_version).transpose()?,
        })
    }

    /// An unconstrained range matching any version.
    pub fn any() -> Self {
        Self { min: None, max: None }
    }

    /// `satisfies` is total: every version is either in or out of range, never
    /// an error.
    pub fn satisfies(&self, version: &Version) -> bool {
        if let Some(min) = &self.min {
            if version < min {
                return false;
            }
        }
        if let Some(max) = &self.max {
            if version > max {
                return false;
            }
        }
        true
    }

    /// Render for error messages, e.g. `>=1.0.0, <2.0.0`.
    pub fn display(&self) -> String {
        match (&self.min, &self.max) {
            (None, None) => "*".to_string(),
            (Some(min), None) => format!(">={}", min),
            (None, Some(max)) => format!("<={}", max),
            (Some(min), Some(max)) => format!(">={}, <={}", min, max),
        }
    }
}

/// Pick the best-matching `(version, implementation_id)` pair for a range:
/// the highest satisfying version, ties broken by lexicographically greatest
/// implementation id.
pub fn select_best<'a>(
    candidates: &'a [(Version, String)],
    range: &VersionRange,
) -> Option<&'a (Version, String)> {
    candidates
        .iter()
        .filter(|(v, _)| range.satisfies(v))
        .max_by(|(v1, id1), (v2, id2)| v1.cmp(v2).then_with(|| id1.cmp(id2)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn satisfies_min_only() {
        let range = VersionRange::parse(Some("1.1.0"), None).unwrap();
        assert!(!range.satisfies(&v("1.0.0")));
        assert!(range.satisfies(&v("1.1.0")));
        assert!(range.satisfies(&v("2.0.0")));
    }

    #[test]
    fn satisfies_min_and_max() {
        let range = VersionRange::parse(Some("1.0.0"), Some("1.9.9")).unwrap();
        assert!(!range.satisfies(&v("0.9.0")));
        assert!(range.satisfies(&v("1.5.0")));
        assert!(!range.satisfies(&v("2.0.0")));
    }

    #[test]
    fn unconstrained_range_matches_everything() {
        let range = VersionRange::any();
        assert!(range.satisfies(&v("0.0.1")));
        assert!(range.satisfies(&v("999.0.0")));
    }

    #[test]
    fn select_best_prefers_highest_version() {
        let candidates = vec![
            (v("1.0.0"), "impl-a".to_string()),
            (v("1.2.0"), "impl-b".to_string()),
        ];
        let range = VersionRange::parse(Some("1.1.0"), None).unwrap();
        let best = select_best(&candidates, &range).unwrap();
        assert_eq!(best.0, v("1.2.0"));
    }

    #[test]
    fn select_best_ignores_versions_above_max() {
        let candidates = vec![
            (v("1.0.0"), "impl-a".to_string()),
            (v("1.2.0"), "impl-b".to_string()),
            (v("2.0.0"), "impl-c".to_string()),
        ];
        let range = VersionRange::parse(None, Some("1.9.9")).unwrap();
        let best = select_best(&candidates, &range).unwrap();
        assert_eq!(best.0, v("1.2.0"));
    }

    #[test]
    fn select_best_breaks_ties_lexicographically() {
        let candidates = vec![
            (v("1.0.0"), "zeta".to_string()),
            (v("1.0.0"), "alpha".to_string()),
        ];
        let best = select_best(&candidates, &VersionRange::any()).unwrap();
        assert_eq!(best.1, "zeta");
    }

    #[test]
    fn select_best_none_when_nothing_matches() {
        let candidates = vec![(v("1.0.0"), "impl-a".to_string())];
        let range = VersionRange::parse(Some("2.0.0"), None).unwrap();
        assert!(select_best(&candidates, &range).is_none());
    }

    proptest::proptest! {
        #[test]
        fn satisfies_is_total(major in 0u64..5, minor in 0u64..5, patch in 0u64..5) {
            let version = Version::new(major, minor, patch);
            let range = VersionRange::parse(Some("1.0.0"), Some("3.0.0")).unwrap();
            // Must return a definite bool, never panic, for any input in range.
            let _ = range.satisfies(&version);
        }
    }
}
