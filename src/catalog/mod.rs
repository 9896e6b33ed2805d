//! Read-only queries over published catalog versions.
//!
//! A project that opts into publishing components is a *catalog resource*.
//! Each release of such a project that contains valid components becomes a
//! [`CatalogVersion`]: an immutable `(name, semver, sha)` record. Versions are
//! the only catalog entities that carry a content address.
//!
//! The [`CatalogVersionRegistry`] trait is the query contract the resolver
//! relies on. Absence is a normal outcome: every query returns `None` when the
//! project is not a catalog resource or nothing matches, and the resolver
//! moves on to its next precedence step.
//!
//! [`InMemoryCatalog`] is the bundled implementation, used by the fixture
//! index and the tests.

use semver::Version;
use std::collections::HashMap;

use crate::core::ComponentError;
use crate::project::Project;
use crate::version::{ShorthandVersion, compare_precedence, parse_version_name};

/// A published version of a catalog resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogVersion {
    /// Published name, unique within the resource (often the release tag)
    pub name: String,
    /// Parsed semantic version, when the name is one
    pub semver: Option<Version>,
    /// Commit sha the version was published from
    pub sha: String,
    /// Full path of the owning project
    pub project: String,
}

impl CatalogVersion {
    /// Create a version, deriving `semver` from `name`.
    pub fn new(
        project: impl Into<String>,
        name: impl Into<String>,
        sha: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            semver: parse_version_name(&name),
            name,
            sha: sha.into(),
            project: project.into(),
        }
    }
}

/// Query contract over published versions.
pub trait CatalogVersionRegistry: Send + Sync {
    /// Latest published version by semver precedence.
    fn latest(&self, project: &Project) -> Option<CatalogVersion>;

    /// Highest version whose major (and minor, if given) equals the prefix.
    fn latest_matching(
        &self,
        project: &Project,
        major: u64,
        minor: Option<u64>,
    ) -> Option<CatalogVersion>;

    /// Exact, case-sensitive match on the version name.
    fn by_name(&self, project: &Project, name: &str) -> Option<CatalogVersion>;

    /// Names of all published versions, used for "did you mean" hints.
    fn version_names(&self, _project: &Project) -> Vec<String> {
        Vec::new()
    }
}

/// In-memory catalog keyed by project full path.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    versions: HashMap<String, Vec<CatalogVersion>>,
}

impl InMemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a published version.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::DuplicateVersion`] if the project already has
    /// a version with the same name.
    pub fn publish(&mut self, version: CatalogVersion) -> Result<(), ComponentError> {
        let versions = self.versions.entry(version.project.clone()).or_default();
        if versions.iter().any(|existing| existing.name == version.name) {
            return Err(ComponentError::DuplicateVersion {
                project: version.project,
                name: version.name,
            });
        }
        versions.push(version);
        Ok(())
    }

    fn published(&self, project: &Project) -> &[CatalogVersion] {
        if !project.catalog_resource {
            return &[];
        }
        // Keyed by canonical path, so redirected lookups must pass the found project.
        self.versions.get(&project.full_path).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn highest<'a>(versions: impl Iterator<Item = &'a CatalogVersion>) -> Option<CatalogVersion> {
    versions
        .filter(|version| version.semver.is_some())
        .max_by(|a, b| match (&a.semver, &b.semver) {
            (Some(a), Some(b)) => compare_precedence(a, b),
            _ => std::cmp::Ordering::Equal,
        })
        .cloned()
}

impl CatalogVersionRegistry for InMemoryCatalog {
    fn latest(&self, project: &Project) -> Option<CatalogVersion> {
        highest(self.published(project).iter())
    }

    fn latest_matching(
        &self,
        project: &Project,
        major: u64,
        minor: Option<u64>,
    ) -> Option<CatalogVersion> {
        let prefix = ShorthandVersion {
            major,
            minor,
        };
        highest(
            self.published(project)
                .iter()
                .filter(|version| version.semver.as_ref().is_some_and(|v| prefix.matches(v))),
        )
    }

    fn by_name(&self, project: &Project, name: &str) -> Option<CatalogVersion> {
        self.published(project).iter().find(|version| version.name == name).cloned()
    }

    fn version_names(&self, project: &Project) -> Vec<String> {
        self.published(project).iter().map(|version| version.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(names: &[&str]) -> (InMemoryCatalog, Project) {
        let project = Project::new("acme/ci").with_catalog_resource();
        let mut catalog = InMemoryCatalog::new();
        for name in names {
            catalog.publish(CatalogVersion::new("acme/ci", *name, format!("sha-{name}"))).unwrap();
        }
        (catalog, project)
    }

    #[test]
    fn test_latest_matching_prefers_release_within_prefix() {
        let (catalog, project) = catalog(&["1.0.0", "1.2.0", "1.2.3", "2.0.0-beta"]);

        assert_eq!(catalog.latest_matching(&project, 1, None).unwrap().name, "1.2.3");
        assert_eq!(catalog.latest_matching(&project, 1, Some(2)).unwrap().name, "1.2.3");
        assert_eq!(catalog.latest_matching(&project, 1, Some(0)).unwrap().name, "1.0.0");
        assert_eq!(catalog.latest_matching(&project, 2, None).unwrap().name, "2.0.0-beta");
        assert!(catalog.latest_matching(&project, 3, None).is_none());
        assert!(catalog.latest_matching(&project, 1, Some(1)).is_none());
    }

    #[test]
    fn test_latest_uses_precedence_not_insertion_order() {
        let (catalog, project) = catalog(&["1.10.0", "1.9.0", "1.2.0"]);
        assert_eq!(catalog.latest(&project).unwrap().name, "1.10.0");
    }

    #[test]
    fn test_release_beats_prerelease_of_same_triple() {
        let (catalog, project) = catalog(&["2.0.0", "2.0.0-rc.1"]);
        assert_eq!(catalog.latest(&project).unwrap().name, "2.0.0");
    }

    #[test]
    fn test_non_semver_names_only_match_by_name() {
        let (catalog, project) = catalog(&["stable", "1.0.0"]);

        assert_eq!(catalog.latest(&project).unwrap().name, "1.0.0");
        let stable = catalog.by_name(&project, "stable").unwrap();
        assert_eq!(stable.sha, "sha-stable");
        assert!(stable.semver.is_none());
        assert!(catalog.by_name(&project, "Stable").is_none());
    }

    #[test]
    fn test_queries_return_none_without_catalog_resource() {
        let (catalog, _) = catalog(&["1.0.0"]);
        let plain = Project::new("acme/ci");

        assert!(catalog.latest(&plain).is_none());
        assert!(catalog.latest_matching(&plain, 1, None).is_none());
        assert!(catalog.by_name(&plain, "1.0.0").is_none());
        assert!(catalog.version_names(&plain).is_empty());
    }

    #[test]
    fn test_latest_of_unknown_project_is_none() {
        let catalog = InMemoryCatalog::new();
        let project = Project::new("nobody/here").with_catalog_resource();
        assert!(catalog.latest(&project).is_none());
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let (mut catalog, project) = catalog(&["1.0.0"]);
        let err = catalog.publish(CatalogVersion::new("acme/ci", "1.0.0", "other")).unwrap_err();
        assert!(matches!(err, ComponentError::DuplicateVersion { .. }));
        assert_eq!(catalog.version_names(&project), ["1.0.0"]);
        assert_eq!(catalog.by_name(&project, "1.0.0").unwrap().sha, "sha-1.0.0");
    }
}
