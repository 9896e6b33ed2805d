//! Projects and the collaborator interfaces the resolver consumes.
//!
//! The resolver never talks to storage, the repository or the permission
//! model directly. Everything outside the resolution core is reached through
//! the traits in this module.
//!
//! | Trait | Question it answers |
//! |---|---|
//! | [`Authorizer`] | may this user download code from this project? |
//! | [`ProjectFinder`] | which project lives at this path (following redirects)? |
//! | [`ReleaseFinder`] | which commit does this released tag point at? |
//! | [`RefResolver`] | which commit does this branch/tag/sha name? |
//! | [`ContentLoader`] | what are the bytes of this component at this commit? |
//! | [`FeatureToggles`] | is this runtime flag on for this scope? |
//!
//! All traits are `Send + Sync` so a single fetch pipeline can be shared
//! between threads.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A project that may host components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Project {
    /// Canonical full path, e.g. `acme/ci/templates`
    pub full_path: String,
    /// Whether the project has opted into publishing versioned components
    #[serde(default)]
    pub catalog_resource: bool,
}

impl Project {
    /// Create a project without a catalog resource.
    pub fn new(full_path: impl Into<String>) -> Self {
        Self {
            full_path: full_path.into(),
            catalog_resource: false,
        }
    }

    /// Mark the project as a catalog resource.
    #[must_use]
    pub fn with_catalog_resource(mut self) -> Self {
        self.catalog_resource = true;
        self
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path)
    }
}

/// The user on whose behalf a component is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    /// Login name
    pub username: String,
}

impl User {
    /// Create a user from a login name.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// A published release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Tag the release was cut from
    pub tag: String,
    /// Commit sha the tag points at
    pub sha: String,
}

/// Permission checks.
pub trait Authorizer: Send + Sync {
    /// Whether `user` may read repository content of `project`.
    fn can_download_code(&self, user: &User, project: &Project) -> bool;
}

/// Project lookup by path.
pub trait ProjectFinder: Send + Sync {
    /// Find the project at `path`.
    ///
    /// With `follow_redirects`, a path the project was moved away from still
    /// finds it.
    fn find_project_by_full_path(&self, path: &str, follow_redirects: bool) -> Option<Project>;
}

/// Release lookup.
pub trait ReleaseFinder: Send + Sync {
    /// Find the release cut from `tag`, if there is one.
    fn find_release_by_tag(&self, project: &Project, tag: &str) -> Option<Release>;
}

/// Raw repository ref resolution.
pub trait RefResolver: Send + Sync {
    /// Resolve a branch, tag or commit name to a commit sha.
    fn resolve_ref(&self, project: &Project, reference: &str) -> Option<String>;
}

/// Reads component files out of a repository.
///
/// Implementations own their retry policy. Errors are propagated to the
/// caller unchanged and never cached.
pub trait ContentLoader: Send + Sync {
    /// Load the raw bytes of `component_name` at commit `sha`.
    fn fetch_component_bytes(
        &self,
        project: &Project,
        sha: &str,
        component_name: &str,
    ) -> anyhow::Result<Vec<u8>>;
}

/// Runtime feature flags.
pub trait FeatureToggles: Send + Sync {
    /// Whether `flag` is enabled for `scope` (usually a project path).
    fn is_enabled(&self, flag: &str, scope: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_builder() {
        let plain = Project::new("acme/ci");
        assert!(!plain.catalog_resource);

        let published = Project::new("acme/ci").with_catalog_resource();
        assert!(published.catalog_resource);
        assert_eq!(published.to_string(), "acme/ci");
    }

    #[test]
    fn test_project_deserializes_without_catalog_flag() {
        let project: Project = toml::from_str(r#"full_path = "acme/ci""#).unwrap();
        assert_eq!(project, Project::new("acme/ci"));
    }
}
