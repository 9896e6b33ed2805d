//! Version token resolution.
//!
//! [`VersionResolver`] turns a `(project, version_token)` pair into the commit
//! sha the token denotes today. The token grammar is overloaded, so the
//! resolver walks an ordered precedence table and stops at the first hit.
//!
//! # Modes
//!
//! Two strategies coexist during a migration window. The caller picks one per
//! request (see [`ResolutionMode::from_toggles`]) and passes it in explicitly.
//!
//! **Optimized**
//! 1. No catalog resource: skip to step 4
//! 2. `~latest`: latest published version
//! 3. Shorthand (`1`, `1.2`): highest version with that prefix
//! 4. Exact catalog version name
//! 5. Released tag
//! 6. Raw ref (branch, tag or commit)
//!
//! **Legacy**
//! 1. `~latest`: latest published version, nothing else
//! 2. Shorthand: highest version with that prefix, nothing else
//! 3. Released tag, then raw ref. Catalog names are never looked up.
//!
//! The legacy table must keep its historical behavior bit for bit until it is
//! removed.
//!
//! # Usage checks
//!
//! [`invalid_usage_for_latest`] and [`invalid_usage_for_partial_semver`] flag
//! catalog-only tokens used on projects without a catalog resource. Callers
//! report these before resolving.

mod steps;

use serde::Serialize;
use tracing::debug;

use crate::catalog::{CatalogVersion, CatalogVersionRegistry};
use crate::constants::OPTIMIZED_RESOLUTION_FLAG;
use crate::project::{FeatureToggles, Project, RefResolver, ReleaseFinder};
use crate::version::{is_latest, is_shorthand};

use steps::{LEGACY, OPTIMIZED, OnMiss, Step};

/// Which precedence table to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    /// Catalog-first resolution including exact version names
    Optimized,
    /// Historical resolution kept for the migration window
    Legacy,
}

impl ResolutionMode {
    /// Pick the mode for `scope` from the runtime toggle.
    pub fn from_toggles(toggles: &dyn FeatureToggles, scope: &str) -> Self {
        if toggles.is_enabled(OPTIMIZED_RESOLUTION_FLAG, scope) {
            Self::Optimized
        } else {
            Self::Legacy
        }
    }

    fn steps(self) -> &'static [Step] {
        match self {
            Self::Optimized => OPTIMIZED,
            Self::Legacy => LEGACY,
        }
    }
}

/// The content a version token resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedReference {
    /// Commit sha of the content
    pub content_sha: String,
    /// Semver of the catalog version matched, only set on the catalog path
    pub matched_semver: Option<String>,
}

impl ResolvedReference {
    fn from_catalog(version: CatalogVersion) -> Self {
        Self {
            content_sha: version.sha,
            matched_semver: version.semver.map(|semver| semver.to_string()),
        }
    }

    fn from_sha(sha: String) -> Self {
        Self {
            content_sha: sha,
            matched_semver: None,
        }
    }
}

/// Resolves version tokens against the catalog and the repository.
///
/// The resolver holds no state of its own. Resolving the same pair twice
/// against unchanged collaborators yields the same result.
///
/// # Examples
///
/// ```rust
/// use cicomp::catalog::{CatalogVersion, InMemoryCatalog};
/// use cicomp::project::{Project, Release, RefResolver, ReleaseFinder};
/// use cicomp::resolver::{ResolutionMode, VersionResolver};
///
/// struct NoRepository;
/// impl ReleaseFinder for NoRepository {
///     fn find_release_by_tag(&self, _: &Project, _: &str) -> Option<Release> { None }
/// }
/// impl RefResolver for NoRepository {
///     fn resolve_ref(&self, _: &Project, _: &str) -> Option<String> { None }
/// }
///
/// let project = Project::new("acme/ci").with_catalog_resource();
/// let mut catalog = InMemoryCatalog::new();
/// catalog.publish(CatalogVersion::new("acme/ci", "1.2.3", "abc123")).unwrap();
///
/// let resolver = VersionResolver::new(&catalog, &NoRepository, &NoRepository);
/// let resolved = resolver.resolve(&project, "1", ResolutionMode::Optimized).unwrap();
/// assert_eq!(resolved.content_sha, "abc123");
/// assert_eq!(resolved.matched_semver.as_deref(), Some("1.2.3"));
/// ```
pub struct VersionResolver<'a> {
    catalog: &'a dyn CatalogVersionRegistry,
    releases: &'a dyn ReleaseFinder,
    refs: &'a dyn RefResolver,
}

impl<'a> VersionResolver<'a> {
    /// Create a resolver over the given collaborators.
    pub fn new(
        catalog: &'a dyn CatalogVersionRegistry,
        releases: &'a dyn ReleaseFinder,
        refs: &'a dyn RefResolver,
    ) -> Self {
        Self {
            catalog,
            releases,
            refs,
        }
    }

    /// Resolve `version_token` for `project` using the table of `mode`.
    ///
    /// Returns `None` when every applicable step misses.
    pub fn resolve(
        &self,
        project: &Project,
        version_token: &str,
        mode: ResolutionMode,
    ) -> Option<ResolvedReference> {
        for step in mode.steps() {
            if !(step.applies)(project, version_token) {
                continue;
            }

            if let Some(resolved) = (step.lookup)(self, project, version_token) {
                debug!(
                    project = %project,
                    version = version_token,
                    ?mode,
                    step = step.name,
                    sha = %resolved.content_sha,
                    "Resolved component version"
                );
                return Some(resolved);
            }

            if step.on_miss == OnMiss::Stop {
                debug!(
                    project = %project,
                    version = version_token,
                    ?mode,
                    step = step.name,
                    "Version token owned by step found nothing"
                );
                return None;
            }
        }

        debug!(project = %project, version = version_token, ?mode, "No step resolved version");
        None
    }

    /// Published version names close to `version_token`, best first.
    ///
    /// Used to enrich "not found" errors. At most three names are returned.
    pub fn suggestions(&self, project: &Project, version_token: &str) -> Vec<String> {
        let mut scored: Vec<(f64, String)> = self
            .catalog
            .version_names(project)
            .into_iter()
            .map(|name| (strsim::jaro_winkler(version_token, &name), name))
            .filter(|(score, _)| *score >= 0.8)
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        scored.into_iter().take(3).map(|(_, name)| name).collect()
    }
}

/// `~latest` used on a project without a catalog resource.
#[must_use]
pub fn invalid_usage_for_latest(project: &Project, version_token: &str) -> bool {
    is_latest(version_token) && !project.catalog_resource
}

/// A shorthand version used on a project without a catalog resource.
///
/// Full triples such as `1.2.3` are not shorthand and are never flagged.
#[must_use]
pub fn invalid_usage_for_partial_semver(project: &Project, version_token: &str) -> bool {
    is_shorthand(version_token) && !project.catalog_resource
}
