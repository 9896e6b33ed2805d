//! End-to-end component fetching.
//!
//! [`FetchService`] runs the whole pipeline for one address:
//!
//! 1. Parse the address (`NotInstanceAddress`, `MalformedAddress`)
//! 2. Find the project, following redirects (`ProjectNotFound`)
//! 3. Check the user may download code, before any catalog or repository
//!    read (`AccessDenied`)
//! 4. Reject catalog-only tokens on non-catalog projects
//!    (`InvalidLatestUsage`, `InvalidPartialSemverUsage`)
//! 5. Resolve the version token to a sha (`Unresolved`)
//! 6. Load the file through the content cache (`Loader`)
//!
//! Mode and caching are decided by the caller once per request and passed in
//! as [`FetchOptions`]; the service never reads feature flags itself.

use serde::Serialize;
use std::borrow::Cow;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, ContentFetchCache};
use crate::catalog::CatalogVersionRegistry;
use crate::constants::CONTENT_CACHE_FLAG;
use crate::core::ComponentError;
use crate::project::{
    Authorizer, ContentLoader, FeatureToggles, Project, ProjectFinder, RefResolver, ReleaseFinder,
    User,
};
use crate::reference::ComponentReference;
use crate::resolver::{
    ResolutionMode, ResolvedReference, VersionResolver, invalid_usage_for_latest,
    invalid_usage_for_partial_semver,
};

/// Everything the fetch pipeline needs from the outside world.
///
/// Implemented automatically for any type implementing all collaborator traits.
pub trait ComponentBackend:
    Authorizer
    + ProjectFinder
    + CatalogVersionRegistry
    + ReleaseFinder
    + RefResolver
    + ContentLoader
{
}

impl<T> ComponentBackend for T where
    T: Authorizer
        + ProjectFinder
        + CatalogVersionRegistry
        + ReleaseFinder
        + RefResolver
        + ContentLoader
{
}

/// Per-request switches, resolved once by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Precedence table to resolve with
    pub mode: ResolutionMode,
    /// Whether the content cache may be used
    pub cache_enabled: bool,
}

impl FetchOptions {
    /// Read both switches from the runtime toggles for `scope`.
    pub fn from_toggles(toggles: &dyn FeatureToggles, scope: &str) -> Self {
        Self {
            mode: ResolutionMode::from_toggles(toggles, scope),
            cache_enabled: toggles.is_enabled(CONTENT_CACHE_FLAG, scope),
        }
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            mode: ResolutionMode::Optimized,
            cache_enabled: true,
        }
    }
}

/// A resolved address, before any content is loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedComponent {
    /// Canonical project path (after redirects)
    pub project: String,
    /// Component name
    pub name: String,
    /// Version token as written in the address
    pub version: String,
    /// Resolution outcome
    #[serde(flatten)]
    pub resolved: ResolvedReference,
}

/// A fetched component file.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedComponent {
    /// The project the file was read from
    pub project: Project,
    /// Component name
    pub name: String,
    /// Commit sha the file was read at
    pub sha: String,
    /// Semver of the matched catalog version, if resolution went through the catalog
    pub matched_version: Option<String>,
    /// Raw file bytes
    pub content: Vec<u8>,
    /// The parsed address
    pub reference: ComponentReference,
}

impl FetchedComponent {
    /// File content as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}

/// Resolves addresses and loads component files.
pub struct FetchService<B> {
    instance_prefix: String,
    backend: B,
    cache: ContentFetchCache,
}

impl<B: ComponentBackend> FetchService<B> {
    /// Create a service for addresses starting with `instance_prefix`.
    pub fn new(instance_prefix: impl Into<String>, backend: B, cache: ContentFetchCache) -> Self {
        Self {
            instance_prefix: instance_prefix.into(),
            backend,
            cache,
        }
    }

    /// The backend the service reads from.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Content cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Resolve `address` to a sha without loading the file.
    ///
    /// # Errors
    ///
    /// Any pipeline error up to and including `Unresolved`.
    pub fn resolve(
        &self,
        address: &str,
        user: &User,
        options: FetchOptions,
    ) -> Result<ResolvedComponent, ComponentError> {
        let (reference, project) = self.authorize(address, user)?;
        self.resolve_reference(&reference, &project, options.mode)
    }

    /// Resolve `address` and load the component file.
    ///
    /// # Errors
    ///
    /// Any pipeline error. Loader errors are wrapped in
    /// [`ComponentError::Loader`] with the original error untouched.
    pub fn fetch(
        &self,
        address: &str,
        user: &User,
        options: FetchOptions,
    ) -> Result<FetchedComponent, ComponentError> {
        let (reference, project) = self.authorize(address, user)?;
        let resolved = self.resolve_reference(&reference, &project, options.mode)?;
        let sha = resolved.resolved.content_sha;

        let content = self.cache.fetch(
            &project.full_path,
            &sha,
            &resolved.name,
            || {
                self.backend
                    .fetch_component_bytes(&project, &sha, &resolved.name)
                    .map_err(ComponentError::Loader)
            },
            options.cache_enabled,
        )?;

        info!(
            project = %project,
            component = %resolved.name,
            sha = %sha,
            bytes = content.len(),
            "Fetched component"
        );

        Ok(FetchedComponent {
            project,
            name: resolved.name,
            sha,
            matched_version: resolved.resolved.matched_semver,
            content,
            reference,
        })
    }

    /// Parse, find the project and check access.
    fn authorize(
        &self,
        address: &str,
        user: &User,
    ) -> Result<(ComponentReference, Project), ComponentError> {
        let reference = ComponentReference::parse(address, &self.instance_prefix).ok_or_else(|| {
            ComponentError::NotInstanceAddress {
                address: address.to_string(),
            }
        })?;

        let Some(project_path) = reference.project_full_path() else {
            return Err(ComponentError::MalformedAddress {
                address: address.to_string(),
            });
        };
        if reference.component_name().is_none() {
            return Err(ComponentError::MalformedAddress {
                address: address.to_string(),
            });
        }

        let project = self.backend.find_project_by_full_path(project_path, true).ok_or_else(|| {
            ComponentError::ProjectNotFound {
                path: project_path.to_string(),
            }
        })?;
        if project.full_path != project_path {
            debug!(from = project_path, to = %project, "Followed project redirect");
        }

        if !self.backend.can_download_code(user, &project) {
            warn!(user = %user.username, project = %project, "Component access denied");
            return Err(ComponentError::AccessDenied {
                project: project.full_path,
            });
        }

        Ok((reference, project))
    }

    fn resolve_reference(
        &self,
        reference: &ComponentReference,
        project: &Project,
        mode: ResolutionMode,
    ) -> Result<ResolvedComponent, ComponentError> {
        let version = reference.version_token();
        let name = reference.component_name().unwrap_or_default();

        if invalid_usage_for_latest(project, version) {
            return Err(ComponentError::InvalidLatestUsage {
                project: project.full_path.clone(),
            });
        }
        if invalid_usage_for_partial_semver(project, version) {
            return Err(ComponentError::InvalidPartialSemverUsage {
                project: project.full_path.clone(),
                version: version.to_string(),
            });
        }

        let resolver = VersionResolver::new(&self.backend, &self.backend, &self.backend);
        let Some(resolved) = resolver.resolve(project, version, mode) else {
            return Err(ComponentError::Unresolved {
                project: project.full_path.clone(),
                component: name.to_string(),
                version: version.to_string(),
                suggestions: resolver.suggestions(project, version),
            });
        };

        Ok(ResolvedComponent {
            project: project.full_path.clone(),
            name: name.to_string(),
            version: version.to_string(),
            resolved,
        })
    }
}
