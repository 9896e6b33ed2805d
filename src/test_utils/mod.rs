//! Test utilities for cicomp
//!
//! This module provides an in-memory [`TestBackend`] implementing every
//! collaborator trait, plus once-only logging setup for tests.
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration test suite.
//!
//! # Example
//!
//! ```rust,no_run
//! use cicomp::test_utils::TestBackend;
//!
//! let backend = TestBackend::new()
//!     .catalog_project("acme/ci")
//!     .version("acme/ci", "1.0.0", "abc123")
//!     .file("abc123", "lint", "lint: {}\n")
//!     .reader("acme/ci", "alice");
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::catalog::{CatalogVersion, CatalogVersionRegistry, InMemoryCatalog};
use crate::project::{
    Authorizer, ContentLoader, Project, ProjectFinder, RefResolver, Release, ReleaseFinder, User,
};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG` if set, otherwise stays
/// silent. Safe to call from every test.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// In-memory backend with read counters.
///
/// `reads` counts every catalog, release, ref and content access, so tests
/// can assert that nothing was read after an access check failed. `loads`
/// counts content loads only.
#[derive(Debug, Default)]
pub struct TestBackend {
    projects: HashMap<String, Project>,
    redirects: HashMap<String, String>,
    readers: HashMap<String, HashSet<String>>,
    catalog: InMemoryCatalog,
    releases: HashMap<(String, String), String>,
    refs: HashMap<(String, String), String>,
    files: HashMap<(String, String), Vec<u8>>,
    reads: AtomicUsize,
    loads: AtomicUsize,
}

impl TestBackend {
    /// Empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a project without a catalog resource.
    #[must_use]
    pub fn project(mut self, path: &str) -> Self {
        self.projects.insert(path.to_string(), Project::new(path));
        self
    }

    /// Add a project with a catalog resource.
    #[must_use]
    pub fn catalog_project(mut self, path: &str) -> Self {
        self.projects.insert(path.to_string(), Project::new(path).with_catalog_resource());
        self
    }

    /// Publish a catalog version.
    ///
    /// # Panics
    ///
    /// If the name is already published for the project.
    #[must_use]
    pub fn version(mut self, project: &str, name: &str, sha: &str) -> Self {
        self.catalog.publish(CatalogVersion::new(project, name, sha)).expect("unique version name");
        self
    }

    /// Add a release.
    #[must_use]
    pub fn release(mut self, project: &str, tag: &str, sha: &str) -> Self {
        self.releases.insert((project.to_string(), tag.to_string()), sha.to_string());
        self
    }

    /// Add a branch, tag or commit ref.
    #[must_use]
    pub fn reference(mut self, project: &str, name: &str, sha: &str) -> Self {
        self.refs.insert((project.to_string(), name.to_string()), sha.to_string());
        self
    }

    /// Add the content of component `name` at `sha`.
    #[must_use]
    pub fn file(mut self, sha: &str, name: &str, content: &str) -> Self {
        self.files.insert((sha.to_string(), name.to_string()), content.as_bytes().to_vec());
        self
    }

    /// Allow `user` to download code from `project`.
    #[must_use]
    pub fn reader(mut self, project: &str, user: &str) -> Self {
        self.readers.entry(project.to_string()).or_default().insert(user.to_string());
        self
    }

    /// Make `from` redirect to the project at `to`.
    #[must_use]
    pub fn redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    /// Catalog, release, ref and content reads so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Content loads so far.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }
}

impl Authorizer for TestBackend {
    fn can_download_code(&self, user: &User, project: &Project) -> bool {
        self.readers.get(&project.full_path).is_some_and(|users| users.contains(&user.username))
    }
}

impl ProjectFinder for TestBackend {
    fn find_project_by_full_path(&self, path: &str, follow_redirects: bool) -> Option<Project> {
        if let Some(project) = self.projects.get(path) {
            return Some(project.clone());
        }
        if !follow_redirects {
            return None;
        }
        self.redirects.get(path).and_then(|target| self.projects.get(target)).cloned()
    }
}

impl CatalogVersionRegistry for TestBackend {
    fn latest(&self, project: &Project) -> Option<CatalogVersion> {
        self.touch();
        self.catalog.latest(project)
    }

    fn latest_matching(
        &self,
        project: &Project,
        major: u64,
        minor: Option<u64>,
    ) -> Option<CatalogVersion> {
        self.touch();
        self.catalog.latest_matching(project, major, minor)
    }

    fn by_name(&self, project: &Project, name: &str) -> Option<CatalogVersion> {
        self.touch();
        self.catalog.by_name(project, name)
    }

    fn version_names(&self, project: &Project) -> Vec<String> {
        self.catalog.version_names(project)
    }
}

impl ReleaseFinder for TestBackend {
    fn find_release_by_tag(&self, project: &Project, tag: &str) -> Option<Release> {
        self.touch();
        self.releases.get(&(project.full_path.clone(), tag.to_string())).map(|sha| Release {
            tag: tag.to_string(),
            sha: sha.clone(),
        })
    }
}

impl RefResolver for TestBackend {
    fn resolve_ref(&self, project: &Project, reference: &str) -> Option<String> {
        self.touch();
        self.refs.get(&(project.full_path.clone(), reference.to_string())).cloned()
    }
}

impl ContentLoader for TestBackend {
    fn fetch_component_bytes(
        &self,
        _project: &Project,
        sha: &str,
        component_name: &str,
    ) -> anyhow::Result<Vec<u8>> {
        self.touch();
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.files
            .get(&(sha.to_string(), component_name.to_string()))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("component '{component_name}' not found at {sha}"))
    }
}
