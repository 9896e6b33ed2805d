//! File-backed project index.
//!
//! [`LocalIndex`] reads a TOML description of projects and implements every
//! collaborator trait on top of it. It backs the `cicomp` binary, which lets
//! resolution be exercised without a running instance.
//!
//! ```toml
//! [[projects]]
//! path = "acme/ci"
//! catalog_resource = true
//! public = false
//! readers = ["alice"]
//! redirects_from = ["acme/old-ci"]
//! versions = [{ name = "1.0.0", sha = "a1" }]
//! releases = [{ tag = "v1.0.0", sha = "a1" }]
//! refs = { main = "b2" }
//!
//! [projects.files.a1]
//! "templates/lint.yml" = "lint:\n  script: make lint\n"
//! ```
//!
//! A component `name` is read from `templates/<name>.yml`, falling back to
//! `templates/<name>/template.yml`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tokio::fs;

use crate::catalog::{CatalogVersion, CatalogVersionRegistry, InMemoryCatalog};
use crate::constants::TEMPLATES_DIR;
use crate::project::{
    Authorizer, ContentLoader, Project, ProjectFinder, RefResolver, Release, ReleaseFinder, User,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IndexFile {
    #[serde(default)]
    projects: Vec<ProjectEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectEntry {
    path: String,
    #[serde(default)]
    catalog_resource: bool,
    #[serde(default)]
    public: bool,
    #[serde(default)]
    readers: Vec<String>,
    #[serde(default)]
    redirects_from: Vec<String>,
    #[serde(default)]
    versions: Vec<VersionEntry>,
    #[serde(default)]
    releases: Vec<Release>,
    #[serde(default)]
    refs: BTreeMap<String, String>,
    /// sha -> repository path -> content
    #[serde(default)]
    files: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct VersionEntry {
    name: String,
    sha: String,
}

/// Projects, catalog and repository contents read from a TOML file.
#[derive(Debug, Default)]
pub struct LocalIndex {
    projects: HashMap<String, ProjectEntry>,
    redirects: HashMap<String, String>,
    catalog: InMemoryCatalog,
}

impl LocalIndex {
    /// Read an index file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a valid index.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read index from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse index from {}", path.display()))
    }

    /// Parse an index from TOML text.
    ///
    /// # Errors
    ///
    /// Fails on invalid TOML, duplicate project paths, redirects claimed by
    /// two projects, or duplicate version names within a project.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: IndexFile = toml::from_str(content)?;
        let mut index = Self::default();

        for entry in file.projects {
            if index.projects.contains_key(&entry.path) {
                anyhow::bail!("project '{}' is listed twice", entry.path);
            }

            for old_path in &entry.redirects_from {
                if let Some(owner) = index.redirects.insert(old_path.clone(), entry.path.clone()) {
                    anyhow::bail!(
                        "redirect '{old_path}' is claimed by '{owner}' and '{}'",
                        entry.path
                    );
                }
            }

            for version in &entry.versions {
                index.catalog.publish(CatalogVersion::new(
                    entry.path.as_str(),
                    version.name.as_str(),
                    version.sha.as_str(),
                ))?;
            }

            index.projects.insert(entry.path.clone(), entry);
        }

        tracing::debug!(projects = index.projects.len(), "Loaded project index");
        Ok(index)
    }

    fn entry(&self, project: &Project) -> Option<&ProjectEntry> {
        self.projects.get(&project.full_path)
    }
}

impl Authorizer for LocalIndex {
    fn can_download_code(&self, user: &User, project: &Project) -> bool {
        self.entry(project)
            .is_some_and(|entry| entry.public || entry.readers.contains(&user.username))
    }
}

impl ProjectFinder for LocalIndex {
    fn find_project_by_full_path(&self, path: &str, follow_redirects: bool) -> Option<Project> {
        let entry = match self.projects.get(path) {
            Some(entry) => entry,
            None if follow_redirects => self.projects.get(self.redirects.get(path)?)?,
            None => return None,
        };

        Some(Project {
            full_path: entry.path.clone(),
            catalog_resource: entry.catalog_resource,
        })
    }
}

impl CatalogVersionRegistry for LocalIndex {
    fn latest(&self, project: &Project) -> Option<CatalogVersion> {
        self.catalog.latest(project)
    }

    fn latest_matching(
        &self,
        project: &Project,
        major: u64,
        minor: Option<u64>,
    ) -> Option<CatalogVersion> {
        self.catalog.latest_matching(project, major, minor)
    }

    fn by_name(&self, project: &Project, name: &str) -> Option<CatalogVersion> {
        self.catalog.by_name(project, name)
    }

    fn version_names(&self, project: &Project) -> Vec<String> {
        self.catalog.version_names(project)
    }
}

impl ReleaseFinder for LocalIndex {
    fn find_release_by_tag(&self, project: &Project, tag: &str) -> Option<Release> {
        self.entry(project)?.releases.iter().find(|release| release.tag == tag).cloned()
    }
}

impl RefResolver for LocalIndex {
    fn resolve_ref(&self, project: &Project, reference: &str) -> Option<String> {
        let entry = self.entry(project)?;
        if let Some(sha) = entry.refs.get(reference) {
            return Some(sha.clone());
        }
        // A commit sha resolves to itself when the repository has it.
        entry.files.contains_key(reference).then(|| reference.to_string())
    }
}

impl ContentLoader for LocalIndex {
    fn fetch_component_bytes(
        &self,
        project: &Project,
        sha: &str,
        component_name: &str,
    ) -> Result<Vec<u8>> {
        let tree = self
            .entry(project)
            .and_then(|entry| entry.files.get(sha))
            .with_context(|| format!("commit {sha} not found in project '{project}'"))?;

        let candidates = [
            format!("{TEMPLATES_DIR}/{component_name}.yml"),
            format!("{TEMPLATES_DIR}/{component_name}/template.yml"),
        ];

        candidates
            .iter()
            .find_map(|path| tree.get(path))
            .map(|content| content.as_bytes().to_vec())
            .with_context(|| {
                format!("component '{component_name}' not found in project '{project}' at {sha}")
            })
    }
}
