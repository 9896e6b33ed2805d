//! Shared fixtures for the integration suite.

use anyhow::Result;
use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::fs;

use cicomp::cache::{ContentFetchCache, MemoryCacheStore};
use cicomp::fetch::FetchService;
use cicomp::index::LocalIndex;
use cicomp::test_utils::TestBackend;

pub const PREFIX: &str = "gitlab.example.com/";

/// Catalog project `acme/ci` readable by alice, and public `acme/plain`
/// without a catalog resource.
pub const INDEX: &str = r#"
[[projects]]
path = "acme/ci"
catalog_resource = true
readers = ["alice"]
redirects_from = ["acme/old-ci"]
versions = [
    { name = "1.0.0", sha = "sha-100" },
    { name = "1.2.0", sha = "sha-120" },
    { name = "1.2.3", sha = "sha-123" },
    { name = "2.0.0-beta", sha = "sha-200b" },
    { name = "stable", sha = "sha-stable" },
]
releases = [{ tag = "v0.9.0", sha = "sha-090" }]
refs = { main = "sha-main", stable = "sha-stable-branch" }

[projects.files.sha-123]
"templates/lint.yml" = "lint:\n  script: make lint\n"
"templates/deploy/template.yml" = """
spec:
  inputs:
    environment:
      options: [staging, production]
    replicas:
      type: number
      default: 1
---
deploy:
  environment: $[[ inputs.environment ]]
"""

[projects.files.sha-main]
"templates/lint.yml" = "lint:\n  script: make lint-main\n"

[[projects]]
path = "acme/plain"
public = true
releases = [{ tag = "1.2.3", sha = "sha-rel" }]
refs = { main = "sha-plain-main" }

[projects.files.sha-rel]
"templates/build.yml" = "build:\n  script: make\n"
"#;

pub fn index() -> LocalIndex {
    LocalIndex::from_toml_str(INDEX).unwrap()
}

pub fn index_service() -> FetchService<LocalIndex> {
    FetchService::new(PREFIX, index(), ContentFetchCache::new(Arc::new(MemoryCacheStore::new())))
}

pub fn backend_service(backend: TestBackend) -> FetchService<TestBackend> {
    FetchService::new(PREFIX, backend, ContentFetchCache::new(Arc::new(MemoryCacheStore::new())))
}

pub fn address(path: &str) -> String {
    format!("{PREFIX}{path}")
}

/// A temporary directory holding an index and a config file.
pub struct TestEnv {
    _temp: TempDir,
    pub index: PathBuf,
    pub config: PathBuf,
}

impl TestEnv {
    pub async fn new() -> Result<Self> {
        Self::with_config("").await
    }

    /// Environment whose config file has `extra` appended after the prefix.
    pub async fn with_config(extra: &str) -> Result<Self> {
        let temp = TempDir::new()?;
        let index = temp.path().join("index.toml");
        let config = temp.path().join("config.toml");

        fs::write(&index, INDEX).await?;
        fs::write(&config, format!("instance_prefix = \"{PREFIX}\"\n{extra}")).await?;

        Ok(Self {
            _temp: temp,
            index,
            config,
        })
    }

    pub fn dir(&self) -> &Path {
        self.index.parent().unwrap()
    }

    /// `cicomp` with this environment's config and no inherited log filter.
    pub fn cicomp(&self) -> Command {
        let mut cmd = Command::cargo_bin("cicomp").unwrap();
        cmd.env("CICOMP_CONFIG", &self.config).env_remove("RUST_LOG").env("NO_COLOR", "1");
        cmd
    }
}
