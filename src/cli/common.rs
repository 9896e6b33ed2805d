//! Arguments and setup shared by the `resolve` and `fetch` commands.

use anyhow::Result;
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::{ContentFetchCache, MemoryCacheStore};
use crate::config::ResolverConfig;
use crate::fetch::{FetchOptions, FetchService};
use crate::index::LocalIndex;
use crate::project::User;
use crate::reference::ComponentReference;
use crate::resolver::ResolutionMode;

/// User name used when `--user` is not given.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable lines
    #[default]
    Text,
    /// A single JSON document
    Json,
}

/// The address to work on and where to look it up.
#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    /// Component address, e.g. `gitlab.example.com/acme/ci/lint@1.2`
    pub address: String,

    /// Project index file describing projects, versions and files
    #[arg(long, value_name = "FILE")]
    pub index: PathBuf,

    /// User to check access for
    #[arg(long, default_value = ANONYMOUS_USER)]
    pub user: String,

    /// Resolve with the legacy precedence table regardless of feature flags
    #[arg(long)]
    pub legacy: bool,
}

impl TargetArgs {
    /// Load the index and build a service around it.
    pub async fn service(&self, config: &ResolverConfig) -> Result<FetchService<LocalIndex>> {
        let index = LocalIndex::load(&self.index).await?;
        let store = Arc::new(MemoryCacheStore::new());
        let cache = ContentFetchCache::with_ttl(store, config.cache.ttl());
        Ok(FetchService::new(config.instance_prefix.clone(), index, cache))
    }

    /// Per-request options from the configured flags and `--legacy`.
    pub fn options(&self, config: &ResolverConfig) -> FetchOptions {
        let scope = ComponentReference::parse(&self.address, &config.instance_prefix)
            .and_then(|reference| reference.project_full_path().map(str::to_string))
            .unwrap_or_default();

        let mut options = FetchOptions::from_toggles(&config.toggles(), &scope);
        if self.legacy {
            options.mode = ResolutionMode::Legacy;
        }
        options
    }

    pub fn user(&self) -> User {
        User::new(self.user.as_str())
    }
}
