//! Command-line interface for cicomp.
//!
//! # Available Commands
//!
//! - `resolve` - Resolve a component address to a commit sha
//! - `fetch` - Fetch a component file and validate its inputs
//!
//! Both commands read projects from a TOML index file (see [`crate::index`]).
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug output
//! - `--quiet` - Suppress all output except errors
//! - `--config` - Path to the configuration file (also `CICOMP_CONFIG`)
//!
//! # Example
//!
//! ```bash
//! cicomp resolve gitlab.com/acme/ci/lint@~latest --index index.toml --user alice
//! cicomp fetch gitlab.com/acme/ci/deploy@1.2 --index index.toml --input stage=deploy
//! ```

pub mod common;
mod fetch;
mod resolve;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::ResolverConfig;

/// Runtime settings derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Filter directive for logging; `None` disables logging
    pub log_level: Option<String>,

    /// Explicit configuration file
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global subscriber. Logs go to stderr.
    ///
    /// `RUST_LOG` takes precedence over the flag-derived level when set.
    pub fn init_logging(&self) {
        let Some(level) = &self.log_level else {
            return;
        };

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

#[derive(Parser)]
#[command(
    name = "cicomp",
    about = "Resolve and fetch CI/CD component references",
    version,
    long_about = "cicomp resolves CI/CD component addresses against catalog versions, \
                  releases and repository refs, and fetches the referenced component files."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, env = "CICOMP_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a component address to a commit sha
    Resolve(resolve::ResolveCommand),

    /// Fetch a component file
    Fetch(fetch::FetchCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("info".to_string())
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        let resolver_config = ResolverConfig::load_with_optional(config.config_path).await?;

        match self.command {
            Commands::Resolve(cmd) => cmd.execute(&resolver_config).await,
            Commands::Fetch(cmd) => cmd.execute(&resolver_config).await,
        }
    }
}
