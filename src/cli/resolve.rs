//! Resolve an address to a commit sha without loading the file.
//!
//! ```bash
//! cicomp resolve gitlab.example.com/acme/ci/lint@1.2 --index index.toml --user alice
//! cicomp resolve gitlab.example.com/acme/ci/lint@~latest --index index.toml --format json
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use super::common::{OutputFormat, TargetArgs};
use crate::config::ResolverConfig;
use crate::fetch::ResolvedComponent;
use crate::resolver::ResolutionMode;

#[derive(Debug, Args)]
pub struct ResolveCommand {
    #[command(flatten)]
    target: TargetArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Serialize)]
struct ResolveOutput<'a> {
    #[serde(flatten)]
    component: &'a ResolvedComponent,
    mode: ResolutionMode,
}

impl ResolveCommand {
    pub async fn execute(self, config: &ResolverConfig) -> Result<()> {
        let service = self.target.service(config).await?;
        let options = self.target.options(config);
        let component = service.resolve(&self.target.address, &self.target.user(), options)?;

        match self.format {
            OutputFormat::Json => {
                let output = ResolveOutput {
                    component: &component,
                    mode: options.mode,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => print_text(&component, options.mode),
        }
        Ok(())
    }
}

fn print_text(component: &ResolvedComponent, mode: ResolutionMode) {
    println!("{} {}", "project:".bold(), component.project);
    println!("{} {}", "component:".bold(), component.name);
    println!("{} {}", "version:".bold(), component.version);
    println!("{} {}", "sha:".bold(), component.resolved.content_sha.green());
    if let Some(semver) = &component.resolved.matched_semver {
        println!("{} {}", "catalog version:".bold(), semver);
    }
    let mode = match mode {
        ResolutionMode::Optimized => "optimized",
        ResolutionMode::Legacy => "legacy",
    };
    println!("{} {}", "mode:".bold(), mode.dimmed());
}
