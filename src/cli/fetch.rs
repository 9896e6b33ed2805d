//! Fetch a component file and validate caller inputs against its header.
//!
//! ```bash
//! cicomp fetch gitlab.example.com/acme/ci/deploy@1 --index index.toml \
//!     --user alice --input environment=production
//! ```
//!
//! The file is printed as stored. When the header declares inputs, the
//! interpolation context follows it as JSON.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;
use std::collections::BTreeMap;

use super::common::{OutputFormat, TargetArgs};
use crate::config::ResolverConfig;
use crate::header::ComponentFile;

#[derive(Debug, Args)]
pub struct FetchCommand {
    #[command(flatten)]
    target: TargetArgs,

    /// Bypass the content cache
    #[arg(long)]
    no_cache: bool,

    /// Input argument as key=value, repeatable
    #[arg(long = "input", value_name = "KEY=VALUE", value_parser = parse_input)]
    inputs: Vec<(String, String)>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl FetchCommand {
    pub async fn execute(self, config: &ResolverConfig) -> Result<()> {
        let service = self.target.service(config).await?;
        let mut options = self.target.options(config);
        if self.no_cache {
            options.cache_enabled = false;
        }

        let fetched = service.fetch(&self.target.address, &self.target.user(), options)?;
        let text = fetched.text();
        let file = ComponentFile::parse(&text)?;
        let header = file.spec_header()?;

        let args: BTreeMap<String, String> = self.inputs.into_iter().collect();
        let context = header
            .build_context(&args)
            .with_context(|| format!("Invalid inputs for {}", fetched.reference))?;

        match self.format {
            OutputFormat::Json => {
                let output = json!({
                    "project": &fetched.project.full_path,
                    "name": &fetched.name,
                    "sha": &fetched.sha,
                    "matched_version": &fetched.matched_version,
                    "content": &text,
                    "context": context.to_json(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                print!("{text}");
                if !text.ends_with('\n') {
                    println!();
                }
                if !header.is_empty() {
                    println!("# interpolation context");
                    println!("{}", serde_json::to_string_pretty(&context.to_json())?);
                }
            }
        }

        tracing::debug!(stats = ?service.cache_stats(), "Content cache");
        Ok(())
    }
}

fn parse_input(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid input '{raw}': expected KEY=VALUE"))?;
    if key.is_empty() {
        return Err(format!("invalid input '{raw}': empty key"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("stage=test").unwrap(), ("stage".to_string(), "test".to_string()));
        assert_eq!(parse_input("url=a=b").unwrap(), ("url".to_string(), "a=b".to_string()));
        assert_eq!(parse_input("empty=").unwrap(), ("empty".to_string(), String::new()));
        assert!(parse_input("stage").is_err());
        assert!(parse_input("=x").is_err());
    }
}
