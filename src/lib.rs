//! cicomp - CI/CD component reference resolution
//!
//! Turns a component address such as `gitlab.example.com/acme/ci/lint@1.2`
//! into the commit sha of the referenced content and loads the component
//! file, checking access before anything is read.
//!
//! # Core Modules
//!
//! - [`reference`] - Address parsing into project path, component name and version token
//! - [`version`] - Version token classification and semver precedence
//! - [`catalog`] - Published catalog versions per project
//! - [`resolver`] - Precedence tables turning a version token into a sha
//! - [`cache`] - Content-addressed TTL cache for component files
//! - [`header`] - Component file headers and input validation
//! - [`fetch`] - The end-to-end fetch pipeline
//!
//! # Supporting Modules
//!
//! - [`project`] - Projects, users and the collaborator traits
//! - [`core`] - Error types and user-facing error display
//! - [`config`] - `~/.cicomp/config.toml` and static feature toggles
//! - [`index`] - TOML-backed project index used by the CLI
//! - [`cli`] - Command-line interface
//!
//! # Resolution Order
//!
//! With `optimized_component_resolution` on, a catalog project resolves
//! `~latest`, shorthand (`1`, `1.2`) and exact version names through the
//! catalog first, then falls back to released tags and repository refs.
//! With the flag off, catalog lookups for `~latest` and shorthand are final
//! and exact names go straight to releases and refs.
//!
//! # Example
//!
//! ```rust,no_run
//! use cicomp::cache::{ContentFetchCache, MemoryCacheStore};
//! use cicomp::fetch::{FetchOptions, FetchService};
//! use cicomp::index::LocalIndex;
//! use cicomp::project::User;
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let index = LocalIndex::from_toml_str(&std::fs::read_to_string("index.toml")?)?;
//! let cache = ContentFetchCache::new(Arc::new(MemoryCacheStore::new()));
//! let service = FetchService::new("gitlab.example.com/", index, cache);
//!
//! let component = service.fetch(
//!     "gitlab.example.com/acme/ci/lint@~latest",
//!     &User::new("alice"),
//!     FetchOptions::default(),
//! )?;
//! println!("{} at {}", component.name, component.sha);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod fetch;
pub mod header;
pub mod index;
pub mod project;
pub mod reference;
pub mod resolver;
pub mod version;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
