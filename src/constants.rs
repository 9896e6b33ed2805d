//! Global constants used throughout the cicomp codebase.
//!
//! This module contains the sentinel tokens, cache durations and feature flag
//! names that are shared between the resolver, the fetch pipeline and the CLI.

use std::time::Duration;

/// Version token meaning "the latest published catalog version".
pub const LATEST_VERSION_TOKEN: &str = "~latest";

/// Time-to-live for cached component content (1 day).
///
/// Entries are keyed by commit sha, so the value behind a key never changes.
/// The TTL only bounds memory, it is not a staleness guard.
pub const COMPONENT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Feature flag selecting the optimized resolution strategy.
///
/// When disabled the resolver runs in legacy mode.
pub const OPTIMIZED_RESOLUTION_FLAG: &str = "optimized_component_resolution";

/// Feature flag gating the component content cache.
pub const CONTENT_CACHE_FLAG: &str = "cache_component_content";

/// Name of the directory holding the global configuration (`~/.cicomp`).
pub const CONFIG_DIR_NAME: &str = ".cicomp";

/// File name of the global configuration inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Directory inside a project repository where components live.
pub const TEMPLATES_DIR: &str = "templates";
