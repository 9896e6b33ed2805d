//! Resolver configuration.
//!
//! Configuration lives in `~/.cicomp/config.toml` unless a path is given on
//! the command line or in `CICOMP_CONFIG`. A missing file means defaults.
//!
//! ```toml
//! instance_prefix = "gitlab.example.com/"
//!
//! [cache]
//! enabled = true
//! ttl_secs = 86400
//!
//! [features]
//! optimized_component_resolution = true
//! cache_component_content = true
//! ```
//!
//! The `[features]` table backs [`StaticToggles`], a [`FeatureToggles`]
//! implementation for deployments without a flag service. Listed flags are
//! merged over the defaults, so leaving one out keeps it on. Unknown flags
//! are off.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::constants::{
    COMPONENT_CACHE_TTL, CONFIG_DIR_NAME, CONFIG_FILE_NAME, CONTENT_CACHE_FLAG,
    OPTIMIZED_RESOLUTION_FLAG,
};
use crate::core::ComponentError;
use crate::project::FeatureToggles;

const DEFAULT_INSTANCE_PREFIX: &str = "gitlab.com/";

fn default_instance_prefix() -> String {
    DEFAULT_INSTANCE_PREFIX.to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_ttl_secs() -> u64 {
    COMPONENT_CACHE_TTL.as_secs()
}

fn default_features() -> BTreeMap<String, bool> {
    BTreeMap::from([
        (OPTIMIZED_RESOLUTION_FLAG.to_string(), true),
        (CONTENT_CACHE_FLAG.to_string(), true),
    ])
}

fn merge_features<'de, D>(deserializer: D) -> Result<BTreeMap<String, bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let listed = BTreeMap::<String, bool>::deserialize(deserializer)?;
    let mut features = default_features();
    features.extend(listed);
    Ok(features)
}

/// Content cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Master switch, combined with the `cache_component_content` flag
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Entry lifetime in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheConfig {
    /// Entry lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Host prefix of addresses served by this instance, e.g. `gitlab.example.com/`
    #[serde(default = "default_instance_prefix")]
    pub instance_prefix: String,

    /// Content cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Feature flag states
    #[serde(default = "default_features", deserialize_with = "merge_features")]
    pub features: BTreeMap<String, bool>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            instance_prefix: default_instance_prefix(),
            cache: CacheConfig::default(),
            features: default_features(),
        }
    }
}

impl ResolverConfig {
    /// Default configuration path, `~/.cicomp/config.toml`.
    ///
    /// # Errors
    ///
    /// Fails if the home directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?;
        Ok(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from `path`, or from the default path when `None`.
    ///
    /// A file that does not exist yields the default configuration.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read, parsed or validated.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };

        if fs::try_exists(&path).await.unwrap_or(false) {
            Self::load_from(&path).await
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, is not valid TOML, or fails
    /// [`validate`](Self::validate).
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot work.
    ///
    /// # Errors
    ///
    /// [`ComponentError::ConfigError`] for an empty prefix or a prefix not
    /// ending in `/`.
    pub fn validate(&self) -> Result<(), ComponentError> {
        if self.instance_prefix.is_empty() {
            return Err(ComponentError::ConfigError {
                message: "instance_prefix must not be empty".to_string(),
            });
        }
        if !self.instance_prefix.ends_with('/') {
            return Err(ComponentError::ConfigError {
                message: format!("instance_prefix '{}' must end with '/'", self.instance_prefix),
            });
        }
        Ok(())
    }

    /// Feature toggles backed by the `[features]` table.
    #[must_use]
    pub fn toggles(&self) -> StaticToggles {
        StaticToggles {
            flags: self.features.clone(),
            cache_enabled: self.cache.enabled,
        }
    }
}

/// [`FeatureToggles`] from a fixed table. Scope is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticToggles {
    flags: BTreeMap<String, bool>,
    cache_enabled: bool,
}

impl StaticToggles {
    /// Toggles from explicit flag states, with the cache switched on.
    #[must_use]
    pub fn new(flags: BTreeMap<String, bool>) -> Self {
        Self {
            flags,
            cache_enabled: true,
        }
    }
}

impl FeatureToggles for StaticToggles {
    fn is_enabled(&self, flag: &str, _scope: &str) -> bool {
        if flag == CONTENT_CACHE_FLAG && !self.cache_enabled {
            return false;
        }
        self.flags.get(flag).copied().unwrap_or(false)
    }
}
