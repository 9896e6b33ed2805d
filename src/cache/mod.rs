//! Content-addressed cache for fetched component files.
//!
//! Component bytes are keyed by `(project_full_path, sha, component_name)`.
//! Because the sha is a content address, a key can only ever map to one
//! correct value. Entries therefore need no invalidation, they simply expire
//! after [`COMPONENT_CACHE_TTL`](crate::constants::COMPONENT_CACHE_TTL).
//!
//! # Behavior
//!
//! - **Disabled**: the loader runs on every call, nothing is read or written
//! - **Hit**: the stored bytes are returned, the loader does not run
//! - **Miss**: the loader runs, its bytes are stored and returned
//! - **Loader error**: returned unchanged, nothing is stored
//!
//! Concurrent misses for the same key may each run the loader once. They
//! store identical bytes, so the race only costs duplicate work.
//!
//! # Examples
//!
//! ```rust
//! use cicomp::cache::{ContentFetchCache, MemoryCacheStore};
//! use std::sync::Arc;
//!
//! let cache = ContentFetchCache::new(Arc::new(MemoryCacheStore::new()));
//! let bytes = cache
//!     .fetch("acme/ci", "abc123", "lint", || Ok::<_, std::io::Error>(b"job: {}".to_vec()), true)
//!     .unwrap();
//! assert_eq!(bytes, b"job: {}");
//! ```

pub mod store;

pub use store::{CacheStore, MemoryCacheStore};

use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::constants::COMPONENT_CACHE_TTL;

/// Identity of a cached component file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey<'a> {
    /// Canonical project path
    pub project_full_path: &'a str,
    /// Commit sha the content was read at
    pub sha: &'a str,
    /// Component name inside the project
    pub component_name: &'a str,
}

impl CacheKey<'_> {
    /// Key string used in the backing store.
    #[must_use]
    pub fn to_store_key(&self) -> String {
        format!("ci_component:{}:{}:{}", self.project_full_path, self.sha, self.component_name)
    }
}

/// Hit, miss and bypass counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Served from the store
    pub hits: u64,
    /// Loaded and stored
    pub misses: u64,
    /// Loaded with caching disabled
    pub bypasses: u64,
}

/// Memoizes component bytes in a [`CacheStore`].
pub struct ContentFetchCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    bypasses: AtomicU64,
}

impl ContentFetchCache {
    /// Create a cache with the default one-day TTL.
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self::with_ttl(store, COMPONENT_CACHE_TTL)
    }

    /// Create a cache with a custom TTL.
    pub fn with_ttl(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            bypasses: AtomicU64::new(0),
        }
    }

    /// Return the bytes for the key, running `loader` only when needed.
    ///
    /// # Errors
    ///
    /// Whatever `loader` returns, unchanged. Failed loads are not cached.
    pub fn fetch<E>(
        &self,
        project_full_path: &str,
        sha: &str,
        component_name: &str,
        loader: impl FnOnce() -> Result<Vec<u8>, E>,
        enabled: bool,
    ) -> Result<Vec<u8>, E> {
        if !enabled {
            self.bypasses.fetch_add(1, Ordering::Relaxed);
            debug!(
                project = project_full_path,
                sha,
                component = component_name,
                "Content cache bypassed"
            );
            return loader();
        }

        let key = CacheKey {
            project_full_path,
            sha,
            component_name,
        }
        .to_store_key();

        if let Some(bytes) = self.store.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(%key, "Content cache hit");
            return Ok(bytes);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(%key, "Content cache miss");

        let bytes = loader()?;
        self.store.set_with_ttl(&key, bytes.clone(), self.ttl);
        Ok(bytes)
    }

    /// Counters since creation.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            bypasses: self.bypasses.load(Ordering::Relaxed),
        }
    }
}
