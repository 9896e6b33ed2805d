//! Key/value storage with per-entry time-to-live.
//!
//! [`CacheStore`] is the boundary to whatever shared cache a deployment runs.
//! [`MemoryCacheStore`] is the in-process implementation backed by a
//! [`DashMap`], safe to share between threads without an outer lock.

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use std::time::Duration;

/// A key/value store supporting expiry.
pub trait CacheStore: Send + Sync {
    /// Value stored under `key`, unless absent or expired.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store `value` under `key` for `ttl`, replacing any previous value.
    fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration);
}

#[derive(Debug)]
struct StoredEntry {
    value: Vec<u8>,
    expires_at: DateTime<Utc>,
}

impl StoredEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// In-memory [`CacheStore`].
///
/// Expired entries are dropped lazily on read, or in bulk with
/// [`purge_expired`](Self::purge_expired).
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: DashMap<String, StoredEntry>,
}

impl MemoryCacheStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = Utc::now();
        // Clone out before removing: holding a read guard while removing deadlocks.
        let found = self.entries.get(key).map(|entry| (entry.is_expired(now), entry.value.clone()));

        match found {
            Some((false, value)) => Some(value),
            Some((true, _)) => {
                self.entries.remove_if(key, |_, entry| entry.is_expired(now));
                None
            }
            None => None,
        }
    }

    fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        let now = Utc::now();
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        let expires_at = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.entries.insert(
            key.to_string(),
            StoredEntry {
                value,
                expires_at,
            },
        );
    }
}
