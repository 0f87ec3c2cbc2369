//! In-memory geocode cache.
//!
//! Backed by `DashMap`, so concurrent lookups for different ZIP codes only
//! contend on their own shard. Entries expire lazily on read.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::model::GeoCoordinate;

/// Geocode results are stable; a day bounds staleness without invalidation.
pub const DEFAULT_GEOCODE_TTL_SECS: i64 = 24 * 60 * 60;

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub coordinate: GeoCoordinate,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct GeocodeCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl Default for GeocodeCache {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_GEOCODE_TTL_SECS))
    }
}

impl GeocodeCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
            clock,
        }
    }

    /// Cached coordinate for `zip`, unless missing or expired.
    pub fn get(&self, zip: &str) -> Option<GeoCoordinate> {
        let key = normalize_zip(zip);
        let now = self.clock.now();

        // The read guard must be released before `remove_if` takes the shard write lock.
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Some(entry.coordinate.clone()),
            Some(_) => {}
            None => return None,
        }

        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        tracing::debug!(zip = key, "geocode cache entry expired");
        None
    }

    /// Store `coordinate` for `zip`, replacing any previous entry.
    pub fn put(&self, zip: &str, coordinate: GeoCoordinate) {
        let expires_at = self.clock.now() + self.ttl;
        self.entries.insert(
            normalize_zip(zip).to_string(),
            CacheEntry {
                coordinate,
                expires_at,
            },
        );
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cache key for a ZIP code. Surrounding whitespace never changes the lookup.
pub fn normalize_zip(zip: &str) -> &str {
    zip.trim()
}
