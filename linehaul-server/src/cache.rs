//! Caching layer for mileage lookups.
//!
//! Curated mileage changes rarely, and the same terminal pairs are asked for
//! over and over by planning screens. Only answers are cached: a "no data"
//! result may be fixed by the next data entry, so it is always recomputed.

use std::time::Duration;

use moka::future::Cache as MokaCache;

use crate::domain::TerminalCode;
use crate::mileage::{LookupPath, Mileage, MileageError, MileageResolver};
use crate::store::Store;

/// Cache key: (origin, destination, lookup path).
type MileageKey = (TerminalCode, TerminalCode, LookupPath);

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct MileageCacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for MileageCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(600),
            max_capacity: 10_000,
        }
    }
}

/// Mileage resolver with caching.
pub struct CachedMileageResolver<S> {
    resolver: MileageResolver<S>,
    entries: MokaCache<MileageKey, Mileage>,
}

impl<S: Store> CachedMileageResolver<S> {
    pub fn new(resolver: MileageResolver<S>, config: &MileageCacheConfig) -> Self {
        let entries = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { resolver, entries }
    }

    pub async fn resolve(
        &self,
        origin: TerminalCode,
        destination: TerminalCode,
    ) -> Result<Mileage, MileageError> {
        self.lookup(origin, destination, LookupPath::Templates).await
    }

    pub async fn resolve_matrix(
        &self,
        origin: TerminalCode,
        destination: TerminalCode,
    ) -> Result<Mileage, MileageError> {
        self.lookup(origin, destination, LookupPath::Matrix).await
    }

    async fn lookup(
        &self,
        origin: TerminalCode,
        destination: TerminalCode,
        path: LookupPath,
    ) -> Result<Mileage, MileageError> {
        let key = (origin, destination, path);

        if let Some(cached) = self.entries.get(&key).await {
            return Ok(cached);
        }

        let mileage = self.resolver.lookup(origin, destination, path)?;
        self.entries.insert(key, mileage).await;
        Ok(mileage)
    }

    /// Access the underlying resolver for lookups that bypass the cache.
    pub fn resolver(&self) -> &MileageResolver<S> {
        &self.resolver
    }

    /// Get cache statistics.
    pub fn cache_entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Drop every cached answer, e.g. after templates or the matrix change.
    pub fn invalidate_cache(&self) {
        self.entries.invalidate_all();
    }
}
