//! First-pass narrative cache using moka TTL cache.
//!
//! Keys are content hashes of the metrics map, so identical data yields the
//! same narrative without another model call. Refinement passes never read
//! or write the cache.

use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::models::{MetricsMap, ReportConfig};

/// Default TTL for cached narratives.
const NARRATIVE_CACHE_TTL_SECS: u64 = 3600;

/// Maximum number of cached narratives.
const NARRATIVE_CACHE_MAX_CAPACITY: u64 = 64;

#[derive(Clone)]
pub struct NarrativeCache {
    entries: Cache<String, Arc<String>>,
}

impl Default for NarrativeCache {
    fn default() -> Self {
        Self::new(
            NARRATIVE_CACHE_MAX_CAPACITY,
            Duration::from_secs(NARRATIVE_CACHE_TTL_SECS),
        )
    }
}

impl NarrativeCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).time_to_live(ttl).build(),
        }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(config.cache_capacity, Duration::from_secs(config.cache_ttl_secs))
    }

    pub async fn get(&self, metrics: &MetricsMap) -> Option<String> {
        self.entries
            .get(&metrics.cache_key())
            .await
            .map(|narrative| (*narrative).clone())
    }

    pub async fn insert(&self, metrics: &MetricsMap, narrative: &str) {
        self.entries
            .insert(metrics.cache_key(), Arc::new(narrative.to_string()))
            .await;
    }

    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }
}
