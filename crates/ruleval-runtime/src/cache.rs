//! Caching layer for extraction replies.
//!
//! Follow-up rounds often see the same answer for the same constraint;
//! caching the extracted parts keeps the extraction model out of those
//! repeats.

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// Cache sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: u64,

    #[serde(with = "crate::config::human_duration")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(3600),
        }
    }
}

/// Cache key for one extraction: (prompt, answer, constraint text).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    question_hash: u64,
    response_hash: u64,
    constraint_hash: u64,
}

impl CacheKey {
    pub fn new(question: &str, response: &str, constraint: &str) -> Self {
        Self {
            question_hash: hash_str(question),
            response_hash: hash_str(response),
            constraint_hash: hash_str(constraint),
        }
    }
}

/// Extracted parts keyed by [`CacheKey`], using moka.
pub struct ExtractionCache {
    cache: Cache<CacheKey, Vec<String>>,
}

impl ExtractionCache {
    pub fn new(config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();

        Self { cache }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Vec<String>> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: CacheKey, parts: Vec<String>) {
        self.cache.insert(key, parts).await;
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for ExtractionCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

fn hash_str(s: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_operations() {
        let cache = ExtractionCache::default();
        let key = CacheKey::new("Write a poem.", "Roses are red.", "Each line rhymes");

        assert!(cache.get(&key).await.is_none());

        cache.insert(key, vec!["Roses are red.".to_string()]).await;
        assert_eq!(cache.get(&key).await, Some(vec!["Roses are red.".to_string()]));

        let other = CacheKey::new("Write a poem.", "Roses are blue.", "Each line rhymes");
        assert!(cache.get(&other).await.is_none());
    }

    #[test]
    fn test_key_depends_on_every_field() {
        let base = CacheKey::new("q", "r", "c");
        assert_eq!(base, CacheKey::new("q", "r", "c"));
        assert_ne!(base, CacheKey::new("q2", "r", "c"));
        assert_ne!(base, CacheKey::new("q", "r2", "c"));
        assert_ne!(base, CacheKey::new("q", "r", "c2"));
    }
}
