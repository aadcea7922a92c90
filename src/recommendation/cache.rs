//! Optional recommendation cache
//!
//! The engine never owns a cache itself; callers inject one through
//! [`RecommendationEngine::with_cache`](super::RecommendationEngine::with_cache).

use super::types::Recommendation;
use crate::soil::{IdealRanges, Region, Season, SoilParameterSet};
use std::fmt::Write;
use std::time::Duration;

pub trait RecommendationCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<Recommendation>>;
    fn put(&self, key: String, value: Vec<Recommendation>, ttl: Duration);
}

/// Cache that stores nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl RecommendationCache for NoopCache {
    fn get(&self, _key: &str) -> Option<Vec<Recommendation>> {
        None
    }

    fn put(&self, _key: String, _value: Vec<Recommendation>, _ttl: Duration) {}
}

/// Exact key: the bit pattern of every sample value in canonical order, the
/// ideal ranges judged against, then region, crop and resolved season.
///
/// Two samples share a key only when they would produce identical advice.
pub fn cache_key(
    params: &SoilParameterSet,
    ranges: &IdealRanges,
    region: Option<Region>,
    crop: Option<&str>,
    season: Option<Season>,
) -> String {
    let mut key = String::with_capacity(256);
    for (parameter, value) in params.iter() {
        let _ = write!(key, "{}={:016x},", parameter.as_str(), value.to_bits());
    }
    key.push('|');
    for (parameter, range) in ranges {
        let _ = write!(
            key,
            "{}:{:016x}-{:016x},",
            parameter.as_str(),
            range.min.to_bits(),
            range.max.to_bits()
        );
    }

    let crop = crop
        .map(|c| c.trim().to_ascii_lowercase())
        .unwrap_or_else(|| "none".to_string());

    let _ = write!(
        key,
        "|{}|{}|{}",
        region.map_or("none", |r| r.display_text()),
        crop,
        season.map_or("none", |s| s.as_str()),
    );
    key
}

#[cfg(feature = "cache")]
pub use moka_cache::MokaRecommendationCache;

#[cfg(feature = "cache")]
mod moka_cache {
    use super::*;
    use moka::sync::Cache;
    use moka::Expiry;
    use std::time::Instant;

    #[derive(Clone)]
    struct Entry {
        value: Vec<Recommendation>,
        ttl: Duration,
    }

    /// Expires each entry after the TTL it was stored with
    struct PerEntryTtl;

    impl Expiry<String, Entry> for PerEntryTtl {
        fn expire_after_create(&self, _key: &String, value: &Entry, _created_at: Instant) -> Option<Duration> {
            Some(value.ttl)
        }

        fn expire_after_update(
            &self,
            _key: &String,
            value: &Entry,
            _updated_at: Instant,
            _duration_until_expiry: Option<Duration>,
        ) -> Option<Duration> {
            Some(value.ttl)
        }
    }

    /// In-process moka cache with a per-entry TTL
    pub struct MokaRecommendationCache {
        inner: Cache<String, Entry>,
    }

    impl MokaRecommendationCache {
        pub fn new(max_capacity: u64) -> Self {
            Self {
                inner: Cache::builder()
                    .max_capacity(max_capacity)
                    .expire_after(PerEntryTtl)
                    .build(),
            }
        }

        pub fn entry_count(&self) -> u64 {
            self.inner.run_pending_tasks();
            self.inner.entry_count()
        }
    }

    impl Default for MokaRecommendationCache {
        fn default() -> Self {
            Self::new(10_000)
        }
    }

    impl RecommendationCache for MokaRecommendationCache {
        fn get(&self, key: &str) -> Option<Vec<Recommendation>> {
            self.inner.get(key).map(|entry| entry.value)
        }

        fn put(&self, key: String, value: Vec<Recommendation>, ttl: Duration) {
            self.inner.insert(key, Entry { value, ttl });
        }
    }
}
