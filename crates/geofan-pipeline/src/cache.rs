//! Process-wide result caching for merged geolocation answers.
//!
//! The cache is an explicitly owned, injected component; `DashMap`
//! supplies the synchronized-access discipline for concurrent
//! requests. Keys are a structured `(q, lang)` composite rather than a
//! raw concatenation, so distinct pairs can never collide.
//!
//! An entry is only usable when the requested service list matches the
//! stored one element for element (a permutation counts as a different
//! request), the diagnostic flag matches, and the entry's age in whole
//! days is within the expiry window.

use dashmap::DashMap;

use geofan_core::{ResultItem, Timestamp};

/// Default age threshold in whole days before an entry expires.
pub const DEFAULT_EXPIRY_DAYS: i64 = 7;

/// Maximum query length (exclusive) after wildcard stripping.
const MAX_QUERY_LEN: usize = 30;

/// Structured composite cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub q: String,
    pub lang: String,
}

impl CacheKey {
    pub fn new(q: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            lang: lang.into(),
        }
    }
}

/// A cached merged answer together with the request shape that
/// produced it.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub stored_at: Timestamp,
    pub keys: Vec<String>,
    pub dev: bool,
    pub loads: Vec<ResultItem>,
}

pub struct ResultCache {
    entries: DashMap<CacheKey, CacheEntry>,
    expiry_days: i64,
}

impl ResultCache {
    pub fn new(expiry_days: i64) -> Self {
        Self {
            entries: DashMap::new(),
            expiry_days,
        }
    }

    /// Whether a query string qualifies for caching: after stripping
    /// literal `+` and `*` wildcard markers the remainder must be
    /// non-empty, strictly alphanumeric, and shorter than 30
    /// characters. Non-cacheable queries are never looked up or
    /// stored.
    pub fn is_cacheable(q: &str) -> bool {
        let stripped: String = q.chars().filter(|c| *c != '+' && *c != '*').collect();
        let len = stripped.chars().count();
        len > 0 && len < MAX_QUERY_LEN && stripped.chars().all(char::is_alphanumeric)
    }

    /// Looks up a usable entry for the request shape, returning its
    /// stored loads on a hit.
    pub fn lookup(
        &self,
        q: &str,
        lang: &str,
        keys: &[String],
        dev: bool,
        now: Timestamp,
    ) -> Option<Vec<ResultItem>> {
        if !Self::is_cacheable(q) {
            return None;
        }
        let entry = self.entries.get(&CacheKey::new(q, lang))?;
        if entry.keys != keys || entry.dev != dev {
            return None;
        }
        if entry.stored_at.whole_days_until(now) > self.expiry_days {
            return None;
        }
        Some(entry.loads.clone())
    }

    /// Stores a merged answer, overwriting any previous entry for the
    /// same `(q, lang)`. Silently refuses non-cacheable queries.
    pub fn store(
        &self,
        q: &str,
        lang: &str,
        keys: &[String],
        dev: bool,
        now: Timestamp,
        loads: &[ResultItem],
    ) {
        if !Self::is_cacheable(q) {
            return;
        }
        self.entries.insert(
            CacheKey::new(q, lang),
            CacheEntry {
                stored_at: now,
                keys: keys.to_vec(),
                dev,
                loads: loads.to_vec(),
            },
        );
        tracing::debug!(q, lang, items = loads.len(), "result cached");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_EXPIRY_DAYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geofan_core::now_utc;
    use serde_json::json;
    use time::Duration;

    fn loads() -> Vec<ResultItem> {
        vec![ResultItem::new(json!({"key": "g1", "name": "Ottawa"}))]
    }

    fn keys() -> Vec<String> {
        vec!["geonames".to_string(), "nominatim".to_string()]
    }

    #[test]
    fn test_is_cacheable_boundaries() {
        assert!(ResultCache::is_cacheable("abc*+123"));
        assert!(!ResultCache::is_cacheable(""));
        assert!(!ResultCache::is_cacheable("++**"));
        assert!(!ResultCache::is_cacheable(&"a".repeat(30)));
        assert!(ResultCache::is_cacheable(&"a".repeat(29)));
        assert!(!ResultCache::is_cacheable("ab cd"));
        assert!(!ResultCache::is_cacheable("ab-cd"));
    }

    #[test]
    fn test_round_trip_within_window() {
        let cache = ResultCache::new(7);
        let now = now_utc();
        cache.store("ottawa", "en", &keys(), false, now, &loads());

        let hit = cache.lookup("ottawa", "en", &keys(), false, now).unwrap();
        assert_eq!(hit, loads());
    }

    #[test]
    fn test_expiry_threshold() {
        let cache = ResultCache::new(7);
        let stored = now_utc();
        cache.store("ottawa", "en", &keys(), false, stored, &loads());

        // Exactly at the threshold: still valid (strictly-greater expiry).
        let at_limit = Timestamp::new(*stored.inner() + Duration::days(7));
        assert!(cache.lookup("ottawa", "en", &keys(), false, at_limit).is_some());

        let past_limit = Timestamp::new(*stored.inner() + Duration::days(8));
        assert!(cache.lookup("ottawa", "en", &keys(), false, past_limit).is_none());
    }

    #[test]
    fn test_keys_order_sensitivity() {
        let cache = ResultCache::new(7);
        let now = now_utc();
        cache.store("ottawa", "en", &keys(), false, now, &loads());

        let reversed: Vec<String> = keys().into_iter().rev().collect();
        assert!(cache.lookup("ottawa", "en", &reversed, false, now).is_none());
    }

    #[test]
    fn test_dev_flag_mismatch_misses() {
        let cache = ResultCache::new(7);
        let now = now_utc();
        cache.store("ottawa", "en", &keys(), false, now, &loads());

        assert!(cache.lookup("ottawa", "en", &keys(), true, now).is_none());
    }

    #[test]
    fn test_structured_key_has_no_concatenation_collisions() {
        let cache = ResultCache::new(7);
        let now = now_utc();
        // "ab" + "c" and "a" + "bc" concatenate identically.
        cache.store("ab", "c", &keys(), false, now, &loads());
        assert!(cache.lookup("a", "bc", &keys(), false, now).is_none());
    }

    #[test]
    fn test_non_cacheable_query_never_stored() {
        let cache = ResultCache::new(7);
        let now = now_utc();
        cache.store("ab cd", "en", &keys(), false, now, &loads());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_store_overwrites() {
        let cache = ResultCache::new(7);
        let now = now_utc();
        cache.store("ottawa", "en", &keys(), false, now, &loads());
        let newer = vec![ResultItem::new(json!({"key": "g2"}))];
        cache.store("ottawa", "en", &keys(), false, now, &newer);

        let hit = cache.lookup("ottawa", "en", &keys(), false, now).unwrap();
        assert_eq!(hit, newer);
        assert_eq!(cache.len(), 1);
    }
}
