use crate::domain::model::GeocodeMatch;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;

/// 固定容量的地理編碼快取，滿了就淘汰最久未使用的項目。
///
/// 「查無結果」也會被快取；錯誤不會。容量為 0 時停用。
pub struct GeocodeCache {
    inner: Option<Cache<String, Option<GeocodeMatch>>>,
}

/// 去頭尾空白、轉小寫、合併連續空白
pub fn normalize_key(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl GeocodeCache {
    pub fn new(capacity: usize) -> Self {
        let inner = (capacity > 0).then(|| {
            Cache::builder()
                .max_capacity(capacity as u64)
                .eviction_policy(EvictionPolicy::lru())
                .eviction_listener(|key, _value, cause| {
                    tracing::debug!("Geocode cache entry removed: {} ({:?})", key, cause);
                })
                .build()
        });
        Self { inner }
    }

    pub fn get(&self, key: &str) -> Option<Option<GeocodeMatch>> {
        self.inner.as_ref()?.get(key)
    }

    pub fn insert(&self, key: String, value: Option<GeocodeMatch>) {
        if let Some(cache) = &self.inner {
            cache.insert(key, value);
        }
    }

    /// 先處理待執行的淘汰再計數
    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |cache| {
            cache.run_pending_tasks();
            cache.entry_count() as usize
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Coordinates;

    fn sample(address: &str) -> Option<GeocodeMatch> {
        Some(GeocodeMatch {
            address: address.to_string(),
            coordinates: Coordinates { lat: 1.0, lon: 2.0 },
        })
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  Paris   France "), "paris france");
        assert_eq!(normalize_key("PARIS\tfrance"), "paris france");
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = GeocodeCache::new(2);
        cache.insert("a".to_string(), sample("A"));
        cache.insert("b".to_string(), sample("B"));
        assert_eq!(cache.len(), 2);

        // 讀取 a 之後，b 變成最久未使用
        assert!(cache.get("a").is_some());
        assert_eq!(cache.len(), 2);
        cache.insert("c".to_string(), sample("C"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_caches_not_found() {
        let cache = GeocodeCache::new(4);
        cache.insert("nowhere".to_string(), None);
        assert_eq!(cache.get("nowhere"), Some(None));
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let cache = GeocodeCache::new(0);
        cache.insert("a".to_string(), sample("A"));
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_reinsert_does_not_grow() {
        let cache = GeocodeCache::new(2);
        cache.insert("a".to_string(), sample("A"));
        cache.insert("a".to_string(), sample("A2"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a").unwrap().unwrap().address, "A2");
    }
}
