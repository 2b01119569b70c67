use crate::models::AnalysisResult;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub keyword: String,
    pub day: NaiveDate,
}

impl CacheKey {
    pub fn new(keyword: impl Into<String>, day: NaiveDate) -> Self {
        Self {
            keyword: keyword.into(),
            day,
        }
    }
}

#[derive(Clone, Default)]
pub struct ResultCache {
    entries: Arc<Mutex<HashMap<CacheKey, AnalysisResult>>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &CacheKey) -> Option<AnalysisResult> {
        let entries = self.entries.lock().await;
        entries.get(key).cloned()
    }

    /// Stores `value` unless another caller got there first, and returns
    /// whichever value the cache now holds for `key`. Entries from days before
    /// `key.day` are dropped.
    pub async fn put(&self, key: CacheKey, value: AnalysisResult) -> AnalysisResult {
        let mut entries = self.entries.lock().await;
        entries.retain(|existing, _| existing.day >= key.day);
        let stored = entries.entry(key).or_insert(value).clone();
        debug!("cache holds {} entries", entries.len());
        stored
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HourlyCurve;

    fn result(best_hour: u8) -> AnalysisResult {
        AnalysisResult {
            curve: [(best_hour, 1.0)].into_iter().collect::<HourlyCurve>(),
            best_hour,
            confidence: Some(100.0),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, d).unwrap()
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let cache = ResultCache::new();
        let key = CacheKey::new("rust", day(1));
        assert!(cache.get(&key).await.is_none());

        cache.put(key.clone(), result(9)).await;
        assert_eq!(cache.get(&key).await, Some(result(9)));
    }

    #[tokio::test]
    async fn a_new_day_is_a_new_key() {
        let cache = ResultCache::new();
        cache.put(CacheKey::new("rust", day(1)), result(9)).await;
        assert!(cache.get(&CacheKey::new("rust", day(2))).await.is_none());
    }

    #[tokio::test]
    async fn storing_a_new_day_forgets_older_days() {
        let cache = ResultCache::new();
        cache.put(CacheKey::new("rust", day(1)), result(9)).await;
        cache.put(CacheKey::new("go", day(1)), result(10)).await;
        cache.put(CacheKey::new("rust", day(2)), result(11)).await;

        assert_eq!(cache.len().await, 1);
        assert!(cache.get(&CacheKey::new("go", day(1))).await.is_none());
        assert_eq!(cache.get(&CacheKey::new("rust", day(2))).await, Some(result(11)));
    }

    #[tokio::test]
    async fn first_write_wins() {
        let cache = ResultCache::new();
        let key = CacheKey::new("rust", day(1));
        assert_eq!(cache.put(key.clone(), result(9)).await, result(9));
        assert_eq!(cache.put(key.clone(), result(17)).await, result(9));
        assert_eq!(cache.get(&key).await, Some(result(9)));
        assert_eq!(cache.len().await, 1);
    }
}
