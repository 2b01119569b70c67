use crate::cache::{CacheKey, ResultCache};
use crate::errors::AnalysisError;
use crate::fetcher::{Keyword, TrendSource};
use crate::models::Analysis;
use crate::stats::analyze_samples;
use chrono::{FixedOffset, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info};

pub struct Aggregator {
    source: Arc<dyn TrendSource>,
    cache: ResultCache,
    offset: FixedOffset,
}

impl Aggregator {
    pub fn new(source: Arc<dyn TrendSource>, cache: ResultCache, offset: FixedOffset) -> Self {
        Self {
            source,
            cache,
            offset,
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }

    pub async fn compute(&self, raw_keyword: &str) -> Result<Analysis, AnalysisError> {
        self.compute_on(raw_keyword, self.today()).await
    }

    /// Same as [`Aggregator::compute`] with the cache day supplied by the caller.
    pub async fn compute_on(
        &self,
        raw_keyword: &str,
        today: NaiveDate,
    ) -> Result<Analysis, AnalysisError> {
        let keyword = Keyword::parse(raw_keyword)?;
        let key = CacheKey::new(keyword.normalized(), today);

        if let Some(cached) = self.cache.get(&key).await {
            debug!("cache hit for '{keyword}' on {today}");
            return Ok(Analysis::Ready(cached));
        }

        // the cache lock is not held while the source is called
        debug!("cache miss for '{keyword}' on {today}, asking {}", self.source.name());
        let samples = self.source.fetch(&keyword).await?;

        let Some(result) = analyze_samples(&samples, self.offset) else {
            info!("no activity found for '{keyword}'");
            return Ok(Analysis::NoData);
        };

        info!(
            "best hour for '{keyword}' is {:02}:00 (confidence {:?}, {} hours)",
            result.best_hour,
            result.confidence,
            result.curve.len()
        );
        let stored = self.cache.put(key, result).await;
        Ok(Analysis::Ready(stored))
    }
}
