//! Search-interest timeline for a keyword, restricted to video searches.

use super::client::ApiClient;
use super::{Keyword, TrendSource, retain_valid};
use crate::config::SourceConfig;
use crate::errors::FetchError;
use crate::models::Sample;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;
use tracing::{info, warn};

/// Fixed recency window: the last 24 hours at hourly-or-finer cadence.
pub const WINDOW: &str = "now 1-d";
pub const PROPERTY: &str = "youtube";
pub const ALL_CATEGORIES: &str = "0";

pub struct TrendsSource {
    api: ApiClient,
    base_url: String,
    api_key: String,
    offset: FixedOffset,
}

impl TrendsSource {
    pub fn new(api: ApiClient, source: &SourceConfig, offset: FixedOffset) -> Self {
        Self {
            api,
            base_url: source.base_url.clone(),
            api_key: source.api_key.clone(),
            offset,
        }
    }

    fn query(&self, keyword: &Keyword) -> Vec<(&'static str, String)> {
        // the upstream counts minutes west of UTC
        let tz = -self.offset.local_minus_utc() / 60;
        vec![
            ("engine", "google_trends".to_string()),
            ("q", keyword.as_str().to_string()),
            ("data_type", "TIMESERIES".to_string()),
            ("date", WINDOW.to_string()),
            ("gprop", PROPERTY.to_string()),
            ("cat", ALL_CATEGORIES.to_string()),
            ("tz", tz.to_string()),
            ("hl", "en".to_string()),
            ("api_key", self.api_key.clone()),
        ]
    }
}

#[async_trait]
impl TrendSource for TrendsSource {
    fn name(&self) -> &'static str {
        "trends"
    }

    async fn fetch(&self, keyword: &Keyword) -> Result<Vec<Sample>, FetchError> {
        let response: TrendsResponse = self
            .api
            .get_json("trends", &self.base_url, &self.query(keyword), self.api.deadline())
            .await?;

        if response.interest_over_time.is_none() {
            let reason = response.error.as_deref().unwrap_or("no timeline in response");
            warn!("trend timeline for '{keyword}' unavailable: {reason}");
            return Ok(Vec::new());
        }

        let mut samples = response.into_samples();
        retain_valid(&mut samples);
        info!("trend timeline for '{keyword}' has {} samples", samples.len());
        Ok(samples)
    }
}

#[derive(Debug, Deserialize)]
struct TrendsResponse {
    #[serde(default)]
    interest_over_time: Option<InterestOverTime>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InterestOverTime {
    #[serde(default)]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimelinePoint {
    timestamp: String,
    #[serde(default)]
    values: Vec<TimelineValue>,
}

#[derive(Debug, Deserialize)]
struct TimelineValue {
    #[serde(default)]
    extracted_value: Option<f64>,
    #[serde(default)]
    value: Option<String>,
}

impl TrendsResponse {
    fn into_samples(self) -> Vec<Sample> {
        let Some(interest) = self.interest_over_time else {
            return Vec::new();
        };

        interest
            .timeline_data
            .into_iter()
            .filter_map(|point| {
                let seconds = point.timestamp.trim().parse::<i64>().ok()?;
                let timestamp: DateTime<Utc> = DateTime::from_timestamp(seconds, 0)?;
                let first = point.values.first()?;
                let value = first
                    .extracted_value
                    .or_else(|| first.value.as_deref()?.trim().parse().ok())?;
                Some(Sample::new(timestamp, value))
            })
            .collect()
    }
}
