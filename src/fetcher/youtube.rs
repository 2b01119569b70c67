//! Upload activity of the channels that match a keyword.
//!
//! The channels found for the keyword are scanned for their latest uploads and
//! the publish instants are turned into an hourly activity series: one sample
//! per clock hour between the oldest and newest upload, valued by the number
//! of uploads published in that hour.

use super::client::ApiClient;
use super::{Keyword, TrendSource};
use crate::config::SourceConfig;
use crate::errors::{FetchError, FetchErrorKind};
use crate::models::Sample;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use tokio::time::Instant;
use tracing::{debug, info};

pub const MAX_CHANNELS: u32 = 5;
pub const MAX_UPLOADS_PER_CHANNEL: u32 = 50;
/// Uploads older than this before the newest one are ignored.
pub const LOOKBACK_DAYS: i64 = 365;

const SECONDS_PER_HOUR: i64 = 3600;

pub struct YouTubeSource {
    api: ApiClient,
    base_url: String,
    api_key: String,
}

impl YouTubeSource {
    pub fn new(api: ApiClient, source: &SourceConfig) -> Self {
        Self {
            api,
            base_url: source.base_url.clone(),
            api_key: source.api_key.clone(),
        }
    }

    async fn search_channels(
        &self,
        keyword: &Keyword,
        deadline: Instant,
    ) -> Result<Vec<String>, FetchError> {
        let query = [
            ("part", "snippet".to_string()),
            ("q", keyword.as_str().to_string()),
            ("type", "channel".to_string()),
            ("maxResults", MAX_CHANNELS.to_string()),
            ("key", self.api_key.clone()),
        ];
        let url = format!("{}/search", self.base_url);
        let page: SearchPage = self.api.get_json("youtube channels", &url, &query, deadline).await?;

        Ok(page
            .items
            .into_iter()
            .filter_map(|item| item.id.channel_id)
            .collect())
    }

    async fn recent_uploads(
        &self,
        channel_id: &str,
        deadline: Instant,
    ) -> Result<Vec<DateTime<Utc>>, FetchError> {
        let query = [
            ("part", "snippet".to_string()),
            ("channelId", channel_id.to_string()),
            ("maxResults", MAX_UPLOADS_PER_CHANNEL.to_string()),
            ("order", "date".to_string()),
            ("key", self.api_key.clone()),
        ];
        let url = format!("{}/search", self.base_url);
        let page: SearchPage = self.api.get_json("youtube uploads", &url, &query, deadline).await?;

        Ok(page
            .items
            .into_iter()
            .filter(|item| item.id.kind == "youtube#video")
            .filter_map(|item| item.snippet?.published_at)
            .collect())
    }
}

#[async_trait]
impl TrendSource for YouTubeSource {
    fn name(&self) -> &'static str {
        "youtube"
    }

    async fn fetch(&self, keyword: &Keyword) -> Result<Vec<Sample>, FetchError> {
        // one budget for the search and every channel listing
        let deadline = self.api.deadline();
        let channels = self.search_channels(keyword, deadline).await?;
        debug!("'{keyword}' matched {} channels", channels.len());

        let mut published = Vec::new();
        for channel in &channels {
            published.extend(self.recent_uploads(channel, deadline).await?);
        }

        info!(
            "'{keyword}': {} uploads across {} channels",
            published.len(),
            channels.len()
        );
        Ok(activity_series(&published))
    }
}

/// Hourly upload counts from the oldest to the newest upload, zeros included.
pub fn activity_series(published: &[DateTime<Utc>]) -> Vec<Sample> {
    let Some(newest) = published.iter().max() else {
        return Vec::new();
    };
    let newest_slot = newest.timestamp().div_euclid(SECONDS_PER_HOUR);
    let cutoff = newest_slot - LOOKBACK_DAYS * 24;

    let mut counts: BTreeMap<i64, u32> = BTreeMap::new();
    for instant in published {
        let slot = instant.timestamp().div_euclid(SECONDS_PER_HOUR);
        if slot >= cutoff {
            *counts.entry(slot).or_default() += 1;
        }
    }

    let Some(&oldest_slot) = counts.keys().next() else {
        return Vec::new();
    };
    (oldest_slot..=newest_slot)
        .filter_map(|slot| {
            let start = DateTime::from_timestamp(slot * SECONDS_PER_HOUR, 0)?;
            let uploads = counts.get(&slot).copied().unwrap_or(0);
            Some(Sample::new(start, f64::from(uploads)))
        })
        .collect()
}

pub fn classify(status: StatusCode, body: &str) -> FetchError {
    let reasons: Vec<String> = serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| parsed.error.errors.into_iter().map(|e| e.reason).collect())
        .unwrap_or_default();
    let detail = format!("HTTP {status}: reasons {reasons:?}");

    let has = |wanted: &[&str]| reasons.iter().any(|reason| wanted.contains(&reason.as_str()));
    if has(&["rateLimitExceeded", "userRateLimitExceeded"]) {
        FetchError::rate_limited(detail)
    } else if has(&["quotaExceeded", "dailyLimitExceeded"]) {
        // daily quota does not come back within one call
        FetchError::new(FetchErrorKind::RateLimited, false, detail)
    } else if has(&["keyInvalid", "keyExpired", "accessNotConfigured", "forbidden"]) {
        FetchError::auth(detail)
    } else {
        FetchError::from_status(status, body)
    }
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: ResourceId,
    #[serde(default)]
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    #[serde(default)]
    kind: String,
    #[serde(default)]
    channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    errors: Vec<ErrorReason>,
}

#[derive(Debug, Deserialize)]
struct ErrorReason {
    #[serde(default)]
    reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SourceConfig, SourceKind};
    use crate::fetcher::retry::RetryPolicy;
    use axum::{
        Json, Router,
        extract::{Query, State},
        http::StatusCode as HttpStatus,
        response::{IntoResponse, Response},
        routing::get,
    };
    use chrono::TimeZone;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Clone, Copy)]
    enum Uploads {
        Listed,
        QuotaExceeded,
        Unavailable,
    }

    #[derive(Clone)]
    struct FakeApi {
        channels: usize,
        uploads: Uploads,
        upload_calls: Arc<AtomicUsize>,
    }

    async fn fake_search(
        State(fake): State<FakeApi>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Response {
        if params.get("type").map(String::as_str) == Some("channel") {
            let items: Vec<_> = (1..=fake.channels)
                .map(|n| json!({"id": {"kind": "youtube#channel", "channelId": format!("UC{n}")}}))
                .collect();
            return Json(json!({ "items": items })).into_response();
        }

        fake.upload_calls.fetch_add(1, Ordering::SeqCst);
        let channel = params.get("channelId").cloned().unwrap_or_default();
        match fake.uploads {
            Uploads::Unavailable => (HttpStatus::SERVICE_UNAVAILABLE, "backend error").into_response(),
            Uploads::QuotaExceeded => (
                HttpStatus::FORBIDDEN,
                Json(json!({"error": {"code": 403, "errors": [{"reason": "quotaExceeded"}]}})),
            )
                .into_response(),
            Uploads::Listed if channel == "UC1" => Json(json!({"items": [
                {"id": {"kind": "youtube#video", "videoId": "a"},
                 "snippet": {"publishedAt": "2026-02-01T09:05:00Z"}},
                {"id": {"kind": "youtube#playlist", "playlistId": "p"},
                 "snippet": {"publishedAt": "2026-02-01T10:00:00Z"}},
                {"id": {"kind": "youtube#video", "videoId": "b"},
                 "snippet": {"publishedAt": "2026-02-01T09:40:00Z"}}
            ]}))
            .into_response(),
            Uploads::Listed => Json(json!({"items": [
                {"id": {"kind": "youtube#video", "videoId": "c"},
                 "snippet": {"publishedAt": "2026-02-01T11:00:00Z"}}
            ]}))
            .into_response(),
        }
    }

    async fn serve(fake: FakeApi) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let app = Router::new().route("/search", get(fake_search)).with_state(fake);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://127.0.0.1:{port}")
    }

    async fn source_for(fake: FakeApi, retry: RetryPolicy) -> YouTubeSource {
        let config = SourceConfig {
            kind: SourceKind::YouTube,
            api_key: "k".into(),
            base_url: serve(fake).await,
            request_timeout: Duration::from_secs(2),
            precall_delay_ms: 0..0,
        };
        let api = ApiClient::new(&config, retry).unwrap().with_classifier(classify);
        YouTubeSource::new(api, &config)
    }

    fn fake(channels: usize, uploads: Uploads) -> FakeApi {
        FakeApi {
            channels,
            uploads,
            upload_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[tokio::test]
    async fn fetch_turns_channel_uploads_into_hourly_activity() {
        let api = fake(2, Uploads::Listed);
        let source = source_for(api.clone(), RetryPolicy::immediate(2)).await;

        let samples = source.fetch(&Keyword::parse("cats").unwrap()).await.unwrap();

        // the playlist published at 10:00 is not an upload
        let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![2.0, 0.0, 1.0]);
        assert_eq!(samples[0].timestamp, at(1, 9, 0));
        assert_eq!(api.upload_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn quota_exceeded_is_not_retried() {
        let api = fake(1, Uploads::QuotaExceeded);
        let source = source_for(api.clone(), RetryPolicy::immediate(4)).await;

        let err = source.fetch(&Keyword::parse("cats").unwrap()).await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::RateLimited);
        assert!(!err.retryable);
        assert_eq!(api.upload_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn one_budget_covers_every_channel() {
        let api = fake(5, Uploads::Unavailable);
        let retry = RetryPolicy {
            max_retries: 4,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(100),
            jitter: false,
            max_elapsed: Duration::from_millis(300),
            ..RetryPolicy::default()
        };
        let source = source_for(api.clone(), retry).await;

        let started = std::time::Instant::now();
        let err = source.fetch(&Keyword::parse("cats").unwrap()).await.unwrap_err();

        assert!(err.kind == FetchErrorKind::Unknown || err.kind == FetchErrorKind::NetworkTimeout);
        assert!(started.elapsed() < Duration::from_millis(600), "took {:?}", started.elapsed());
        // only the first channel was tried before the budget ran out
        assert!(api.upload_calls.load(Ordering::SeqCst) <= 3);
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn uploads_fill_an_hourly_series() {
        let published = vec![at(1, 9, 5), at(1, 9, 40), at(1, 11, 0)];
        let samples = activity_series(&published);

        let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![2.0, 0.0, 1.0]);
        assert_eq!(samples[0].timestamp, at(1, 9, 0));
        assert_eq!(samples[2].timestamp, at(1, 11, 0));
    }

    #[test]
    fn no_uploads_no_samples() {
        assert!(activity_series(&[]).is_empty());
    }

    #[test]
    fn very_old_uploads_are_ignored() {
        let ancient = Utc.with_ymd_and_hms(2019, 5, 1, 8, 0, 0).unwrap();
        let samples = activity_series(&[ancient, at(3, 14, 0)]);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 1.0);
    }

    #[test]
    fn quota_errors_are_classified_from_reasons() {
        let body = r#"{"error": {"code": 403, "message": "quota",
            "errors": [{"reason": "quotaExceeded", "domain": "youtube.quota"}]}}"#;
        let err = classify(StatusCode::FORBIDDEN, body);
        assert_eq!(err.kind, FetchErrorKind::RateLimited);
        assert!(!err.retryable);

        let body = r#"{"error": {"errors": [{"reason": "userRateLimitExceeded"}]}}"#;
        let err = classify(StatusCode::FORBIDDEN, body);
        assert_eq!(err.kind, FetchErrorKind::RateLimited);
        assert!(err.retryable);

        let body = r#"{"error": {"errors": [{"reason": "keyInvalid"}]}}"#;
        assert_eq!(classify(StatusCode::BAD_REQUEST, body).kind, FetchErrorKind::AuthFailure);

        let err = classify(StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(err.kind, FetchErrorKind::Unknown);
        assert!(err.retryable);
    }
}
