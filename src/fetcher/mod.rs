pub mod client;
pub mod retry;
pub mod trends;
pub mod youtube;

use crate::config::{Config, SourceKind};
use crate::errors::{AnalysisError, FetchError};
use crate::models::Sample;
use async_trait::async_trait;
use client::ApiClient;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Keyword(String);

impl Keyword {
    pub fn parse(raw: &str) -> Result<Self, AnalysisError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AnalysisError::BlankKeyword);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An upstream that reports recent activity for a keyword.
///
/// Implementations retry transient failures themselves; an empty vector means
/// the call worked but there was nothing to report.
#[async_trait]
pub trait TrendSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, keyword: &Keyword) -> Result<Vec<Sample>, FetchError>;
}

pub fn build_source(config: &Config) -> Result<Arc<dyn TrendSource>, reqwest::Error> {
    let api = ApiClient::new(&config.source, config.retry.clone())?;
    let source: Arc<dyn TrendSource> = match config.source.kind {
        SourceKind::Trends => Arc::new(trends::TrendsSource::new(api, &config.source, config.offset)),
        SourceKind::YouTube => Arc::new(youtube::YouTubeSource::new(
            api.with_classifier(youtube::classify),
            &config.source,
        )),
    };
    Ok(source)
}

pub(crate) fn retain_valid(samples: &mut Vec<Sample>) {
    let before = samples.len();
    samples.retain(|sample| sample.value.is_finite() && sample.value >= 0.0);
    if samples.len() != before {
        debug!("dropped {} invalid samples", before - samples.len());
    }
}
