use crate::errors::ConfigError;
use crate::fetcher::retry::RetryPolicy;
use chrono::FixedOffset;
use std::{env, ops::Range, time::Duration};

pub const DEFAULT_TRENDS_URL: &str = "https://serpapi.com/search.json";
pub const DEFAULT_YOUTUBE_URL: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Trends,
    YouTube,
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub api_key: String,
    pub base_url: String,
    pub request_timeout: Duration,
    pub precall_delay_ms: Range<u64>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub offset: FixedOffset,
    pub source: SourceConfig,
    pub retry: RetryPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_or(&lookup, "PORT", 8080u16)?;

        let minutes: i32 = parse_or(&lookup, "TREND_TZ_OFFSET_MINUTES", 0)?;
        let offset = FixedOffset::east_opt(minutes * 60).ok_or_else(|| ConfigError::Invalid {
            name: "TREND_TZ_OFFSET_MINUTES",
            value: minutes.to_string(),
        })?;

        let kind = match lookup("TREND_SOURCE").as_deref().map(str::trim) {
            None | Some("") | Some("trends") => SourceKind::Trends,
            Some("youtube") => SourceKind::YouTube,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "TREND_SOURCE",
                    value: other.to_string(),
                });
            }
        };

        let (key_var, url_var, default_url, label) = match kind {
            SourceKind::Trends => ("TRENDS_API_KEY", "TRENDS_BASE_URL", DEFAULT_TRENDS_URL, "trends"),
            SourceKind::YouTube => ("YOUTUBE_API_KEY", "YOUTUBE_BASE_URL", DEFAULT_YOUTUBE_URL, "youtube"),
        };
        let api_key = lookup(key_var)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingCredential(key_var, label))?;
        let base_url = lookup(url_var)
            .map(|value| value.trim_end_matches('/').to_string())
            .unwrap_or_else(|| default_url.to_string());

        let request_timeout = Duration::from_millis(parse_or(&lookup, "FETCH_TIMEOUT_MS", 10_000u64)?);
        let precall_delay_ms = parse_range(&lookup, "FETCH_PRECALL_DELAY_MS", 1_000..4_000)?;

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_retries: parse_or(&lookup, "FETCH_MAX_RETRIES", defaults.max_retries)?,
            base_delay: Duration::from_millis(parse_or(
                &lookup,
                "FETCH_BASE_DELAY_MS",
                defaults.base_delay.as_millis() as u64,
            )?),
            max_elapsed: Duration::from_millis(parse_or(
                &lookup,
                "FETCH_MAX_ELAPSED_MS",
                defaults.max_elapsed.as_millis() as u64,
            )?),
            ..defaults
        };

        Ok(Self {
            port,
            offset,
            source: SourceConfig {
                kind,
                api_key,
                base_url,
                request_timeout,
                precall_delay_ms,
            },
            retry,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { name, value }),
    }
}

/// Parses `min-max` (or a single number for a fixed delay).
fn parse_range<F>(lookup: &F, name: &'static str, default: Range<u64>) -> Result<Range<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(name) else {
        return Ok(default);
    };
    let invalid = || ConfigError::Invalid {
        name,
        value: value.clone(),
    };

    let (min, max) = match value.trim().split_once('-') {
        Some((min, max)) => (min.trim().parse::<u64>(), max.trim().parse::<u64>()),
        None => (value.trim().parse::<u64>(), value.trim().parse::<u64>()),
    };
    let (min, max) = (min.map_err(|_| invalid())?, max.map_err(|_| invalid())?);
    if min > max {
        return Err(invalid());
    }
    Ok(min..max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_to_trends_source() {
        let config = Config::from_lookup(lookup(&[("TRENDS_API_KEY", "secret")])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.source.kind, SourceKind::Trends);
        assert_eq!(config.source.base_url, DEFAULT_TRENDS_URL);
        assert_eq!(config.source.precall_delay_ms, 1_000..4_000);
        assert_eq!(config.offset.local_minus_utc(), 0);
        assert_eq!(config.retry.max_retries, 4);
    }

    #[test]
    fn missing_credential_fails_fast() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::MissingCredential("TRENDS_API_KEY", "trends"));

        let err = Config::from_lookup(lookup(&[
            ("TREND_SOURCE", "youtube"),
            ("YOUTUBE_API_KEY", "   "),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::MissingCredential("YOUTUBE_API_KEY", "youtube"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("TREND_SOURCE", "youtube"),
            ("YOUTUBE_API_KEY", "k"),
            ("YOUTUBE_BASE_URL", "http://127.0.0.1:9000/"),
            ("PORT", "9100"),
            ("TREND_TZ_OFFSET_MINUTES", "-300"),
            ("FETCH_PRECALL_DELAY_MS", "0"),
            ("FETCH_MAX_RETRIES", "3"),
            ("FETCH_BASE_DELAY_MS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.source.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.offset.local_minus_utc(), -300 * 60);
        assert_eq!(config.source.precall_delay_ms, 0..0);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.base_delay, Duration::from_millis(5));
    }

    #[test]
    fn rejects_bad_values() {
        let err = Config::from_lookup(lookup(&[
            ("TRENDS_API_KEY", "k"),
            ("FETCH_PRECALL_DELAY_MS", "4000-1000"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "FETCH_PRECALL_DELAY_MS", .. }));

        let err = Config::from_lookup(lookup(&[("TRENDS_API_KEY", "k"), ("TREND_SOURCE", "rss")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "TREND_SOURCE", .. }));
    }
}
