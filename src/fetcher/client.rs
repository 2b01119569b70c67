use crate::config::SourceConfig;
use crate::errors::{FetchError, FetchErrorKind};
use crate::fetcher::retry::{RetryPolicy, retry_with_backoff};
use rand::Rng;
use reqwest::{Client, StatusCode, header};
use serde::de::DeserializeOwned;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148",
];

pub type Classifier = fn(StatusCode, &str) -> FetchError;

pub struct ApiClient {
    client: Client,
    retry: RetryPolicy,
    precall_delay_ms: Range<u64>,
    next_agent: AtomicUsize,
    classify: Classifier,
}

impl ApiClient {
    pub fn new(source: &SourceConfig, retry: RetryPolicy) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(source.request_timeout).build()?;
        Ok(Self {
            client,
            retry,
            precall_delay_ms: source.precall_delay_ms.clone(),
            next_agent: AtomicUsize::new(0),
            classify: FetchError::from_status,
        })
    }

    pub fn with_classifier(mut self, classify: Classifier) -> Self {
        self.classify = classify;
        self
    }

    pub fn deadline(&self) -> Instant {
        self.retry.deadline()
    }

    /// GETs `url` and decodes the JSON body, retrying transient failures
    /// until `deadline`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        label: &str,
        url: &str,
        query: &[(&str, String)],
        deadline: Instant,
    ) -> Result<T, FetchError> {
        retry_with_backoff(&self.retry, label, deadline, |_| self.get_once(url, query)).await
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let pause = self.precall_delay();
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }

        let agent = self.next_user_agent();
        debug!("GET {url} after {pause:?}");
        let response = self
            .client
            .get(url)
            .query(query)
            .header(header::USER_AGENT, agent)
            .send()
            .await
            .map_err(FetchError::from_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(FetchError::from_transport)?;
        if !status.is_success() {
            return Err((self.classify)(status, &body));
        }

        serde_json::from_str(&body).map_err(|err| {
            FetchError::new(FetchErrorKind::Unknown, false, format!("malformed response body: {err}"))
        })
    }

    fn precall_delay(&self) -> Duration {
        let Range { start, end } = self.precall_delay_ms;
        let millis = if start < end {
            rand::thread_rng().gen_range(start..end)
        } else {
            start
        };
        Duration::from_millis(millis)
    }

    fn next_user_agent(&self) -> &'static str {
        let index = self.next_agent.fetch_add(1, Ordering::Relaxed);
        USER_AGENTS[index % USER_AGENTS.len()]
    }
}
