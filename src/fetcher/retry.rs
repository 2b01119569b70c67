use crate::errors::{FetchError, FetchErrorKind};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter: bool,
    /// Budget for one whole fetch, every request and sleep included.
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 4,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
            backoff_multiplier: 2.0,
            jitter: true,
            max_elapsed: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: false,
            ..Self::default()
        }
    }

    /// Deadline for a fetch starting now.
    pub fn deadline(&self) -> Instant {
        Instant::now() + self.max_elapsed
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1) as i32;
        let millis = self.base_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64);

        if self.jitter && capped > 0.0 {
            let factor = rand::thread_rng().gen_range(0.8..1.2);
            Duration::from_millis((capped * factor) as u64)
        } else {
            Duration::from_millis(capped as u64)
        }
    }
}

/// Runs `op` until it succeeds, fails permanently, runs out of retries or
/// reaches `deadline`.
///
/// Attempts run one after another and an attempt still in flight at the
/// deadline is abandoned. Several calls may share one deadline.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    deadline: Instant,
    mut op: F,
) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        debug!("{label}: attempt {attempt}");

        let err = match timeout_at(deadline, op(attempt)).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => err,
            Err(_) => {
                warn!("{label}: deadline reached during attempt {attempt}");
                return Err(FetchError::new(
                    FetchErrorKind::NetworkTimeout,
                    false,
                    format!("fetch budget of {:?} spent during attempt {attempt}", policy.max_elapsed),
                ));
            }
        };

        if !err.retryable {
            warn!("{label}: permanent failure on attempt {attempt}: {err}");
            return Err(err);
        }
        if attempt > policy.max_retries {
            warn!("{label}: giving up after {attempt} attempts: {err}");
            return Err(err);
        }

        let delay = policy.delay_for(attempt);
        if Instant::now() + delay >= deadline {
            warn!(
                "{label}: fetch budget of {:?} exhausted after {attempt} attempts: {err}",
                policy.max_elapsed
            );
            return Err(err);
        }

        warn!("{label}: attempt {attempt} failed ({}), retrying in {delay:?}", err.kind);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
