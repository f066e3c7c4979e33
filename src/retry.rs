//! Retries for calls to the model hub, the inference API and the TTS service.
//!
//! Each failure is classified by the caller: stop, retry on the exponential
//! schedule, or retry after a wait the server asked for (the inference API
//! reports an `estimated_time` while a model is loading). Server-requested
//! waits are capped at `max_delay`.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retry {
    Stop,
    Backoff,
    After(Duration),
}

impl Retry {
    /// `Backoff` for transient failures, `Stop` otherwise.
    pub fn on(transient: bool) -> Self {
        if transient {
            Retry::Backoff
        } else {
            Retry::Stop
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total tries including the first; zero behaves as one
    pub attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Growth of the delay per retry
    pub factor: u32,
}

impl RetryConfig {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts,
            base_delay,
            max_delay: Duration::from_secs(30),
            factor: 2,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_factor(mut self, factor: u32) -> Self {
        self.factor = factor;
        self
    }

    /// Hub lookups: waits of 500ms then 1s.
    pub fn model_lookup() -> Self {
        Self::new(3, Duration::from_millis(500)).with_max_delay(Duration::from_secs(2))
    }

    /// Inference and speech: waits of 2s, 4s, 8s, longer if a model is loading.
    pub fn inference() -> Self {
        Self::new(4, Duration::from_secs(2)).with_max_delay(Duration::from_secs(20))
    }

    /// Wait before retry number `retry` (1 for the first retry).
    fn backoff(&self, retry: u32) -> Duration {
        let growth = self.factor.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(growth).min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::model_lookup()
    }
}

/// Run `operation` until it succeeds, `classify` says stop, or attempts run out.
///
/// Returns the last error when giving up.
pub async fn with_retry_if<T, E, F, Fut, C>(
    config: &RetryConfig,
    label: &str,
    mut operation: F,
    classify: C,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    C: Fn(&E) -> Retry,
{
    let attempts = config.attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}/{}", label, attempt, attempts);
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        let wait = match classify(&err) {
            Retry::Stop => {
                debug!("{} failed permanently: {}", label, err);
                return Err(err);
            }
            _ if attempt >= attempts => {
                warn!("{} gave up after {} attempts: {}", label, attempts, err);
                return Err(err);
            }
            Retry::Backoff => config.backoff(attempt),
            Retry::After(requested) => requested.min(config.max_delay),
        };

        warn!(
            "{} attempt {}/{} failed ({}), retrying in {:?}",
            label, attempt, attempts, err, wait
        );
        sleep(wait).await;
    }
}
