use crate::fetcher::HttpResponse;
use crate::pacing::Pacer;
use crate::types::{AggregatorError, FetchConfig, Result};
use backoff::{backoff::Backoff, ExponentialBackoff};
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Issues a remote call with bounded retry on rate-limit responses.
///
/// A 429 response waits `base_delay * 2^attempt` and retries, for at most
/// `max_retries` attempts in total. Any other failure is returned at once.
/// The schedule carries no jitter, so the waits are exactly `1s, 2s, 4s, ...`
/// for a one second base delay.
pub struct RequestExecutor {
    max_retries: u32,
    base_delay: Duration,
    pacer: Arc<dyn Pacer>,
    attempts_issued: AtomicU32,
}

impl RequestExecutor {
    pub fn new(config: &FetchConfig, pacer: Arc<dyn Pacer>) -> Self {
        Self::with_policy(config.max_retries, config.base_delay(), pacer)
    }

    pub fn with_policy(max_retries: u32, base_delay: Duration, pacer: Arc<dyn Pacer>) -> Self {
        Self {
            max_retries: max_retries.max(1),
            base_delay,
            pacer,
            attempts_issued: AtomicU32::new(0),
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Every attempt counts, retries included.
    pub fn requests_issued(&self) -> u32 {
        self.attempts_issued.load(Ordering::Relaxed)
    }

    pub fn pacer(&self) -> Arc<dyn Pacer> {
        self.pacer.clone()
    }

    fn schedule(&self) -> ExponentialBackoff {
        let ceiling = self
            .base_delay
            .saturating_mul(1u32 << self.max_retries.min(16));

        ExponentialBackoff {
            current_interval: self.base_delay,
            initial_interval: self.base_delay,
            randomization_factor: 0.0,
            multiplier: 2.0,
            max_interval: ceiling,
            max_elapsed_time: None,
            ..Default::default()
        }
    }

    pub async fn execute<F, Fut>(&self, mut call: F) -> Result<HttpResponse>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<HttpResponse>> + Send,
    {
        let mut schedule = self.schedule();

        for attempt in 1..=self.max_retries {
            self.attempts_issued.fetch_add(1, Ordering::Relaxed);
            let started = Instant::now();

            let response = call().await.map_err(|e| match e {
                AggregatorError::Network(_) => e,
                other => AggregatorError::Network(other.to_string()),
            })?;

            debug!(
                "Attempt {}/{} finished with HTTP {} in {}ms",
                attempt,
                self.max_retries,
                response.status,
                started.elapsed().as_millis()
            );

            if response.is_rate_limited() {
                if attempt == self.max_retries {
                    break;
                }
                // Whole milliseconds keep the schedule exact.
                let delay = schedule
                    .next_backoff()
                    .map(|d| Duration::from_millis(d.as_millis() as u64))
                    .unwrap_or(self.base_delay);
                warn!(
                    "Rate limited. Waiting {:?} before retry {}/{}",
                    delay,
                    attempt + 1,
                    self.max_retries
                );
                self.pacer.pause(delay).await;
                continue;
            }

            if !response.is_success() {
                return Err(AggregatorError::Network(format!("HTTP {}", response.status)));
            }

            return Ok(response);
        }

        warn!("Max retries ({}) exceeded for rate limited request", self.max_retries);
        Err(AggregatorError::RateLimitExceeded { attempts: self.max_retries })
    }
}
