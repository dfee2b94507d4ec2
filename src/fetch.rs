//! HTTP fetching with exponential backoff retry logic.
//!
//! Spiders never talk to `reqwest` directly; they take anything implementing
//! [`Fetch`], which keeps their request/parse flow testable against fixture
//! bodies.
//!
//! - [`Fetch`]: core trait, "give me the body of this URL"
//! - [`HttpFetcher`]: `reqwest`-backed implementation
//! - [`RetryFetch`]: decorator adding retries to any `Fetch` implementation
//!
//! # Retry Strategy
//!
//! Only transient failures are retried (see [`SpiderError::is_transient`]).
//! The delay between attempts follows:
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..=max_jitter)
//! ```

use crate::config::CrawlerConfig;
use crate::error::SpiderError;
use rand::{Rng, rng};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// Something that can turn a URL into a response body.
pub trait Fetch {
    async fn fetch_text(&self, url: &str) -> Result<String, SpiderError>;
}

/// Plain `reqwest` client. Non-2xx responses become [`SpiderError::Status`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self, SpiderError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(SpiderError::Client)?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_text(&self, url: &str) -> Result<String, SpiderError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| SpiderError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpiderError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().await.map_err(|source| SpiderError::Http {
            url: url.to_string(),
            source,
        })?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched body"
        );
        Ok(body)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`Fetch`] implementation.
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
    max_jitter_ms: u64,
}

impl<T> RetryFetch<T>
where
    T: Fetch,
{
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
            max_jitter_ms: 250,
        }
    }

    /// Cap on the random delay added to each backoff.
    pub fn with_max_jitter(mut self, jitter: Duration) -> Self {
        self.max_jitter_ms = jitter.as_millis() as u64;
        self
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let shift = (attempt - 1).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=self.max_jitter_ms);
        delay + Duration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> Fetch for RetryFetch<T>
where
    T: Fetch,
{
    #[instrument(level = "debug", skip(self))]
    async fn fetch_text(&self, url: &str) -> Result<String, SpiderError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch_text(url).await {
                Ok(body) => return Ok(body),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    let elapsed_ms_total = total_t0.elapsed().as_millis() as u64;

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total,
                            error = %e,
                            "fetch exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total,
                        ?delay,
                        error = %e,
                        "fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Build the fetcher the spiders run against.
///
/// # Arguments
///
/// * `config` - User agent, timeout and retry settings
///
/// # Returns
///
/// An [`HttpFetcher`] wrapped in [`RetryFetch`], retrying up to
/// `config.max_retries` times.
///
/// # Errors
///
/// Returns [`SpiderError::Client`] if the HTTP client cannot be built.
pub fn build_fetcher(config: &CrawlerConfig) -> Result<RetryFetch<HttpFetcher>, SpiderError> {
    let http = HttpFetcher::new(config)?;
    Ok(RetryFetch::new(
        http,
        config.max_retries,
        Duration::from_millis(config.retry_base_delay_ms),
    )
    .with_max_jitter(Duration::from_millis(config.retry_max_jitter_ms)))
}
