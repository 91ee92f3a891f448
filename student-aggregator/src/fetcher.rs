use crate::types::{AggregatorError, FetchConfig, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::debug;

/// Raw response of one remote call. Status codes are data here; the executor
/// decides what a 429 or a 500 means.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self { status: 200, body: body.into() }
    }

    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

/// Transport used by the source adapters. `Fetcher` talks HTTP; tests script it.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse>;
}

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| AggregatorError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for Fetcher {
    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse> {
        let start_time = Instant::now();

        let response = self.client.get(url).query(query).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(
            "GET {} -> {} ({} bytes, {}ms)",
            url,
            status,
            body.len(),
            start_time.elapsed().as_millis()
        );

        Ok(HttpResponse { status, body })
    }
}
