//! HTTP client for the search backend
//!
//! Thin wrapper over `reqwest`: scroll search, scroll continuation and
//! `_bulk` submission, with optional basic auth and a bounded retry with
//! exponential backoff for transient statuses (429/502/503/504). Errors
//! escaping this module represent retry exhaustion or non-retryable
//! conditions and are treated as fatal by the pipeline.

use crate::backend::SearchBackend;
use crate::types::{BulkResponse, ScrollPage, SearchResponse};
use async_trait::async_trait;
use proxicalc_core::{ElasticConfig, IndexerError, IndexerResult};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Retry policy for transient backend statuses.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    pub max_retries: usize,
    /// Initial delay between retries in milliseconds
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,
    /// Backoff multiplier (exponential backoff)
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 30000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

const RETRY_STATUSES: [u16; 4] = [429, 502, 503, 504];

/// Client for an Elasticsearch-compatible backend.
pub struct ElasticClient {
    client: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    retry: RetryConfig,
}

impl ElasticClient {
    /// Create a new client from connection settings.
    pub fn new(config: &ElasticConfig) -> IndexerResult<Self> {
        let base_url = config.base_url();
        Url::parse(&base_url)
            .map_err(|e| IndexerError::Config(format!("Invalid backend URL {}: {}", base_url, e)))?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| IndexerError::Backend(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            retry: RetryConfig::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => request.basic_auth(user, Some(pass)),
            _ => request,
        }
    }

    /// Send a request, retrying transient statuses with backoff.
    async fn execute<F>(&self, operation: &str, make_request: F) -> IndexerResult<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0;
        let mut delay = self.retry.initial_delay_ms;

        loop {
            attempt += 1;

            let response = self
                .authorized(make_request())
                .send()
                .await
                .map_err(|e| {
                    IndexerError::Backend(format!("{} request failed: {}", operation, e))
                })?;

            let status = response.status().as_u16();
            if response.status().is_success() {
                return Ok(response);
            }

            if RETRY_STATUSES.contains(&status) && attempt <= self.retry.max_retries {
                let actual_delay = if self.retry.jitter {
                    let jitter = (fastrand::f64() - 0.5) * 0.2;
                    ((delay as f64) * (1.0 + jitter)) as u64
                } else {
                    delay
                };

                warn!(
                    operation,
                    status,
                    attempt,
                    delay_ms = actual_delay,
                    "Transient backend status, retrying"
                );

                tokio::time::sleep(Duration::from_millis(actual_delay)).await;
                delay = (((delay as f64) * self.retry.backoff_multiplier) as u64)
                    .min(self.retry.max_delay_ms);
                continue;
            }

            let reason = response.text().await.unwrap_or_default();
            return Err(IndexerError::Response { status, reason });
        }
    }
}

fn format_keep_alive(keep_alive: Duration) -> String {
    let secs = keep_alive.as_secs();
    if secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

#[async_trait]
impl SearchBackend for ElasticClient {
    async fn open_scroll(
        &self,
        index: &str,
        sort_key: &str,
        page_size: usize,
        keep_alive: Duration,
    ) -> IndexerResult<ScrollPage> {
        let url = format!("{}/{}/_search", self.base_url, index);
        let scroll = format_keep_alive(keep_alive);
        let size = page_size.to_string();

        debug!(index, sort_key, page_size, "Opening scroll");

        let response = self
            .execute("search", || {
                self.client.get(&url).query(&[
                    ("scroll", scroll.as_str()),
                    ("size", size.as_str()),
                    ("sort", sort_key),
                ])
            })
            .await?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| IndexerError::Backend(format!("Invalid search response: {}", e)))?;

        Ok(body.into_page())
    }

    async fn next_page(&self, scroll_id: &str, keep_alive: Duration) -> IndexerResult<ScrollPage> {
        let url = format!("{}/_search/scroll", self.base_url);
        let payload = json!({
            "scroll": format_keep_alive(keep_alive),
            "scroll_id": scroll_id,
        });

        let response = self
            .execute("scroll", || self.client.post(&url).json(&payload))
            .await?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| IndexerError::Backend(format!("Invalid scroll response: {}", e)))?;

        Ok(body.into_page())
    }

    async fn bulk(&self, index: &str, body: String) -> IndexerResult<BulkResponse> {
        let url = format!("{}/{}/_bulk", self.base_url, index);

        let response = self
            .execute("bulk", || {
                self.client
                    .post(&url)
                    .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
                    .body(body.clone())
            })
            .await?;

        let parsed: BulkResponse = response
            .json()
            .await
            .map_err(|e| IndexerError::Backend(format!("Invalid bulk response: {}", e)))?;

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_alive_formatting() {
        assert_eq!(format_keep_alive(Duration::from_secs(300)), "5m");
        assert_eq!(format_keep_alive(Duration::from_secs(90)), "90s");
    }

    #[test]
    fn test_client_rejects_invalid_url() {
        let config = ElasticConfig {
            scheme: "not a scheme".to_string(),
            ..Default::default()
        };
        assert!(ElasticClient::new(&config).is_err());
    }
}
