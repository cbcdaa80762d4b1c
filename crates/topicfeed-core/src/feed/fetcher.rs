use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, Proxy, StatusCode};
use url::Url;

use super::models::FeedHandle;
use super::parser::parse_feed;
use super::FeedClient;
use crate::config::SyncConfig;
use crate::{Error, Result};

const MAX_RETRIES: u32 = 3;
const INITIAL_RETRY_DELAY_MS: u64 = 500;

static USER_AGENT_INDEX: AtomicUsize = AtomicUsize::new(0);
const USER_AGENTS: &[&str] = &[
    // Chrome on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Firefox on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
];

fn next_user_agent() -> &'static str {
    let index = USER_AGENT_INDEX.fetch_add(1, Ordering::Relaxed) % USER_AGENTS.len();
    USER_AGENTS[index]
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE
}

/// HTTP feed fetcher
pub struct FeedFetcher {
    client: Client,
    max_feed_bytes: usize,
}

impl FeedFetcher {
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let client = Self::build_client(config.request_timeout_secs, &config.proxy_url)?;

        Ok(Self {
            client,
            max_feed_bytes: config.max_feed_bytes,
        })
    }

    fn build_client(timeout_secs: u64, proxy_url: &Option<String>) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(ref proxy) = proxy_url {
            let proxy = Proxy::all(proxy)
                .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
            tracing::info!("Using HTTP proxy for feed fetching");
        }

        builder.build().map_err(Error::Http)
    }

    fn build_headers(user_agent: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "application/rss+xml,application/atom+xml,application/xml;q=0.9,text/xml;q=0.8,*/*;q=0.5",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        if let Ok(ua) = HeaderValue::from_str(user_agent) {
            headers.insert(USER_AGENT, ua);
        }
        headers
    }

    /// GET with retry and exponential backoff on transport errors, 429 and 503
    async fn fetch_with_retry(&self, url: &str) -> Result<(StatusCode, Bytes)> {
        let mut last_error = None;
        let mut delay_ms = INITIAL_RETRY_DELAY_MS;

        for attempt in 0..MAX_RETRIES {
            let user_agent = next_user_agent();

            tracing::debug!("Fetch attempt {} for {}", attempt + 1, url);

            match self
                .client
                .get(url)
                .headers(Self::build_headers(user_agent))
                .send()
                .await
            {
                Ok(response) if is_retryable(response.status()) => {
                    let status = response.status();
                    tracing::warn!("Received {} for {}, retrying after {}ms", status, url, delay_ms);
                    last_error = Some(Error::Fetch {
                        url: url.to_string(),
                        reason: format!("HTTP {}", status),
                    });
                }
                Ok(response) => {
                    let status = response.status();
                    match response.bytes().await {
                        Ok(bytes) => return Ok((status, bytes)),
                        Err(e) => {
                            tracing::warn!("Failed to read response body from {}: {}", url, e);
                            last_error = Some(Error::Http(e));
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Request failed for {} (attempt {}): {}", url, attempt + 1, e);
                    last_error = Some(Error::Http(e));
                }
            }

            if attempt < MAX_RETRIES - 1 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                delay_ms *= 2;
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Fetch {
            url: url.to_string(),
            reason: format!("no response after {} attempts", MAX_RETRIES),
        }))
    }

    fn ensure_content_size(&self, size: usize, url: &str) -> Result<()> {
        if size > self.max_feed_bytes {
            return Err(Error::Fetch {
                url: url.to_string(),
                reason: format!("feed too large ({} bytes)", size),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FeedClient for FeedFetcher {
    async fn fetch(&self, url: &str) -> Result<FeedHandle> {
        Url::parse(url)?;

        tracing::info!("Fetching feed from: {}", url);

        let (status, content) = self.fetch_with_retry(url).await?;

        if !status.is_success() {
            return Err(Error::Fetch {
                url: url.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        self.ensure_content_size(content.len(), url)?;

        parse_feed(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_rotation() {
        let first = next_user_agent();
        let second = next_user_agent();
        assert_ne!(first, second);
        assert!(USER_AGENTS.contains(&first));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
        assert!(!is_retryable(StatusCode::OK));
    }

    #[test]
    fn test_content_size_limit() {
        let config = SyncConfig {
            max_feed_bytes: 10,
            ..SyncConfig::default()
        };
        let fetcher = FeedFetcher::new(&config).unwrap();
        assert!(fetcher.ensure_content_size(10, "https://example.com/feed").is_ok());
        assert!(matches!(
            fetcher.ensure_content_size(11, "https://example.com/feed"),
            Err(Error::Fetch { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_url_rejected_before_request() {
        let fetcher = FeedFetcher::new(&SyncConfig::default()).unwrap();
        assert!(matches!(fetcher.fetch("not a url").await, Err(Error::UrlParse(_))));
    }
}
