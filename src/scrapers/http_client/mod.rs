//! Retrying, caching fetcher shared by every source.

mod user_agent;

pub use user_agent::{
    resolve_user_agent, BROWSER_USER_AGENT, IMPERSONATE, IMPERSONATE_USER_AGENTS, USER_AGENT,
};

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::cache::ContentCache;
use super::config::ScraperOptions;
use super::page::{load_content, PageAccess};
use crate::error::{Result, ScrapeError};

/// Fetches markup with a bounded retry loop and an optional content cache.
///
/// When a [`PageAccess`] is configured every attempt goes through a fresh
/// page; otherwise a direct GET is issued with the configured user agent.
#[derive(Clone)]
pub struct RetryingFetcher {
    client: Client,
    page_access: Option<Arc<dyn PageAccess>>,
    cache: Arc<ContentCache>,
    retry_attempts: u32,
    retry_delay: Duration,
    timeout: Duration,
}

impl RetryingFetcher {
    /// Create a fetcher from source options.
    pub fn new(options: &ScraperOptions, cache: Arc<ContentCache>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&options.user_agent)
            .timeout(options.timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| ScrapeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            page_access: options.page_access.clone(),
            cache,
            retry_attempts: options.retry_attempts,
            retry_delay: options.retry_delay,
            timeout: options.timeout,
        })
    }

    /// The cache this fetcher reads and writes.
    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    /// Fetch raw markup for `url`.
    pub async fn fetch_raw(&self, url: &str, use_cache: bool) -> Result<String> {
        self.fetch_page(url, use_cache, None).await
    }

    /// Fetch markup for `url`, waiting for `wait_for` when rendering through a page.
    ///
    /// Makes at most `max(retry_attempts, 1)` attempts. Errors that are not
    /// retryable are returned immediately.
    pub async fn fetch_page(
        &self,
        url: &str,
        use_cache: bool,
        wait_for: Option<&str>,
    ) -> Result<String> {
        if use_cache {
            if let Some(cached) = self.cache.get(url) {
                debug!("Cache hit for {}", url);
                return Ok(cached);
            }
        }

        let attempts = self.retry_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.fetch_once(url, wait_for).await {
                Ok(content) => {
                    if use_cache {
                        self.cache.set(url, content.as_str());
                    }
                    return Ok(content);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    warn!("Attempt {}/{} for {} failed: {}", attempt, attempts, url, e);
                    if attempt >= attempts {
                        return Err(ScrapeError::FetchExhausted {
                            url: url.to_string(),
                            attempts,
                            cause: Box::new(e),
                        });
                    }
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    async fn fetch_once(&self, url: &str, wait_for: Option<&str>) -> Result<String> {
        match &self.page_access {
            Some(access) => load_content(access.as_ref(), url, wait_for, self.timeout).await,
            None => match tokio::time::timeout(self.timeout, self.get_text(url)).await {
                Ok(result) => result,
                Err(_) => Err(ScrapeError::Timeout {
                    url: url.to_string(),
                    timeout: self.timeout,
                }),
            },
        }
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| transport(url, source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        response.text().await.map_err(|source| transport(url, source))
    }
}

fn transport(url: &str, source: reqwest::Error) -> ScrapeError {
    ScrapeError::Transport {
        url: url.to_string(),
        source,
    }
}
