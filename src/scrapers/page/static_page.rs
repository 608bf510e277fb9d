//! Static page strategy: one HTTP GET, no script execution.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;

use super::{PageAccess, PageHandle};
use crate::error::{Result, ScrapeError};
use crate::scrapers::http_client::BROWSER_USER_AGENT;

/// Page access backed by plain HTTP fetches.
///
/// Holds no network resources beyond the shared client, so `close` is a no-op.
#[derive(Clone)]
pub struct StaticPageAccess {
    client: Client,
}

impl StaticPageAccess {
    /// Create a static page access with a browser-like user agent.
    pub fn new() -> Result<Self> {
        Self::with_user_agent(BROWSER_USER_AGENT)
    }

    /// Create a static page access with a custom user agent.
    pub fn with_user_agent(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| ScrapeError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageAccess for StaticPageAccess {
    async fn get_page(&self) -> Result<Box<dyn PageHandle>> {
        Ok(Box::new(StaticPage {
            client: self.client.clone(),
            body: None,
        }))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

struct StaticPage {
    client: Client,
    body: Option<String>,
}

#[async_trait]
impl PageHandle for StaticPage {
    async fn goto(&mut self, url: &str) -> Result<()> {
        debug!("Fetching {} (static)", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ScrapeError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| ScrapeError::Transport {
                url: url.to_string(),
                source,
            })?;
        self.body = Some(body);
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str) -> Result<bool> {
        let Some(body) = self.body.as_deref() else {
            return Err(ScrapeError::Browser("Page not loaded".to_string()));
        };
        let Ok(selector) = Selector::parse(selector) else {
            return Ok(false);
        };
        let document = Html::parse_document(body);
        let found = document.select(&selector).next().is_some();
        Ok(found)
    }

    async fn content(&mut self) -> Result<String> {
        Ok(self.body.clone().unwrap_or_default())
    }

    async fn close(mut self: Box<Self>) -> Result<()> {
        self.body = None;
        Ok(())
    }
}
