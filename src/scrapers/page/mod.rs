//! Page access strategies.
//!
//! A [`PageAccess`] turns a URL into markup, either with a plain HTTP fetch
//! ([`StaticPageAccess`]) or through a rendered browser tab
//! (`BrowserPageAccess`). Pages are private to one request and must be closed
//! by whoever acquired them; [`load_content`] does that on every path.

mod static_page;
#[cfg(test)]
pub(crate) mod testing;

pub use static_page::StaticPageAccess;

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Result, ScrapeError};

/// A single navigable page.
#[async_trait]
pub trait PageHandle: Send {
    /// Navigate to `url`. Fails on transport errors or non-2xx responses.
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Wait until `selector` matches something on the page.
    ///
    /// Returns `false` when it never appears; missing markup is not an error.
    async fn wait_for_selector(&mut self, selector: &str) -> Result<bool>;

    /// Raw markup of the current page.
    async fn content(&mut self) -> Result<String>;

    /// Release the page.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Capability to obtain pages.
#[async_trait]
pub trait PageAccess: Send + Sync {
    /// Create a fresh page. The caller owns it and must close it.
    async fn get_page(&self) -> Result<Box<dyn PageHandle>>;

    /// Tear down any shared resources behind this strategy.
    async fn close(&self) -> Result<()>;
}

/// Fetch the markup at `url` through a page, closing the page afterwards on
/// every outcome, timeouts included.
///
/// `timeout` bounds navigation and the selector wait, not page acquisition.
pub async fn load_content(
    access: &dyn PageAccess,
    url: &str,
    wait_for: Option<&str>,
    timeout: Duration,
) -> Result<String> {
    let mut page = access.get_page().await?;
    let navigation = navigate(page.as_mut(), url, wait_for);
    let result = match tokio::time::timeout(timeout, navigation).await {
        Ok(result) => result,
        Err(_) => Err(ScrapeError::Timeout {
            url: url.to_string(),
            timeout,
        }),
    };
    if let Err(e) = page.close().await {
        debug!("Failed to close page for {}: {}", url, e);
    }
    result
}

async fn navigate(page: &mut dyn PageHandle, url: &str, wait_for: Option<&str>) -> Result<String> {
    page.goto(url).await?;
    if let Some(selector) = wait_for {
        if !page.wait_for_selector(selector).await? {
            debug!("Selector {} never matched on {}", selector, url);
        }
    }
    page.content().await
}
