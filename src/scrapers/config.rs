//! Runtime options for sources.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::cache::ContentCache;
use super::http_client::USER_AGENT;
use super::page::PageAccess;

/// Default number of simultaneous chapter fetches in a batch scrape.
pub const DEFAULT_MAX_CONCURRENCY: usize = 3;
/// Default number of fetch attempts before giving up.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
/// Default delay between fetch attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);
/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Options accepted by `SourceRegistry::create_source`.
#[derive(Clone)]
pub struct ScraperOptions {
    pub max_concurrency: usize,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub timeout: Duration,
    pub user_agent: String,
    /// Fetch markup through pages instead of direct HTTP requests.
    pub page_access: Option<Arc<dyn PageAccess>>,
    /// Cache to use instead of the registry's shared one.
    pub cache: Option<Arc<ContentCache>>,
}

impl ScraperOptions {
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay = delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_page_access(mut self, access: Arc<dyn PageAccess>) -> Self {
        self.page_access = Some(access);
        self
    }

    pub fn with_cache(mut self, cache: Arc<ContentCache>) -> Self {
        self.cache = Some(cache);
        self
    }
}

impl Default for ScraperOptions {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            timeout: DEFAULT_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
            page_access: None,
            cache: None,
        }
    }
}

impl fmt::Debug for ScraperOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScraperOptions")
            .field("max_concurrency", &self.max_concurrency)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_delay", &self.retry_delay)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("page_access", &self.page_access.is_some())
            .field("cache", &self.cache.is_some())
            .finish()
    }
}
