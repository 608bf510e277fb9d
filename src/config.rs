//! Configuration management.
//!
//! Settings come from an optional TOML or JSON file (chosen by extension)
//! with environment variable overrides applied on top.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ScrapeError};
use crate::scrapers::cache::{ContentCache, DEFAULT_TTL_MINUTES};
use crate::scrapers::config::{
    DEFAULT_MAX_CONCURRENCY, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT,
};
use crate::scrapers::http_client::{resolve_user_agent, BROWSER_USER_AGENT, USER_AGENT};
use crate::scrapers::{
    BrowserEngineConfig, BrowserPageAccess, DecoderTable, PageAccess, ScraperOptions,
    SiteDecoder, SourceRegistry, StaticPageAccess,
};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "NOVELSCRAPE_CONFIG";

/// How sources fetch markup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Direct HTTP requests with the configured user agent.
    #[default]
    Http,
    /// Static pages: one GET per page with a browser user agent, no scripts.
    Static,
    /// Rendered pages in a shared headless browser.
    Browser,
}

impl FetchMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "http" => Some(Self::Http),
            "static" => Some(Self::Static),
            "browser" => Some(Self::Browser),
            _ => None,
        }
    }
}

/// `[scraper]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScraperConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Custom user agent, or "impersonate" for a real browser UA picked once per run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default = "default_cache_ttl_minutes")]
    pub cache_ttl_minutes: u64,
    #[serde(default)]
    pub fetch_mode: FetchMode,
}

impl ScraperConfig {
    /// Runtime options without a page access strategy.
    pub fn to_options(&self) -> ScraperOptions {
        ScraperOptions::default()
            .with_max_concurrency(self.max_concurrency)
            .with_retry(self.retry_attempts, Duration::from_millis(self.retry_delay_ms))
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_user_agent(resolve_user_agent(self.user_agent.as_deref(), USER_AGENT))
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_ms: default_timeout_ms(),
            user_agent: None,
            cache_ttl_minutes: default_cache_ttl_minutes(),
            fetch_mode: FetchMode::default(),
        }
    }
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_retry_attempts() -> u32 {
    DEFAULT_RETRY_ATTEMPTS
}

fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY.as_millis() as u64
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

fn default_cache_ttl_minutes() -> u64 {
    DEFAULT_TTL_MINUTES
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Include the full error chain in 500 responses.
    #[serde(default)]
    pub expose_error_details: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            expose_error_details: false,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub browser: BrowserEngineConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Extra or replacement site decoders.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decoders: Vec<SiteDecoder>,
    /// Path the config was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load from `path`, else from `NOVELSCRAPE_CONFIG`, else from a
    /// discovered `novelscrape` config file, else defaults.
    /// Environment overrides are applied in every case.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var(CONFIG_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let path = match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => Some(path),
            None => Self::discover().await,
        };
        let config = match path {
            Some(path) => Self::load_from_path(&path).await?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    /// Find a `novelscrape` config file in the standard locations.
    async fn discover() -> Option<PathBuf> {
        match prefer::load("novelscrape").await {
            Ok(found) => found.source_path().map(|p| p.to_path_buf()),
            Err(_) => {
                debug!("No novelscrape config file discovered, using defaults");
                None
            }
        }
    }

    /// Load configuration from a specific file path.
    pub async fn load_from_path(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            ScrapeError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse config text in the format named by `ext`.
    pub fn parse(contents: &str, ext: &str) -> Result<Self> {
        match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| ScrapeError::Config(format!("Failed to parse TOML config: {}", e))),
            _ => serde_json::from_str(contents)
                .map_err(|e| ScrapeError::Config(format!("Failed to parse JSON config: {}", e))),
        }
    }

    /// Apply environment variable overrides.
    ///
    /// - `NOVELSCRAPE_MAX_CONCURRENCY`, `NOVELSCRAPE_RETRY_ATTEMPTS`
    /// - `NOVELSCRAPE_FETCH_MODE` - http, static or browser
    /// - `NOVELSCRAPE_USER_AGENT`
    /// - `NOVELSCRAPE_EXPOSE_ERRORS` - true/1 to expose error details
    /// - `BROWSER_URL` - remote Chrome DevTools URL
    pub fn with_env_overrides(self) -> Self {
        let mut config = self.apply_env(|key| std::env::var(key).ok());
        config.browser = config.browser.with_env_overrides();
        config
    }

    fn apply_env(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(n) = var("NOVELSCRAPE_MAX_CONCURRENCY").and_then(|v| v.parse().ok()) {
            self.scraper.max_concurrency = n;
        }
        if let Some(n) = var("NOVELSCRAPE_RETRY_ATTEMPTS").and_then(|v| v.parse().ok()) {
            self.scraper.retry_attempts = n;
        }
        if let Some(mode) = var("NOVELSCRAPE_FETCH_MODE").and_then(|v| FetchMode::from_str(&v)) {
            self.scraper.fetch_mode = mode;
        }
        if let Some(ua) = var("NOVELSCRAPE_USER_AGENT").filter(|v| !v.is_empty()) {
            self.scraper.user_agent = Some(ua);
        }
        if let Some(val) = var("NOVELSCRAPE_EXPOSE_ERRORS") {
            self.server.expose_error_details = matches!(val.as_str(), "1" | "true" | "yes");
        }
        self
    }

    /// Page access strategy for the configured fetch mode.
    pub fn page_access(&self) -> Result<Option<Arc<dyn PageAccess>>> {
        let access: Arc<dyn PageAccess> = match self.scraper.fetch_mode {
            FetchMode::Http => return Ok(None),
            FetchMode::Static => {
                let user_agent =
                    resolve_user_agent(self.scraper.user_agent.as_deref(), BROWSER_USER_AGENT);
                Arc::new(StaticPageAccess::with_user_agent(&user_agent)?)
            }
            FetchMode::Browser => Arc::new(BrowserPageAccess::new(self.browser.clone())),
        };
        Ok(Some(access))
    }

    /// Runtime options including the page access strategy.
    pub fn scraper_options(&self) -> Result<ScraperOptions> {
        let mut options = self.scraper.to_options();
        options.page_access = self.page_access()?;
        Ok(options)
    }

    /// Built-in decoders merged with configured ones.
    pub fn decoder_table(&self) -> Result<DecoderTable> {
        DecoderTable::builtin()?.merge(self.decoders.clone())
    }

    /// Source registry over the merged decoder table with the configured cache TTL.
    pub fn registry(&self) -> Result<SourceRegistry> {
        Ok(SourceRegistry::with_cache(
            self.decoder_table()?,
            Arc::new(ContentCache::with_ttl_minutes(self.scraper.cache_ttl_minutes)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.scraper.max_concurrency, 3);
        assert_eq!(config.scraper.retry_attempts, 3);
        assert_eq!(config.scraper.retry_delay_ms, 1000);
        assert_eq!(config.scraper.timeout_ms, 30_000);
        assert_eq!(config.scraper.cache_ttl_minutes, 60);
        assert_eq!(config.scraper.fetch_mode, FetchMode::Http);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert!(config.browser.headless);
    }

    #[test]
    fn test_parse_toml_sections() {
        let config = Config::parse(
            r#"
            [scraper]
            max_concurrency = 8
            fetch_mode = "static"
            user_agent = "custom-agent"

            [browser]
            headless = false

            [server]
            port = 8080
            "#,
            "toml",
        )
        .unwrap();

        assert_eq!(config.scraper.max_concurrency, 8);
        assert_eq!(config.scraper.retry_attempts, 3);
        assert_eq!(config.scraper.fetch_mode, FetchMode::Static);
        assert!(!config.browser.headless);
        assert_eq!(config.server.port, 8080);

        let options = config.scraper.to_options();
        assert_eq!(options.max_concurrency, 8);
        assert_eq!(options.user_agent, "custom-agent");
        assert_eq!(options.retry_delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_parse_json() {
        let config =
            Config::parse(r#"{"scraper": {"retry_attempts": 5, "timeout_ms": 1000}}"#, "json")
                .unwrap();
        assert_eq!(config.scraper.retry_attempts, 5);
        assert_eq!(config.scraper.to_options().timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        assert!(matches!(
            Config::parse("[scraper\nbroken", "toml"),
            Err(ScrapeError::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("NOVELSCRAPE_MAX_CONCURRENCY", "10"),
            ("NOVELSCRAPE_RETRY_ATTEMPTS", "not-a-number"),
            ("NOVELSCRAPE_FETCH_MODE", "Browser"),
            ("NOVELSCRAPE_EXPOSE_ERRORS", "true"),
        ]
        .into_iter()
        .collect();

        let config = Config::default().apply_env(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.scraper.max_concurrency, 10);
        assert_eq!(config.scraper.retry_attempts, 3);
        assert_eq!(config.scraper.fetch_mode, FetchMode::Browser);
        assert!(config.server.expose_error_details);
    }

    #[test]
    fn test_configured_decoders_merge_into_registry() {
        let mut config = Config::default();
        let mut mirror = (*DecoderTable::builtin().unwrap().get("novelbin").unwrap()).clone();
        mirror.id = "novelbin-mirror".to_string();
        config.decoders.push(mirror);
        config.scraper.cache_ttl_minutes = 5;

        let registry = config.registry().unwrap();

        assert_eq!(
            registry.available_sources().last().map(String::as_str),
            Some("novelbin-mirror")
        );
        assert_eq!(registry.cache().stats().ttl_minutes, 5);
    }

    #[test]
    fn test_page_access_follows_fetch_mode() {
        let mut config = Config::default();
        assert!(config.page_access().unwrap().is_none());

        config.scraper.fetch_mode = FetchMode::Static;
        assert!(config.scraper_options().unwrap().page_access.is_some());

        config.scraper.fetch_mode = FetchMode::Browser;
        assert!(config.page_access().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_load_reads_explicit_path() {
        let path = std::env::temp_dir().join(format!(
            "novelscrape-config-{}.toml",
            std::process::id()
        ));
        tokio::fs::write(&path, "[scraper]\ncache_ttl_minutes = 15\n")
            .await
            .unwrap();

        let config = Config::load(Some(&path)).await;
        let _ = tokio::fs::remove_file(&path).await;
        let config = config.unwrap();

        assert_eq!(config.scraper.cache_ttl_minutes, 15);
        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_load_missing_explicit_path_is_an_error() {
        let path = std::env::temp_dir().join("novelscrape-does-not-exist.toml");
        assert!(matches!(
            Config::load(Some(&path)).await,
            Err(ScrapeError::Config(_))
        ));
    }
}
