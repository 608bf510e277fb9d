//! Browser engine configuration.
//!
//! Always compiled so that config parsing works without the `browser` feature.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Headless browser settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowserEngineConfig {
    /// Run in headless mode (default: true).
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Navigation and selector wait timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Explicit Chrome/Chromium executable. Searched for when unset.
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to an existing browser instead of launching one.
    #[serde(default)]
    pub remote_url: Option<String>,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Inject automation-hiding scripts into every page.
    #[serde(default = "default_stealth")]
    pub stealth: bool,
}

impl BrowserEngineConfig {
    /// Apply environment variable overrides.
    ///
    /// - `BROWSER_URL` - Remote Chrome DevTools URL
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("BROWSER_URL") {
            let val = val.trim();
            if !val.is_empty() {
                self.remote_url = Some(val.to_string());
            }
        }
        self
    }
}

impl Default for BrowserEngineConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            timeout: default_timeout(),
            chrome_path: None,
            chrome_args: Vec::new(),
            remote_url: None,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            stealth: default_stealth(),
        }
    }
}

pub fn default_headless() -> bool {
    true
}

pub fn default_timeout() -> u64 {
    30
}

fn default_viewport_width() -> u32 {
    1920
}

fn default_viewport_height() -> u32 {
    1080
}

fn default_stealth() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: BrowserEngineConfig = toml::from_str(
            r#"
            headless = false
            chrome_args = ["--lang=en-US"]
            "#,
        )
        .unwrap();

        assert!(!config.headless);
        assert_eq!(config.timeout, 30);
        assert_eq!(config.viewport_width, 1920);
        assert_eq!(config.viewport_height, 1080);
        assert!(config.stealth);
        assert_eq!(config.chrome_args, vec!["--lang=en-US".to_string()]);
        assert!(config.remote_url.is_none());
    }
}
