//! Shared helpers for CLI commands.

use std::future::Future;

use anyhow::Context;
use console::style;
use serde::Serialize;

use novelscrape::config::Config;
use novelscrape::scrapers::{ScraperOptions, Source};

/// Build a source from config along with the options it was created with.
pub fn open_source(
    config: &Config,
    source_id: &str,
    options: ScraperOptions,
) -> anyhow::Result<Source> {
    let registry = config.registry().context("Invalid decoder table")?;
    registry.create_source(source_id, &options).with_context(|| {
        format!(
            "Unknown source '{}'. Available: {}",
            source_id,
            registry.available_sources().join(", ")
        )
    })
}

/// Run `op` against a source, then release any page access the options hold.
///
/// The browser process must not outlive the command, so the page access is
/// closed whether `op` succeeded or not.
pub async fn with_source<T, F, Fut>(
    config: &Config,
    source_id: &str,
    options: ScraperOptions,
    op: F,
) -> anyhow::Result<T>
where
    F: FnOnce(Source) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let access = options.page_access.clone();
    let result = match open_source(config, source_id, options) {
        Ok(source) => op(source).await,
        Err(e) => Err(e),
    };

    if let Some(access) = access {
        if let Err(e) = access.close().await {
            eprintln!("{} Failed to close page access: {}", style("!").yellow(), e);
        }
    }
    result
}

/// Print a record as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Truncate a string for column display.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
