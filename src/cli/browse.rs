//! Single-operation commands: sources, search, novel, chapters, chapter.

use anyhow::Context;
use console::style;

use novelscrape::config::Config;

use super::helpers::{print_json, truncate, with_source};

/// List registered sources.
pub fn cmd_sources(config: &Config) -> anyhow::Result<()> {
    let registry = config.registry().context("Invalid decoder table")?;

    println!("\n{}", style("Novel Sources").bold());
    println!("{}", "-".repeat(60));
    println!("{:<15} {:<20} Base URL", "ID", "Name");
    println!("{}", "-".repeat(60));

    for info in registry.source_info() {
        println!(
            "{:<15} {:<20} {}",
            info.id,
            truncate(&info.name, 19),
            info.base_url
        );
    }

    Ok(())
}

/// Search a source and print the matches.
pub async fn cmd_search(config: &Config, source_id: &str, query: &str) -> anyhow::Result<()> {
    let options = config.scraper_options()?;
    let results = with_source(config, source_id, options, |source| async move {
        source
            .search_novels(query)
            .await
            .with_context(|| format!("Search for '{}' failed", query))
    })
    .await?;

    eprintln!(
        "{} {} result(s) for '{}'",
        style("✓").green(),
        results.len(),
        query
    );
    print_json(&results)
}

/// Print novel metadata.
pub async fn cmd_novel(config: &Config, source_id: &str, url: &str) -> anyhow::Result<()> {
    let options = config.scraper_options()?;
    let novel = with_source(config, source_id, options, |source| async move {
        source
            .get_novel(url)
            .await
            .with_context(|| format!("Failed to fetch novel {}", url))
    })
    .await?;
    print_json(&novel)
}

/// Print the chapter URLs of a novel.
pub async fn cmd_chapters(config: &Config, source_id: &str, url: &str) -> anyhow::Result<()> {
    let options = config.scraper_options()?;
    let chapters = with_source(config, source_id, options, |source| async move {
        source
            .get_chapter_list(url)
            .await
            .with_context(|| format!("Failed to fetch chapter list {}", url))
    })
    .await?;

    eprintln!("{} {} chapter(s)", style("✓").green(), chapters.len());
    print_json(&chapters)
}

/// Print one chapter.
pub async fn cmd_chapter(config: &Config, source_id: &str, url: &str) -> anyhow::Result<()> {
    let options = config.scraper_options()?;
    let chapter = with_source(config, source_id, options, |source| async move {
        source
            .get_chapter(url)
            .await
            .with_context(|| format!("Failed to fetch chapter {}", url))
    })
    .await?;
    print_json(&chapter)
}
