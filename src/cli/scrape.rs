//! Full novel scrape with a progress bar.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use novelscrape::config::Config;
use novelscrape::models::{BatchResult, ScraperProgress};

use super::helpers::{print_json, with_source};

/// Scrape a novel and every chapter, then write the JSON result.
pub async fn cmd_scrape(
    config: &Config,
    source_id: &str,
    url: &str,
    concurrency: Option<usize>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let mut options = config.scraper_options()?;
    if let Some(n) = concurrency {
        options = options.with_max_concurrency(n);
    }

    eprintln!(
        "{} Scraping {} from {} ({} concurrent)",
        style("→").cyan(),
        url,
        style(source_id).yellow(),
        options.max_concurrency
    );

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}) {msg}",
            )?
            .progress_chars("#>-"),
    );

    let on_progress = |progress: ScraperProgress| {
        pb.set_length(progress.total as u64);
        pb.set_position((progress.completed + progress.errors) as u64);
        match progress.current {
            Some(current) => pb.set_message(current),
            None => pb.set_message(format!("{} failed", progress.errors)),
        }
    };

    let result = with_source(config, source_id, options, |source| async move {
        source
            .scrape_all_chapters(url, Some(&on_progress))
            .await
            .with_context(|| format!("Failed to scrape {}", url))
    })
    .await;
    pb.finish_and_clear();
    let result = result?;

    write_summary(&mut std::io::stderr().lock(), &result)?;

    match output {
        Some(path) => {
            let json = serde_json::to_string_pretty(&result)?;
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{} Wrote {}", style("✓").green(), path.display());
            Ok(())
        }
        None => print_json(&result),
    }
}

/// Human-readable outcome. Kept off stdout, which may carry the JSON result.
fn write_summary(out: &mut impl Write, result: &BatchResult) -> std::io::Result<()> {
    writeln!(
        out,
        "{} {}: {} chapter(s) scraped",
        style("✓").green(),
        result.novel.title,
        result.chapters.len()
    )?;
    if !result.failures.is_empty() {
        writeln!(
            out,
            "{} {} chapter(s) failed:",
            style("✗").red(),
            result.failures.len()
        )?;
        for failure in &result.failures {
            writeln!(out, "  {} {}", failure.url, style(&failure.error).dim())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use novelscrape::models::{ChapterFailure, ScrapedNovel};

    #[test]
    fn test_summary_lists_failures() {
        let result = BatchResult {
            novel: ScrapedNovel::new("Lord of Mysteries", "https://novelbin.com/b/lom"),
            chapters: Vec::new(),
            failures: vec![ChapterFailure {
                url: "https://novelbin.com/b/lom/chapter-2".to_string(),
                error: "HTTP 503".to_string(),
            }],
        };

        let mut buf = Vec::new();
        write_summary(&mut buf, &result).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("Lord of Mysteries: 0 chapter(s) scraped"));
        assert!(text.contains("1 chapter(s) failed"));
        assert!(text.contains("https://novelbin.com/b/lom/chapter-2"));
        assert!(!text.contains('{'));
    }
}
