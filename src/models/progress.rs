//! Batch scrape progress and results.

use serde::{Deserialize, Serialize};

use super::{ScrapedChapter, ScrapedNovel};

/// Snapshot emitted to a progress callback after every chapter task settles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScraperProgress {
    /// Number of chapters in the batch.
    pub total: usize,
    /// Chapters scraped successfully so far.
    pub completed: usize,
    /// Label of the chapter that just finished, if it succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,
    /// Chapters that failed so far.
    pub errors: usize,
}

/// Callback receiving progress snapshots.
pub type ProgressCallback<'a> = &'a (dyn Fn(ScraperProgress) + Send + Sync);

/// A chapter URL that could not be scraped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterFailure {
    pub url: String,
    pub error: String,
}

/// Result of scraping an entire novel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub novel: ScrapedNovel,
    /// Successfully scraped chapters, ascending by chapter number.
    pub chapters: Vec<ScrapedChapter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ChapterFailure>,
}
