//! Data models for scraped novels and chapters.

mod novel;
mod progress;

pub use novel::{NovelStatus, ScrapedChapter, ScrapedNovel};
pub use progress::{BatchResult, ChapterFailure, ProgressCallback, ScraperProgress};
