//! novelscrape - web novel scraping engine.
//!
//! Pulls novel metadata, chapter lists and chapter bodies from a fixed set of
//! reading sites, described by a declarative table of CSS selectors. Fetches
//! go through a retrying, caching fetcher and optionally a headless browser.

pub mod config;
pub mod error;
pub mod models;
pub mod scrapers;
pub mod server;

pub use config::{Config, FetchMode};
pub use error::{Result, ScrapeError};
pub use models::{
    BatchResult, ChapterFailure, NovelStatus, ProgressCallback, ScrapedChapter, ScrapedNovel,
    ScraperProgress,
};
pub use scrapers::{ScraperOptions, Source, SourceInfo, SourceRegistry};
