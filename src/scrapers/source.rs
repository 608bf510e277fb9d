//! Generic per-site source driven by a [`SiteDecoder`].

use std::sync::Arc;

use scraper::Html;
use tracing::debug;

use super::batch::BatchOrchestrator;
use super::cache::ContentCache;
use super::config::ScraperOptions;
use super::decoder::SiteDecoder;
use super::extract;
use super::http_client::RetryingFetcher;
use super::limiter::ConcurrencyLimiter;
use crate::error::Result;
use crate::models::{BatchResult, ProgressCallback, ScrapedChapter, ScrapedNovel};

/// One site's extractor.
///
/// All sites share this engine; only the decoder differs. The decoder and
/// base URL are fixed for the life of the source.
#[derive(Clone)]
pub struct Source {
    decoder: Arc<SiteDecoder>,
    fetcher: RetryingFetcher,
    limiter: ConcurrencyLimiter,
}

impl Source {
    pub fn new(
        decoder: Arc<SiteDecoder>,
        options: &ScraperOptions,
        cache: Arc<ContentCache>,
    ) -> Result<Self> {
        Ok(Self {
            decoder,
            fetcher: RetryingFetcher::new(options, cache)?,
            limiter: ConcurrencyLimiter::new(options.max_concurrency),
        })
    }

    pub fn id(&self) -> &str {
        &self.decoder.id
    }

    pub fn name(&self) -> &str {
        &self.decoder.name
    }

    pub fn base_url(&self) -> &str {
        &self.decoder.base_url
    }

    pub fn decoder(&self) -> &SiteDecoder {
        &self.decoder
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    pub fn fetcher(&self) -> &RetryingFetcher {
        &self.fetcher
    }

    /// Search the site. Results are partial records in page order.
    pub async fn search_novels(&self, query: &str) -> Result<Vec<ScrapedNovel>> {
        let url = self.decoder.search_url(query);
        debug!("[{}] searching {}", self.id(), url);
        let html = self.fetcher.fetch_raw(&url, false).await?;
        let doc = Html::parse_document(&html);
        Ok(extract::search_results(&doc, &self.decoder))
    }

    /// Novel metadata from its detail page.
    pub async fn get_novel(&self, url: &str) -> Result<ScrapedNovel> {
        let html = self.fetcher.fetch_raw(url, false).await?;
        let doc = Html::parse_document(&html);
        Ok(extract::novel_details(&doc, &self.decoder, url))
    }

    /// Absolute chapter URLs listed on the novel page.
    pub async fn get_chapter_list(&self, novel_url: &str) -> Result<Vec<String>> {
        let html = self.fetcher.fetch_raw(novel_url, false).await?;
        let doc = Html::parse_document(&html);
        Ok(extract::chapter_links(&doc, &self.decoder))
    }

    /// A single chapter. Chapter pages are served from the content cache when fresh.
    pub async fn get_chapter(&self, chapter_url: &str) -> Result<ScrapedChapter> {
        let html = self
            .fetcher
            .fetch_page(
                chapter_url,
                true,
                Some(&self.decoder.selectors.chapter.content),
            )
            .await?;
        let doc = Html::parse_document(&html);
        Ok(extract::chapter_details(&doc, &self.decoder, chapter_url))
    }

    /// Scrape a novel and every chapter it lists.
    pub async fn scrape_all_chapters(
        &self,
        novel_url: &str,
        on_progress: Option<ProgressCallback<'_>>,
    ) -> Result<BatchResult> {
        BatchOrchestrator::new(self).run(novel_url, on_progress).await
    }
}
