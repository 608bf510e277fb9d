//! Whole-novel scrapes with bounded concurrency and partial-failure tolerance.

use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;
use tracing::{info, warn};

use super::source::Source;
use crate::error::Result;
use crate::models::{BatchResult, ChapterFailure, ProgressCallback, ScraperProgress};

/// Runs a full scrape of one novel through a [`Source`].
pub struct BatchOrchestrator<'a> {
    source: &'a Source,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(source: &'a Source) -> Self {
        Self { source }
    }

    /// Fetch metadata and the chapter list, then every chapter.
    ///
    /// Only the metadata and chapter-list fetches can fail the batch. Chapter
    /// failures are counted, logged and returned in `failures`. Chapters come
    /// back sorted by chapter number whatever order they finished in.
    pub async fn run(
        &self,
        novel_url: &str,
        on_progress: Option<ProgressCallback<'_>>,
    ) -> Result<BatchResult> {
        let source = self.source;
        let novel = source.get_novel(novel_url).await?;
        let urls = source.get_chapter_list(novel_url).await?;

        let total = urls.len();
        info!(
            "[{}] scraping {} chapters of {:?} (max {} at once)",
            source.id(),
            total,
            novel.title,
            source.limiter().max_concurrency()
        );

        let completed = AtomicUsize::new(0);
        let errors = AtomicUsize::new(0);

        let tasks = urls.iter().map(|url| {
            let completed = &completed;
            let errors = &errors;
            async move {
                let result = source.limiter().run(source.get_chapter(url)).await;
                let (outcome, current) = match result {
                    Ok(chapter) => {
                        completed.fetch_add(1, Ordering::SeqCst);
                        let label = format!("Chapter {}", chapter.chapter_number);
                        (Ok(chapter), Some(label))
                    }
                    Err(e) => {
                        errors.fetch_add(1, Ordering::SeqCst);
                        warn!("Failed to scrape chapter {}: {}", url, e);
                        let failure = ChapterFailure {
                            url: url.clone(),
                            error: e.to_string(),
                        };
                        (Err(failure), None)
                    }
                };

                if let Some(callback) = on_progress {
                    callback(ScraperProgress {
                        total,
                        completed: completed.load(Ordering::SeqCst),
                        current,
                        errors: errors.load(Ordering::SeqCst),
                    });
                }
                outcome
            }
        });

        // join_all keeps results in URL-list order
        let mut chapters = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for outcome in join_all(tasks).await {
            match outcome {
                Ok(chapter) => chapters.push(chapter),
                Err(failure) => failures.push(failure),
            }
        }
        chapters.sort_by_key(|c| c.chapter_number);

        info!(
            "[{}] finished {:?}: {} chapters, {} failed",
            source.id(),
            novel.title,
            chapters.len(),
            failures.len()
        );

        Ok(BatchResult {
            novel,
            chapters,
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::error::ScrapeError;
    use crate::models::ScraperProgress;
    use crate::scrapers::cache::ContentCache;
    use crate::scrapers::config::ScraperOptions;
    use crate::scrapers::decoder::DecoderTable;
    use crate::scrapers::page::testing::FakePageAccess;
    use crate::scrapers::source::Source;

    const NOVEL: &str = "https://novelbin.com/b/test-novel";

    fn novel_page(chapters: &[&str]) -> String {
        let links: String = chapters
            .iter()
            .map(|href| format!(r#"<li><a href="{}">c</a></li>"#, href))
            .collect();
        format!(
            r#"<h3 class="title">Test Novel</h3><ul id="list-chapter">{}</ul>"#,
            links
        )
    }

    fn chapter_page(n: u32) -> String {
        format!(
            r#"<h2>Chapter {n}</h2><div id="chr-content"><p>Body {n}</p></div>"#
        )
    }

    fn source(access: &FakePageAccess, max_concurrency: usize) -> Source {
        let decoder = DecoderTable::builtin().unwrap().get("novelbin").unwrap();
        let options = ScraperOptions::default()
            .with_max_concurrency(max_concurrency)
            .with_retry(2, Duration::from_millis(100))
            .with_page_access(Arc::new(access.clone()));
        Source::new(decoder, &options, Arc::new(ContentCache::new())).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_chapters_sorted_regardless_of_completion_order() {
        // Listed as 3, 1, 2; chapter 2 finishes first, then 3, then 1.
        let access = FakePageAccess::new()
            .with_page(
                NOVEL,
                &novel_page(&["/b/test-novel/chapter-3", "/b/test-novel/chapter-1", "/b/test-novel/chapter-2"]),
            )
            .with_delayed_page(
                "https://novelbin.com/b/test-novel/chapter-3",
                &chapter_page(3),
                Duration::from_millis(200),
            )
            .with_delayed_page(
                "https://novelbin.com/b/test-novel/chapter-1",
                &chapter_page(1),
                Duration::from_millis(300),
            )
            .with_delayed_page(
                "https://novelbin.com/b/test-novel/chapter-2",
                &chapter_page(2),
                Duration::from_millis(100),
            );
        let source = source(&access, 3);

        let progress = Mutex::new(Vec::new());
        let record = |p: ScraperProgress| progress.lock().unwrap().push(p);
        let result = source.scrape_all_chapters(NOVEL, Some(&record)).await.unwrap();

        let numbers: Vec<u32> = result.chapters.iter().map(|c| c.chapter_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(result.novel.title, "Test Novel");
        assert!(result.failures.is_empty());

        let labels: Vec<Option<String>> = progress
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.current.clone())
            .collect();
        assert_eq!(
            labels,
            vec![
                Some("Chapter 2".to_string()),
                Some("Chapter 3".to_string()),
                Some("Chapter 1".to_string())
            ]
        );
        assert_eq!(access.open_pages(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_failures_are_collected_not_thrown() {
        let hrefs: Vec<String> = (1..=5).map(|n| format!("/b/test-novel/chapter-{n}")).collect();
        let href_refs: Vec<&str> = hrefs.iter().map(String::as_str).collect();

        let mut access = FakePageAccess::new().with_page(NOVEL, &novel_page(&href_refs));
        for n in [1, 3, 5] {
            access = access.with_page(
                &format!("https://novelbin.com/b/test-novel/chapter-{n}"),
                &chapter_page(n),
            );
        }
        access = access
            .with_failure("https://novelbin.com/b/test-novel/chapter-2")
            .with_failure("https://novelbin.com/b/test-novel/chapter-4");
        let source = source(&access, 2);

        let progress = Mutex::new(Vec::new());
        let record = |p: ScraperProgress| progress.lock().unwrap().push(p);
        let result = source.scrape_all_chapters(NOVEL, Some(&record)).await.unwrap();

        let numbers: Vec<u32> = result.chapters.iter().map(|c| c.chapter_number).collect();
        assert_eq!(numbers, vec![1, 3, 5]);

        let mut failed: Vec<&str> = result.failures.iter().map(|f| f.url.as_str()).collect();
        failed.sort();
        assert_eq!(
            failed,
            vec![
                "https://novelbin.com/b/test-novel/chapter-2",
                "https://novelbin.com/b/test-novel/chapter-4"
            ]
        );

        let progress = progress.lock().unwrap();
        assert_eq!(progress.len(), 5);
        let last = progress.last().unwrap();
        assert_eq!(last.total, 5);
        assert_eq!(last.completed, 3);
        assert_eq!(last.errors, 2);

        // each failing chapter used its full retry budget
        assert_eq!(
            access.navigations("https://novelbin.com/b/test-novel/chapter-2"),
            2
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_respects_concurrency_limit() {
        let hrefs: Vec<String> = (1..=6).map(|n| format!("/b/test-novel/chapter-{n}")).collect();
        let href_refs: Vec<&str> = hrefs.iter().map(String::as_str).collect();

        let mut access = FakePageAccess::new().with_page(NOVEL, &novel_page(&href_refs));
        for n in 1..=6 {
            access = access.with_delayed_page(
                &format!("https://novelbin.com/b/test-novel/chapter-{n}"),
                &chapter_page(n),
                Duration::from_millis(50),
            );
        }
        let source = source(&access, 2);

        let start = tokio::time::Instant::now();
        let result = source.scrape_all_chapters(NOVEL, None).await.unwrap();

        assert_eq!(result.chapters.len(), 6);
        // six 50ms chapters, two at a time
        assert!(start.elapsed() >= Duration::from_millis(150));
        assert_eq!(source.limiter().available(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chapter_list_failure_fails_batch() {
        let access = FakePageAccess::new().with_failure(NOVEL);
        let source = source(&access, 3);

        let err = source.scrape_all_chapters(NOVEL, None).await.unwrap_err();

        assert!(matches!(err, ScrapeError::FetchExhausted { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_chapter_list() {
        let access = FakePageAccess::new().with_page(NOVEL, &novel_page(&[]));
        let source = source(&access, 3);

        let result = source.scrape_all_chapters(NOVEL, None).await.unwrap();

        assert!(result.chapters.is_empty());
        assert!(result.failures.is_empty());
    }
}
