//! In-memory page access for tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{PageAccess, PageHandle};
use crate::error::{Result, ScrapeError};

#[derive(Default)]
struct Inner {
    pages: HashMap<String, (String, Duration)>,
    failures: HashSet<String>,
    flaky: Mutex<HashMap<String, usize>>,
    created: AtomicUsize,
    open: AtomicUsize,
    navigations: Mutex<Vec<String>>,
}

/// Serves canned markup per URL, optionally delayed or failing.
#[derive(Clone, Default)]
pub(crate) struct FakePageAccess {
    inner: Arc<Inner>,
}

impl FakePageAccess {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner_mut(&mut self) -> &mut Inner {
        Arc::get_mut(&mut self.inner).expect("configure before sharing")
    }

    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.with_delayed_page(url, html, Duration::ZERO)
    }

    pub fn with_delayed_page(mut self, url: &str, html: &str, delay: Duration) -> Self {
        self.inner_mut()
            .pages
            .insert(url.to_string(), (html.to_string(), delay));
        self
    }

    /// Every navigation to `url` fails.
    pub fn with_failure(mut self, url: &str) -> Self {
        self.inner_mut().failures.insert(url.to_string());
        self
    }

    /// The first `times` navigations to `url` fail with a 503.
    pub fn with_flaky(mut self, url: &str, times: usize) -> Self {
        self.inner_mut()
            .flaky
            .get_mut()
            .expect("lock")
            .insert(url.to_string(), times);
        self
    }

    pub fn pages_created(&self) -> usize {
        self.inner.created.load(Ordering::SeqCst)
    }

    pub fn open_pages(&self) -> usize {
        self.inner.open.load(Ordering::SeqCst)
    }

    pub fn navigations(&self, url: &str) -> usize {
        self.inner
            .navigations
            .lock()
            .expect("lock")
            .iter()
            .filter(|u| *u == url)
            .count()
    }
}

#[async_trait]
impl PageAccess for FakePageAccess {
    async fn get_page(&self) -> Result<Box<dyn PageHandle>> {
        self.inner.created.fetch_add(1, Ordering::SeqCst);
        self.inner.open.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakePage {
            inner: self.inner.clone(),
            body: None,
        }))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

struct FakePage {
    inner: Arc<Inner>,
    body: Option<String>,
}

#[async_trait]
impl PageHandle for FakePage {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.inner
            .navigations
            .lock()
            .expect("lock")
            .push(url.to_string());

        if self.inner.failures.contains(url) {
            return Err(ScrapeError::Browser(format!("navigation to {} failed", url)));
        }

        let flaky = {
            let mut flaky = self.inner.flaky.lock().expect("lock");
            match flaky.get_mut(url) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    true
                }
                _ => false,
            }
        };
        if flaky {
            return Err(ScrapeError::HttpStatus {
                url: url.to_string(),
                status: 503,
                status_text: "Service Unavailable".to_string(),
            });
        }

        match self.inner.pages.get(url) {
            Some((html, delay)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(*delay).await;
                }
                self.body = Some(html.clone());
                Ok(())
            }
            None => Err(ScrapeError::HttpStatus {
                url: url.to_string(),
                status: 404,
                status_text: "Not Found".to_string(),
            }),
        }
    }

    async fn wait_for_selector(&mut self, _selector: &str) -> Result<bool> {
        Ok(self.body.is_some())
    }

    async fn content(&mut self) -> Result<String> {
        Ok(self.body.clone().unwrap_or_default())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.inner.open.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}
