//! Bounded concurrency for network-bound work.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

/// Caps how many futures run at once. Clones share the same slots.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    max: usize,
}

impl ConcurrencyLimiter {
    /// A limiter with `max` slots. Zero is treated as one.
    pub fn new(max: usize) -> Self {
        let max = max.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max)),
            max,
        }
    }

    /// Run `fut` once a slot is free, holding the slot until it finishes.
    pub async fn run<F, T>(&self, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        // The semaphore is never closed, so acquire only fails if that changes.
        let _permit = self.semaphore.acquire().await.ok();
        fut.await
    }

    pub fn max_concurrency(&self) -> usize {
        self.max
    }

    /// Slots not currently held.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
