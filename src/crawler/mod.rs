use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error};

pub mod fetcher;
use fetcher::{ComicSource, FetchError};

use crate::indexer::schema::Comic;

/// The outcome of fetching one comic.
pub type FetchResult = (u32, Result<Comic, FetchError>);

/// Fetches batches of comics with a bounded number of requests in flight.
#[derive(Clone)]
pub struct Crawler {
    source: Arc<dyn ComicSource>,
    concurrency: usize,
}

impl Crawler {
    pub fn new(source: Arc<dyn ComicSource>, concurrency: usize) -> Self {
        Self {
            source,
            concurrency: concurrency.max(1),
        }
    }

    /// Fetches a single comic, `0` being the latest one.
    pub async fn fetch_one(&self, ordinal: u32) -> Result<Comic, FetchError> {
        self.source.fetch(ordinal).await
    }

    /// Fetches every id in `ids`. A failed fetch never cancels the others;
    /// each id gets its own result, returned in descending id order.
    pub async fn fetch_all(&self, ids: Vec<u32>) -> Vec<FetchResult> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set = JoinSet::new();
        let mut results = Vec::with_capacity(ids.len());

        for id in ids {
            let source = Arc::clone(&self.source);
            let semaphore = Arc::clone(&semaphore);

            join_set.spawn(async move {
                // The semaphore is never closed, so acquiring only fails if that changes.
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return None,
                };
                debug!("Getting comic {}...", id);
                Some((id, source.fetch(id).await))
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(e) => error!("Fetch task failed: {}", e),
            }
        }

        results.sort_by(|a, b| b.0.cmp(&a.0));
        results
    }
}
