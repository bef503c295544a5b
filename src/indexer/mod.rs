use std::fmt;
use std::ops::RangeInclusive;

use thiserror::Error;
use tracing::{debug, info, warn};

pub mod schema;
pub mod store;

use crate::crawler::Crawler;
use crate::crawler::fetcher::FetchError;
use self::store::IndexStore;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("unable to get latest comic number: {0}")]
    Latest(#[source] FetchError),
}

/// Which comics an indexing run should cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// The `n` most recently published comics.
    Latest(u32),
    /// Every published comic.
    All,
}

impl Window {
    /// Parses the `index` argument. Anything that is not `all` or a positive count indexes the latest comic only.
    pub fn parse(arg: &str) -> Self {
        if arg == "all" {
            return Window::All;
        }
        match arg.trim().parse::<i64>() {
            Ok(n) if n >= 1 => Window::Latest(u32::try_from(n).unwrap_or(u32::MAX)),
            _ => {
                warn!("invalid value for index: '{}', indexing the latest comic only", arg);
                Window::Latest(1)
            }
        }
    }

    /// The comic numbers covered, given the number of the latest comic.
    pub fn range(self, latest: u32) -> RangeInclusive<u32> {
        match self {
            Window::All => 1..=latest,
            Window::Latest(n) => {
                let lower = latest.saturating_sub(n.saturating_sub(1)).max(1);
                lower..=latest
            }
        }
    }
}

impl Default for Window {
    fn default() -> Self {
        Window::Latest(1)
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Window::All => write!(f, "all"),
            Window::Latest(n) => write!(f, "latest {}", n),
        }
    }
}

/// What an indexing run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub latest: u32,
    pub fetched: usize,
    pub skipped: usize,
    pub failed: Vec<u32>,
}

/// Fills an [`IndexStore`] with the comics of a [`Window`] that are not indexed yet.
pub struct Indexer {
    crawler: Crawler,
}

impl Indexer {
    pub fn new(crawler: Crawler) -> Self {
        Self { crawler }
    }

    pub async fn run(&self, window: Window, store: &mut IndexStore) -> Result<IndexReport, IndexError> {
        let latest_comic = self.crawler.fetch_one(0).await.map_err(IndexError::Latest)?;
        let latest = latest_comic.num;
        info!("Latest comic is {}, indexing {}", latest, window);

        let mut report = IndexReport {
            latest,
            ..Default::default()
        };

        // Decide everything to fetch up front, so each missing id is requested exactly once.
        let mut pending = Vec::new();
        for num in window.range(latest).rev() {
            if store.contains(num) {
                debug!("Comic {} already indexed.", num);
                report.skipped += 1;
            } else if num == latest {
                // Already have it from the lookup above.
                if store.insert(latest_comic.clone()) {
                    info!("Indexed comic {}", num);
                    report.fetched += 1;
                }
            } else {
                pending.push(num);
            }
        }

        if !pending.is_empty() {
            info!("Fetching {} comics...", pending.len());
        }

        for (num, result) in self.crawler.fetch_all(pending).await {
            match result {
                Ok(comic) => {
                    if comic.num != num {
                        warn!("Asked for comic {} but got comic {}", num, comic.num);
                    }
                    let got = comic.num;
                    if store.insert(comic) {
                        debug!("Indexed comic {}", got);
                        report.fetched += 1;
                    }
                }
                Err(e) => {
                    warn!("Unable to get comic: {}", e);
                    report.failed.push(num);
                }
            }
        }

        Ok(report)
    }
}
