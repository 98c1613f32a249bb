//! Crawler module for fetching pages and expanding the frontier
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching on a bounded pool of async tasks
//! - HTML link extraction on a bounded pool of blocking workers
//! - The depth-by-depth crawl loop and its dedup against the visited store

mod coordinator;
mod fetcher;
mod parser;

pub use coordinator::{CrawlReport, Crawler, Termination};
pub use fetcher::{build_http_client, Fetch, FetchError, FetchStage, HttpFetcher, PageContent};
pub use parser::{
    is_article_path, ExtractLinks, LinkExtractor, ParseStage, ARTICLE_PREFIX, MEDIA_EXTENSIONS,
};

use crate::config::Config;
use crate::storage::VisitedStore;
use crate::CrawlError;
use std::sync::Arc;
use tokio::sync::watch;

/// Shared flag asking a running crawl to stop
///
/// The crawl loop checks it between depths. The worker pools stop issuing
/// tasks once it is set and abort the ones still in flight, so an
/// interrupted batch is abandoned rather than drained.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<watch::Sender<bool>>);

impl Default for CancelHandle {
    fn default() -> Self {
        let (sender, _) = watch::channel(false);
        Self(Arc::new(sender))
    }
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once `cancel` has been called, immediately if it already was
    pub async fn cancelled(&self) {
        let mut receiver = self.0.subscribe();
        // The sender lives in `self`, so the channel cannot close here
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

/// Builds a crawler that fetches over HTTP
///
/// # Arguments
///
/// * `config` - The full crawler configuration
/// * `store` - The visited store to deduplicate against
///
/// # Returns
///
/// * `Ok(Crawler)` - Ready to crawl
/// * `Err(CrawlError)` - The HTTP client or base origin was invalid
///
/// # Example
///
/// ```no_run
/// use std::collections::HashSet;
/// use wiki_crawler::config::Config;
/// use wiki_crawler::crawler::http_crawler;
/// use wiki_crawler::storage::MemoryStorage;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut crawler = http_crawler(&Config::default(), MemoryStorage::new())?;
/// let seeds = HashSet::from(["https://en.wikipedia.org/wiki/Rust".to_string()]);
/// crawler.crawl(seeds, 2).await?;
/// # Ok(())
/// # }
/// ```
pub fn http_crawler<S: VisitedStore>(
    config: &Config,
    store: S,
) -> Result<Crawler<HttpFetcher, S>, CrawlError> {
    let fetcher = HttpFetcher::from_config(&config.http)?;
    Crawler::new(config.crawler.clone(), fetcher, store)
}
