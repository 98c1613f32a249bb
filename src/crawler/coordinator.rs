//! Crawl coordinator - depth-by-depth orchestration
//!
//! Each iteration of the crawl loop:
//! 1. Records the frontier in the visited store at the current depth
//! 2. Stops if the depth budget is spent
//! 3. Fetches every frontier page on the fetch pool
//! 4. Extracts candidate links on the parse pool
//! 5. Subtracts everything the store already knows to get the next frontier
//!
//! Every depth is a full barrier, and only the coordinator touches the store.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{Fetch, FetchStage};
use crate::crawler::parser::{LinkExtractor, ParseStage};
use crate::crawler::CancelHandle;
use crate::storage::VisitedStore;
use crate::CrawlError;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Why a crawl stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// No unvisited URLs were left to expand
    FrontierExhausted,
    /// The deepest allowed level was recorded
    MaxDepthReached,
    /// A cancellation was observed between iterations
    Cancelled,
}

/// Summary of a finished crawl
///
/// The visited store holds the actual output; this is bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub termination: Termination,

    /// Deepest level whose frontier was recorded (0 if none was)
    pub deepest_level: u32,

    /// URLs newly added to the store by this crawl
    pub urls_recorded: usize,
}

/// State of one crawl invocation
#[derive(Debug)]
struct CrawlRun {
    depth: u32,
    max_depth: u32,
    frontier: HashSet<String>,
}

impl CrawlRun {
    fn new(seeds: HashSet<String>, max_depth: u32) -> Self {
        Self {
            depth: 1,
            max_depth,
            frontier: seeds,
        }
    }

    fn at_max_depth(&self) -> bool {
        self.depth >= self.max_depth
    }

    fn advance(&mut self, next_frontier: HashSet<String>) {
        self.frontier = next_frontier;
        self.depth += 1;
    }
}

/// Depth-bounded breadth-first crawler
pub struct Crawler<F, S> {
    config: CrawlerConfig,
    fetcher: Arc<F>,
    extractor: Arc<LinkExtractor>,
    store: S,
    cancel: CancelHandle,
}

impl<F: Fetch, S: VisitedStore> Crawler<F, S> {
    /// Creates a new crawler
    ///
    /// # Arguments
    ///
    /// * `config` - Pool sizes and the base origin for link resolution
    /// * `fetcher` - Network collaborator
    /// * `store` - Visited store the crawl deduplicates against
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to crawl
    /// * `Err(CrawlError)` - The base origin is not a valid URL
    pub fn new(config: CrawlerConfig, fetcher: F, store: S) -> Result<Self, CrawlError> {
        let extractor = LinkExtractor::new(&config.base_origin)?;
        Ok(Self {
            config,
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(extractor),
            store,
            cancel: CancelHandle::default(),
        })
    }

    /// Handle that stops the crawl at the next iteration boundary
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Crawls breadth-first from `seeds` down to `max_depth`
    ///
    /// Seeds are recorded at depth 1. A store failure aborts the crawl with
    /// an error; fetch and parse failures only shrink the next frontier.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The crawl terminated normally or was cancelled
    /// * `Err(CrawlError)` - Invalid arguments or a store failure
    pub async fn crawl(
        &mut self,
        seeds: HashSet<String>,
        max_depth: u32,
    ) -> Result<CrawlReport, CrawlError> {
        if max_depth < 1 {
            return Err(CrawlError::InvalidRequest(
                "max depth must be at least 1".to_string(),
            ));
        }
        if seeds.is_empty() {
            return Err(CrawlError::InvalidRequest(
                "at least one seed URL is required".to_string(),
            ));
        }

        let fetch_stage = FetchStage::new(
            Arc::clone(&self.fetcher),
            self.config.fetch_concurrency,
            self.cancel.clone(),
        );
        let parse_stage = ParseStage::new(
            Arc::clone(&self.extractor),
            self.config.parse_workers,
            self.cancel.clone(),
        );

        let start_time = Instant::now();
        let mut run = CrawlRun::new(seeds, max_depth);
        let mut deepest_level = 0;
        let mut urls_recorded = 0;

        let termination = loop {
            if self.cancel.is_cancelled() {
                tracing::info!("Crawl cancelled before depth {}", run.depth);
                break Termination::Cancelled;
            }

            if run.frontier.is_empty() {
                tracing::info!("Frontier is empty at depth {}, crawl complete", run.depth);
                break Termination::FrontierExhausted;
            }

            let recorded = self
                .store
                .record_if_absent(&run.frontier, run.depth)
                .map_err(|e| {
                    tracing::error!("Failed to record depth {}: {}", run.depth, e);
                    e
                })?;
            urls_recorded += recorded;
            deepest_level = run.depth;

            tracing::info!(
                "Depth {}: {} URLs in frontier, {} newly recorded",
                run.depth,
                run.frontier.len(),
                recorded
            );

            if run.at_max_depth() {
                tracing::info!("Reached max depth {}", run.max_depth);
                break Termination::MaxDepthReached;
            }

            let pages = fetch_stage.fetch_all(&run.frontier).await;
            tracing::debug!(
                "Depth {}: fetched {}/{} pages",
                run.depth,
                pages.len(),
                run.frontier.len()
            );

            let candidates = parse_stage.extract_all(pages).await;
            let next_frontier = self.unvisited(candidates)?;
            tracing::debug!(
                "Depth {}: {} unvisited URLs for the next level",
                run.depth,
                next_frontier.len()
            );

            run.advance(next_frontier);
        };

        tracing::info!(
            "Crawl finished ({:?}): {} URLs recorded down to depth {} in {:?}",
            termination,
            urls_recorded,
            deepest_level,
            start_time.elapsed()
        );

        Ok(CrawlReport {
            termination,
            deepest_level,
            urls_recorded,
        })
    }

    /// Removes every candidate the store already holds, at any depth
    fn unvisited(&self, mut candidates: HashSet<String>) -> Result<HashSet<String>, CrawlError> {
        let known = self.store.contains(&candidates).map_err(|e| {
            tracing::error!("Failed to read visited store: {}", e);
            e
        })?;
        candidates.retain(|url| !known.contains(url));
        Ok(candidates)
    }
}
