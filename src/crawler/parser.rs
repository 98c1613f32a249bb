//! Link extraction and the parse stage
//!
//! This module turns fetched pages into candidate URLs:
//! - `LinkExtractor` scans `<a href>` elements for wiki article paths
//! - `ParseStage` runs extraction on blocking worker threads, away from the
//!   async workers that drive network I/O

use crate::crawler::{CancelHandle, PageContent};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Only hrefs under this prefix are followed
pub const ARTICLE_PREFIX: &str = "/wiki/";

/// Links mentioning one of these extensions point at media, not articles
pub const MEDIA_EXTENSIONS: &[&str] = &["png", "jpg", "gif", "pdf", "svg", "mp4"];

/// Anything that can pull candidate URLs out of a page
///
/// Implementations must be pure: same input, same output, no I/O.
pub trait ExtractLinks: Send + Sync + 'static {
    fn extract(&self, html: &str) -> HashSet<String>;
}

/// Extracts wiki article links and resolves them against a base origin
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    base: Url,
}

impl LinkExtractor {
    /// Creates an extractor resolving links against `base_origin`
    ///
    /// # Example
    ///
    /// ```
    /// use wiki_crawler::crawler::{ExtractLinks, LinkExtractor};
    ///
    /// let extractor = LinkExtractor::new("https://en.wikipedia.org").unwrap();
    /// let links = extractor.extract(r#"<a href="/wiki/Rust">Rust</a>"#);
    /// assert!(links.contains("https://en.wikipedia.org/wiki/Rust"));
    /// ```
    pub fn new(base_origin: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(base_origin)?,
        })
    }
}

impl ExtractLinks for LinkExtractor {
    fn extract(&self, html: &str) -> HashSet<String> {
        let document = Html::parse_document(html);
        let mut links = HashSet::new();

        let Ok(a_selector) = Selector::parse("a[href]") else {
            return links;
        };

        for element in document.select(&a_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };

            if !is_article_path(href) {
                continue;
            }

            match self.base.join(href) {
                Ok(absolute_url) => {
                    links.insert(absolute_url.to_string());
                }
                Err(e) => {
                    tracing::debug!("Failed to resolve {}: {}", href, e);
                }
            }
        }

        links
    }
}

/// Checks whether an href is a wiki article path
///
/// Matches `/wiki/...` unless the remainder mentions a media extension,
/// e.g. `/wiki/File:Logo.svg`.
pub fn is_article_path(href: &str) -> bool {
    let Some(rest) = href.strip_prefix(ARTICLE_PREFIX) else {
        return false;
    };

    let rest = rest.to_ascii_lowercase();
    !MEDIA_EXTENSIONS
        .iter()
        .any(|ext| rest.contains(&format!(".{}", ext)))
}

/// Bounded pool of CPU-bound extraction workers, created once per crawl run
pub struct ParseStage<E> {
    extractor: Arc<E>,
    permits: Arc<Semaphore>,
    cancel: CancelHandle,
}

impl<E: ExtractLinks> ParseStage<E> {
    pub fn new(extractor: Arc<E>, workers: usize, cancel: CancelHandle) -> Self {
        Self {
            extractor,
            permits: Arc::new(Semaphore::new(workers.max(1))),
            cancel,
        }
    }

    /// Extracts links from every page and returns their union
    ///
    /// A page whose worker fails contributes nothing. On cancellation the
    /// batch is discarded; workers already running finish on their blocking
    /// threads but their results are dropped.
    pub async fn extract_all(&self, pages: Vec<PageContent>) -> HashSet<String> {
        let mut tasks = JoinSet::new();

        for page in pages {
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return abandon(tasks),
                permit = Arc::clone(&self.permits).acquire_owned() => permit,
            };
            let Ok(permit) = permit else {
                break;
            };
            let extractor = Arc::clone(&self.extractor);

            tasks.spawn_blocking(move || {
                let _permit = permit;
                let links = extractor.extract(&page.body);
                (page.url, links)
            });
        }

        let mut candidates = HashSet::new();
        loop {
            let joined = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                joined = tasks.join_next() => Some(joined),
            };
            let Some(joined) = joined else {
                return abandon(tasks);
            };
            let Some(joined) = joined else {
                break;
            };

            match joined {
                Ok((url, links)) => {
                    tracing::debug!("Extracted {} links from {}", links.len(), url);
                    candidates.extend(links);
                }
                Err(e) => {
                    tracing::warn!("Link extraction failed: {}", e);
                }
            }
        }

        candidates
    }
}

fn abandon<T: 'static>(mut tasks: JoinSet<T>) -> HashSet<String> {
    if !tasks.is_empty() {
        tracing::info!("Cancellation requested, dropping {} pending extractions", tasks.len());
    }
    // Blocking workers cannot be interrupted; this only detaches them
    tasks.abort_all();
    HashSet::new()
}
