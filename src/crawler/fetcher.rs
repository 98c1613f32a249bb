//! HTTP fetcher and the fetch stage
//!
//! This module handles all network I/O for the crawler, including:
//! - The `Fetch` capability the engine depends on
//! - Building the reqwest client with timeouts and a user agent
//! - Error classification (status, transport, timeout, decode)
//! - Running a whole frontier's fetches on a bounded pool of tasks

use crate::config::HttpConfig;
use crate::crawler::CancelHandle;
use reqwest::Client;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Why a single page could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Failed to decode body of {url}: {message}")]
    Decode { url: String, message: String },
}

/// A fetched page, alive for one crawl iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    /// The URL the page was fetched from
    pub url: String,

    /// Raw page text
    pub body: String,
}

/// Retrieves the content of one page
///
/// The crawl engine only ever talks to the network through this trait, so
/// tests can substitute a stub without a server.
pub trait Fetch: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `Fetch` implementation backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Decode {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })
    }
}

fn classify_transport_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Transport {
            url: url.to_string(),
            message: "Connection refused".to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

/// Bounded pool of fetch tasks, created once per crawl run
pub struct FetchStage<F> {
    fetcher: Arc<F>,
    permits: Arc<Semaphore>,
    cancel: CancelHandle,
}

impl<F: Fetch> FetchStage<F> {
    pub fn new(fetcher: Arc<F>, concurrency: usize, cancel: CancelHandle) -> Self {
        Self {
            fetcher,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            cancel,
        }
    }

    /// Fetches every URL, returning the pages that succeeded
    ///
    /// A failing URL is logged and left out; it never stops the others.
    /// If the crawl is cancelled while the batch runs, the fetches still in
    /// flight are aborted and the whole batch is discarded.
    pub async fn fetch_all(&self, urls: &HashSet<String>) -> Vec<PageContent> {
        let mut tasks = JoinSet::new();

        for url in urls {
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return abandon(tasks),
                permit = Arc::clone(&self.permits).acquire_owned() => permit,
            };
            let Ok(permit) = permit else {
                break;
            };
            let fetcher = Arc::clone(&self.fetcher);
            let url = url.clone();

            tasks.spawn(async move {
                let _permit = permit;
                let result = fetcher.fetch(&url).await;
                (url, result)
            });
        }

        let mut pages = Vec::with_capacity(tasks.len());
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
                Ok((url, Ok(body))) => {
                    tracing::debug!("Fetched {} ({} bytes)", url, body.len());
                    pages.push(PageContent { url, body });
                }
                Ok((_, Err(e))) => {
                    tracing::warn!("{}", e);
                }
                Err(e) => {
                    tracing::warn!("Fetch task failed: {}", e);
                }
            }
        }

        pages
    }
}

fn abandon<T: 'static>(mut tasks: JoinSet<T>) -> Vec<PageContent> {
    if !tasks.is_empty() {
        tracing::info!("Cancellation requested, aborting {} in-flight fetches", tasks.len());
    }
    tasks.abort_all();
    Vec::new()
}
