use serde::Deserialize;

/// Default number of concurrent page fetches
pub const DEFAULT_FETCH_CONCURRENCY: usize = 8;

/// Default origin that relative article links are resolved against
pub const DEFAULT_BASE_ORIGIN: &str = "https://en.wikipedia.org";

/// Main configuration structure for Wiki-Crawler
///
/// Every section is optional; a missing config file is equivalent to
/// `Config::default()`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub http: HttpConfig,
    pub storage: StorageConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of fetches in flight at once
    #[serde(rename = "fetch-concurrency")]
    pub fetch_concurrency: usize,

    /// Maximum number of pages parsed at once
    #[serde(rename = "parse-workers")]
    pub parse_workers: usize,

    /// Origin used to resolve `/wiki/...` links into absolute URLs
    #[serde(rename = "base-origin")]
    pub base_origin: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            parse_workers: default_parse_workers(),
            base_origin: DEFAULT_BASE_ORIGIN.to_string(),
        }
    }
}

/// Parsing is CPU-bound, so the pool is sized to the machine
fn default_parse_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Total request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("WikiCrawler/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// Visited store configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "wiki_crawler.db".to_string(),
        }
    }
}
