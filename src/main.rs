//! Wiki-Crawler main entry point
//!
//! This is the command-line interface for the Wiki-Crawler.

use clap::Parser;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use wiki_crawler::config::{load_config_or_default, Config};
use wiki_crawler::crawler::http_crawler;
use wiki_crawler::storage::{MemoryStorage, RunStatus, SqliteStorage, VisitedStore};
use wiki_crawler::{CrawlError, CrawlReport, Termination};

/// Wiki-Crawler: a depth-bounded wiki link crawler
///
/// Crawls wiki articles breadth-first from a seed URL and records every
/// distinct URL once, with the depth it was first reached at.
#[derive(Parser, Debug)]
#[command(name = "wiki-crawler")]
#[command(version)]
#[command(about = "A depth-bounded wiki link crawler", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(value_name = "URL")]
    url: String,

    /// Maximum depth; the seed is depth 1
    #[arg(value_name = "MAX_DEPTH", value_parser = clap::value_parser!(u32).range(1..))]
    max_depth: u32,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Keep URLs visited by earlier runs instead of clearing them
    #[arg(long)]
    resume: bool,

    /// Keep the visited set in memory instead of the database
    #[arg(long, conflicts_with = "resume")]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);
    tracing::info!("wiki-crawler started");

    let result = run(&cli).await;

    println!("Work time: {:.2}s", start_time.elapsed().as_secs_f64());

    match result {
        Ok(report) => {
            if report.termination == Termination::Cancelled {
                tracing::info!("wiki-crawler stopped");
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wiki_crawler=info,warn"),
            1 => EnvFilter::new("wiki_crawler=debug,info"),
            2 => EnvFilter::new("wiki_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration and dispatches to the selected store
async fn run(cli: &Cli) -> Result<CrawlReport, CrawlError> {
    let config = load_config_or_default(cli.config.as_deref())?;

    if cli.in_memory {
        crawl(cli, &config, MemoryStorage::new()).await
    } else {
        handle_persistent_crawl(cli, &config).await
    }
}

/// Crawls against the SQLite store and records the run in its ledger
async fn handle_persistent_crawl(cli: &Cli, config: &Config) -> Result<CrawlReport, CrawlError> {
    let path = Path::new(&config.storage.database_path);
    tracing::info!("Opening visited store at {}", path.display());
    let mut storage = SqliteStorage::new(path)?;

    if cli.resume {
        tracing::info!("Resuming with {} previously visited URLs", storage.count()?);
    } else {
        storage.clear()?;
    }

    let run_id = storage.create_run(&cli.url, cli.max_depth)?;
    let result = crawl(cli, config, &mut storage).await;

    let status = match &result {
        Ok(report) if report.termination == Termination::Cancelled => RunStatus::Interrupted,
        Ok(_) => RunStatus::Completed,
        Err(_) => RunStatus::Failed,
    };
    if let Err(e) = storage.finish_run(run_id, status) {
        tracing::warn!("Failed to close run {}: {}", run_id, e);
    }

    result
}

/// Runs the crawl, turning Ctrl-C into a graceful cancellation
async fn crawl<S: VisitedStore>(
    cli: &Cli,
    config: &Config,
    store: S,
) -> Result<CrawlReport, CrawlError> {
    let mut crawler = http_crawler(config, store)?;

    let cancel = crawler.cancel_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, abandoning in-flight work");
            cancel.cancel();
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Second interrupt received, exiting immediately");
            std::process::exit(130);
        }
    });

    let seeds = HashSet::from([cli.url.clone()]);
    let result = crawler.crawl(seeds, cli.max_depth).await;
    interrupt.abort();

    if let Ok(report) = &result {
        tracing::info!(
            "{} URLs recorded, deepest level {}",
            report.urls_recorded,
            report.deepest_level
        );
    }

    result
}
