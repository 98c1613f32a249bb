//! Storage traits and error types
//!
//! This module defines the visited-store contract the crawl engine depends on
//! and the error type shared by every backend.

use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable ledger of every URL the crawl has recorded
///
/// The store maps each URL to the depth at which it was first recorded.
/// It is the single source of truth for "has this URL been processed", so
/// implementations must honor two rules:
///
/// - `record_if_absent` never overwrites the depth of an existing record.
/// - Recording an already-known URL is a no-op, not an error.
pub trait VisitedStore {
    /// Records every URL in `urls` at `depth` unless it is already known
    ///
    /// The write is all-or-nothing per call.
    ///
    /// # Returns
    ///
    /// The number of URLs that were newly recorded
    fn record_if_absent(&mut self, urls: &HashSet<String>, depth: u32) -> StorageResult<usize>;

    /// Returns the subset of `urls` that is already recorded
    fn contains(&self, urls: &HashSet<String>) -> StorageResult<HashSet<String>>;

    /// Returns every recorded URL
    fn all_known(&self) -> StorageResult<HashSet<String>>;

    /// Gets the first-seen depth of a URL, if recorded
    fn depth_of(&self, url: &str) -> StorageResult<Option<u32>>;

    /// Counts recorded URLs
    fn count(&self) -> StorageResult<u64>;

    /// Removes every record, resetting the store for a fresh crawl
    fn clear(&mut self) -> StorageResult<()>;
}

impl<S: VisitedStore + ?Sized> VisitedStore for &mut S {
    fn record_if_absent(&mut self, urls: &HashSet<String>, depth: u32) -> StorageResult<usize> {
        (**self).record_if_absent(urls, depth)
    }

    fn contains(&self, urls: &HashSet<String>) -> StorageResult<HashSet<String>> {
        (**self).contains(urls)
    }

    fn all_known(&self) -> StorageResult<HashSet<String>> {
        (**self).all_known()
    }

    fn depth_of(&self, url: &str) -> StorageResult<Option<u32>> {
        (**self).depth_of(url)
    }

    fn count(&self) -> StorageResult<u64> {
        (**self).count()
    }

    fn clear(&mut self) -> StorageResult<()> {
        (**self).clear()
    }
}
