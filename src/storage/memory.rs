//! In-memory storage implementation
//!
//! A key-value visited store with no durability. Useful for tests and
//! one-off crawls where nothing should touch disk.

use crate::storage::traits::{StorageResult, VisitedStore};
use std::collections::{HashMap, HashSet};

/// Visited store backed by a `HashMap<url, depth>`
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    records: HashMap<String, u32>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VisitedStore for MemoryStorage {
    fn record_if_absent(&mut self, urls: &HashSet<String>, depth: u32) -> StorageResult<usize> {
        let mut inserted = 0;
        for url in urls {
            if !self.records.contains_key(url) {
                self.records.insert(url.clone(), depth);
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn contains(&self, urls: &HashSet<String>) -> StorageResult<HashSet<String>> {
        Ok(urls
            .iter()
            .filter(|url| self.records.contains_key(*url))
            .cloned()
            .collect())
    }

    fn all_known(&self) -> StorageResult<HashSet<String>> {
        Ok(self.records.keys().cloned().collect())
    }

    fn depth_of(&self, url: &str) -> StorageResult<Option<u32>> {
        Ok(self.records.get(url).copied())
    }

    fn count(&self) -> StorageResult<u64> {
        Ok(self.records.len() as u64)
    }

    fn clear(&mut self) -> StorageResult<()> {
        self.records.clear();
        Ok(())
    }
}
