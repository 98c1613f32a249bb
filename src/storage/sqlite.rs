//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the VisitedStore trait,
//! plus the run ledger that records each crawl invocation.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StorageError, StorageResult, VisitedStore};
use crate::storage::{RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    // ===== Run Management =====

    /// Opens a new crawl run and returns its ID
    pub fn create_run(&mut self, seed_url: &str, max_depth: u32) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (seed_url, max_depth, started_at, status) VALUES (?1, ?2, ?3, ?4)",
            params![seed_url, max_depth, now, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Closes a run with its final status and a finish timestamp
    pub fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    /// Gets a run by ID
    pub fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, seed_url, max_depth, started_at, finished_at, status FROM runs WHERE id = ?1",
                params![run_id],
                |row| {
                    Ok(RunRecord {
                        id: row.get(0)?,
                        seed_url: row.get(1)?,
                        max_depth: row.get(2)?,
                        started_at: row.get(3)?,
                        finished_at: row.get(4)?,
                        status: RunStatus::from_db_string(&row.get::<_, String>(5)?)
                            .unwrap_or(RunStatus::Failed),
                    })
                },
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }
}

impl VisitedStore for SqliteStorage {
    fn record_if_absent(&mut self, urls: &HashSet<String>, depth: u32) -> StorageResult<usize> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            // The UNIQUE(url) constraint turns a rediscovery into a no-op
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO visited_urls (url, depth, recorded_at) VALUES (?1, ?2, ?3)",
            )?;
            for url in urls {
                inserted += stmt.execute(params![url, depth, now])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn contains(&self, urls: &HashSet<String>) -> StorageResult<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT 1 FROM visited_urls WHERE url = ?1")?;

        let mut known = HashSet::new();
        for url in urls {
            if stmt.exists(params![url])? {
                known.insert(url.clone());
            }
        }
        Ok(known)
    }

    fn all_known(&self) -> StorageResult<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT url FROM visited_urls")?;
        let urls = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(urls)
    }

    fn depth_of(&self, url: &str) -> StorageResult<Option<u32>> {
        let depth = self
            .conn
            .query_row(
                "SELECT depth FROM visited_urls WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(depth)
    }

    fn count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM visited_urls", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn clear(&mut self) -> StorageResult<()> {
        self.conn.execute("DELETE FROM visited_urls", [])?;
        Ok(())
    }
}
