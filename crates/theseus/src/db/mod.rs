//! `SQLite` storage layer for Theseus.
//!
//! This module manages the `SQLite` database that stores ingested occurrence
//! records and the persisted dependency-edge relation built from them.
//! `SQLite` is the source of truth for all persistent data.
//!
//! ## Module Structure
//!
//! - `schema` - Database schema (DDL)
//! - `helpers` - Row conversion utilities
//! - `occurrences` - Occurrence CRUD operations (`OccurrenceSource` impl)
//! - `edges` - Dependency edge operations (`EdgeStore` impl)

mod edges;
mod helpers;
mod occurrences;
mod schema;

pub use occurrences::OccurrenceData;

pub(crate) use helpers::{encode_ancestors, row_to_occurrence, OCCURRENCES_COLUMNS};
pub(crate) use schema::SCHEMA;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::Connection;

use crate::error::{Error, Result};
use crate::types::StoreStats;

/// `SQLite` database wrapper for the Theseus index.
///
/// The connection is wrapped in a `Mutex` to allow sharing across graph
/// operations while maintaining thread safety.
pub struct Store {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl Store {
    /// Open or create the index database.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // WAL keeps readers unblocked while a build transaction replaces an
        // edge set; foreign keys enforce edge -> occurrence integrity.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
        })
    }

    /// Path of the underlying database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquire the connection lock.
    ///
    /// Returns a `MutexGuard` providing exclusive access to the underlying
    /// connection. Used internally by all database operations.
    pub(crate) fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            Error::Internal(format!(
                "database connection mutex poisoned (a thread panicked while holding the lock): {e}"
            ))
        })
    }

    /// Delete the database file and reopen with a fresh schema.
    ///
    /// Handles schema changes by removing the file entirely and recreating
    /// it, rather than just deleting rows (which would leave an outdated
    /// schema in place). The old connection is replaced with an in-memory
    /// placeholder before deletion to release `SQLite` file locks.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be deleted or the database cannot
    /// be reopened; in the latter case the store holds the in-memory
    /// placeholder until the next successful reset.
    pub fn reset(&mut self) -> Result<()> {
        tracing::info!(path = %self.path.display(), "Resetting index database");

        // Swap the file-backed connection for an in-memory placeholder to
        // release SQLite file locks before deleting the database file.
        // NOTE: `&mut self` is load-bearing here: it guarantees exclusive
        // access so no other thread can use the connection between the swap
        // and the file deletion.
        let placeholder = Connection::open_in_memory()?;
        {
            let mut conn = self.connection()?;
            *conn = placeholder;
        }

        Self::remove_file_if_exists(&self.path)?;

        // WAL sidecars are named by appending to the full file name.
        let mut wal_path = self.path.as_os_str().to_owned();
        wal_path.push("-wal");
        Self::remove_file_if_exists(Path::new(&wal_path))?;
        let mut shm_path = self.path.as_os_str().to_owned();
        shm_path.push("-shm");
        Self::remove_file_if_exists(Path::new(&shm_path))?;

        match Self::open(&self.path) {
            Ok(new) => {
                *self = new;
                tracing::debug!(path = %self.path.display(), "Database reset complete");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to reopen database after reset; \
                     store holds an in-memory placeholder until next successful reset"
                );
                Err(e)
            }
        }
    }

    fn remove_file_if_exists(path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to delete {}: {e}", path.display()),
            ))),
        }
    }

    /// Get the current unix timestamp in nanoseconds.
    ///
    /// Returns an error if the system time is before the Unix epoch, which
    /// would break ingestion timestamps.
    // u128 nanoseconds won't exceed i64::MAX until year 2262
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub(crate) fn now_ns() -> Result<i64> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as i64)
            .map_err(|e| {
                Error::Internal(format!(
                    "System clock is before Unix epoch: {e}. Fix system time before ingesting."
                ))
            })
    }

    /// Get statistics about the database contents.
    ///
    /// # Errors
    ///
    /// Returns an error if any count query fails.
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.connection()?;

        let project_count: usize = conn.query_row(
            "SELECT COUNT(DISTINCT project_id) FROM occurrences",
            [],
            |row| row.get(0),
        )?;
        let occurrence_count: usize =
            conn.query_row("SELECT COUNT(*) FROM occurrences", [], |row| row.get(0))?;
        let edge_count: usize =
            conn.query_row("SELECT COUNT(*) FROM dependency_edges", [], |row| row.get(0))?;
        // The sentinel is a named enum case in the persisted JSON, so a plain
        // substring match is exact.
        let direct_declaration_count: usize = conn.query_row(
            "SELECT COUNT(*) FROM occurrences WHERE ancestors LIKE '%\"direct_declaration\"%'",
            [],
            |row| row.get(0),
        )?;

        Ok(StoreStats {
            project_count,
            occurrence_count,
            edge_count,
            direct_declaration_count,
        })
    }

    /// Update `SQLite` query planner statistics.
    ///
    /// Should be called after bulk data changes (ingest of a large report)
    /// so the query planner can make better index-selection decisions.
    ///
    /// # Errors
    ///
    /// Returns an error if the `ANALYZE` statement fails.
    pub fn analyze(&self) -> Result<()> {
        let conn = self.connection()?;

        conn.execute_batch("ANALYZE")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    pub(crate) fn temp_db() -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("should create temp directory");
        let path = dir.path().join("test.db");
        (dir, path)
    }

    #[test]
    fn open_creates_database_and_schema() {
        let (_dir, path) = temp_db();

        let store = Store::open(&path).expect("failed to open database");
        let conn = store.connection().expect("should get connection");

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"occurrences".to_string()));
        assert!(tables.contains(&"dependency_edges".to_string()));
    }

    #[test]
    fn stats_on_empty_database_are_zero() {
        let (_dir, path) = temp_db();
        let store = Store::open(&path).unwrap();

        let stats = store.stats().expect("stats should succeed");
        assert_eq!(stats.project_count, 0);
        assert_eq!(stats.occurrence_count, 0);
        assert_eq!(stats.edge_count, 0);
        assert_eq!(stats.direct_declaration_count, 0);
    }

    #[test]
    fn reset_discards_data_and_recreates_schema() {
        let (_dir, path) = temp_db();
        let mut store = Store::open(&path).expect("should open database");

        store
            .replace_project_occurrences(
                crate::types::ProjectId::from(1),
                &[crate::db::OccurrenceData {
                    component_name: "rails".to_string(),
                    version: "7.0.0".to_string(),
                    input_file_path: "Gemfile.lock".to_string(),
                    ancestors: vec![],
                }],
            )
            .expect("should insert");
        assert_eq!(store.stats().unwrap().occurrence_count, 1);

        store.reset().expect("reset should succeed");

        let stats = store.stats().expect("stats after reset should succeed");
        assert_eq!(stats.occurrence_count, 0);
        assert!(path.exists(), "database file should be recreated");

        // Schema survives: new data can be written.
        store
            .replace_project_occurrences(
                crate::types::ProjectId::from(2),
                &[crate::db::OccurrenceData {
                    component_name: "rack".to_string(),
                    version: "2.2.8".to_string(),
                    input_file_path: "Gemfile.lock".to_string(),
                    ancestors: vec![],
                }],
            )
            .expect("should insert after reset");
    }

    #[test]
    fn open_is_reentrant() {
        let (_dir, path) = temp_db();

        // Opening twice must not fail on an existing schema.
        let first = Store::open(&path).expect("first open");
        drop(first);
        Store::open(&path).expect("second open");
    }
}
