//! Error types for Theseus operations.
//!
//! ## Error Philosophy
//!
//! Theseus follows a "best effort" approach for dependency data:
//! - A dangling or malformed ancestor reference shouldn't prevent resolving
//!   the rest of the graph; it simply produces no edge
//! - Only infrastructure failures (database, I/O) cause early termination
//! - An operation never returns partial results plus an error; it is
//!   all-or-nothing per call

use thiserror::Error;

/// Result type for Theseus operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for Theseus operations.
///
/// These errors represent infrastructure failures that prevent the operation
/// from completing. Data-quality gaps in ingested dependency metadata are
/// not errors; they degrade to omitted edges.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// SBOM report file could not be parsed
    #[error("report error: {0}")]
    Report(String),

    /// A requested record does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal invariant violated (bug or database corruption)
    #[error("internal error: {0}")]
    Internal(String),
}
