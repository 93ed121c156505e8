//! Dependency graph subsystem: edge construction and path resolution.
//!
//! This module hosts the two-stage core of Theseus:
//! - [`GraphBuilder`] converts each occurrence's declared ancestor list into
//!   a persisted directed edge set, scoped to a single manifest file
//! - [`PathResolver`] walks that edge set backwards from a target occurrence
//!   and enumerates every dependency path to a root, tolerating cycles
//!
//! ## Design
//!
//! - Traits define the storage seams ([`OccurrenceSource`], [`EdgeStore`]);
//!   the `SQLite` [`Store`](crate::Store) implements both
//! - The builder owns edge writes; the resolver is a pure read
//! - Both stages are synchronous over already-materialized data

mod builder;
mod paths;

pub use builder::GraphBuilder;
pub use paths::PathResolver;

use crate::error::Result;
use crate::types::{DependencyEdge, Occurrence, OccurrenceId, ProjectId};

/// Read interface over ingested occurrence records.
///
/// The graph subsystem never writes occurrences; ingestion owns them.
pub trait OccurrenceSource: Send + Sync {
    /// Fetch one occurrence by id, with its ancestors list loaded.
    fn get_occurrence(&self, id: OccurrenceId) -> Result<Option<Occurrence>>;

    /// Fetch all of a project's occurrences.
    fn occurrences_for_project(&self, project_id: ProjectId) -> Result<Vec<Occurrence>>;
}

/// Read/write interface over the persisted dependency-edge relation.
///
/// Writes are wholesale per project and atomic; there is no row-level
/// mutation. Only the graph builder writes.
pub trait EdgeStore: Send + Sync {
    /// Atomically replace a project's entire edge set.
    ///
    /// Returns the number of edges written.
    fn replace_project_edges(
        &self,
        project_id: ProjectId,
        edges: &[DependencyEdge],
    ) -> Result<usize>;

    /// All direct parents of an occurrence (edges whose child it is).
    fn parents_of(&self, child_id: OccurrenceId) -> Result<Vec<OccurrenceId>>;

    /// All edges of a project, for prefetching into memory.
    fn edges_for_project(&self, project_id: ProjectId) -> Result<Vec<DependencyEdge>>;
}
