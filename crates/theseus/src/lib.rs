//! # Theseus: Dependency Provenance Index
//!
//! Theseus answers "why is this dependency present, and through what
//! chain(s) of other dependencies?" for a software bill of materials. It
//! ingests flat SBOM reports into `SQLite`, materializes a per-manifest
//! dependency-edge relation, and enumerates every chain of requirement from
//! a component instance back to the packages declared directly by the user,
//! including the cycles that real-world dependency metadata contains.
//!
//! ## Design Philosophy
//!
//! - **Projection, not source of truth** - the edge set is always
//!   rebuildable from the ingested occurrence records
//! - **Best effort on data quality** - dangling or malformed ancestor
//!   references degrade to missing edges, never errors
//! - **Cycle tolerant** - requirement loops are reported explicitly, not
//!   worked around
//! - **Embeddable** - library first, CLI second
//!
//! ## Quick Start
//!
//! ```no_run
//! use theseus::{ProjectId, Theseus};
//! use std::path::Path;
//!
//! let theseus = Theseus::open(Path::new("theseus.db"))?;
//!
//! // Ingest an SBOM report and build the project's graph
//! let ingest = theseus.ingest_report_files(&[Path::new("report.json").to_path_buf()])?;
//! println!("{} occurrences ingested", ingest.occurrences_written);
//!
//! // Ask why a component is present
//! let project = ProjectId::from(42);
//! for occurrence in theseus.find_occurrences(project, "rack", None)? {
//!     for path in theseus.find_paths(occurrence.id)? {
//!         println!("{} nodes, cyclic: {}", path.occurrences().len(), path.is_cyclic());
//!     }
//! }
//! # Ok::<(), theseus::Error>(())
//! ```

mod db;
mod error;
mod graph;
mod metrics;
mod report;
mod types;

pub use db::{OccurrenceData, Store};
pub use error::{Error, Result};
pub use graph::{EdgeStore, GraphBuilder, OccurrenceSource, PathResolver};
pub use metrics::{
    LogRecorder, MetricsRecorder, NoopRecorder, PATHS_FOUND_COUNTER, PATH_RESOLUTION_TIMER,
};
pub use report::Report;
pub use types::{
    AncestorRef, BuildStats, DependencyEdge, DependencyPath, IngestStats, Occurrence,
    OccurrenceId, ProjectId, StoreStats,
};

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use tracing::debug;

/// Dependency provenance index.
///
/// `Theseus` is the main entry point. It owns the `SQLite` store and ties
/// together report ingestion, graph construction, and path resolution.
pub struct Theseus {
    store: Store,
    recorder: LogRecorder,
}

impl Theseus {
    /// Open or create an index at the given database path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(db_path: &Path) -> Result<Self> {
        let store = Store::open(db_path)?;
        Ok(Self {
            store,
            recorder: LogRecorder,
        })
    }

    /// Path of the underlying database file.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        self.store.path()
    }

    /// Direct access to the underlying store.
    ///
    /// Useful for embedders that want to drive [`GraphBuilder`] or
    /// [`PathResolver`] with their own wiring (custom metrics recorder,
    /// test doubles, ...).
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Ingest one or more SBOM report files and rebuild the affected graphs.
    ///
    /// Files are parsed in parallel; database writes are sequential. Each
    /// report replaces its project's occurrence records wholesale and the
    /// project's edge set is rebuilt immediately after.
    ///
    /// # Errors
    ///
    /// Returns the first parse or store error encountered; no partial stats
    /// are returned alongside an error.
    pub fn ingest_report_files(&self, paths: &[PathBuf]) -> Result<IngestStats> {
        let started = Instant::now();

        // Parse-parallel, write-sequential: parsing dominates for large
        // reports and has no shared state.
        let reports: Vec<Report> = paths
            .par_iter()
            .map(|path| Report::from_file(path))
            .collect::<Result<Vec<_>>>()?;

        let mut stats = IngestStats::default();
        for report in reports {
            debug!(
                project_id = %report.project_id,
                occurrences = report.occurrences.len(),
                "Ingesting report"
            );
            self.store
                .replace_project_occurrences(report.project_id, &report.occurrences)?;
            GraphBuilder::new(&self.store).build(report.project_id)?;

            stats.reports_ingested += 1;
            stats.occurrences_written += report.occurrences.len();
            stats.malformed_ancestors += report.malformed_ancestors;
        }

        self.store.analyze()?;
        stats.duration = started.elapsed();
        Ok(stats)
    }

    /// (Re)build the persisted edge set for one project.
    ///
    /// # Errors
    ///
    /// Returns an error for store failures.
    pub fn build_graph(&self, project_id: ProjectId) -> Result<BuildStats> {
        GraphBuilder::new(&self.store).build(project_id)
    }

    /// List the projects with ingested occurrences.
    ///
    /// # Errors
    ///
    /// Returns an error for store failures.
    pub fn projects(&self) -> Result<Vec<ProjectId>> {
        self.store.projects()
    }

    /// Look up occurrences of a component within a project.
    ///
    /// # Errors
    ///
    /// Returns an error for store failures.
    pub fn find_occurrences(
        &self,
        project_id: ProjectId,
        component_name: &str,
        version: Option<&str>,
    ) -> Result<Vec<Occurrence>> {
        self.store
            .find_occurrences(project_id, component_name, version)
    }

    /// Resolve every dependency path leading to an occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the occurrence does not exist, or a
    /// store error.
    pub fn find_paths(&self, occurrence_id: OccurrenceId) -> Result<Vec<DependencyPath>> {
        let target = self
            .store
            .get_occurrence(occurrence_id)?
            .ok_or_else(|| Error::NotFound(format!("occurrence id: {occurrence_id}")))?;

        PathResolver::new(&self.store, &self.recorder).find_paths(&target)
    }

    /// Get statistics about the index contents.
    ///
    /// # Errors
    ///
    /// Returns an error for store failures.
    pub fn stats(&self) -> Result<StoreStats> {
        self.store.stats()
    }
}
