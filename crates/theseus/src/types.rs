//! Domain types for the dependency provenance index.
//!
//! These types represent the core domain model:
//! - **Entities**: [`Occurrence`], [`DependencyEdge`] (stored in database)
//! - **Results**: [`DependencyPath`], [`BuildStats`], [`IngestStats`],
//!   [`StoreStats`] (query/operation results, not stored)
//!
//! ## Design Decisions
//!
//! | Decision | Choice | Rationale |
//! |----------|--------|-----------|
//! | Ancestor entry | Enum not loose map | The "also directly declared" sentinel becomes a named case, never a string check |
//! | IDs | Newtypes over i64 | Prevents swapping project and occurrence ids at call sites |
//! | Ancestors column | JSON of the typed enum | One canonical persisted form, decoded once per row |

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ============================================================================
// Strongly-typed ID wrappers
// ============================================================================

/// A strongly-typed project ID to prevent mixing with occurrence IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectId(pub i64);

impl ProjectId {
    /// Extract the raw i64 value.
    #[must_use]
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl From<i64> for ProjectId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A strongly-typed occurrence ID to prevent mixing with project IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OccurrenceId(pub i64);

impl OccurrenceId {
    /// Extract the raw i64 value.
    #[must_use]
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl From<i64> for OccurrenceId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for OccurrenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Ancestor references
// ============================================================================

/// One declared ancestor reference attached to an occurrence.
///
/// Source SBOM data models "also directly declared by the user" as an empty
/// map mixed into an otherwise-typed ancestors list. That convention is
/// classified once at the ingest boundary into this explicit enum so graph
/// code never has to ask "is this entry empty".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AncestorRef {
    /// A real parent component identity, resolved against the same file scope.
    Parent {
        /// Component name of the declared parent.
        name: String,
        /// Version of the declared parent.
        version: String,
    },
    /// Sentinel: this occurrence is also a direct (top-level) dependency,
    /// independent of any transitive parent. Produces no edge.
    DirectDeclaration,
}

impl AncestorRef {
    /// Returns `true` for the direct-declaration sentinel.
    #[must_use]
    pub fn is_direct_declaration(&self) -> bool {
        matches!(self, Self::DirectDeclaration)
    }
}

// ============================================================================
// Entities
// ============================================================================

/// One resolved dependency instance within a specific manifest file of a
/// project.
///
/// Occurrences are immutable to the graph subsystem; they are written only by
/// ingestion. Two occurrences are graph-linkable only if they share
/// `input_file_path`: the same name+version appearing independently in two
/// manifests must never produce a cross-manifest edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// Unique identifier.
    pub id: OccurrenceId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Identity of the resolved package.
    pub component_name: String,
    /// Resolved version string.
    pub version: String,
    /// The manifest/lockfile this occurrence was resolved from.
    pub input_file_path: String,
    /// Declared ancestor references, in report order.
    pub ancestors: Vec<AncestorRef>,
    /// Unix timestamp (nanoseconds) of ingestion.
    pub ingested_at: i64,
}

impl Occurrence {
    /// Whether this occurrence is marked as also directly declared.
    #[must_use]
    pub fn is_directly_declared(&self) -> bool {
        self.ancestors.iter().any(AncestorRef::is_direct_declaration)
    }
}

/// A persisted directed edge: `child` is required by `parent` within one
/// manifest scope.
///
/// Edges are created/replaced wholesale each time the graph builder runs for
/// a project, never mutated incrementally. Written exclusively by the
/// builder; read-only to the path resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyEdge {
    /// Owning project.
    pub project_id: ProjectId,
    /// Manifest scope the edge was resolved in; no edge ever crosses scopes.
    pub input_file_path: String,
    /// Occurrence that declares the requirement.
    pub parent_id: OccurrenceId,
    /// Occurrence being required.
    pub child_id: OccurrenceId,
}

// ============================================================================
// Results
// ============================================================================

/// One chain of requirement from a root dependency down to a target.
///
/// For non-cyclic paths the last element is the occurrence the resolver was
/// invoked on. For cyclic paths both the first and last elements are the
/// occurrence at which the cycle closed, which may differ from the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyPath {
    /// Occurrences from root-most ancestor to target.
    occurrences: Vec<Occurrence>,
    /// Whether this path records a closed requirement loop.
    is_cyclic: bool,
}

impl DependencyPath {
    /// Create a new dependency path, validating invariants.
    ///
    /// Returns `None` if `occurrences` is empty, or if a cyclic path's first
    /// and last elements are not the same occurrence.
    #[must_use]
    pub fn new(occurrences: Vec<Occurrence>, is_cyclic: bool) -> Option<Self> {
        if occurrences.is_empty() {
            return None;
        }
        if is_cyclic {
            let first = occurrences.first().map(|o| o.id);
            let last = occurrences.last().map(|o| o.id);
            if first != last {
                return None;
            }
        }
        Some(Self {
            occurrences,
            is_cyclic,
        })
    }

    /// Create a trivial non-cyclic path with a single occurrence.
    #[must_use]
    pub fn single(occurrence: Occurrence) -> Self {
        Self {
            occurrences: vec![occurrence],
            is_cyclic: false,
        }
    }

    /// Get the occurrences in this path, root-most first.
    #[must_use]
    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    /// Whether this path records a closed requirement loop.
    #[must_use]
    pub fn is_cyclic(&self) -> bool {
        self.is_cyclic
    }

    /// Consume the path and return the occurrences.
    #[must_use]
    pub fn into_occurrences(self) -> Vec<Occurrence> {
        self.occurrences
    }
}

/// Result of a graph build for one project.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Occurrences loaded for the project.
    pub occurrences_seen: usize,
    /// Distinct manifest file scopes resolved.
    pub file_scopes: usize,
    /// Edges written to the store.
    pub edges_written: usize,
    /// Ancestor references that resolved to no occurrence in scope.
    pub dangling_refs: usize,
    /// Wall-clock duration of the build.
    pub duration: Duration,
}

/// Result of ingesting one or more SBOM reports.
#[derive(Debug, Clone, Default)]
pub struct IngestStats {
    /// Report files successfully ingested.
    pub reports_ingested: usize,
    /// Occurrence records written.
    pub occurrences_written: usize,
    /// Ancestor entries dropped as malformed (name xor version missing).
    pub malformed_ancestors: usize,
    /// Wall-clock duration of the ingest.
    pub duration: Duration,
}

/// Statistics about the database contents.
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    /// Distinct projects with ingested occurrences.
    pub project_count: usize,
    /// Total occurrence records.
    pub occurrence_count: usize,
    /// Total persisted dependency edges.
    pub edge_count: usize,
    /// Occurrences marked as directly declared.
    pub direct_declaration_count: usize,
}
