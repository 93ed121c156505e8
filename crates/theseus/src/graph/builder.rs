//! Graph construction: ancestor lists into a persisted edge relation.
//!
//! The underlying SBOM format stores "who are my parents" per occurrence as a
//! loosely-validated list. The builder's job is precisely to convert that
//! into a clean edge relation: partition occurrences by manifest file scope,
//! resolve each declared parent identity against the scope, and rewrite the
//! project's edge set in one atomic swap.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, info, trace};

use super::{EdgeStore, OccurrenceSource};
use crate::error::Result;
use crate::types::{AncestorRef, BuildStats, DependencyEdge, Occurrence, ProjectId};

/// Builds and persists a project's dependency-edge set.
///
/// Runs once per project after SBOM ingestion. Re-running over unchanged
/// occurrences is idempotent: the replaced edge set comes out identical.
pub struct GraphBuilder<'a, S: OccurrenceSource + EdgeStore> {
    store: &'a S,
}

impl<'a, S: OccurrenceSource + EdgeStore> GraphBuilder<'a, S> {
    /// Create a builder over the given store.
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// (Re)materialize the edge set for one project.
    ///
    /// Dangling ancestor references (a declared parent with no matching
    /// occurrence in its file scope) are not errors; they are counted in the
    /// returned stats and simply produce no edge, leaving that branch
    /// unreachable during traversal.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure failures (store read/write).
    pub fn build(&self, project_id: ProjectId) -> Result<BuildStats> {
        let started = Instant::now();
        let occurrences = self.store.occurrences_for_project(project_id)?;

        let resolution = resolve_edges(&occurrences);
        let edges_written = self
            .store
            .replace_project_edges(project_id, &resolution.edges)?;

        let stats = BuildStats {
            occurrences_seen: occurrences.len(),
            file_scopes: resolution.file_scopes,
            edges_written,
            dangling_refs: resolution.dangling_refs,
            duration: started.elapsed(),
        };
        info!(
            project_id = %project_id,
            occurrences = stats.occurrences_seen,
            file_scopes = stats.file_scopes,
            edges = stats.edges_written,
            dangling = stats.dangling_refs,
            "Dependency graph built"
        );

        Ok(stats)
    }
}

/// Outcome of resolving one project's ancestor lists into edges.
struct EdgeResolution {
    edges: Vec<DependencyEdge>,
    file_scopes: usize,
    dangling_refs: usize,
}

/// Resolve declared ancestor references into concrete edges.
///
/// A flat one-pass mapping: no recursion, no cycle handling. Cycles in the
/// underlying data (A requires B, B requires A) are legal and become cyclic
/// edges verbatim; the path resolver deals with them.
fn resolve_edges(occurrences: &[Occurrence]) -> EdgeResolution {
    // Partition by manifest scope. Occurrences in different files must never
    // link, even on an exact name+version match.
    let mut scopes: HashMap<&str, Vec<&Occurrence>> = HashMap::new();
    for occurrence in occurrences {
        scopes
            .entry(occurrence.input_file_path.as_str())
            .or_default()
            .push(occurrence);
    }

    let file_scopes = scopes.len();
    let mut edges = Vec::new();
    let mut dangling_refs = 0usize;

    for (scope, members) in scopes {
        // (name, version) -> occurrence id lookup; first occurrence wins on a
        // duplicate identity within the scope.
        let mut index = HashMap::with_capacity(members.len());
        for member in &members {
            let key = (member.component_name.as_str(), member.version.as_str());
            match index.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(member.id);
                }
                Entry::Occupied(_) => debug!(
                    scope,
                    component = %member.component_name,
                    version = %member.version,
                    "Duplicate component identity within scope; keeping first occurrence"
                ),
            }
        }

        for member in &members {
            for ancestor in &member.ancestors {
                let AncestorRef::Parent { name, version } = ancestor else {
                    // Sentinel entries mark direct declaration; the path
                    // resolver consumes them, no edge here.
                    continue;
                };
                match index.get(&(name.as_str(), version.as_str())) {
                    Some(&parent_id) => {
                        edges.push(DependencyEdge {
                            project_id: member.project_id,
                            input_file_path: member.input_file_path.clone(),
                            parent_id,
                            child_id: member.id,
                        });
                    }
                    None => {
                        // Inconsistent or partial scan data; the branch just
                        // becomes unreachable.
                        dangling_refs += 1;
                        trace!(
                            scope,
                            child = %member.component_name,
                            parent = name.as_str(),
                            parent_version = version.as_str(),
                            "Ancestor reference resolves to no occurrence in scope; edge omitted"
                        );
                    }
                }
            }
        }
    }

    EdgeResolution {
        edges,
        file_scopes,
        dangling_refs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OccurrenceId;

    fn occurrence(
        id: i64,
        name: &str,
        version: &str,
        file: &str,
        ancestors: Vec<AncestorRef>,
    ) -> Occurrence {
        Occurrence {
            id: OccurrenceId::from(id),
            project_id: ProjectId::from(1),
            component_name: name.to_string(),
            version: version.to_string(),
            input_file_path: file.to_string(),
            ancestors,
            ingested_at: 0,
        }
    }

    fn parent(name: &str, version: &str) -> AncestorRef {
        AncestorRef::Parent {
            name: name.to_string(),
            version: version.to_string(),
        }
    }

    #[test]
    fn resolves_declared_parent_to_edge() {
        let occurrences = vec![
            occurrence(1, "rails", "7.0.0", "Gemfile.lock", vec![]),
            occurrence(2, "rack", "2.2.8", "Gemfile.lock", vec![parent("rails", "7.0.0")]),
        ];

        let resolution = resolve_edges(&occurrences);
        assert_eq!(resolution.edges.len(), 1);
        assert_eq!(resolution.edges[0].parent_id, OccurrenceId::from(1));
        assert_eq!(resolution.edges[0].child_id, OccurrenceId::from(2));
        assert_eq!(resolution.dangling_refs, 0);
    }

    #[test]
    fn dangling_reference_is_counted_not_raised() {
        let occurrences = vec![occurrence(
            1,
            "rack",
            "2.2.8",
            "Gemfile.lock",
            vec![parent("ghost", "0.0.1")],
        )];

        let resolution = resolve_edges(&occurrences);
        assert!(resolution.edges.is_empty());
        assert_eq!(resolution.dangling_refs, 1);
    }

    #[test]
    fn no_edge_crosses_file_scope() {
        // Same identity in two manifests; the textual match must not link.
        let occurrences = vec![
            occurrence(1, "lodash", "4.17.21", "package-lock.json", vec![]),
            occurrence(2, "left-pad", "1.3.0", "yarn.lock", vec![parent("lodash", "4.17.21")]),
        ];

        let resolution = resolve_edges(&occurrences);
        assert!(resolution.edges.is_empty());
        assert_eq!(resolution.dangling_refs, 1);
        assert_eq!(resolution.file_scopes, 2);
    }

    #[test]
    fn sentinel_produces_no_edge() {
        let occurrences = vec![
            occurrence(1, "rails", "7.0.0", "Gemfile.lock", vec![]),
            occurrence(
                2,
                "rack",
                "2.2.8",
                "Gemfile.lock",
                vec![parent("rails", "7.0.0"), AncestorRef::DirectDeclaration],
            ),
        ];

        let resolution = resolve_edges(&occurrences);
        assert_eq!(resolution.edges.len(), 1);
    }

    #[test]
    fn cyclic_data_becomes_cyclic_edges() {
        let occurrences = vec![
            occurrence(1, "a", "1.0.0", "Gemfile.lock", vec![parent("b", "1.0.0")]),
            occurrence(2, "b", "1.0.0", "Gemfile.lock", vec![parent("a", "1.0.0")]),
        ];

        let resolution = resolve_edges(&occurrences);
        assert_eq!(resolution.edges.len(), 2);
    }

    #[test]
    fn duplicate_identity_keeps_first_occurrence() {
        let occurrences = vec![
            occurrence(1, "dup", "1.0.0", "Gemfile.lock", vec![]),
            occurrence(2, "dup", "1.0.0", "Gemfile.lock", vec![]),
            occurrence(3, "child", "0.1.0", "Gemfile.lock", vec![parent("dup", "1.0.0")]),
        ];

        let resolution = resolve_edges(&occurrences);
        assert_eq!(resolution.edges.len(), 1);
        assert_eq!(resolution.edges[0].parent_id, OccurrenceId::from(1));
    }

    #[test]
    fn multi_parent_node_emits_one_edge_per_parent() {
        let occurrences = vec![
            occurrence(1, "rails", "7.0.0", "Gemfile.lock", vec![]),
            occurrence(2, "sinatra", "3.0.0", "Gemfile.lock", vec![]),
            occurrence(
                3,
                "rack",
                "2.2.8",
                "Gemfile.lock",
                vec![parent("rails", "7.0.0"), parent("sinatra", "3.0.0")],
            ),
        ];

        let resolution = resolve_edges(&occurrences);
        assert_eq!(resolution.edges.len(), 2);
        let parents: Vec<_> = resolution.edges.iter().map(|e| e.parent_id).collect();
        assert!(parents.contains(&OccurrenceId::from(1)));
        assert!(parents.contains(&OccurrenceId::from(2)));
    }
}
