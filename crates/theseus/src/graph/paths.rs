//! Path resolution: backward, cycle-aware traversal from an occurrence to
//! every root that requires it.
//!
//! The walk uses an explicit frame stack rather than recursion, so
//! pathological dependency depth cannot overflow the call stack. Each step
//! either stops at a node with no parents (completing a non-cyclic path) or
//! stops upon meeting a node already on the active path (completing a cyclic
//! one), which bounds the walk and guarantees termination for any finite
//! edge set.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use tracing::debug;

use super::{EdgeStore, OccurrenceSource};
use crate::error::{Error, Result};
use crate::metrics::{MetricsRecorder, PATHS_FOUND_COUNTER, PATH_RESOLUTION_TIMER};
use crate::types::{DependencyPath, Occurrence, OccurrenceId};

/// Enumerates all dependency paths from roots down to a target occurrence.
///
/// Pure read over the edge store; never writes, and never fails on
/// well-formed data. The whole project's edge set and occurrence records are
/// prefetched once per call, so the traversal itself does no I/O.
pub struct PathResolver<'a, S: OccurrenceSource + EdgeStore, M: MetricsRecorder> {
    store: &'a S,
    metrics: &'a M,
}

impl<'a, S: OccurrenceSource + EdgeStore, M: MetricsRecorder> PathResolver<'a, S, M> {
    /// Create a resolver over the given store, reporting into `metrics`.
    #[must_use]
    pub fn new(store: &'a S, metrics: &'a M) -> Self {
        Self { store, metrics }
    }

    /// Find every dependency path from a root to `target`.
    ///
    /// Returns the deduplication-free collection of paths: distinct traversal
    /// branches that happen to produce identical sequences are all kept, so
    /// the result records every resolution branch. If `target` is also
    /// directly declared, the `[target]` singleton path is included alongside
    /// any transitive paths.
    ///
    /// # Errors
    ///
    /// Returns an error for infrastructure failures, or [`Error::NotFound`]
    /// if an edge references an occurrence that no longer exists (data
    /// integrity gap).
    pub fn find_paths(&self, target: &Occurrence) -> Result<Vec<DependencyPath>> {
        let started = Instant::now();
        let outcome = self.resolve(target);
        self.metrics
            .observe_duration(PATH_RESOLUTION_TIMER, started.elapsed());

        let paths = outcome?;
        // Both labels are recorded on every call, zeros included, so the
        // absent category still shows up downstream.
        let cyclic = paths.iter().filter(|p| p.is_cyclic()).count() as u64;
        let non_cyclic = paths.len() as u64 - cyclic;
        self.metrics
            .count_paths(PATHS_FOUND_COUNTER, false, non_cyclic);
        self.metrics.count_paths(PATHS_FOUND_COUNTER, true, cyclic);

        Ok(paths)
    }

    fn resolve(&self, target: &Occurrence) -> Result<Vec<DependencyPath>> {
        // One round-trip each for the project's edges and occurrences; the
        // DFS below runs entirely in memory.
        let parents = parent_adjacency(self.store, target)?;
        let occurrences: HashMap<OccurrenceId, Occurrence> = self
            .store
            .occurrences_for_project(target.project_id)?
            .into_iter()
            .map(|o| (o.id, o))
            .collect();

        let id_paths = walk_to_roots(target.id, &parents);

        let mut paths = Vec::with_capacity(id_paths.len() + 1);
        for id_path in id_paths {
            paths.push(materialize(&id_path, &occurrences)?);
        }

        // Dual declaration: being a root and being transitively reachable are
        // both reported, never merged into one entry.
        if target.is_directly_declared() {
            paths.push(DependencyPath::single(target.clone()));
        }

        debug!(
            occurrence_id = %target.id,
            component = %target.component_name,
            paths = paths.len(),
            "Dependency paths resolved"
        );
        Ok(paths)
    }
}

/// Build the child -> parents adjacency map for the target's project.
fn parent_adjacency<S: EdgeStore + ?Sized>(
    store: &S,
    target: &Occurrence,
) -> Result<HashMap<OccurrenceId, Vec<OccurrenceId>>> {
    let mut parents: HashMap<OccurrenceId, Vec<OccurrenceId>> = HashMap::new();
    for edge in store.edges_for_project(target.project_id)? {
        parents.entry(edge.child_id).or_default().push(edge.parent_id);
    }
    Ok(parents)
}

/// A finished path as ids, root-most first, plus its cyclic flag.
struct IdPath {
    ids: Vec<OccurrenceId>,
    is_cyclic: bool,
}

/// One in-flight node during the upward walk: which parents it has and how
/// many have been tried so far.
struct Frame {
    parents: Vec<OccurrenceId>,
    next: usize,
}

/// Backward DFS from `target`, collecting every completed path.
///
/// `path` holds the branch explored so far, target first; `on_path` mirrors
/// it for O(1) cycle checks. Frames line up one-to-one with `path` entries.
/// A node with no parents completes the branch as a non-cyclic path. A
/// parent already on the branch closes a cycle: the emitted path is the loop
/// itself, from the repeated node back down the branch to its earlier
/// position, and that parent is not descended into again on this branch.
fn walk_to_roots(
    target: OccurrenceId,
    parents: &HashMap<OccurrenceId, Vec<OccurrenceId>>,
) -> Vec<IdPath> {
    let mut results = Vec::new();
    let mut path = vec![target];
    let mut on_path: HashSet<OccurrenceId> = HashSet::from([target]);

    let root_parents = parents.get(&target).cloned().unwrap_or_default();
    if root_parents.is_empty() {
        // The target itself is a root.
        return vec![IdPath {
            ids: vec![target],
            is_cyclic: false,
        }];
    }

    let mut frames = vec![Frame {
        parents: root_parents,
        next: 0,
    }];

    while let Some(frame) = frames.last_mut() {
        if frame.next >= frame.parents.len() {
            // All parents of the current node explored; backtrack.
            frames.pop();
            if let Some(done) = path.pop() {
                on_path.remove(&done);
            }
            continue;
        }

        let parent = frame.parents[frame.next];
        frame.next += 1;

        if on_path.contains(&parent) {
            results.push(cycle_path(&path, parent));
            continue;
        }

        let grandparents = parents.get(&parent).cloned().unwrap_or_default();
        if grandparents.is_empty() {
            // Reached a root: the branch, reversed, reads root -> target.
            let mut ids: Vec<OccurrenceId> = path.iter().rev().copied().collect();
            ids.insert(0, parent);
            results.push(IdPath {
                ids,
                is_cyclic: false,
            });
        } else {
            path.push(parent);
            on_path.insert(parent);
            frames.push(Frame {
                parents: grandparents,
                next: 0,
            });
        }
    }

    results
}

/// Emit the closed loop for a back-edge to `repeated`.
///
/// The recorded path spans from the repeated node, down through the branch,
/// back to the repeated node's earlier position; both ends are the repeated
/// node, which need not be the resolution target.
fn cycle_path(path: &[OccurrenceId], repeated: OccurrenceId) -> IdPath {
    // `repeated` is guaranteed on the path by the caller's on_path check.
    let position = path
        .iter()
        .position(|&id| id == repeated)
        .unwrap_or_default();
    let mut ids = vec![repeated];
    ids.extend(path[position..].iter().rev());
    IdPath {
        ids,
        is_cyclic: true,
    }
}

/// Turn an id path into a [`DependencyPath`] of full occurrence records.
fn materialize(
    id_path: &IdPath,
    occurrences: &HashMap<OccurrenceId, Occurrence>,
) -> Result<DependencyPath> {
    let mut records = Vec::with_capacity(id_path.ids.len());
    for id in &id_path.ids {
        let occurrence = occurrences.get(id).cloned().ok_or_else(|| {
            Error::NotFound(format!(
                "occurrence id: {} (referenced by a dependency edge but missing from the store)",
                id.as_i64()
            ))
        })?;
        records.push(occurrence);
    }
    DependencyPath::new(records, id_path.is_cyclic).ok_or_else(|| {
        Error::Internal("walk produced an invalid dependency path".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjacency(edges: &[(i64, i64)]) -> HashMap<OccurrenceId, Vec<OccurrenceId>> {
        let mut parents: HashMap<OccurrenceId, Vec<OccurrenceId>> = HashMap::new();
        for &(parent, child) in edges {
            parents
                .entry(OccurrenceId::from(child))
                .or_default()
                .push(OccurrenceId::from(parent));
        }
        parents
    }

    fn ids(raw: &[i64]) -> Vec<OccurrenceId> {
        raw.iter().copied().map(OccurrenceId::from).collect()
    }

    #[test]
    fn linear_chain_yields_single_full_path() {
        // 1 -> 2 -> 3 -> 4
        let parents = adjacency(&[(1, 2), (2, 3), (3, 4)]);
        let paths = walk_to_roots(OccurrenceId::from(4), &parents);

        assert_eq!(paths.len(), 1);
        assert!(!paths[0].is_cyclic);
        assert_eq!(paths[0].ids, ids(&[1, 2, 3, 4]));
    }

    #[test]
    fn target_without_parents_is_its_own_root() {
        let parents = adjacency(&[]);
        let paths = walk_to_roots(OccurrenceId::from(7), &parents);

        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].ids, ids(&[7]));
        assert!(!paths[0].is_cyclic);
    }

    #[test]
    fn sibling_parents_yield_independent_paths() {
        // 1 -> 3 and 2 -> 3
        let parents = adjacency(&[(1, 3), (2, 3)]);
        let mut paths = walk_to_roots(OccurrenceId::from(3), &parents);
        paths.sort_by(|a, b| a.ids.cmp(&b.ids));

        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].ids, ids(&[1, 3]));
        assert_eq!(paths[1].ids, ids(&[2, 3]));
    }

    #[test]
    fn diamond_reports_both_branches() {
        // 1 -> 2 -> 4, 1 -> 3 -> 4
        let parents = adjacency(&[(1, 2), (1, 3), (2, 4), (3, 4)]);
        let mut paths = walk_to_roots(OccurrenceId::from(4), &parents);
        paths.sort_by(|a, b| a.ids.cmp(&b.ids));

        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].ids, ids(&[1, 2, 4]));
        assert_eq!(paths[1].ids, ids(&[1, 3, 4]));
    }

    #[test]
    fn cycle_off_the_target_terminates_with_loop_path() {
        // ancestor(1) -> c1(2) <-> c2(3), c2 -> deep(4)
        let parents = adjacency(&[(1, 2), (2, 3), (3, 2), (3, 4)]);
        let paths = walk_to_roots(OccurrenceId::from(4), &parents);

        let non_cyclic: Vec<_> = paths.iter().filter(|p| !p.is_cyclic).collect();
        let cyclic: Vec<_> = paths.iter().filter(|p| p.is_cyclic).collect();

        assert_eq!(non_cyclic.len(), 1);
        assert_eq!(non_cyclic[0].ids, ids(&[1, 2, 3, 4]));

        // The loop c2 -> c1 -> c2, repeated node at both ends.
        assert_eq!(cyclic.len(), 1);
        assert_eq!(cyclic[0].ids, ids(&[3, 2, 3]));
    }

    #[test]
    fn self_referential_occurrence_closes_immediately() {
        let parents = adjacency(&[(5, 5)]);
        let paths = walk_to_roots(OccurrenceId::from(5), &parents);

        assert_eq!(paths.len(), 1);
        assert!(paths[0].is_cyclic);
        assert_eq!(paths[0].ids, ids(&[5, 5]));
    }

    #[test]
    fn two_node_cycle_from_inside_the_loop() {
        // 1 <-> 2, resolve 2
        let parents = adjacency(&[(1, 2), (2, 1)]);
        let paths = walk_to_roots(OccurrenceId::from(2), &parents);

        assert_eq!(paths.len(), 1);
        assert!(paths[0].is_cyclic);
        // Repeated node is the target itself here.
        assert_eq!(paths[0].ids, ids(&[2, 1, 2]));
    }

    #[test]
    fn identical_sequences_from_distinct_branches_are_kept() {
        // Two distinct edges collapse to the same (parent, child) pair only
        // if the store held duplicates; simulate with a doubled parent entry.
        let mut parents = adjacency(&[(1, 2)]);
        parents
            .get_mut(&OccurrenceId::from(2))
            .unwrap()
            .push(OccurrenceId::from(1));

        let paths = walk_to_roots(OccurrenceId::from(2), &parents);
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].ids, paths[1].ids);
    }
}
