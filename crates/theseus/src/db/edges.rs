//! Dependency edge operations for the Theseus index.
//!
//! Edges are derived from occurrence ancestor lists by the graph builder and
//! rewritten wholesale per project. The path resolver only reads them (via
//! the [`EdgeStore`] trait).

use rusqlite::params;
use tracing::trace;

use super::Store;
use crate::error::Result;
use crate::graph::EdgeStore;
use crate::types::{DependencyEdge, OccurrenceId, ProjectId};

impl EdgeStore for Store {
    /// Replace a project's edge set wholesale.
    ///
    /// Delete and insert happen inside one transaction, so concurrent readers
    /// observe either the previous or the new edge set, never an empty or
    /// half-written one. Returns the number of edges written.
    fn replace_project_edges(
        &self,
        project_id: ProjectId,
        edges: &[DependencyEdge],
    ) -> Result<usize> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;

        let deleted = tx.execute(
            "DELETE FROM dependency_edges WHERE project_id = ?1",
            [project_id.as_i64()],
        )?;
        trace!(
            project_id = %project_id,
            deleted,
            inserting = edges.len(),
            "Replacing project edge set"
        );

        let mut written = 0usize;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO dependency_edges
                     (project_id, input_file_path, parent_occurrence_id, child_occurrence_id)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for edge in edges {
                // OR IGNORE reports 0 changed rows for a duplicate edge, so
                // the sum counts distinct edges actually written.
                written += stmt.execute(params![
                    edge.project_id.as_i64(),
                    edge.input_file_path,
                    edge.parent_id.as_i64(),
                    edge.child_id.as_i64(),
                ])?;
            }
        }

        tx.commit()?;
        Ok(written)
    }

    fn parents_of(&self, child_id: OccurrenceId) -> Result<Vec<OccurrenceId>> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare(
            "SELECT parent_occurrence_id FROM dependency_edges
             WHERE child_occurrence_id = ?1
             ORDER BY parent_occurrence_id",
        )?;

        let parents = stmt
            .query_map([child_id.as_i64()], |row| {
                Ok(OccurrenceId::from(row.get::<_, i64>(0)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(parents)
    }

    fn edges_for_project(&self, project_id: ProjectId) -> Result<Vec<DependencyEdge>> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare(
            "SELECT project_id, input_file_path, parent_occurrence_id, child_occurrence_id
             FROM dependency_edges
             WHERE project_id = ?1
             ORDER BY input_file_path, parent_occurrence_id, child_occurrence_id",
        )?;

        let edges = stmt
            .query_map([project_id.as_i64()], |row| {
                Ok(DependencyEdge {
                    project_id: ProjectId::from(row.get::<_, i64>(0)?),
                    input_file_path: row.get(1)?,
                    parent_id: OccurrenceId::from(row.get::<_, i64>(2)?),
                    child_id: OccurrenceId::from(row.get::<_, i64>(3)?),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(edges)
    }
}
