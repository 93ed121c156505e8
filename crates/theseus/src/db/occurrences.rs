//! Occurrence CRUD operations for the Theseus index.
//!
//! Occurrences are written only by ingestion, wholesale per project, and are
//! read-only to the graph subsystem (via the [`OccurrenceSource`] trait).

use rusqlite::{params, OptionalExtension};
use tracing::trace;

use super::{encode_ancestors, row_to_occurrence, Store, OCCURRENCES_COLUMNS};
use crate::error::Result;
use crate::graph::OccurrenceSource;
use crate::types::{AncestorRef, Occurrence, OccurrenceId, ProjectId};

/// Data required to insert one occurrence.
///
/// Used by `replace_project_occurrences` to insert records within a
/// transaction; the id and ingestion timestamp are assigned by the store.
#[derive(Debug, Clone)]
pub struct OccurrenceData {
    /// Component name of the resolved package.
    pub component_name: String,
    /// Resolved version string.
    pub version: String,
    /// Manifest/lockfile the occurrence was resolved from.
    pub input_file_path: String,
    /// Declared ancestor references, in report order.
    pub ancestors: Vec<AncestorRef>,
}

impl Store {
    /// Replace a project's occurrence records wholesale.
    ///
    /// Runs in a single transaction: readers observe either the previous or
    /// the new record set. Cascades delete the project's stale edges; the
    /// graph builder is expected to run afterwards.
    ///
    /// Returns the ids of the inserted occurrences, in input order.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement in the transaction fails.
    pub fn replace_project_occurrences(
        &self,
        project_id: ProjectId,
        records: &[OccurrenceData],
    ) -> Result<Vec<OccurrenceId>> {
        let ingested_at = Self::now_ns()?;
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;

        let deleted = tx.execute(
            "DELETE FROM occurrences WHERE project_id = ?1",
            [project_id.as_i64()],
        )?;
        trace!(
            project_id = %project_id,
            deleted,
            inserting = records.len(),
            "Replacing project occurrences"
        );

        let mut ids = Vec::with_capacity(records.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO occurrences
                     (project_id, component_name, version, input_file_path, ancestors, ingested_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for record in records {
                let ancestors = encode_ancestors(&record.ancestors)?;
                stmt.execute(params![
                    project_id.as_i64(),
                    record.component_name,
                    record.version,
                    record.input_file_path,
                    ancestors,
                    ingested_at,
                ])?;
                ids.push(OccurrenceId::from(tx.last_insert_rowid()));
            }
        }

        tx.commit()?;
        Ok(ids)
    }

    /// Look up occurrences by component identity within a project.
    ///
    /// `version` narrows the match when given; otherwise all versions.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_occurrences(
        &self,
        project_id: ProjectId,
        component_name: &str,
        version: Option<&str>,
    ) -> Result<Vec<Occurrence>> {
        let conn = self.connection()?;

        let sql = format!(
            "SELECT {OCCURRENCES_COLUMNS} FROM occurrences
             WHERE project_id = ?1 AND component_name = ?2
               AND (?3 IS NULL OR version = ?3)
             ORDER BY input_file_path, version, id"
        );
        let mut stmt = conn.prepare(&sql)?;

        let occurrences = stmt
            .query_map(
                params![project_id.as_i64(), component_name, version],
                row_to_occurrence,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(occurrences)
    }

    /// List the distinct projects with ingested occurrences.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn projects(&self) -> Result<Vec<ProjectId>> {
        let conn = self.connection()?;

        let mut stmt =
            conn.prepare("SELECT DISTINCT project_id FROM occurrences ORDER BY project_id")?;
        let projects = stmt
            .query_map([], |row| Ok(ProjectId::from(row.get::<_, i64>(0)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(projects)
    }
}

impl OccurrenceSource for Store {
    fn get_occurrence(&self, id: OccurrenceId) -> Result<Option<Occurrence>> {
        let conn = self.connection()?;

        let sql = format!("SELECT {OCCURRENCES_COLUMNS} FROM occurrences WHERE id = ?1");
        let occurrence = conn
            .query_row(&sql, [id.as_i64()], row_to_occurrence)
            .optional()?;

        Ok(occurrence)
    }

    fn occurrences_for_project(&self, project_id: ProjectId) -> Result<Vec<Occurrence>> {
        let conn = self.connection()?;

        let sql = format!(
            "SELECT {OCCURRENCES_COLUMNS} FROM occurrences WHERE project_id = ?1 ORDER BY id"
        );
        let mut stmt = conn.prepare(&sql)?;

        let occurrences = stmt
            .query_map([project_id.as_i64()], row_to_occurrence)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(occurrences)
    }
}
