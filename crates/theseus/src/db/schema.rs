//! Database schema definition for Theseus.

/// Database schema definition.
pub(crate) const SCHEMA: &str = r"
-- Ingested dependency occurrences
-- ancestors holds the canonical JSON encoding of the typed ancestor list
CREATE TABLE IF NOT EXISTS occurrences (
    id INTEGER PRIMARY KEY,
    project_id INTEGER NOT NULL,
    component_name TEXT NOT NULL,
    version TEXT NOT NULL,
    input_file_path TEXT NOT NULL,
    ancestors TEXT NOT NULL DEFAULT '[]',
    ingested_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_occurrences_project ON occurrences(project_id);
CREATE INDEX IF NOT EXISTS idx_occurrences_identity
    ON occurrences(project_id, input_file_path, component_name, version);

-- Persisted dependency edges (parent requires child within one manifest scope)
-- Rewritten wholesale per project by the graph builder; never mutated row-wise.
CREATE TABLE IF NOT EXISTS dependency_edges (
    project_id INTEGER NOT NULL,
    input_file_path TEXT NOT NULL,
    parent_occurrence_id INTEGER NOT NULL REFERENCES occurrences(id) ON DELETE CASCADE,
    child_occurrence_id INTEGER NOT NULL REFERENCES occurrences(id) ON DELETE CASCADE,
    PRIMARY KEY (project_id, input_file_path, parent_occurrence_id, child_occurrence_id)
);

CREATE INDEX IF NOT EXISTS idx_dependency_edges_child ON dependency_edges(child_occurrence_id);
CREATE INDEX IF NOT EXISTS idx_dependency_edges_project ON dependency_edges(project_id);
";
