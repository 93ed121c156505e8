//! SBOM report parsing.
//!
//! Reports arrive as flat JSON: a project id plus one entry per detected
//! component instance, each carrying a loosely-typed `ancestors` array. This
//! module is the only place that deals with that looseness; everything past
//! it sees the typed [`AncestorRef`] enum.
//!
//! Ancestor entry convention in the wire format:
//! - `{"name": ..., "version": ...}` declares a real parent identity
//! - `{}` (an empty map) is the sentinel for "also directly declared"
//! - an entry with only one of name/version is malformed and dropped,
//!   counted but never raised

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::db::OccurrenceData;
use crate::error::{Error, Result};
use crate::types::{AncestorRef, ProjectId};

/// A parsed SBOM report, ready for ingestion.
#[derive(Debug)]
pub struct Report {
    /// Project the report belongs to.
    pub project_id: ProjectId,
    /// Occurrence records, in report order.
    pub occurrences: Vec<OccurrenceData>,
    /// Ancestor entries dropped as malformed.
    pub malformed_ancestors: usize,
}

#[derive(Debug, Deserialize)]
struct RawReport {
    project_id: i64,
    components: Vec<RawComponent>,
}

#[derive(Debug, Deserialize)]
struct RawComponent {
    name: String,
    version: String,
    input_file_path: String,
    #[serde(default)]
    ancestors: Vec<RawAncestor>,
}

/// Wire form of one ancestor entry: any subset of the two identity fields.
#[derive(Debug, Deserialize)]
struct RawAncestor {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

/// Classification of a wire ancestor entry.
enum Classified {
    Typed(AncestorRef),
    Malformed,
}

fn classify(raw: RawAncestor) -> Classified {
    match (raw.name, raw.version) {
        (Some(name), Some(version)) if !name.is_empty() => {
            Classified::Typed(AncestorRef::Parent { name, version })
        }
        // The empty map mixed into an otherwise-typed list means "also
        // directly declared by the user".
        (None, None) => Classified::Typed(AncestorRef::DirectDeclaration),
        _ => Classified::Malformed,
    }
}

impl Report {
    /// Parse a report from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Report`] if the document is not valid JSON or misses
    /// required fields. Malformed *ancestor entries* are not errors; they are
    /// dropped and counted.
    pub fn parse(source: &str) -> Result<Self> {
        let raw: RawReport = serde_json::from_str(source)
            .map_err(|e| Error::Report(format!("invalid report JSON: {e}")))?;

        let mut malformed_ancestors = 0usize;
        let occurrences = raw
            .components
            .into_iter()
            .map(|component| {
                let mut ancestors = Vec::with_capacity(component.ancestors.len());
                for entry in component.ancestors {
                    match classify(entry) {
                        Classified::Typed(ancestor) => ancestors.push(ancestor),
                        Classified::Malformed => malformed_ancestors += 1,
                    }
                }
                OccurrenceData {
                    component_name: component.name,
                    version: component.version,
                    input_file_path: component.input_file_path,
                    ancestors,
                }
            })
            .collect();

        if malformed_ancestors > 0 {
            warn!(
                project_id = raw.project_id,
                malformed_ancestors, "Dropped malformed ancestor entries from report"
            );
        }

        Ok(Self {
            project_id: ProjectId::from(raw.project_id),
            occurrences,
            malformed_ancestors,
        })
    }

    /// Read and parse a report file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or [`Error::Report`]
    /// if it cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read report {}: {e}", path.display()),
            ))
        })?;
        Self::parse(&source)
    }
}
