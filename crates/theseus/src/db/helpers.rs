//! Helper functions for database row conversion.
//!
//! These utilities convert between database representations and domain types.
//! Also provides SQL column list constants to reduce duplication across query
//! modules.

use crate::types::{AncestorRef, Occurrence, OccurrenceId, ProjectId};

/// SQL column list for the occurrences table.
///
/// Use with `row_to_occurrence` for consistent column ordering.
pub(crate) const OCCURRENCES_COLUMNS: &str =
    "id, project_id, component_name, version, input_file_path, ancestors, ingested_at";

/// Decode the persisted ancestors column.
///
/// Returns an error for undecodable JSON, indicating possible database
/// corruption: the column only ever holds what `encode_ancestors` wrote.
pub(crate) fn parse_ancestors(raw: &str) -> rusqlite::Result<Vec<AncestorRef>> {
    serde_json::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!(
                "Undecodable ancestors column: {e}. Database may be corrupted or from a newer version."
            )
            .into(),
        )
    })
}

/// Encode an ancestor list into its canonical persisted form.
pub(crate) fn encode_ancestors(ancestors: &[AncestorRef]) -> crate::error::Result<String> {
    serde_json::to_string(ancestors)
        .map_err(|e| crate::error::Error::Internal(format!("failed to encode ancestors: {e}")))
}

/// Convert a database row to an [`Occurrence`].
///
/// Expected columns: id, `project_id`, `component_name`, version,
/// `input_file_path`, ancestors, `ingested_at`
pub(crate) fn row_to_occurrence(row: &rusqlite::Row) -> rusqlite::Result<Occurrence> {
    Ok(Occurrence {
        id: OccurrenceId::from(row.get::<_, i64>(0)?),
        project_id: ProjectId::from(row.get::<_, i64>(1)?),
        component_name: row.get(2)?,
        version: row.get(3)?,
        input_file_path: row.get(4)?,
        ancestors: parse_ancestors(&row.get::<_, String>(5)?)?,
        ingested_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ancestors_decodes_canonical_form() {
        let ancestors = vec![
            AncestorRef::Parent {
                name: "rails".to_string(),
                version: "7.0.0".to_string(),
            },
            AncestorRef::DirectDeclaration,
        ];
        let encoded = encode_ancestors(&ancestors).expect("encodes");
        let decoded = parse_ancestors(&encoded).expect("decodes");
        assert_eq!(decoded, ancestors);
    }

    #[test]
    fn parse_ancestors_rejects_garbage() {
        assert!(parse_ancestors("not json").is_err());
        assert!(parse_ancestors(r#"[{"kind":"unknown_case"}]"#).is_err());
    }

    #[test]
    fn parse_ancestors_accepts_empty_list() {
        assert_eq!(parse_ancestors("[]").expect("decodes"), vec![]);
    }
}
