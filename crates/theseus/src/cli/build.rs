//! `theseus build` command implementation.

use std::path::Path;

use colored::Colorize;
use theseus::{ProjectId, Theseus};

/// Run the build command.
pub fn run(db: &Path, project: Option<i64>) -> Result<(), theseus::Error> {
    let theseus = Theseus::open(db)?;

    let projects = match project {
        Some(id) => vec![ProjectId::from(id)],
        None => theseus.projects()?,
    };

    if projects.is_empty() {
        println!("No ingested projects; nothing to build");
        return Ok(());
    }

    for project_id in projects {
        let stats = theseus.build_graph(project_id)?;
        println!(
            "{} project {}: {} edges from {} occurrences in {} file scope(s)",
            "Built".green().bold(),
            project_id.to_string().cyan(),
            stats.edges_written,
            stats.occurrences_seen,
            stats.file_scopes
        );
        if stats.dangling_refs > 0 {
            println!(
                "  {}: {} ancestor reference(s) had no occurrence in scope",
                "Dangling".yellow(),
                stats.dangling_refs
            );
        }
    }

    Ok(())
}
