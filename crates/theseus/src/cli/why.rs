//! `theseus why` command implementation.

use std::path::Path;

use colored::Colorize;
use theseus::{DependencyPath, ProjectId, Theseus};

/// Run the why command.
pub fn run(
    db: &Path,
    project: i64,
    component: &str,
    version: Option<&str>,
) -> Result<(), theseus::Error> {
    let theseus = Theseus::open(db)?;
    let project = ProjectId::from(project);

    let occurrences = theseus.find_occurrences(project, component, version)?;
    if occurrences.is_empty() {
        println!(
            "No occurrences of \"{}\" in project {}",
            component.cyan(),
            project
        );
        return Ok(());
    }

    for occurrence in occurrences {
        println!(
            "{} {} {} ({})",
            "Occurrence".white().bold(),
            occurrence.component_name.cyan().bold(),
            occurrence.version,
            occurrence.input_file_path.dimmed()
        );

        let paths = theseus.find_paths(occurrence.id)?;
        if paths.is_empty() {
            println!("  (no dependency paths)");
            println!();
            continue;
        }

        let cyclic = paths.iter().filter(|p| p.is_cyclic()).count();
        for path in &paths {
            println!("  {}", render_path(path));
        }

        println!();
        println!(
            "{}: {} path(s), {} cyclic",
            "Total".dimmed(),
            paths.len().to_string().green(),
            if cyclic > 0 {
                cyclic.to_string().yellow()
            } else {
                cyclic.to_string().normal()
            }
        );
        println!();
    }

    Ok(())
}

/// Render one path as a requirement chain, root first.
fn render_path(path: &DependencyPath) -> String {
    let chain = path
        .occurrences()
        .iter()
        .map(|o| format!("{} {}", o.component_name, o.version))
        .collect::<Vec<_>>()
        .join(" → ");

    if path.is_cyclic() {
        format!("{chain} {}", "(cycle)".yellow())
    } else {
        chain
    }
}
