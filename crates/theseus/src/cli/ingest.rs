//! `theseus ingest` command implementation.

use std::path::{Path, PathBuf};

use colored::Colorize;
use theseus::Theseus;

/// Run the ingest command.
pub fn run(db: &Path, reports: &[PathBuf]) -> Result<(), theseus::Error> {
    println!(
        "{} {} report file(s)...",
        "Ingesting".cyan().bold(),
        reports.len()
    );

    let theseus = Theseus::open(db)?;
    let stats = theseus.ingest_report_files(reports)?;

    println!();
    println!(
        "{} {} reports, {} occurrences",
        "Ingested".green().bold(),
        stats.reports_ingested,
        stats.occurrences_written
    );
    println!("{}: {:.2?}", "Duration".dimmed(), stats.duration);

    if stats.malformed_ancestors > 0 {
        println!(
            "{}: {} ancestor entries (missing name or version)",
            "Dropped".yellow(),
            stats.malformed_ancestors
        );
    }

    Ok(())
}
