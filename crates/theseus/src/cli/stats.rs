//! `theseus stats` command implementation.

use std::path::Path;

use colored::Colorize;
use theseus::Theseus;

/// Run the stats command.
pub fn run(db: &Path) -> Result<(), theseus::Error> {
    let theseus = Theseus::open(db)?;

    // Get database size
    let db_path = theseus.db_path();
    let db_size_str = match std::fs::metadata(db_path) {
        Ok(meta) => format_size(meta.len()),
        Err(e) => {
            tracing::debug!(error = %e, "Failed to get database file size");
            "size unknown".to_string()
        }
    };

    let stats = theseus.stats()?;

    println!("{}", "Theseus Index Statistics".cyan().bold());
    println!();
    println!(
        "  {}: {} ({})",
        "Database".white().bold(),
        db_path.display(),
        db_size_str
    );
    println!();
    println!(
        "  {}: {}",
        "Projects".white().bold(),
        stats.project_count.to_string().green()
    );
    println!(
        "  {}: {} total, {} directly declared",
        "Occurrences".white().bold(),
        stats.occurrence_count.to_string().green(),
        stats.direct_declaration_count
    );
    println!(
        "  {}: {}",
        "Edges".white().bold(),
        stats.edge_count.to_string().green()
    );

    Ok(())
}

/// Format a byte count human-readably.
#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;

    let bytes = bytes as f64;
    if bytes >= MIB {
        format!("{:.1} MiB", bytes / MIB)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes / KIB)
    } else {
        format!("{bytes:.0} B")
    }
}
