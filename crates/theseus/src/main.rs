//! Theseus CLI - dependency provenance from the command line.
//!
//! Ingests SBOM reports into a local `SQLite` index and answers why a
//! dependency is present, through which chains, and whether those chains
//! contain cycles.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod cli;

/// Theseus: dependency provenance index.
#[derive(Parser)]
#[command(name = "theseus")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Index database file (defaults to theseus.db in the current directory)
    #[arg(short, long, global = true)]
    db: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest SBOM report files and rebuild their dependency graphs
    Ingest {
        /// Report files (JSON) to ingest
        #[arg(required = true)]
        reports: Vec<PathBuf>,
    },

    /// Rebuild the persisted dependency graph for a project
    Build {
        /// Project to rebuild (all ingested projects when omitted)
        #[arg(short, long)]
        project: Option<i64>,
    },

    /// Explain why a component is present in a project
    Why {
        /// Project to query
        #[arg(short, long)]
        project: i64,

        /// Component name (e.g. "rack")
        component: String,

        /// Narrow to one version
        #[arg(long)]
        version: Option<String>,
    },

    /// Show index statistics
    Stats,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let db = cli.db.unwrap_or_else(|| PathBuf::from("theseus.db"));

    let result = match cli.command {
        Commands::Ingest { reports } => cli::ingest::run(&db, &reports),
        Commands::Build { project } => cli::build::run(&db, project),
        Commands::Why {
            project,
            component,
            version,
        } => cli::why::run(&db, project, &component, version.as_deref()),
        Commands::Stats => cli::stats::run(&db),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            // Show cause chain for nested errors
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  {}: {cause}", "caused by".dimmed());
                source = std::error::Error::source(cause);
            }
            ExitCode::FAILURE
        }
    }
}
