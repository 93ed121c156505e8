//! CLI command implementations.

pub mod build;
pub mod ingest;
pub mod stats;
pub mod why;
