//! Melody Keeper - music library ingestion service.
//!
//! Periodically walks a music directory, catalogs every audio file in
//! SQLite, writes lyrics and cover sidecars next to the audio, and fills
//! in what is missing from a lyrics/cover lookup service.

pub mod cli;
pub mod config;
pub mod db;
pub mod enrichment;
pub mod error;
pub mod library;
pub mod metadata;
pub mod model;
pub mod scanner;
pub mod sidecar;
#[cfg(test)]
pub mod test_utils;

use clap::{CommandFactory, Parser};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_TARGETS: [&str; 5] = ["scanner", "library", "metadata", "enrichment", "sidecar"];

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging; subsystems log under their own targets
    let mut filter = EnvFilter::from_default_env().add_directive("melody_keeper=info".parse()?);
    for target in LOG_TARGETS {
        filter = filter.add_directive(format!("{target}=info").parse()?);
    }
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    if !cli::run_command(&args)? {
        cli::Cli::command().print_help()?;
    }

    Ok(())
}
