//! Command-line interface for melody-keeper.
//!
//! Runs the background scanner, one-off scans, and the catalog reads and
//! admin actions the serving layer would otherwise perform.

mod commands;

pub use commands::{Cli, Commands, run_command};
