//! CLI module for votable-ingest
//!
//! Provides command-line interface for:
//! - collection: validate and load a collection catalogue
//! - metrics: validate and load the validation metrics of an evaluation file

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{collection, metrics, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
