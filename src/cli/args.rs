//! CLI argument definitions using clap
//!
//! Commands:
//! - votable-ingest collection --table <json> --collection-id <n> --project <code>
//! - votable-ingest metrics --table <json> --evaluation-id <n> --project <code>

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Validates VOTABLE tables and derives the statements that load them
#[derive(Parser, Debug)]
#[command(name = "votable-ingest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Also log per-statement detail
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ingest a collection catalogue
    Collection {
        /// Path to configuration file; built-in defaults if absent
        #[arg(long)]
        config: Option<PathBuf>,

        /// Parsed table, as JSON
        #[arg(long)]
        table: PathBuf,

        /// Level 7 collection the catalogue belongs to
        #[arg(long)]
        collection_id: i64,

        /// Owning project code
        #[arg(long)]
        project: String,

        /// Deposited filename; defaults to the table file's name
        #[arg(long)]
        filename: Option<String>,

        /// Generation date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        generation_date: Option<NaiveDate>,

        /// Tables that already exist in the schema
        #[arg(long = "existing-table")]
        existing_tables: Vec<String>,

        /// Report every problem and discard all changes
        #[arg(long)]
        validate_only: bool,
    },

    /// Ingest the validation metrics of an evaluation file
    Metrics {
        /// Path to configuration file; built-in defaults if absent
        #[arg(long)]
        config: Option<PathBuf>,

        /// Parsed table, as JSON
        #[arg(long)]
        table: PathBuf,

        /// Evaluation file the metrics belong to
        #[arg(long)]
        evaluation_id: i64,

        /// Owning project code
        #[arg(long)]
        project: String,

        /// Metric values already stored for the evaluation file
        #[arg(long, default_value_t = 0)]
        existing_values: usize,

        /// Report every problem and discard all changes
        #[arg(long)]
        validate_only: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
