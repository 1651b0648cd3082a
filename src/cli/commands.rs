//! CLI command implementations
//!
//! Each command loads configuration, reads a parsed table from JSON and runs
//! one pipeline against an in-memory repository. Committed statements go to
//! stdout, one per line; a validate-only run prints its report instead.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::config::IngestConfig;
use crate::constraint::ConfigError;
use crate::ingest::{ExecutionMode, Outcome};
use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::pipelines::{CollectionPipeline, CollectionTarget, EvaluationTarget, MetricsPipeline};
use crate::repository::InMemoryRepository;
use crate::votable::Table;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    if cli.verbose {
        Logger::set_min_severity(Severity::Trace);
    }
    run_command(cli.command, &mut io::stdout().lock())
}

/// Run the appropriate command based on CLI args
pub fn run_command<W: Write>(cmd: Command, out: &mut W) -> CliResult<()> {
    match cmd {
        Command::Collection {
            config,
            table,
            collection_id,
            project,
            filename,
            generation_date,
            existing_tables,
            validate_only,
        } => {
            let filename = match filename {
                Some(name) => name,
                None => file_name(&table)?,
            };
            let target = CollectionTarget {
                collection_id,
                project_code: project,
                filename,
                generation_date: generation_date.unwrap_or_else(today),
            };
            collection(
                config.as_deref(),
                &table,
                &target,
                &existing_tables,
                mode(validate_only),
                out,
            )
        }
        Command::Metrics {
            config,
            table,
            evaluation_id,
            project,
            existing_values,
            validate_only,
        } => {
            let target = EvaluationTarget {
                evaluation_file_id: evaluation_id,
                project_code: project,
                existing_metric_values: existing_values,
            };
            metrics(config.as_deref(), &table, &target, mode(validate_only), out)
        }
    }
}

/// Ingest one collection catalogue
pub fn collection<W: Write>(
    config_path: Option<&Path>,
    table_path: &Path,
    target: &CollectionTarget,
    existing_tables: &[String],
    mode: ExecutionMode,
    out: &mut W,
) -> CliResult<()> {
    let config = load_config(config_path)?;
    let pipeline = config
        .collection_catalog()
        .and_then(|catalog| CollectionPipeline::new(Arc::new(catalog), &config))
        .map_err(config_failure)?;
    let table = read_table(table_path)?;

    let mut repo = existing_tables
        .iter()
        .fold(InMemoryRepository::new(), |repo, name| {
            repo.with_table(&config.schema, name)
        });

    let outcome = pipeline.ingest(&table, target, mode, &mut repo)?;
    report(outcome, &repo, out)
}

/// Ingest the validation metrics of one evaluation file
pub fn metrics<W: Write>(
    config_path: Option<&Path>,
    table_path: &Path,
    target: &EvaluationTarget,
    mode: ExecutionMode,
    out: &mut W,
) -> CliResult<()> {
    let config = load_config(config_path)?;
    let pipeline = config
        .metric_catalog()
        .and_then(|catalog| MetricsPipeline::new(Arc::new(catalog), &config))
        .map_err(config_failure)?;
    let table = read_table(table_path)?;

    let mut repo = InMemoryRepository::new();
    let outcome = pipeline.ingest(&table, target, mode, &mut repo)?;
    report(outcome, &repo, out)
}

fn report<T, W: Write>(
    outcome: Outcome<T>,
    repo: &InMemoryRepository,
    out: &mut W,
) -> CliResult<()> {
    match outcome {
        Outcome::Persisted(_) => {
            for statement in repo.committed() {
                writeln!(out, "{}", statement)?;
            }
            Ok(())
        }
        Outcome::ValidationReport(messages) if messages.is_empty() => {
            writeln!(out, "VALID")?;
            Ok(())
        }
        Outcome::ValidationReport(messages) => {
            for message in &messages {
                writeln!(out, "{}", message)?;
            }
            Err(CliError::validation_failed(messages.len()))
        }
    }
}

fn load_config(path: Option<&Path>) -> CliResult<IngestConfig> {
    match path {
        Some(path) => IngestConfig::load(path).map_err(config_failure),
        None => Ok(IngestConfig::default()),
    }
}

/// Logs an unusable configuration before it ends the process
fn config_failure(err: ConfigError) -> CliError {
    log_event_with_fields(
        Event::ConfigurationInvalid,
        &[("code", err.code().code()), ("reason", err.message())],
    );
    err.into()
}

fn read_table(path: &Path) -> CliResult<Table> {
    let json = fs::read_to_string(path).map_err(|e| {
        CliError::io_error(format!("Failed to read table '{}': {}", path.display(), e))
    })?;
    Table::from_json(&json).map_err(|e| {
        CliError::input_error(format!("Invalid table '{}': {}", path.display(), e))
    })
}

fn file_name(path: &Path) -> CliResult<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| CliError::input_error(format!("'{}' names no file", path.display())))
}

fn mode(validate_only: bool) -> ExecutionMode {
    if validate_only {
        ExecutionMode::ValidateOnly
    } else {
        ExecutionMode::Normal
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::errors::CliErrorCode;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const CATALOGUE: &str = r#"{
        "description": "Bright sources",
        "params": [
            {"name": "Catalogue Name", "datatype": "char", "value": "bright_sources"},
            {"name": "Indexed Fields", "datatype": "char", "value": "source_name"},
            {"name": "Principal Fields", "datatype": "char", "value": "source_name"}
        ],
        "fields": [
            {"name": "source_name", "datatype": "char", "arraysize": "19", "ucd": "meta.id;meta.main"},
            {"name": "ra_deg_cont", "datatype": "double", "ucd": "pos.eq.ra;meta.main"},
            {"name": "dec_deg_cont", "datatype": "double", "ucd": "pos.eq.dec;meta.main"}
        ],
        "rows": [["Sgr A*", "266.4166667", "-29.00781"]]
    }"#;

    fn write_table(dir: &TempDir, json: &str) -> PathBuf {
        let path = dir.path().join("bright.json");
        fs::write(&path, json).unwrap();
        path
    }

    fn target() -> CollectionTarget {
        CollectionTarget {
            collection_id: 5,
            project_code: "AS007".into(),
            filename: "bright.xml".into(),
            generation_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        }
    }

    #[test]
    fn test_collection_prints_committed_statements() {
        let dir = TempDir::new().unwrap();
        let table = write_table(&dir, CATALOGUE);
        let mut out = Vec::new();

        collection(None, &table, &target(), &[], ExecutionMode::Normal, &mut out).unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("CREATE TABLE casda.bright_sources ("));
        assert!(printed.contains("INSERT INTO casda.bright_sources (source_name, ra_deg_cont, dec_deg_cont)"));
    }

    #[test]
    fn test_validate_only_prints_valid() {
        let dir = TempDir::new().unwrap();
        let table = write_table(&dir, CATALOGUE);
        let mut out = Vec::new();

        collection(None, &table, &target(), &[], ExecutionMode::ValidateOnly, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "VALID\n");
    }

    #[test]
    fn test_validate_only_reports_existing_table() {
        let dir = TempDir::new().unwrap();
        let table = write_table(&dir, CATALOGUE);
        let mut out = Vec::new();

        let err = collection(
            None,
            &table,
            &target(),
            &["bright_sources".to_string()],
            ExecutionMode::ValidateOnly,
            &mut out,
        )
        .unwrap_err();

        assert_eq!(err.code(), CliErrorCode::ValidationFailed);
        assert!(String::from_utf8(out).unwrap().contains("already exists"));
    }

    #[test]
    fn test_unreadable_table() {
        let dir = TempDir::new().unwrap();
        let table = write_table(&dir, "{ not json");
        let mut out = Vec::new();

        let err = collection(None, &table, &target(), &[], ExecutionMode::Normal, &mut out)
            .unwrap_err();
        assert_eq!(err.code(), CliErrorCode::InputError);

        let missing = dir.path().join("missing.json");
        let err = collection(None, &missing, &target(), &[], ExecutionMode::Normal, &mut out)
            .unwrap_err();
        assert_eq!(err.code(), CliErrorCode::IoError);
    }

    #[test]
    fn test_default_filename_is_table_file_name() {
        assert_eq!(file_name(&PathBuf::from("/tmp/in/cat.json")).unwrap(), "cat.json");
    }
}
