//! Collection Catalogue Ingest Tests
//!
//! End-to-end tests for the collection catalogue pipeline:
//! - Catalogue name rules
//! - Positional error messages
//! - Fail-fast versus accumulating traversal
//! - Validate-only runs never commit
//! - Literal escaping in rendered statements
//! - One pipeline shared across threads

use std::sync::Arc;
use std::thread;

use chrono::NaiveDate;
use votable_ingest::config::IngestConfig;
use votable_ingest::constraint::ConstraintCatalog;
use votable_ingest::ingest::{ExecutionMode, IngestError, Outcome};
use votable_ingest::pipelines::{CollectionPipeline, CollectionTarget};
use votable_ingest::repository::{InMemoryRepository, RepositoryError};
use votable_ingest::votable::{DeclaredField, DeclaredParam, Row, Table};

// =============================================================================
// Helper Functions
// =============================================================================

fn pipeline() -> CollectionPipeline {
    let catalog = Arc::new(ConstraintCatalog::collection_catalogue().unwrap());
    CollectionPipeline::new(catalog, &IngestConfig::default()).unwrap()
}

fn target() -> CollectionTarget {
    CollectionTarget {
        collection_id: 123456,
        project_code: "AS007".to_string(),
        filename: "selavy-catalogue.xml".to_string(),
        generation_date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
    }
}

fn catalogue(name: &str) -> Table {
    Table {
        description: Some("Radio components".to_string()),
        params: vec![
            DeclaredParam::text("Catalogue Name", name),
            DeclaredParam::text("Indexed Fields", "source_name, ra_deg_cont"),
            DeclaredParam::text("Principal Fields", "source_name"),
        ],
        fields: vec![
            DeclaredField::new("source_name", "char")
                .with_arraysize("19")
                .with_ucd("meta.id;meta.main")
                .with_description("Designation for the radio component"),
            DeclaredField::new("ra_deg_cont", "double")
                .with_ucd("pos.eq.ra;meta.main")
                .with_unit("deg"),
            DeclaredField::new("dec_deg_cont", "double")
                .with_ucd("pos.eq.dec;meta.main")
                .with_unit("deg"),
            DeclaredField::new("flag1", "boolean"),
            DeclaredField::new("comment", "char").with_arraysize("18"),
        ],
        rows: vec![
            Row::from_values(["Sgr A*", "266.4166667", "-29.00781", "true", "galactic centre"]),
            Row::new(vec![
                Some("J0437-4715".to_string()),
                Some("69.3158".to_string()),
                Some("-47.2525".to_string()),
                None,
                None,
            ]),
        ],
    }
}

fn rejected(result: Result<Outcome<impl std::fmt::Debug>, IngestError>) -> Vec<String> {
    match result {
        Err(IngestError::MalformedInput(messages)) => messages,
        other => panic!("expected malformed input, got {:?}", other),
    }
}

fn report(result: Result<Outcome<impl std::fmt::Debug>, IngestError>) -> Vec<String> {
    match result {
        Ok(Outcome::ValidationReport(messages)) => messages,
        other => panic!("expected validation report, got {:?}", other),
    }
}

// =============================================================================
// Successful Ingest Tests
// =============================================================================

/// A valid catalogue creates its table, registers metadata and inserts rows.
#[test]
fn test_valid_catalogue_is_persisted() {
    let mut repo = InMemoryRepository::new();
    let outcome = pipeline()
        .ingest(&catalogue("bright_sources"), &target(), ExecutionMode::Normal, &mut repo)
        .unwrap();

    let record = outcome.persisted().unwrap();
    assert_eq!(record.table_name, "bright_sources");
    assert_eq!(record.rows_inserted, 2);
    assert_eq!(
        record.columns,
        vec!["source_name", "ra_deg_cont", "dec_deg_cont", "flag1", "comment"]
    );

    assert_eq!(repo.commit_count(), 1);
    assert_eq!(repo.rollback_count(), 0);

    let committed = repo.committed().join("\n");
    assert!(committed.contains(
        "INSERT INTO casda.catalogue (level7_collection_id, filename, format, entries_table_name, generation_date) \
         VALUES (123456, 'selavy-catalogue.xml', 'votable', 'bright_sources', '2024-03-09');"
    ));
    assert!(committed.contains("    source_name VARCHAR(19),"));
    assert!(committed.contains("    comment VARCHAR(18)"));
    assert!(committed.contains("CREATE INDEX bright_sources_ra_deg_cont_idx ON casda.bright_sources (ra_deg_cont);"));
    assert!(committed.contains("'AS007.bright_sources'"));
    assert!(committed.contains(
        "INSERT INTO casda.bright_sources (source_name, ra_deg_cont, dec_deg_cont, flag1, comment) \
         VALUES ('Sgr A*', 266.4166667, -29.00781, TRUE, 'galactic centre');"
    ));
    assert!(committed.contains("VALUES ('J0437-4715', 69.3158, -47.2525, NULL, NULL);"));
}

/// Cells are trimmed before they are checked and stored.
#[test]
fn test_padded_cells_are_trimmed() {
    let mut table = catalogue("bright_sources");
    table.rows[0] = Row::from_values([
        " Sgr A* ",
        "266.4166667",
        "-29.00781",
        " true ",
        " galactic centre xy ",
    ]);

    let mut repo = InMemoryRepository::new();
    let outcome = pipeline()
        .ingest(&table, &target(), ExecutionMode::Normal, &mut repo)
        .unwrap();

    assert_eq!(outcome.persisted().unwrap().rows_inserted, 2);
    assert!(repo.committed().join("\n").contains(
        "VALUES ('Sgr A*', 266.4166667, -29.00781, TRUE, 'galactic centre xy');"
    ));
}

/// The catalogue name is lower-cased before use.
#[test]
fn test_catalogue_name_is_lower_cased() {
    let mut repo = InMemoryRepository::new();
    let outcome = pipeline()
        .ingest(&catalogue("Bright_Sources"), &target(), ExecutionMode::Normal, &mut repo)
        .unwrap();

    assert_eq!(outcome.persisted().unwrap().table_name, "bright_sources");
}

/// A committed catalogue makes its name unavailable to later files.
#[test]
fn test_second_ingest_with_same_name_is_rejected() {
    let mut repo = InMemoryRepository::new();
    let pipeline = pipeline();
    pipeline
        .ingest(&catalogue("bright_sources"), &target(), ExecutionMode::Normal, &mut repo)
        .unwrap();

    let messages = rejected(pipeline.ingest(
        &catalogue("bright_sources"),
        &target(),
        ExecutionMode::Normal,
        &mut repo,
    ));
    assert_eq!(
        messages,
        vec!["Error in PARAM 'Catalogue Name' : catalogue with name 'bright_sources' already exists"]
    );
}

// =============================================================================
// Catalogue Name Tests
// =============================================================================

/// Spaces are forbidden in the catalogue name.
#[test]
fn test_catalogue_name_with_spaces() {
    let mut repo = InMemoryRepository::new();
    let messages = rejected(pipeline().ingest(
        &catalogue("bright sources"),
        &target(),
        ExecutionMode::Normal,
        &mut repo,
    ));

    assert_eq!(
        messages,
        vec!["Error in PARAM 'Catalogue Name' : value contains forbidden characters (it must contain only letters, numbers and underscores)"]
    );
}

/// Versions are managed by the store, not by the depositor.
#[test]
fn test_catalogue_name_with_trailing_version() {
    let mut repo = InMemoryRepository::new();
    let messages = rejected(pipeline().ingest(
        &catalogue("bright_sources_v2"),
        &target(),
        ExecutionMode::Normal,
        &mut repo,
    ));

    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("Error in PARAM 'Catalogue Name' : value contains a trailing version"));
}

/// A pre-existing table is reported by name.
#[test]
fn test_catalogue_name_already_exists() {
    let mut repo = InMemoryRepository::new().with_table("casda", "bright_sources");
    let messages = rejected(pipeline().ingest(
        &catalogue("bright_sources"),
        &target(),
        ExecutionMode::Normal,
        &mut repo,
    ));

    assert_eq!(
        messages,
        vec!["Error in PARAM 'Catalogue Name' : catalogue with name 'bright_sources' already exists"]
    );
    assert!(repo.committed().is_empty());
}

/// A missing catalogue name is a TABLE-level error.
#[test]
fn test_missing_catalogue_name() {
    let mut table = catalogue("bright_sources");
    table.params.retain(|p| p.name != "Catalogue Name");

    let mut repo = InMemoryRepository::new();
    let messages = report(pipeline().ingest(&table, &target(), ExecutionMode::ValidateOnly, &mut repo));

    assert!(messages
        .iter()
        .any(|m| m.starts_with("Error in TABLE : Missing PARAM matching name: 'Catalogue Name'")));
}

// =============================================================================
// Positional Error Tests
// =============================================================================

/// A char value wider than its declared arraysize names the cell.
#[test]
fn test_value_wider_than_arraysize() {
    let mut table = catalogue("bright_sources");
    table.rows[0].cells[4] = Some("galactic centre xyz".to_string());

    let mut repo = InMemoryRepository::new();
    let messages = rejected(pipeline().ingest(&table, &target(), ExecutionMode::Normal, &mut repo));

    assert_eq!(
        messages,
        vec!["Error in 5th TD (FIELD 'comment') of 1st TR : Value 'galactic centre xyz' is wider than 18 chars"]
    );
}

/// A value that does not parse names its type.
#[test]
fn test_value_of_wrong_type() {
    let mut table = catalogue("bright_sources");
    table.rows[1].cells[1] = Some("east".to_string());

    let mut repo = InMemoryRepository::new();
    let messages = rejected(pipeline().ingest(&table, &target(), ExecutionMode::Normal, &mut repo));

    assert_eq!(
        messages,
        vec!["Error in 2nd TD (FIELD 'ra_deg_cont') of 2nd TR : Value 'east' is not a 'double'"]
    );
}

/// Extra and missing cells are reported against their row.
#[test]
fn test_row_cardinality() {
    let mut table = catalogue("bright_sources");
    table.rows[0].cells.push(Some("extra".to_string()));
    table.rows[1].cells.truncate(3);

    let mut repo = InMemoryRepository::new();
    let messages = report(pipeline().ingest(&table, &target(), ExecutionMode::ValidateOnly, &mut repo));

    assert_eq!(
        messages,
        vec![
            "Error in 1st TR : Additional TD",
            "Error in 2nd TR : Missing TD",
        ]
    );
}

/// Field names must be usable as column names.
#[test]
fn test_field_name_with_forbidden_characters() {
    let mut table = catalogue("bright_sources");
    table.fields[3] = DeclaredField::new("flag 1", "boolean");

    let mut repo = InMemoryRepository::new();
    let messages = report(pipeline().ingest(&table, &target(), ExecutionMode::ValidateOnly, &mut repo));

    assert_eq!(
        messages,
        vec!["Error in FIELD 'flag 1' : Attribute 'name' ('flag 1') contains forbidden characters (it must contain only letters, numbers and underscores)"]
    );
}

/// Indexed and principal field lists must name declared FIELDs.
#[test]
fn test_unknown_indexed_field() {
    let mut table = catalogue("bright_sources");
    table.params[1] = DeclaredParam::text("Indexed Fields", "source_name, flux");

    let mut repo = InMemoryRepository::new();
    let messages = report(pipeline().ingest(&table, &target(), ExecutionMode::ValidateOnly, &mut repo));

    assert_eq!(messages, vec!["Error in TABLE : Unknown indexed fields 'flux'"]);
}

/// Every unknown name is quoted on its own.
#[test]
fn test_several_unknown_indexed_fields() {
    let mut table = catalogue("bright_sources");
    table.params[1] = DeclaredParam::text("Indexed Fields", "ra_deg_cont, foo, bar");

    let mut repo = InMemoryRepository::new();
    let messages = report(pipeline().ingest(&table, &target(), ExecutionMode::ValidateOnly, &mut repo));

    assert_eq!(messages, vec!["Error in TABLE : Unknown indexed fields 'foo', 'bar'"]);
}

/// Overlong descriptions are rejected at TABLE and FIELD level.
#[test]
fn test_description_too_long() {
    let mut table = catalogue("bright_sources");
    table.description = Some("x".repeat(256));

    let mut repo = InMemoryRepository::new();
    let messages = report(pipeline().ingest(&table, &target(), ExecutionMode::ValidateOnly, &mut repo));

    assert_eq!(
        messages,
        vec!["Error in TABLE : Description element must be no bigger than 255 characters"]
    );
}

// =============================================================================
// Execution Mode Tests
// =============================================================================

fn table_with_three_problems() -> Table {
    let mut table = catalogue("bright sources");
    table.fields[3] = DeclaredField::new("flag 1", "boolean");
    table.rows[1].cells[2] = Some("south".to_string());
    table
}

/// Normal mode stops at the first problem.
#[test]
fn test_normal_mode_fails_fast() {
    let mut repo = InMemoryRepository::new();
    let messages = rejected(pipeline().ingest(
        &table_with_three_problems(),
        &target(),
        ExecutionMode::Normal,
        &mut repo,
    ));

    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("Error in PARAM 'Catalogue Name'"));
    assert_eq!(repo.rollback_count(), 1);
}

/// Validate-only mode reports every problem in discovery order.
#[test]
fn test_validate_only_accumulates() {
    let mut repo = InMemoryRepository::new();
    let messages = report(pipeline().ingest(
        &table_with_three_problems(),
        &target(),
        ExecutionMode::ValidateOnly,
        &mut repo,
    ));

    assert_eq!(messages.len(), 3);
    assert!(messages[0].starts_with("Error in PARAM 'Catalogue Name'"));
    assert!(messages[1].starts_with("Error in FIELD 'flag 1'"));
    assert_eq!(
        messages[2],
        "Error in 3rd TD (FIELD 'dec_deg_cont') of 2nd TR : Value 'south' is not a 'double'"
    );
}

/// A clean validate-only run executes its statements and then discards them.
#[test]
fn test_validate_only_never_commits() {
    let mut repo = InMemoryRepository::new();
    let messages = report(pipeline().ingest(
        &catalogue("bright_sources"),
        &target(),
        ExecutionMode::ValidateOnly,
        &mut repo,
    ));

    assert!(messages.is_empty());
    assert_eq!(repo.commit_count(), 0);
    assert_eq!(repo.rollback_count(), 1);
    assert!(repo.committed().is_empty());
    assert!(!repo.in_transaction());
}

/// Storage failures are not validation problems, in either mode.
#[test]
fn test_database_failure_is_distinct() {
    for mode in [ExecutionMode::Normal, ExecutionMode::ValidateOnly] {
        let mut repo = InMemoryRepository::new().failing_on("CREATE TABLE");
        let err = pipeline()
            .ingest(&catalogue("bright_sources"), &target(), mode, &mut repo)
            .unwrap_err();

        assert!(
            matches!(err, IngestError::Database(RepositoryError::Statement(_))),
            "unexpected error in {} mode: {:?}",
            mode,
            err
        );
        assert!(repo.committed().is_empty());
    }
}

/// Project codes must be usable as schema names.
#[test]
fn test_invalid_project_code() {
    let mut repo = InMemoryRepository::new();
    let mut target = target();
    target.project_code = "AS 007".to_string();

    let err = pipeline()
        .ingest(&catalogue("bright_sources"), &target, ExecutionMode::Normal, &mut repo)
        .unwrap_err();

    assert!(matches!(err, IngestError::Configuration(_)));
    assert_eq!(repo.begin_count(), 0);
}

// =============================================================================
// Escaping Tests
// =============================================================================

/// Quotes in free text are doubled, never passed through.
#[test]
fn test_literals_are_escaped() {
    let mut table = catalogue("bright_sources");
    table.description = Some("O'Brien's sources".to_string());
    table.rows[0].cells[0] = Some("x'); DROP TABLE".to_string());

    let mut repo = InMemoryRepository::new();
    pipeline()
        .ingest(&table, &target(), ExecutionMode::Normal, &mut repo)
        .unwrap();

    let committed = repo.committed().join("\n");
    assert!(committed.contains("COMMENT ON TABLE casda.bright_sources is 'O''Brien''s sources';"));
    assert!(committed.contains("VALUES ('x''); DROP TABLE', 266.4166667"));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

/// One pipeline serves several files at once, each with its own repository.
#[test]
fn test_pipeline_shared_across_threads() {
    let pipeline = pipeline();
    let names: Vec<String> = (0..8).map(|i| format!("sources_{}", i)).collect();

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = names
            .iter()
            .map(|name| {
                let pipeline = &pipeline;
                s.spawn(move || {
                    let mut repo = InMemoryRepository::new();
                    let outcome = pipeline
                        .ingest(&catalogue(name), &target(), ExecutionMode::Normal, &mut repo)
                        .unwrap();
                    (outcome.persisted().unwrap().table_name.clone(), repo.committed().len())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (name, (table_name, statements)) in names.iter().zip(results) {
        assert_eq!(&table_name, name);
        assert_eq!(statements, 4);
    }
}
