//! Collection catalogue pipeline
//!
//! Loads a catalogue deposited with a level 7 collection into its own entries
//! table:
//!
//! 1. PARAMs name the table and flag indexed and principal columns
//! 2. FIELDs become columns; once they are error-free the table is created
//!    and registered in the TAP metadata
//! 3. Every valid row becomes an insert

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use chrono::NaiveDate;
use regex::Regex;
use uuid::Uuid;

use crate::config::IngestConfig;
use crate::constraint::{ConfigError, ConfigResult, ConstraintCatalog};
use crate::ddl::{
    create_table, insert_row, is_safe_identifier, register_metadata, ColumnDescriptor,
    SqlIdentifier, SqlText, SqlType, SqlValue, UNRESOLVED_CHAR_WIDTH,
};
use crate::ingest::{self, ExecutionMode, IngestError, IngestResult, Outcome};
use crate::observability::{log_event_at, Event, ObservationScope, Severity};
use crate::repository::Repository;
use crate::traversal::{
    BoundField, ConvertedRow, Diagnostics, Stages, Traversal, TraversalResult,
};
use crate::votable::{DeclaredParam, FieldDatatype, Table};

use super::settle;

pub const CATALOGUE_NAME: &str = "Catalogue Name";
pub const INDEXED_FIELDS: &str = "Indexed Fields";
pub const PRINCIPAL_FIELDS: &str = "Principal Fields";

static CATALOGUE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[a-z0-9_]+$").expect("valid regex"));
static TRAILING_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_v\d+$").expect("valid regex"));

/// Where a catalogue is being deposited
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionTarget {
    pub collection_id: i64,
    /// Owning project, e.g. `AS007`
    pub project_code: String,
    pub filename: String,
    pub generation_date: NaiveDate,
}

/// A persisted catalogue
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogueRecord {
    pub collection_id: i64,
    pub table_name: String,
    pub filename: String,
    /// Column names in declaration order
    pub columns: Vec<String>,
    pub rows_inserted: usize,
}

/// Ingests collection catalogues.
///
/// Holds only immutable state, so one pipeline can serve many files, from
/// many threads.
#[derive(Debug, Clone)]
pub struct CollectionPipeline {
    catalog: Arc<ConstraintCatalog>,
    schema: SqlIdentifier,
    description_max_length: usize,
}

impl CollectionPipeline {
    /// Fails if char columns could end up without a width, or if the catalog
    /// does not require a `Catalogue Name` PARAM.
    pub fn new(catalog: Arc<ConstraintCatalog>, config: &IngestConfig) -> ConfigResult<Self> {
        if catalog.char_width_fallback().is_none() {
            return Err(ConfigError::width_unresolvable(UNRESOLVED_CHAR_WIDTH));
        }

        let requires_name = catalog
            .params()
            .iter()
            .any(|c| c.name.as_deref() == Some(CATALOGUE_NAME) && !c.optional);
        if !requires_name {
            return Err(ConfigError::invalid(format!(
                "Constraint catalog '{}' must require a '{}' PARAM",
                catalog.name(),
                CATALOGUE_NAME
            )));
        }

        let schema = SqlIdentifier::parse(config.schema.as_str())
            .map_err(|e| ConfigError::invalid(e.to_string()))?;

        Ok(Self {
            catalog,
            schema,
            description_max_length: config.description_max_length,
        })
    }

    pub fn catalog(&self) -> &Arc<ConstraintCatalog> {
        &self.catalog
    }

    /// Validates a catalogue and, in `Normal` mode, persists it
    pub fn ingest<R: Repository + ?Sized>(
        &self,
        table: &Table,
        target: &CollectionTarget,
        mode: ExecutionMode,
        repository: &mut R,
    ) -> IngestResult<Outcome<CatalogueRecord>> {
        let owner = SqlIdentifier::parse(target.project_code.as_str()).map_err(|e| {
            IngestError::Configuration(ConfigError::invalid(format!("Invalid project code: {}", e)))
        })?;

        let run_id = Uuid::new_v4().to_string();
        let collection_id = target.collection_id.to_string();
        let scope = ObservationScope::with_fields(
            "INGEST",
            &[
                ("collection_id", collection_id.as_str()),
                ("filename", target.filename.as_str()),
                ("mode", mode.as_str()),
                ("pipeline", "collection"),
                ("run_id", run_id.as_str()),
            ],
        );

        let result = ingest::run(mode, repository, |repo| {
            let stages = CatalogueStages::new(self, target, owner, repo);
            let report = Traversal::new(&self.catalog, stages, mode.fail_fast()).run(table)?;
            if !report.is_valid() {
                return Err(IngestError::MalformedInput(report.messages()));
            }
            report.stages.into_record()
        });

        settle(scope, &run_id, &result, |record| {
            ("rows", record.rows_inserted.to_string())
        });
        result
    }
}

/// Per-file callbacks for a collection catalogue
struct CatalogueStages<'p, 'r, R: Repository + ?Sized> {
    pipeline: &'p CollectionPipeline,
    target: &'p CollectionTarget,
    owner: SqlIdentifier,
    repository: &'r mut R,
    description: SqlText,
    catalogue_name: Option<SqlIdentifier>,
    params: Vec<(String, String)>,
    indexed: Vec<String>,
    principal: Vec<String>,
    columns: Vec<ColumnDescriptor>,
    created: bool,
    rows_inserted: usize,
}

impl<'p, 'r, R: Repository + ?Sized> CatalogueStages<'p, 'r, R> {
    fn new(
        pipeline: &'p CollectionPipeline,
        target: &'p CollectionTarget,
        owner: SqlIdentifier,
        repository: &'r mut R,
    ) -> Self {
        Self {
            pipeline,
            target,
            owner,
            repository,
            description: SqlText::default(),
            catalogue_name: None,
            params: Vec::new(),
            indexed: Vec::new(),
            principal: Vec::new(),
            columns: Vec::new(),
            created: false,
            rows_inserted: 0,
        }
    }

    fn execute(&mut self, kind: &str, statement: &str) -> TraversalResult<()> {
        self.repository.execute(statement)?;
        log_event_at(Severity::Trace, Event::StatementExecuted, &[("kind", kind)]);
        Ok(())
    }

    /// Checks the catalogue name, in order, stopping at the first problem
    fn check_catalogue_name(
        &mut self,
        value: &str,
        diagnostics: &mut Diagnostics,
    ) -> TraversalResult<()> {
        let name = value.trim().to_lowercase();

        if name.is_empty() {
            return diagnostics.param(CATALOGUE_NAME, "value cannot be blank");
        }
        if !CATALOGUE_NAME_RE.is_match(&name) {
            return diagnostics.param(
                CATALOGUE_NAME,
                "value contains forbidden characters (it must contain only letters, numbers and underscores)",
            );
        }
        if TRAILING_VERSION_RE.is_match(&name) {
            return diagnostics.param(
                CATALOGUE_NAME,
                "value contains a trailing version. Table versions are managed automatically and should not be manually provided.",
            );
        }
        if self
            .repository
            .table_exists(self.pipeline.schema.as_str(), &name)?
        {
            return diagnostics.param(
                CATALOGUE_NAME,
                format!("catalogue with name '{}' already exists", name),
            );
        }

        match SqlIdentifier::parse(name) {
            Ok(identifier) => self.catalogue_name = Some(identifier),
            Err(e) => diagnostics.param(CATALOGUE_NAME, e.to_string())?,
        }
        Ok(())
    }

    fn check_field(&self, binding: &BoundField, diagnostics: &mut Diagnostics) -> TraversalResult<()> {
        let name = binding.name();
        if !name.trim().is_empty() && !is_safe_identifier(name) {
            diagnostics.field(
                name,
                format!(
                    "Attribute 'name' ('{}') contains forbidden characters (it must contain only letters, numbers and underscores)",
                    name
                ),
            )?;
        }

        let too_long = binding
            .field
            .description
            .as_deref()
            .map_or(false, |d| d.chars().count() > self.pipeline.description_max_length);
        if too_long {
            diagnostics.field(name, self.description_limit_message())?;
        }
        Ok(())
    }

    fn description_limit_message(&self) -> String {
        format!(
            "Description element must be no bigger than {} characters",
            self.pipeline.description_max_length
        )
    }

    fn column_for(&self, binding: &BoundField) -> TraversalResult<Option<ColumnDescriptor>> {
        let (Some(datatype), Ok(source_name)) =
            (binding.datatype, SqlIdentifier::parse(binding.name()))
        else {
            return Ok(None);
        };

        let size = match datatype {
            FieldDatatype::Char => binding
                .limits
                .char_width()
                .or_else(|| self.pipeline.catalog.char_width_fallback()),
            _ => binding.limits.char_width(),
        };
        let sql_type = SqlType::for_datatype(datatype, size)?;

        let field = &binding.field;
        let mut column = ColumnDescriptor::new(source_name, datatype, sql_type);
        column.indexed = self.indexed.iter().any(|n| n == binding.name());
        column.principal = self.principal.iter().any(|n| n == binding.name());
        column.description = SqlText::new(field.description.as_deref().unwrap_or_default().trim());
        column.ucd = SqlText::new(field.ucd.as_deref().unwrap_or_default());
        column.unit = SqlText::new(field.unit.as_deref().unwrap_or_default());
        Ok(Some(column))
    }

    /// Reports names in a flag set that match no FIELD
    fn check_flag_set(
        names: &[String],
        known: &HashSet<&str>,
        label: &str,
        diagnostics: &mut Diagnostics,
    ) -> TraversalResult<()> {
        let unknown: Vec<String> = names
            .iter()
            .filter(|n| !known.contains(n.as_str()))
            .map(|n| format!("'{}'", n))
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }
        diagnostics.table(format!("Unknown {} fields {}", label, unknown.join(", ")))
    }

    fn create(&mut self) -> TraversalResult<()> {
        let Some(name) = self.catalogue_name.clone() else {
            return Ok(());
        };
        let pipeline = self.pipeline;
        let target = self.target;

        let ddl = create_table(
            &pipeline.schema,
            target.collection_id,
            &name,
            &self.description,
            &self.columns,
            &SqlText::new(target.filename.as_str()),
            target.generation_date,
        );
        self.execute("CREATE_TABLE", &ddl)?;

        let metadata = register_metadata(
            &pipeline.schema,
            &self.owner,
            &name,
            &self.description,
            &self.columns,
            &self.params,
        );
        self.execute("REGISTER_METADATA", &metadata)?;

        self.created = true;
        Ok(())
    }

    fn into_record(self) -> IngestResult<CatalogueRecord> {
        let (Some(name), true) = (self.catalogue_name, self.created) else {
            return Err(IngestError::Configuration(ConfigError::invalid(
                "Catalogue table was not created",
            )));
        };
        Ok(CatalogueRecord {
            collection_id: self.target.collection_id,
            table_name: name.to_string(),
            filename: self.target.filename.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| c.source_name.to_string())
                .collect(),
            rows_inserted: self.rows_inserted,
        })
    }
}

impl<R: Repository + ?Sized> Stages for CatalogueStages<'_, '_, R> {
    fn on_table(&mut self, table: &Table, diagnostics: &mut Diagnostics) -> TraversalResult<()> {
        let description = table.description.as_deref().unwrap_or_default().trim();
        if description.chars().count() > self.pipeline.description_max_length {
            diagnostics.table(self.description_limit_message())?;
        }
        self.description = SqlText::new(description);
        Ok(())
    }

    fn on_params(
        &mut self,
        params: &[DeclaredParam],
        diagnostics: &mut Diagnostics,
    ) -> TraversalResult<()> {
        self.params = params
            .iter()
            .map(|p| (p.name.clone(), p.value.clone()))
            .collect();

        for param in params {
            if diagnostics.has_param_errors(&param.name) {
                continue;
            }
            match param.name.as_str() {
                CATALOGUE_NAME => self.check_catalogue_name(&param.value, diagnostics)?,
                INDEXED_FIELDS => self.indexed = split_names(&param.value),
                PRINCIPAL_FIELDS => self.principal = split_names(&param.value),
                _ => {}
            }
        }
        Ok(())
    }

    fn on_fields(&mut self, fields: &[BoundField], diagnostics: &mut Diagnostics) -> TraversalResult<()> {
        for binding in fields {
            self.check_field(binding, diagnostics)?;
        }

        let known: HashSet<&str> = fields.iter().map(BoundField::name).collect();
        Self::check_flag_set(&self.indexed, &known, "indexed", diagnostics)?;
        Self::check_flag_set(&self.principal, &known, "principal", diagnostics)?;

        let mut columns = Vec::with_capacity(fields.len());
        for binding in fields {
            if !binding.is_valid() || diagnostics.has_field_errors(binding.name()) {
                continue;
            }
            if let Some(column) = self.column_for(binding)? {
                columns.push(column);
            }
        }
        self.columns = columns;

        if diagnostics.is_empty() {
            self.create()?;
        }
        Ok(())
    }

    fn on_row(&mut self, row: &ConvertedRow<'_>, _diagnostics: &mut Diagnostics) -> TraversalResult<()> {
        let Some(name) = self.catalogue_name.clone() else {
            return Ok(());
        };
        if !self.created {
            return Ok(());
        }

        let values: Vec<SqlValue> = row.cells.iter().map(|c| SqlValue::from(&c.value)).collect();
        let sql = insert_row(&self.pipeline.schema, &name, &self.columns, &values);
        self.execute("INSERT_ROW", &sql)?;
        self.rows_inserted += 1;
        Ok(())
    }
}

fn split_names(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect()
}
