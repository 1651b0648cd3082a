//! Validation metric pipeline
//!
//! Loads the quality metrics computed for one evaluation file. Each row names
//! a metric, its description, its value and a status code. Metric definitions
//! are shared between files and registered once per (name, description).

use std::collections::BTreeSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::config::IngestConfig;
use crate::constraint::{ConfigError, ConfigResult, ConstraintCatalog};
use crate::ddl::{
    escape_literal, insert_row, ColumnDescriptor, SqlIdentifier, SqlText, SqlType, SqlValue,
};
use crate::ingest::{self, ExecutionMode, IngestError, IngestResult, Outcome};
use crate::observability::{log_event_at, Event, ObservationScope, Severity};
use crate::repository::{Repository, RepositoryError};
use crate::traversal::{BoundField, ConvertedRow, Diagnostics, Stages, Traversal, TraversalResult};
use crate::votable::{DeclaredParam, FieldDatatype, Table};

use super::settle;

pub const PROJECT: &str = "project";
pub const METRIC_NAME: &str = "metric_name";
pub const METRIC_VALUE: &str = "metric_value";
pub const METRIC_STATUS: &str = "metric_status";
pub const METRIC_DESCRIPTION: &str = "metric_description";

/// Table holding one row per metric definition
pub const METRIC_TABLE: &str = "validation_metric";
/// Table holding one row per metric value
pub const METRIC_VALUE_TABLE: &str = "validation_metric_value";

/// The evaluation file the metrics belong to
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationTarget {
    pub evaluation_file_id: i64,
    pub project_code: String,
    /// Metric values already stored for this evaluation file
    pub existing_metric_values: usize,
}

/// A metric definition, unique by name and description
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MetricDefinition {
    pub name: String,
    pub description: String,
}

/// One measured metric
#[derive(Debug, Clone, PartialEq)]
pub struct MetricValue {
    pub definition: MetricDefinition,
    pub value: Option<f64>,
    pub status: Option<i64>,
}

/// Persisted metrics of one evaluation file
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRecord {
    pub evaluation_file_id: i64,
    /// Distinct definitions, sorted
    pub definitions: Vec<MetricDefinition>,
    /// Values in row order
    pub values: Vec<MetricValue>,
}

/// Ingests validation metric files
#[derive(Debug, Clone)]
pub struct MetricsPipeline {
    catalog: Arc<ConstraintCatalog>,
    schema: SqlIdentifier,
    value_table: SqlIdentifier,
    columns: Vec<ColumnDescriptor>,
}

impl MetricsPipeline {
    pub fn new(catalog: Arc<ConstraintCatalog>, config: &IngestConfig) -> ConfigResult<Self> {
        let identifier =
            |name: &str| SqlIdentifier::parse(name).map_err(|e| ConfigError::invalid(e.to_string()));
        let schema = identifier(config.schema.as_str())?;
        let value_table = identifier(METRIC_VALUE_TABLE)?;
        let columns = [
            ("evaluation_file_id", FieldDatatype::Long, SqlType::BigInt),
            (METRIC_NAME, FieldDatatype::Char, SqlType::Varchar(255)),
            (METRIC_DESCRIPTION, FieldDatatype::Char, SqlType::Varchar(255)),
            (METRIC_VALUE, FieldDatatype::Double, SqlType::DoublePrecision),
            (METRIC_STATUS, FieldDatatype::Int, SqlType::Integer),
        ]
        .into_iter()
        .map(|(name, datatype, sql_type)| {
            identifier(name).map(|id| ColumnDescriptor::new(id, datatype, sql_type))
        })
        .collect::<ConfigResult<Vec<_>>>()?;

        Ok(Self {
            catalog,
            schema,
            value_table,
            columns,
        })
    }

    pub fn catalog(&self) -> &Arc<ConstraintCatalog> {
        &self.catalog
    }

    /// Validates a metric file and, in `Normal` mode, persists its values.
    ///
    /// An evaluation file that already has metric values is refused before
    /// any work starts.
    pub fn ingest<R: Repository + ?Sized>(
        &self,
        table: &Table,
        target: &EvaluationTarget,
        mode: ExecutionMode,
        repository: &mut R,
    ) -> IngestResult<Outcome<EvaluationRecord>> {
        if target.existing_metric_values > 0 {
            return Err(IngestError::Database(RepositoryError::Conflict(format!(
                "Evaluation file {} already has validation metric entries",
                target.evaluation_file_id
            ))));
        }

        let run_id = Uuid::new_v4().to_string();
        let evaluation_file_id = target.evaluation_file_id.to_string();
        let scope = ObservationScope::with_fields(
            "INGEST",
            &[
                ("evaluation_file_id", evaluation_file_id.as_str()),
                ("mode", mode.as_str()),
                ("pipeline", "metrics"),
                ("run_id", run_id.as_str()),
            ],
        );

        let result = ingest::run(mode, repository, |repo| {
            let stages = MetricStages::new(self, target, repo);
            let report = Traversal::new(&self.catalog, stages, mode.fail_fast()).run(table)?;
            if !report.is_valid() {
                return Err(IngestError::MalformedInput(report.messages()));
            }
            Ok(report.stages.into_record())
        });

        settle(scope, &run_id, &result, |record| {
            ("values", record.values.len().to_string())
        });
        result
    }
}

/// Per-file callbacks for a validation metric file
struct MetricStages<'p, 'r, R: Repository + ?Sized> {
    pipeline: &'p MetricsPipeline,
    target: &'p EvaluationTarget,
    repository: &'r mut R,
    definitions: BTreeSet<MetricDefinition>,
    values: Vec<MetricValue>,
}

impl<'p, 'r, R: Repository + ?Sized> MetricStages<'p, 'r, R> {
    fn new(pipeline: &'p MetricsPipeline, target: &'p EvaluationTarget, repository: &'r mut R) -> Self {
        Self {
            pipeline,
            target,
            repository,
            definitions: BTreeSet::new(),
            values: Vec::new(),
        }
    }

    /// Registers a definition unless this file or an earlier one already did
    fn register_definition(&mut self, definition: &MetricDefinition) -> TraversalResult<()> {
        if self.definitions.contains(definition) {
            return Ok(());
        }
        let schema = &self.pipeline.schema;
        let name = escape_literal(&definition.name);
        let description = escape_literal(&definition.description);
        let sql = format!(
            "INSERT INTO {schema}.{table} (metric_name, description) SELECT {name}, {description} \
             WHERE NOT EXISTS (SELECT 1 FROM {schema}.{table} WHERE metric_name = {name} AND description = {description});",
            schema = schema,
            table = METRIC_TABLE,
            name = name,
            description = description,
        );
        self.repository.execute(&sql)?;
        log_event_at(Severity::Trace, Event::StatementExecuted, &[("kind", "REGISTER_METRIC")]);
        self.definitions.insert(definition.clone());
        Ok(())
    }

    fn into_record(self) -> EvaluationRecord {
        EvaluationRecord {
            evaluation_file_id: self.target.evaluation_file_id,
            definitions: self.definitions.into_iter().collect(),
            values: self.values,
        }
    }
}

impl<R: Repository + ?Sized> Stages for MetricStages<'_, '_, R> {
    fn on_params(
        &mut self,
        params: &[DeclaredParam],
        diagnostics: &mut Diagnostics,
    ) -> TraversalResult<()> {
        let Some(project) = params.iter().find(|p| p.name == PROJECT) else {
            return Ok(());
        };
        if diagnostics.has_param_errors(PROJECT) {
            return Ok(());
        }
        let declared = project.value.trim();
        if declared != self.target.project_code {
            diagnostics.param(
                PROJECT,
                format!(
                    "value '{}' does not match the project code '{}' of the evaluation file",
                    declared, self.target.project_code
                ),
            )?;
        }
        Ok(())
    }

    fn on_fields(&mut self, _fields: &[BoundField], _diagnostics: &mut Diagnostics) -> TraversalResult<()> {
        Ok(())
    }

    fn on_row(&mut self, row: &ConvertedRow<'_>, _diagnostics: &mut Diagnostics) -> TraversalResult<()> {
        let text = |field: &str| {
            row.get(field)
                .and_then(|c| c.value.as_text())
                .unwrap_or_default()
                .to_string()
        };
        let definition = MetricDefinition {
            name: text(METRIC_NAME),
            description: text(METRIC_DESCRIPTION),
        };
        let value = row.get(METRIC_VALUE).and_then(|c| c.value.as_real());
        let status = row.get(METRIC_STATUS).and_then(|c| c.value.as_integer());

        self.register_definition(&definition)?;

        let pipeline = self.pipeline;
        let values = [
            SqlValue::Integer(self.target.evaluation_file_id),
            SqlValue::Text(SqlText::new(definition.name.as_str())),
            SqlValue::Text(SqlText::new(definition.description.as_str())),
            value.map_or(SqlValue::Null, SqlValue::Real),
            status.map_or(SqlValue::Null, SqlValue::Integer),
        ];
        let sql = insert_row(&pipeline.schema, &pipeline.value_table, &pipeline.columns, &values);
        self.repository.execute(&sql)?;
        log_event_at(Severity::Trace, Event::StatementExecuted, &[("kind", "INSERT_ROW")]);

        self.values.push(MetricValue {
            definition,
            value,
            status,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_columns() {
        let pipeline = MetricsPipeline::new(
            Arc::new(ConstraintCatalog::validation_metric().unwrap()),
            &IngestConfig::default(),
        )
        .unwrap();
        let names: Vec<String> = pipeline
            .columns
            .iter()
            .map(|c| c.source_name.to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "evaluation_file_id",
                "metric_name",
                "metric_description",
                "metric_value",
                "metric_status"
            ]
        );
    }

    #[test]
    fn test_unsafe_schema_is_rejected_up_front() {
        let config = IngestConfig {
            schema: "casda; drop".to_string(),
            ..IngestConfig::default()
        };
        let err = MetricsPipeline::new(
            Arc::new(ConstraintCatalog::validation_metric().unwrap()),
            &config,
        )
        .unwrap_err();
        assert_eq!(err.code(), crate::constraint::ConfigErrorCode::ConfigInvalid);
    }

    #[test]
    fn test_existing_values_conflict() {
        let pipeline = MetricsPipeline::new(
            Arc::new(ConstraintCatalog::validation_metric().unwrap()),
            &IngestConfig::default(),
        )
        .unwrap();
        let target = EvaluationTarget {
            evaluation_file_id: 12,
            project_code: "AS031".into(),
            existing_metric_values: 3,
        };
        let mut repo = crate::repository::InMemoryRepository::new();
        let err = pipeline
            .ingest(
                &Table::default(),
                &target,
                ExecutionMode::Normal,
                &mut repo,
            )
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Database error: Conflict: Evaluation file 12 already has validation metric entries"
        );
        assert_eq!(repo.begin_count(), 0);
    }
}
