//! Traversal engine
//!
//! Walks a table in a fixed order:
//!
//! ```text
//! Start -> ParamsProcessed -> FieldsProcessed -> RowsProcessed(n)* -> Done
//! ```
//!
//! Each stage validates the declared elements against the catalog, then hands
//! them to the pipeline's `Stages` implementation. The engine owns the
//! per-file state and is consumed by `run`.

use std::collections::HashSet;

use super::diagnostics::Diagnostics;
use super::errors::{TraversalResult, ValidationError};
use crate::constraint::{Constraint, ConstraintCatalog};
use crate::matcher::{
    check_attributes, check_declared, convert, match_field, match_param, merged_constraint,
    resolve_datatype, ValueLimits,
};
use crate::votable::{DeclaredField, DeclaredParam, FieldDatatype, Row, Table, TypedValue};

/// Pipeline callbacks invoked by the traversal engine.
///
/// Callbacks record problems through `diagnostics` and propagate its result
/// with `?`, so fail-fast mode stops at the first recorded error.
pub trait Stages {
    /// Called before any PARAM is visited
    fn on_table(&mut self, _table: &Table, _diagnostics: &mut Diagnostics) -> TraversalResult<()> {
        Ok(())
    }

    /// Called once with every distinctly named PARAM
    fn on_params(
        &mut self,
        params: &[DeclaredParam],
        diagnostics: &mut Diagnostics,
    ) -> TraversalResult<()>;

    /// Called once with every FIELD, in column order
    fn on_fields(&mut self, fields: &[BoundField], diagnostics: &mut Diagnostics) -> TraversalResult<()>;

    /// Called for each row free of errors, and only when nothing was reported
    /// before the first row
    fn on_row(&mut self, row: &ConvertedRow<'_>, diagnostics: &mut Diagnostics) -> TraversalResult<()>;
}

/// A FIELD together with the constraint and limits that apply to it
#[derive(Debug, Clone)]
pub struct BoundField {
    pub field: DeclaredField,
    /// `None` when the datatype is unsupported
    pub datatype: Option<FieldDatatype>,
    /// All applicable constraints, merged
    pub constraint: Constraint,
    pub limits: ValueLimits,
    valid: bool,
}

impl BoundField {
    pub fn name(&self) -> &str {
        &self.field.name
    }

    /// False if the engine found a problem with this FIELD
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// One converted cell
#[derive(Debug, Clone)]
pub struct ConvertedCell<'a> {
    pub field: &'a BoundField,
    pub raw: Option<&'a str>,
    pub value: TypedValue,
}

/// One row with every cell converted
#[derive(Debug, Clone)]
pub struct ConvertedRow<'a> {
    /// Zero-based row index
    pub index: usize,
    pub cells: Vec<ConvertedCell<'a>>,
}

impl<'a> ConvertedRow<'a> {
    /// Looks a cell up by FIELD name
    pub fn get(&self, name: &str) -> Option<&ConvertedCell<'a>> {
        self.cells.iter().find(|cell| cell.field.name() == name)
    }
}

/// Progress of a traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalState {
    Start,
    ParamsProcessed,
    FieldsProcessed,
    RowsProcessed(usize),
    Done,
}

impl TraversalState {
    fn rank(&self) -> (u8, usize) {
        match self {
            TraversalState::Start => (0, 0),
            TraversalState::ParamsProcessed => (1, 0),
            TraversalState::FieldsProcessed => (2, 0),
            TraversalState::RowsProcessed(n) => (3, *n),
            TraversalState::Done => (4, 0),
        }
    }
}

/// Result of a completed traversal
#[derive(Debug)]
pub struct TraversalReport<S> {
    /// The pipeline callbacks, holding whatever they derived
    pub stages: S,
    /// Errors in discovery order; always empty in fail-fast mode
    pub errors: Vec<ValidationError>,
    pub rows_visited: usize,
    pub state: TraversalState,
}

impl<S> TraversalReport<S> {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Walks one table through the pipeline's stages
pub struct Traversal<'c, S: Stages> {
    catalog: &'c ConstraintCatalog,
    stages: S,
    diagnostics: Diagnostics,
    state: TraversalState,
}

impl<'c, S: Stages> Traversal<'c, S> {
    pub fn new(catalog: &'c ConstraintCatalog, stages: S, fail_fast: bool) -> Self {
        Self {
            catalog,
            stages,
            diagnostics: Diagnostics::new(fail_fast),
            state: TraversalState::Start,
        }
    }

    pub fn state(&self) -> TraversalState {
        self.state
    }

    /// Runs the traversal to completion.
    ///
    /// Returns `Err` on the first error in fail-fast mode, on an unresolvable
    /// row/column mismatch, and on configuration or persistence failures.
    pub fn run(mut self, table: &Table) -> TraversalResult<TraversalReport<S>> {
        self.stages.on_table(table, &mut self.diagnostics)?;

        let params = self.collect_params(&table.params)?;
        for param in &params {
            self.validate_param(param)?;
        }
        for constraint in self.catalog.params() {
            if reports_missing(constraint) && match_param(&params, constraint).is_none() {
                self.diagnostics
                    .table(format!("Missing PARAM matching {}", constraint.describe()))?;
            }
        }
        self.stages.on_params(&params, &mut self.diagnostics)?;
        self.advance(TraversalState::ParamsProcessed);

        let fields = self.bind_fields(&table.fields)?;
        for constraint in self.catalog.fields() {
            if reports_missing(constraint) && match_field(&table.fields, constraint).is_none() {
                self.diagnostics
                    .table(format!("Missing FIELD matching {}", constraint.describe()))?;
            }
        }
        self.stages.on_fields(&fields, &mut self.diagnostics)?;
        self.advance(TraversalState::FieldsProcessed);

        if fields.is_empty() && !table.rows.is_empty() {
            return Err(self
                .diagnostics
                .abort(ValidationError::table("Table contains TR elements but no FIELDs")));
        }

        let rows_convertible = self.diagnostics.is_empty()
            && fields
                .iter()
                .all(|f| f.is_valid() && !self.diagnostics.has_field_errors(f.name()));

        for (index, row) in table.rows.iter().enumerate() {
            self.visit_row(index, row, &fields, rows_convertible)?;
            self.advance(TraversalState::RowsProcessed(index + 1));
        }
        self.advance(TraversalState::Done);

        Ok(TraversalReport {
            stages: self.stages,
            errors: self.diagnostics.into_errors(),
            rows_visited: table.rows.len(),
            state: self.state,
        })
    }

    fn advance(&mut self, next: TraversalState) {
        debug_assert!(next.rank() > self.state.rank(), "traversal cannot move backwards");
        self.state = next;
    }

    /// Drops PARAMs with blank or repeated names
    fn collect_params(&mut self, declared: &[DeclaredParam]) -> TraversalResult<Vec<DeclaredParam>> {
        let mut seen = HashSet::new();
        let mut params = Vec::with_capacity(declared.len());

        for param in declared {
            if param.name.trim().is_empty() {
                self.diagnostics
                    .table("Table has one or more PARAMs with a blank 'name' attribute")?;
                continue;
            }
            if !seen.insert(param.name.as_str()) {
                self.diagnostics.table(format!(
                    "Table contains more than one PARAM named '{}'",
                    param.name
                ))?;
                continue;
            }
            params.push(param.clone());
        }
        Ok(params)
    }

    fn validate_param(&mut self, param: &DeclaredParam) -> TraversalResult<()> {
        let datatype = match resolve_datatype(param) {
            Ok(datatype) => datatype,
            Err(message) => return self.diagnostics.param(&param.name, message),
        };

        let constraint = merged_constraint(self.catalog.params(), param)?;
        let checked = check_attributes(&constraint, param).and_then(|()| check_declared(datatype, param));
        if let Err(message) = checked {
            return self.diagnostics.param(&param.name, message);
        }

        let limits = ValueLimits::resolve(param, &constraint);
        if let Err(message) = convert(&param.value, datatype, &limits) {
            self.diagnostics.param(&param.name, message)?;
        }
        Ok(())
    }

    /// Binds every FIELD, keeping column positions even for rejected FIELDs
    fn bind_fields(&mut self, declared: &[DeclaredField]) -> TraversalResult<Vec<BoundField>> {
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(declared.len());

        for field in declared {
            let named = !field.name.trim().is_empty();
            if !named {
                self.diagnostics
                    .table("Table has one or more FIELDs with a blank 'name' attribute")?;
            } else if field.name.eq_ignore_ascii_case("id") {
                self.diagnostics
                    .field(&field.name, "Table contains a FIELD named 'id'")?;
            }

            if named && !seen.insert(field.name.as_str()) {
                self.diagnostics.table(format!(
                    "Table contains more than one FIELD named '{}'",
                    field.name
                ))?;
                fields.push(BoundField {
                    field: field.clone(),
                    datatype: None,
                    constraint: Constraint::default(),
                    limits: ValueLimits::default(),
                    valid: false,
                });
                continue;
            }

            let mut binding = self.bind_field(field)?;
            binding.valid &= named;
            fields.push(binding);
        }
        Ok(fields)
    }

    fn bind_field(&mut self, field: &DeclaredField) -> TraversalResult<BoundField> {
        let datatype = match resolve_datatype(field) {
            Ok(datatype) => Some(datatype),
            Err(message) => {
                self.diagnostics.field(&field.name, message)?;
                None
            }
        };

        let constraint = merged_constraint(self.catalog.fields(), field)?;
        if let Some(datatype) = datatype {
            let checked =
                check_attributes(&constraint, field).and_then(|()| check_declared(datatype, field));
            if let Err(message) = checked {
                self.diagnostics.field(&field.name, message)?;
            }
        }

        let limits = ValueLimits::resolve(field, &constraint);
        let valid = datatype.is_some() && !self.diagnostics.has_field_errors(&field.name);

        Ok(BoundField {
            field: field.clone(),
            datatype,
            constraint,
            limits,
            valid,
        })
    }

    fn visit_row(
        &mut self,
        index: usize,
        row: &Row,
        fields: &[BoundField],
        rows_convertible: bool,
    ) -> TraversalResult<()> {
        let mut cells = Vec::with_capacity(fields.len());

        for (column, raw) in row.cells.iter().enumerate() {
            let Some(binding) = fields.get(column) else {
                self.diagnostics.row(index, "Additional TD")?;
                break;
            };

            let raw = raw.as_deref();
            let value = match (binding.datatype, binding.is_valid()) {
                (Some(datatype), true) => {
                    match convert(raw.unwrap_or_default(), datatype, &binding.limits) {
                        Ok(value) => value,
                        Err(message) => {
                            self.diagnostics
                                .cell(index, column, Some(binding.name()), message)?;
                            TypedValue::Null
                        }
                    }
                }
                _ => TypedValue::Null,
            };

            cells.push(ConvertedCell {
                field: binding,
                raw,
                value,
            });
        }

        if row.cells.len() < fields.len() {
            self.diagnostics.row(index, "Missing TD")?;
        }

        if rows_convertible && !self.diagnostics.has_row_errors(index) {
            let converted = ConvertedRow { index, cells };
            self.stages.on_row(&converted, &mut self.diagnostics)?;
        }
        Ok(())
    }
}

fn reports_missing(constraint: &Constraint) -> bool {
    constraint.requires_match() && !constraint.optional
}
