//! Per-traversal error accumulator

use super::errors::{Location, TraversalError, TraversalResult, ValidationError};

/// Collects validation errors in discovery order.
///
/// In fail-fast mode the first recorded error aborts: `record` returns
/// `Err`, and `?` unwinds the traversal. Otherwise `record` always succeeds.
#[derive(Debug)]
pub struct Diagnostics {
    fail_fast: bool,
    errors: Vec<ValidationError>,
}

impl Diagnostics {
    pub fn new(fail_fast: bool) -> Self {
        Self {
            fail_fast,
            errors: Vec::new(),
        }
    }

    pub fn fail_fast(&self) -> bool {
        self.fail_fast
    }

    /// Records an error, aborting if in fail-fast mode.
    ///
    /// Table-level errors with an identical message are recorded once.
    pub fn record(&mut self, error: ValidationError) -> TraversalResult<()> {
        if *error.location() == Location::Table && self.errors.contains(&error) {
            return Ok(());
        }
        self.errors.push(error);
        if self.fail_fast {
            return Err(self.reject());
        }
        Ok(())
    }

    /// Records an error that makes continuing unsafe, in any mode
    pub fn abort(&mut self, error: ValidationError) -> TraversalError {
        self.errors.push(error);
        self.reject()
    }

    fn reject(&mut self) -> TraversalError {
        TraversalError::Rejected(std::mem::take(&mut self.errors))
    }

    pub fn table(&mut self, message: impl Into<String>) -> TraversalResult<()> {
        self.record(ValidationError::table(message))
    }

    pub fn param(&mut self, name: &str, message: impl Into<String>) -> TraversalResult<()> {
        self.record(ValidationError::param(name, message))
    }

    pub fn field(&mut self, name: &str, message: impl Into<String>) -> TraversalResult<()> {
        self.record(ValidationError::field(name, message))
    }

    pub fn row(&mut self, row: usize, message: impl Into<String>) -> TraversalResult<()> {
        self.record(ValidationError::row(row, message))
    }

    pub fn cell(
        &mut self,
        row: usize,
        column: usize,
        field: Option<&str>,
        message: impl Into<String>,
    ) -> TraversalResult<()> {
        self.record(ValidationError::cell(row, column, field, message))
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn has_param_errors(&self, name: &str) -> bool {
        self.errors
            .iter()
            .any(|e| matches!(e.location(), Location::Param(n) if n == name))
    }

    pub fn has_field_errors(&self, name: &str) -> bool {
        self.errors
            .iter()
            .any(|e| matches!(e.location(), Location::Field(n) if n == name))
    }

    /// True if the row, or any of its cells, has an error
    pub fn has_row_errors(&self, row: usize) -> bool {
        self.errors.iter().any(|e| match e.location() {
            Location::Row(r) => *r == row,
            Location::Cell { row: r, .. } => *r == row,
            _ => false,
        })
    }

    /// Formatted messages in discovery order
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}
