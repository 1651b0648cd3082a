//! Traversal error types
//!
//! - `ValidationError`: a positional, human-readable problem with the input
//! - `TraversalError`: why a traversal stopped early

use std::fmt;

use thiserror::Error;

use crate::constraint::ConfigError;
use crate::repository::RepositoryError;

/// Where in the table a validation error was found.
///
/// Row and column indices are zero-based; display is one-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Table,
    Param(String),
    Field(String),
    Row(usize),
    Cell {
        row: usize,
        column: usize,
        /// `None` when the cell has no declared FIELD
        field: Option<String>,
    },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Table => write!(f, "TABLE"),
            Location::Param(name) => write!(f, "PARAM '{}'", name),
            Location::Field(name) => write!(f, "FIELD '{}'", name),
            Location::Row(row) => write!(f, "{} TR", ordinal(row + 1)),
            Location::Cell { row, column, field } => match field {
                Some(name) => write!(
                    f,
                    "{} TD (FIELD '{}') of {} TR",
                    ordinal(column + 1),
                    name,
                    ordinal(row + 1)
                ),
                None => write!(f, "{} TD of {} TR", ordinal(column + 1), ordinal(row + 1)),
            },
        }
    }
}

/// English ordinal: 1st, 2nd, 3rd, 4th, 11th, 12th, 13th, 21st
pub fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// A validation error with its position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    location: Location,
    message: String,
}

impl ValidationError {
    pub fn new(location: Location, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
        }
    }

    pub fn table(message: impl Into<String>) -> Self {
        Self::new(Location::Table, message)
    }

    pub fn param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Location::Param(name.into()), message)
    }

    pub fn field(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Location::Field(name.into()), message)
    }

    pub fn row(row: usize, message: impl Into<String>) -> Self {
        Self::new(Location::Row(row), message)
    }

    pub fn cell(row: usize, column: usize, field: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(
            Location::Cell {
                row,
                column,
                field: field.map(str::to_string),
            },
            message,
        )
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The bare message, without position
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error in {} : {}", self.location, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Why a traversal stopped before completing
#[derive(Debug, Error)]
pub enum TraversalError {
    /// Validation errors recorded up to the abort, the last one caused it
    #[error("{}", join_messages(.0))]
    Rejected(Vec<ValidationError>),

    #[error("{0}")]
    Configuration(#[from] ConfigError),

    #[error("{0}")]
    Persistence(#[from] RepositoryError),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result type for traversal operations
pub type TraversalResult<T> = Result<T, TraversalError>;
