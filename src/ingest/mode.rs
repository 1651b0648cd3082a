//! Execution modes and outcomes

use std::fmt;

/// How an ingest run treats the database.
///
/// Chosen before traversal and fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Apply the file and commit; the first error aborts
    #[default]
    Normal,
    /// Apply the file, collect every error, always roll back
    ValidateOnly,
}

impl ExecutionMode {
    /// Normal runs stop at the first validation error
    pub fn fail_fast(&self) -> bool {
        matches!(self, ExecutionMode::Normal)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Normal => "NORMAL",
            ExecutionMode::ValidateOnly => "VALIDATE_ONLY",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Successful result of an ingest run
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// Normal mode: the work was committed
    Persisted(T),
    /// ValidateOnly mode: every validation message, empty if the file is valid
    ValidationReport(Vec<String>),
}

impl<T> Outcome<T> {
    pub fn persisted(&self) -> Option<&T> {
        match self {
            Outcome::Persisted(value) => Some(value),
            Outcome::ValidationReport(_) => None,
        }
    }

    pub fn report(&self) -> Option<&[String]> {
        match self {
            Outcome::Persisted(_) => None,
            Outcome::ValidationReport(messages) => Some(messages),
        }
    }
}
