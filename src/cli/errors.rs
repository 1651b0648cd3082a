//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero status.

use std::fmt;
use std::io;

use crate::constraint::ConfigError;
use crate::ingest::IngestError;

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration or constraint file error
    ConfigError,
    /// I/O error
    IoError,
    /// Table file is not a valid table
    InputError,
    /// The file was rejected
    MalformedInput,
    /// The database refused the work
    DatabaseError,
    /// A validate-only run found problems
    ValidationFailed,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "VOT_CLI_CONFIG_ERROR",
            Self::IoError => "VOT_CLI_IO_ERROR",
            Self::InputError => "VOT_CLI_INPUT_ERROR",
            Self::MalformedInput => "VOT_CLI_MALFORMED_INPUT",
            Self::DatabaseError => "VOT_CLI_DATABASE_ERROR",
            Self::ValidationFailed => "VOT_CLI_VALIDATION_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn input_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InputError, msg)
    }

    /// A validate-only run reported `count` problems
    pub fn validation_failed(count: usize) -> Self {
        Self::new(
            CliErrorCode::ValidationFailed,
            format!("Validation found {} error(s)", count),
        )
    }

    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<IngestError> for CliError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::MalformedInput(_) => Self::new(CliErrorCode::MalformedInput, e.to_string()),
            IngestError::Database(_) => Self::new(CliErrorCode::DatabaseError, e.to_string()),
            IngestError::Configuration(inner) => inner.into(),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RepositoryError;

    #[test]
    fn test_display_has_code() {
        let err = CliError::input_error("bad table");
        assert_eq!(err.to_string(), "VOT_CLI_INPUT_ERROR: bad table");
    }

    #[test]
    fn test_ingest_error_mapping() {
        let malformed: CliError = IngestError::malformed("Error in TABLE : x").into();
        assert_eq!(malformed.code(), CliErrorCode::MalformedInput);
        assert_eq!(malformed.message(), "Error in TABLE : x");

        let database: CliError =
            IngestError::Database(RepositoryError::Conflict("taken".into())).into();
        assert_eq!(database.code(), CliErrorCode::DatabaseError);

        let config: CliError = IngestError::Configuration(ConfigError::invalid("nope")).into();
        assert_eq!(config.code(), CliErrorCode::ConfigError);
    }
}
