//! Observable ingest events
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events during an ingest run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Ingest configuration loaded
    ConfigLoaded,
    /// A constraint catalog loaded
    ConstraintsLoaded,
    /// A constraint catalog or configuration is unusable (FATAL)
    ConfigurationInvalid,

    // Ingest lifecycle
    /// A file ingest finished
    IngestComplete,
    /// A file was rejected as malformed
    IngestRejected,
    /// A validate-only run produced its report
    ValidationReported,

    // Persistence
    /// A rendered statement was executed
    StatementExecuted,
    /// The ingest transaction was committed
    TransactionCommitted,
    /// The ingest transaction was rolled back
    TransactionRolledBack,
    /// Rolling back the ingest transaction failed
    RollbackFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ConstraintsLoaded => "CONSTRAINTS_LOADED",
            Event::ConfigurationInvalid => "CONFIGURATION_INVALID",
            Event::IngestComplete => "INGEST_COMPLETE",
            Event::IngestRejected => "INGEST_REJECTED",
            Event::ValidationReported => "VALIDATION_REPORTED",
            Event::StatementExecuted => "STATEMENT_EXECUTED",
            Event::TransactionCommitted => "TRANSACTION_COMMITTED",
            Event::TransactionRolledBack => "TRANSACTION_ROLLED_BACK",
            Event::RollbackFailed => "ROLLBACK_FAILED",
        }
    }

    /// Fatal events stop the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::ConfigurationInvalid)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
